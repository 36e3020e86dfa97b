use serde::{Deserialize, Serialize};

// lookback_days 的合法取值范围
pub const MIN_LOOKBACK_DAYS: i64 = 1;
pub const MAX_LOOKBACK_DAYS: i64 = 30;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    // 为 true 时告警只写日志，不发送邮件
    pub dry_run: bool,
    pub market: MarketConfig,
    pub broker: BrokerConfig,
    pub email: EmailConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    // IANA 时区名
    pub timezone: String,
    // 每日截止时刻，之后不再评估
    pub cutoff_hour: u32,
    pub cutoff_minute: u32,
    // 拉取 K 线的回溯天数，需覆盖前一交易日
    pub lookback_days: i64,
    pub symbols: Vec<WatchConfig>,
}

/// 单个监控标的及其相对强弱基准。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    pub name: String,
    pub token: String,
    pub reference_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub base_url: String,
    pub api_key: String,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    // 逗号分隔的收件人列表
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
}

impl AppConfig {
    /// # Summary
    /// 列出未填写的必填项。
    ///
    /// # Logic
    /// 1. 行情凭证始终必填。
    /// 2. 邮件凭证仅在非 dry-run 模式下必填。
    ///
    /// # Returns
    /// 缺失项的配置路径列表，为空表示校验通过。
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.broker.api_key.trim().is_empty() {
            missing.push("broker.api_key");
        }
        if self.broker.access_token.trim().is_empty() {
            missing.push("broker.access_token");
        }
        if !self.dry_run {
            if self.email.user.trim().is_empty() {
                missing.push("email.user");
            }
            if self.email.pass.trim().is_empty() {
                missing.push("email.pass");
            }
            if self.email.to.trim().is_empty() {
                missing.push("email.to");
            }
        }
        if self.market.symbols.is_empty() {
            missing.push("market.symbols");
        }
        missing
    }

    /// # Summary
    /// 列出取值越界的配置项。
    ///
    /// # Invariants
    /// - `market.lookback_days` 位于 `MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS`。
    ///
    /// # Returns
    /// 越界项的配置路径列表，为空表示校验通过。
    pub fn out_of_range(&self) -> Vec<&'static str> {
        let mut invalid = Vec::new();
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&self.market.lookback_days) {
            invalid.push("market.lookback_days");
        }
        invalid
    }

    /// 解析逗号分隔的收件人列表。
    pub fn recipients(&self) -> Vec<String> {
        self.email
            .to
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            market: MarketConfig {
                timezone: "Asia/Kolkata".to_string(),
                cutoff_hour: 14,
                cutoff_minute: 30,
                lookback_days: 4,
                symbols: vec![
                    WatchConfig {
                        name: "NIFTY".to_string(),
                        token: "256265".to_string(),
                        reference_token: "13297412".to_string(),
                    },
                    WatchConfig {
                        name: "BANKNIFTY".to_string(),
                        token: "260105".to_string(),
                        reference_token: "260105".to_string(),
                    },
                ],
            },
            broker: BrokerConfig {
                base_url: "https://api.kite.trade".to_string(),
                api_key: String::new(),
                access_token: String::new(),
            },
            email: EmailConfig {
                host: "smtp.gmail.com".to_string(),
                port: 587,
                user: String::new(),
                pass: String::new(),
                to: String::new(),
            },
            storage: StorageConfig {
                data_dir: "data".to_string(),
            },
            log: LogConfig {
                level: "info".to_string(),
                dir: "logs".to_string(),
            },
        }
    }
}
