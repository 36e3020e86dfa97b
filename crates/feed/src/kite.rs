use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};
use vigil_core::common::{Instrument, TimeFrame};
use vigil_core::market::entity::Candle;
use vigil_core::market::error::MarketError;
use vigil_core::market::port::MarketDataProvider;

// Kite Connect 请求中 from / to 参数的本地时间格式
const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// # Summary
/// Kite Connect 历史 K 线行情提供者。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端，所有请求携带 `X-Kite-Version: 3` 与 `token key:access` 鉴权头。
/// - 请求时间窗按交易所时区 `tz` 格式化。
#[derive(Clone)]
pub struct KiteProvider {
    client: Client,
    // API 根地址，例如 https://api.kite.trade
    base_url: String,
    tz: Tz,
}

impl KiteProvider {
    /// # Summary
    /// 创建一个新的 KiteProvider 实例。
    ///
    /// # Logic
    /// 1. 构建鉴权与版本请求头。
    /// 2. 配置 10 秒超时并初始化 reqwest 客户端。
    ///
    /// # Arguments
    /// * `base_url`: API 根地址。
    /// * `api_key`: 应用 API key。
    /// * `access_token`: 当日登录换取的 access token。
    /// * `tz`: 交易所时区。
    ///
    /// # Returns
    /// 凭证含非法字符或客户端构建失败时返回 `MarketError::Auth` / `MarketError::Network`。
    pub fn new(base_url: &str, api_key: &str, access_token: &str, tz: Tz) -> Result<Self, MarketError> {
        let mut headers = HeaderMap::new();
        headers.insert("X-Kite-Version", HeaderValue::from_static("3"));
        let auth = HeaderValue::from_str(&format!("token {}:{}", api_key, access_token))
            .map_err(|e| MarketError::Auth(e.to_string()))?;
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tz,
        })
    }

    /// 将 `TimeFrame` 映射为 Kite 的 interval 名称。
    pub fn interval(timeframe: TimeFrame) -> &'static str {
        match timeframe {
            TimeFrame::Minute1 => "minute",
            TimeFrame::Minute5 => "5minute",
            TimeFrame::Hour1 => "60minute",
            TimeFrame::Day1 => "day",
        }
    }

    fn format_time(&self, t: DateTime<Utc>) -> String {
        t.with_timezone(&self.tz).format(QUERY_TIME_FORMAT).to_string()
    }
}

/// # Summary
/// Kite API 响应信封。
///
/// # Invariants
/// - `status` 为 "success" 时 `data` 存在，为 "error" 时 `message` / `error_type` 存在。
#[derive(Deserialize, Debug)]
struct KiteEnvelope<T> {
    status: String,
    data: Option<T>,
    message: Option<String>,
    error_type: Option<String>,
}

impl<T> KiteEnvelope<T> {
    // 错误信封按 error_type 映射为 MarketError，成功时取出 data
    fn into_data(self) -> Result<Option<T>, MarketError> {
        if self.status == "success" {
            return Ok(self.data);
        }
        let message = self.message.unwrap_or_else(|| "unknown error".into());
        Err(match self.error_type.as_deref() {
            Some("TokenException") | Some("PermissionException") => MarketError::Auth(message),
            Some("InputException") => MarketError::Parse(message),
            Some("NetworkException") => MarketError::Network(message),
            _ => MarketError::Unknown(message),
        })
    }
}

#[derive(Deserialize, Debug)]
struct KiteCandles {
    // 每行为 [timestamp, open, high, low, close, volume(, oi)]
    candles: Vec<Vec<Value>>,
}

/// # Summary
/// 解析 Kite 历史 K 线响应体。
///
/// # Logic
/// 1. 反序列化信封；`status` 非 success 时按 `error_type` 映射错误。
/// 2. 逐行解析，字段缺失或格式不符的行直接丢弃。
/// 3. 按时间升序排序并去除重复时间戳。
///
/// # Arguments
/// * `body`: 响应体原文。
///
/// # Returns
/// 成功返回 K 线列表 (可能为空)。
pub fn parse_candles(body: &str) -> Result<Vec<Candle>, MarketError> {
    let envelope: KiteEnvelope<KiteCandles> =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    let rows = envelope.into_data()?.map(|d| d.candles).unwrap_or_default();
    let total = rows.len();
    let mut candles: Vec<Candle> = rows.iter().filter_map(|row| parse_row(row)).collect();
    if candles.len() < total {
        warn!("Dropped {} malformed candle rows", total - candles.len());
    }

    candles.sort_by_key(|c| c.time);
    candles.dedup_by_key(|c| c.time);
    Ok(candles)
}

fn parse_row(row: &[Value]) -> Option<Candle> {
    let ts = row.first()?.as_str()?;
    let time = DateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%z")
        .or_else(|_| DateTime::parse_from_rfc3339(ts))
        .ok()?
        .with_timezone(&Utc);
    let num = |i: usize| row.get(i).and_then(Value::as_f64);

    Some(Candle {
        time,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        volume: num(5)?,
    })
}

#[derive(Deserialize, Debug)]
struct KiteProfile {
    user_id: String,
}

/// # Summary
/// 解析 `/user/profile` 响应体。
///
/// # Returns
/// 成功返回账户 user_id；错误信封按 `error_type` 映射，缺少 data 时返回 Parse。
pub fn parse_profile(body: &str) -> Result<String, MarketError> {
    let envelope: KiteEnvelope<KiteProfile> =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;
    envelope
        .into_data()?
        .map(|p| p.user_id)
        .ok_or_else(|| MarketError::Parse("profile response without data".into()))
}

// 非 2xx 且错误体不可读时按 HTTP 状态码归类
fn resolve_status<T>(
    status: reqwest::StatusCode,
    parsed: Result<T, MarketError>,
) -> Result<T, MarketError> {
    match parsed {
        Ok(value) if status.is_success() => Ok(value),
        Err(e @ MarketError::Parse(_)) if !status.is_success() => {
            warn!("Kite returned HTTP {} with unreadable body: {}", status, e);
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                Err(MarketError::Auth(format!("HTTP {}", status)))
            } else {
                Err(MarketError::Network(format!("HTTP {}", status)))
            }
        }
        Ok(_) => Err(MarketError::Network(format!("HTTP {}", status))),
        Err(e) => Err(e),
    }
}

impl KiteProvider {
    /// # Summary
    /// 校验行情接口连通性与凭证有效性。
    ///
    /// # Logic
    /// 1. 请求 `/user/profile`。
    /// 2. 按信封与 HTTP 状态码映射错误，凭证失效映射为 `MarketError::Auth`。
    pub async fn test_connection(&self) -> Result<(), MarketError> {
        let url = format!("{}/user/profile", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let user_id = resolve_status(status, parse_profile(&body))?;
        info!("Connected to Kite as {}", user_id);
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for KiteProvider {
    /// # Summary
    /// 从 Kite Connect 抓取历史 K 线。
    ///
    /// # Logic
    /// 1. 映射 TimeFrame 为 Kite interval。
    /// 2. 构建 `/instruments/historical/{token}/{interval}` 请求，时间窗按交易所时区格式化。
    /// 3. 401/403 映射为 Auth，其余非 2xx 且无法解析错误体时映射为 Network。
    /// 4. 解析响应体。
    ///
    /// # Arguments
    /// * `instrument`: 标的。
    /// * `timeframe`: 周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回按时间升序的 K 线列表，失败返回 MarketError。
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let url = format!(
            "{}/instruments/historical/{}/{}",
            self.base_url,
            instrument.token,
            Self::interval(timeframe)
        );
        let (from, to) = (self.format_time(start), self.format_time(end));
        debug!("Fetching {} {} from {} to {}", instrument.symbol, timeframe, from, to);

        let resp = self
            .client
            .get(&url)
            .query(&[("from", from.as_str()), ("to", to.as_str())])
            .send()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| MarketError::Network(e.to_string()))?;

        let candles = resolve_status(status, parse_candles(&body))?;
        debug!("Fetched {} candles for {}", candles.len(), instrument.symbol);
        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_sorts_and_dedups() {
        let body = r#"{
            "status": "success",
            "data": {"candles": [
                ["2024-03-05T09:20:00+0530", 101.0, 102.0, 95.0, 100.0, 1200],
                ["2024-03-05T09:15:00+0530", 100.0, 101.5, 99.0, 101.0, 1500, 0],
                ["2024-03-05T09:20:00+0530", 101.0, 102.0, 95.0, 100.0, 1200]
            ]}
        }"#;

        let candles = parse_candles(body).unwrap();

        assert_eq!(candles.len(), 2);
        assert!(candles[0].time < candles[1].time);
        assert_eq!(candles[0].time.to_rfc3339(), "2024-03-05T03:45:00+00:00");
        assert_eq!(candles[0].volume, 1500.0);
        assert_eq!(candles[1].close, 100.0);
    }

    #[test]
    fn test_parse_skips_malformed_rows() {
        let body = r#"{
            "status": "success",
            "data": {"candles": [
                ["2024-03-05T09:15:00+0530", 100.0, 101.5, 99.0, 101.0, 1500],
                ["not a time", 100.0, 101.5, 99.0, 101.0, 1500],
                ["2024-03-05T09:20:00+0530", 100.0, null, 99.0, 101.0, 1500],
                ["2024-03-05T09:25:00+0530", 100.0, 101.5]
            ]}
        }"#;

        let candles = parse_candles(body).unwrap();
        assert_eq!(candles.len(), 1);
    }

    #[test]
    fn test_parse_empty_is_ok() {
        let body = r#"{"status": "success", "data": {"candles": []}}"#;
        assert!(parse_candles(body).unwrap().is_empty());
    }

    #[test]
    fn test_parse_error_mapping() {
        let token = r#"{"status": "error", "message": "Incorrect `api_key` or `access_token`.", "error_type": "TokenException"}"#;
        assert!(matches!(parse_candles(token), Err(MarketError::Auth(_))));

        let input = r#"{"status": "error", "message": "invalid token", "error_type": "InputException"}"#;
        assert!(matches!(parse_candles(input), Err(MarketError::Parse(_))));

        let other = r#"{"status": "error", "message": "boom", "error_type": "GeneralException"}"#;
        assert!(matches!(parse_candles(other), Err(MarketError::Unknown(_))));

        assert!(matches!(parse_candles("<html>"), Err(MarketError::Parse(_))));
    }

    #[test]
    fn test_parse_profile() {
        let ok = r#"{"status": "success", "data": {"user_id": "AB1234", "user_name": "Test", "email": "t@example.com"}}"#;
        assert_eq!(parse_profile(ok).unwrap(), "AB1234");

        let expired = r#"{"status": "error", "message": "Incorrect `api_key` or `access_token`.", "error_type": "TokenException"}"#;
        assert!(matches!(parse_profile(expired), Err(MarketError::Auth(_))));

        let empty = r#"{"status": "success"}"#;
        assert!(matches!(parse_profile(empty), Err(MarketError::Parse(_))));
    }

    #[test]
    fn test_resolve_status_classifies_unreadable_errors() {
        use reqwest::StatusCode;

        let unreadable = || parse_profile("<html>forbidden</html>");
        assert!(matches!(
            resolve_status(StatusCode::FORBIDDEN, unreadable()),
            Err(MarketError::Auth(_))
        ));
        assert!(matches!(
            resolve_status(StatusCode::BAD_GATEWAY, unreadable()),
            Err(MarketError::Network(_))
        ));
        assert!(matches!(
            resolve_status(StatusCode::INTERNAL_SERVER_ERROR, Ok("AB1234".to_string())),
            Err(MarketError::Network(_))
        ));

        // 可读的错误信封优先于状态码
        let expired = r#"{"status": "error", "message": "expired", "error_type": "TokenException"}"#;
        assert!(matches!(
            resolve_status(StatusCode::FORBIDDEN, parse_profile(expired)),
            Err(MarketError::Auth(_))
        ));
        assert_eq!(resolve_status(StatusCode::OK, Ok(1)).unwrap(), 1);
    }

    #[test]
    fn test_interval_names() {
        assert_eq!(KiteProvider::interval(TimeFrame::Minute5), "5minute");
        assert_eq!(KiteProvider::interval(TimeFrame::Day1), "day");
    }

    #[test]
    fn test_query_time_uses_exchange_zone() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let provider =
            KiteProvider::new("https://api.kite.trade/", "key", "token", chrono_tz::Asia::Kolkata)
                .unwrap();
        let t = DateTime::parse_from_rfc3339("2024-03-05T03:45:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(provider.format_time(t), "2024-03-05 09:15:00");
        assert_eq!(provider.base_url, "https://api.kite.trade");
    }
}
