use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use vigil_core::signal::entity::AlertRecord;
use vigil_core::store::error::StoreError;
use vigil_core::store::port::AlertStore;

// timestamp_ist 列的文本格式，按市场时区渲染
const JOURNAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 告警流水表的单行结构：timestamp_ist, symbol, signal, close, avwap_anchor, avwap_value,
/// rs_value, pattern, measure, bar_time
type AlertRow = (
    String,
    String,
    String,
    f64,
    String,
    f64,
    f64,
    String,
    f64,
    DateTime<Utc>,
);

/// AlertStore 的 SQLite 实现。
///
/// # Summary
/// 在 `{root}/alerts.db` 中以只追加方式记录每一条已发出的告警。
///
/// # Invariants
/// * 数据库结构在存储实例创建时初始化。
/// * 只有 INSERT 与 SELECT，已写入的行不会被修改。
/// * `timestamp_ist` 以市场时区的 `%Y-%m-%d %H:%M:%S` 文本保存。
pub struct SqliteAlertStore {
    pool: SqlitePool,
    // 市场时区，用于渲染与解析 timestamp_ist
    tz: Tz,
}

impl SqliteAlertStore {
    /// 在配置的数据根目录下打开告警流水库。
    pub async fn new(tz: Tz) -> Result<Self, StoreError> {
        Self::open(&crate::config::alerts_db_path(), tz).await
    }

    /// 打开指定路径的告警流水库并初始化表结构。
    ///
    /// # Logic
    /// 1. 确保父目录存在。
    /// 2. 配置 SQLite 连接选项，开启 `create_if_missing`。
    /// 3. 执行 DDL 初始化 `alerts` 表。
    ///
    /// # Arguments
    /// * `db_path` - 数据库文件路径。
    /// * `tz` - 市场时区。
    ///
    /// # Returns
    /// * `Result<Self, StoreError>` - 存储实例或初始化错误。
    pub async fn open(db_path: &Path, tz: Tz) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::InitError(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| StoreError::InitError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp_ist TEXT NOT NULL,
                symbol TEXT NOT NULL,
                signal TEXT NOT NULL,
                close REAL NOT NULL,
                avwap_anchor TEXT NOT NULL,
                avwap_value REAL NOT NULL,
                rs_value REAL NOT NULL,
                pattern TEXT NOT NULL,
                measure REAL NOT NULL,
                bar_time DATETIME NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StoreError::InitError(e.to_string()))?;

        info!("Alert journal ready at {}", db_path.display());
        Ok(Self { pool, tz })
    }
}

fn decode(row: AlertRow, tz: Tz) -> Result<AlertRecord, StoreError> {
    let bad = |reason: String| StoreError::Database(format!("Bad timestamp {}: {}", row.0, reason));
    let timestamp = NaiveDateTime::parse_from_str(&row.0, JOURNAL_TIME_FORMAT)
        .map_err(|e| bad(e.to_string()))?
        .and_local_timezone(tz)
        .earliest()
        .ok_or_else(|| bad(format!("not a valid time in {}", tz)))?
        .fixed_offset();
    Ok(AlertRecord {
        timestamp,
        symbol: row.1,
        signal: row.2.parse().map_err(StoreError::Database)?,
        close: row.3,
        avwap_anchor: row.4.parse().map_err(StoreError::Database)?,
        avwap_value: row.5,
        rs_value: row.6,
        pattern: row.7.parse().map_err(StoreError::Database)?,
        measure: row.8,
        bar_time: row.9,
    })
}

#[async_trait]
impl AlertStore for SqliteAlertStore {
    /// # Summary
    /// 追加一条告警流水。
    ///
    /// # Logic
    /// 在 `alerts` 表上执行 INSERT，告警时间转换到市场时区后按 `%Y-%m-%d %H:%M:%S` 保存。
    async fn append(&self, record: &AlertRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO alerts (timestamp_ist, symbol, signal, close, avwap_anchor, avwap_value, rs_value, pattern, measure, bar_time) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(
            record
                .timestamp
                .with_timezone(&self.tz)
                .format(JOURNAL_TIME_FORMAT)
                .to_string(),
        )
        .bind(&record.symbol)
        .bind(record.signal.as_str())
        .bind(record.close)
        .bind(record.avwap_anchor.as_str())
        .bind(record.avwap_value)
        .bind(record.rs_value)
        .bind(record.pattern.as_str())
        .bind(record.measure)
        .bind(record.bar_time)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        debug!("Appended {} alert for {}", record.signal, record.symbol);
        Ok(())
    }

    /// # Summary
    /// 按写入倒序读取最近的告警流水。
    async fn recent(&self, limit: usize) -> Result<Vec<AlertRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        sqlx::query_as::<_, AlertRow>(
            "SELECT timestamp_ist, symbol, signal, close, avwap_anchor, avwap_value, rs_value, pattern, measure, bar_time FROM alerts ORDER BY id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?
        .into_iter()
        .map(|row| decode(row, self.tz))
        .collect()
    }
}
