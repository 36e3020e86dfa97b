use crate::common::{Instrument, TimeFrame};
use crate::market::entity::Candle;
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// # Summary
/// 市场行情数据提供者接口（原始数据源）。
///
/// # Invariants
/// - 返回的 K 线按时间升序排列，且时间戳唯一。
/// - 区间内无数据时返回空列表，而不是错误。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取特定标的在指定时间范围内的 K 线数据。
    ///
    /// # Logic
    /// 1. 将 TimeFrame 映射为数据源识别的周期。
    /// 2. 构建数据源请求并执行。
    /// 3. 解析响应，丢弃字段缺失的行，按时间排序去重。
    ///
    /// # Arguments
    /// * `instrument`: 标的身份。
    /// * `timeframe`: K 线周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回 K 线列表 (可能为空)。
    async fn fetch_candles(
        &self,
        instrument: &Instrument,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError>;
}
