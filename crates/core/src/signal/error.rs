use thiserror::Error;

/// # Summary
/// 单次评估中止的原因。
///
/// # Invariants
/// - 两类错误都只中止当前 (symbol, bar) 的评估，不写入去重键，可在下个边界重试。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    // K 线序列为空、拉取失败或缺少前一交易日数据
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
    // AVWAP 或 RS 无法计算 (零成交量 / 零基准价)
    #[error("Undefined indicator: {0}")]
    UndefinedIndicator(String),
}

/// # Summary
/// 告警出口错误，由调用方记录日志，引擎不重试。
#[derive(Error, Debug)]
pub enum SinkError {
    // 通知投递失败
    #[error("Notify failed: {0}")]
    Notify(String),
    // 告警落盘失败
    #[error("Store failed: {0}")]
    Store(String),
}
