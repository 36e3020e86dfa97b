use crate::signal::entity::AlertRecord;
use crate::signal::error::SinkError;
use async_trait::async_trait;

/// # Summary
/// 告警出口接口 (Port)。
/// 接收一条已定稿的告警记录，负责投递与持久化。
///
/// # Invariants
/// - 实现类必须保证线程安全 (`Send` + `Sync`)。
/// - 失败只向调用方报告，不在内部重试。
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// # Summary
    /// 投递一条告警。
    ///
    /// # Arguments
    /// * `record`: 告警记录。
    ///
    /// # Returns
    /// * 成功返回 `Ok(())`，任一环节失败返回 `SinkError`。
    async fn deliver(&self, record: &AlertRecord) -> Result<(), SinkError>;
}
