use super::error::StoreError;
use crate::signal::entity::AlertRecord;
use async_trait::async_trait;

/// # Summary
/// 告警流水存储接口 (只追加)。
///
/// # Invariants
/// - 已写入的行不可修改或删除。
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// # Summary
    /// 追加一条告警流水。
    ///
    /// # Arguments
    /// * `record` - 告警记录。
    async fn append(&self, record: &AlertRecord) -> Result<(), StoreError>;

    /// # Summary
    /// 按写入倒序读取最近的告警流水。
    ///
    /// # Arguments
    /// * `limit` - 返回条数上限。
    async fn recent(&self, limit: usize) -> Result<Vec<AlertRecord>, StoreError>;
}
