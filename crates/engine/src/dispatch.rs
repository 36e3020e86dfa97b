use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use vigil_core::notify::port::Notifier;
use vigil_core::signal::entity::AlertRecord;
use vigil_core::signal::error::SinkError;
use vigil_core::signal::port::AlertSink;
use vigil_core::store::port::AlertStore;

/// # Summary
/// `AlertSink` 的默认实现：先投递通知，再写入告警流水。
///
/// # Invariants
/// - 两个环节相互独立，通知失败仍会尝试落盘。
/// - 不做任何重试。
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn AlertStore>,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, store: Arc<dyn AlertStore>) -> Self {
        Self { notifier, store }
    }
}

#[async_trait]
impl AlertSink for AlertDispatcher {
    /// # Summary
    /// 投递并记录一条告警。
    ///
    /// # Logic
    /// 1. 以告警标题与正文调用通知器。
    /// 2. 将告警追加到流水存储。
    /// 3. 两者都成功才返回 Ok；通知错误优先于存储错误上报。
    async fn deliver(&self, record: &AlertRecord) -> Result<(), SinkError> {
        let notified = self
            .notifier
            .notify(&record.subject(), &record.body())
            .await
            .map_err(|e| SinkError::Notify(e.to_string()));

        let stored = self
            .store
            .append(record)
            .await
            .map_err(|e| SinkError::Store(e.to_string()));

        if stored.is_ok() {
            info!("Alert for {} recorded", record.symbol);
        }

        notified.and(stored)
    }
}
