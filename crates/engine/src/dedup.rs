use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::debug;
use vigil_core::signal::entity::ProcessedKey;

/// # Summary
/// 单个标的的逐 K 线去重状态。
///
/// # Invariants
/// - 每个标的独占一个实例，由调用方持有并在每次评估时以 `&mut` 传入。
/// - 只有评估完整结束 (无论是否出信号) 后才允许 `mark_processed`。
/// - 跨日清理是显式操作，不会在查询时隐式发生。
#[derive(Debug, Default)]
pub struct DedupTracker {
    keys: HashSet<ProcessedKey>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 该键尚未处理过时返回 true。
    pub fn should_process(&self, key: &ProcessedKey) -> bool {
        !self.keys.contains(key)
    }

    pub fn mark_processed(&mut self, key: ProcessedKey) {
        debug!("Marking {} as processed", key);
        self.keys.insert(key);
    }

    /// # Summary
    /// 清理不属于 `today` 的全部键。
    ///
    /// # Returns
    /// 被清理的键数量。
    pub fn rollover_if_new_day(&mut self, today: NaiveDate) -> usize {
        let before = self.keys.len();
        self.keys.retain(|key| key.minute.date() == today);
        let purged = before - self.keys.len();
        if purged > 0 {
            debug!(
                "Purged {} processed keys, keeping {} for {}",
                purged,
                self.keys.len(),
                today
            );
        }
        purged
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
