use crate::schedule::{MarketSession, is_bar_boundary, until_next_boundary};
use tracing::{error, info, warn};
use vigil_core::common::time::MarketClock;
use vigil_engine::dedup::DedupTracker;
use vigil_engine::processor::{Outcome, SymbolProcessor, WatchedSymbol};

/// # Summary
/// 盘中监控循环：在每个 5 分钟边界对全部标的依次评估一次。
///
/// # Invariants
/// - 每个标的独占一个 `DedupTracker`。
/// - 标的按配置顺序串行处理，同一时刻只有一个评估在进行。
pub struct Monitor {
    processor: SymbolProcessor,
    clock: MarketClock,
    session: MarketSession,
    watches: Vec<(WatchedSymbol, DedupTracker)>,
}

impl Monitor {
    pub fn new(
        processor: SymbolProcessor,
        clock: MarketClock,
        session: MarketSession,
        symbols: Vec<WatchedSymbol>,
    ) -> Self {
        Self {
            processor,
            clock,
            session,
            watches: symbols
                .into_iter()
                .map(|s| (s, DedupTracker::new()))
                .collect(),
        }
    }

    /// # Summary
    /// 运行监控循环直到截止时刻或收到 Ctrl-C。
    ///
    /// # Logic
    /// 1. 截止时刻之后记录日志并退出。
    /// 2. 处于 K 线边界窗口内时执行一轮评估。
    /// 3. 休眠到下一个边界，期间响应 Ctrl-C。
    pub async fn run(&mut self) {
        info!(
            "Monitoring {} symbol(s) until {}",
            self.watches.len(),
            self.session.cutoff()
        );

        loop {
            let now = self.clock.now_local();
            if !self.session.is_open(&now) {
                info!("Market cutoff {} reached, stopping", self.session.cutoff());
                break;
            }

            if is_bar_boundary(&now) {
                self.tick().await;
            }

            let wait = until_next_boundary(&self.clock.now_local());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!("Failed to listen for shutdown signal: {}", e);
                    }
                    info!("Shutdown signal received. Exiting...");
                    break;
                }
            }
        }
    }

    /// # Summary
    /// 对全部标的执行一轮评估。
    ///
    /// # Logic
    /// 1. 清理每个标的去重状态中不属于今日的键。
    /// 2. 依次调用 `SymbolProcessor::process` 并记录结果。
    ///
    /// # Returns
    /// 每个标的的评估结果，顺序与配置一致。
    pub async fn tick(&mut self) -> Vec<Outcome> {
        let today = self.clock.today();
        let mut outcomes = Vec::with_capacity(self.watches.len());

        for (watch, dedup) in self.watches.iter_mut() {
            let purged = dedup.rollover_if_new_day(today);
            if purged > 0 {
                info!("New trading day {}, cleared {} keys for {}", today, purged, watch.name());
            }

            let outcome = self.processor.process(watch, dedup).await;
            match &outcome {
                Outcome::Duplicate(key) => info!("{} already evaluated", key),
                Outcome::Aborted(e) => warn!("{} skipped: {}", watch.name(), e),
                Outcome::Evaluated { key, decision, .. } => {
                    info!("{} evaluated: {}", key, decision.signal)
                }
            }
            outcomes.push(outcome);
        }

        outcomes
    }
}
