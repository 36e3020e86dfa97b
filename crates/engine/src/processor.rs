use crate::avwap::{AnchoredVwapCalculator, bars_on_date, previous_day_extremes};
use crate::dedup::DedupTracker;
use crate::evaluator::{IndicatorSnapshot, SignalEvaluator};
use crate::pattern::PatternDetector;
use crate::strength::RelativeStrengthCalculator;
use chrono::{DateTime, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info, warn};
use vigil_core::common::time::MarketClock;
use vigil_core::common::{Instrument, TimeFrame};
use vigil_core::market::entity::Candle;
use vigil_core::market::port::MarketDataProvider;
use vigil_core::signal::entity::{AlertRecord, AvwapAnchor, ProcessedKey, Signal, SignalDecision};
use vigil_core::signal::error::EvalError;
use vigil_core::signal::port::AlertSink;

/// # Summary
/// 一个受监控的标的及其相对强弱基准。
#[derive(Debug, Clone)]
pub struct WatchedSymbol {
    pub instrument: Instrument,
    pub reference: Instrument,
}

impl WatchedSymbol {
    pub fn new(instrument: Instrument, reference: Instrument) -> Self {
        Self {
            instrument,
            reference,
        }
    }

    pub fn name(&self) -> &str {
        &self.instrument.symbol
    }
}

/// # Summary
/// 单次评估的结果，评估边界之外永远不会出现错误传播。
#[derive(Debug, Clone)]
pub enum Outcome {
    // 该 (symbol, bar) 今日已处理过
    Duplicate(ProcessedKey),
    // 评估中止，去重键未写入，可在下一个边界重试
    Aborted(EvalError),
    // 评估完成，去重键已写入
    Evaluated {
        key: ProcessedKey,
        decision: SignalDecision,
        alert: Option<AlertRecord>,
    },
}

/// # Summary
/// 评估过程中计算出的完整指标上下文。
#[derive(Debug, Clone, Copy)]
pub struct Analysis {
    pub snapshot: IndicatorSnapshot,
    pub prev_high: f64,
    pub prev_low: f64,
}

/// # Summary
/// 单标的信号处理器：拉取 K 线、计算指标、评估规则、去重并投递告警。
///
/// # Invariants
/// - 指标计算与规则评估是同步的纯计算，只有拉取 K 线与投递告警会挂起。
/// - 去重键仅在结论确定后写入；拉取失败或指标未定义时绝不写入。
/// - 每次调用只读取一次市场时钟，"今天" 由该读数推导。
pub struct SymbolProcessor {
    // 行情数据源
    provider: Arc<dyn MarketDataProvider>,
    // 告警出口
    sink: Arc<dyn AlertSink>,
    clock: MarketClock,
    evaluator: SignalEvaluator,
    // 拉取窗口覆盖的日历天数
    lookback_days: i64,
}

impl SymbolProcessor {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        sink: Arc<dyn AlertSink>,
        clock: MarketClock,
        lookback_days: i64,
    ) -> Self {
        Self {
            provider,
            sink,
            clock,
            evaluator: SignalEvaluator::new(),
            lookback_days,
        }
    }

    /// # Summary
    /// 对一个标的的最新 5 分钟 K 线执行一次完整评估。
    ///
    /// # Logic
    /// 1. 读取市场时钟，得到 now 与 today。
    /// 2. 拉取标的与基准的 K 线，任一为空则中止 (DataUnavailable)。
    /// 3. 以最新 K 线构造去重键，已处理则返回 Duplicate。
    /// 4. 计算前日极值、双锚 AVWAP、RS 与形态，任一未定义则中止。
    /// 5. 规则评估得出结论后写入去重键。
    /// 6. 若为 BUY/SELL，构造告警并交给告警出口；投递失败只记录日志。
    ///
    /// # Arguments
    /// * `watch`: 受监控标的。
    /// * `dedup`: 该标的独占的去重状态。
    ///
    /// # Returns
    /// 评估结果 `Outcome`。
    pub async fn process(&self, watch: &WatchedSymbol, dedup: &mut DedupTracker) -> Outcome {
        let now = self.clock.now_local();
        let today = now.date_naive();
        let tz = self.clock.tz();

        info!("Processing {}...", watch.name());

        let (bars, reference_bars) = match self.fetch_pair(watch, now.with_timezone(&Utc)).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Aborting {}: {}", watch.name(), e);
                return Outcome::Aborted(e);
            }
        };

        let Some(latest) = bars.last() else {
            return Outcome::Aborted(EvalError::DataUnavailable(format!(
                "no bars for {}",
                watch.name()
            )));
        };

        let key = ProcessedKey::from_bar(watch.name(), latest.time, tz);
        if !dedup.should_process(&key) {
            info!("Already processed {}, skipping", key);
            return Outcome::Duplicate(key);
        }

        let analysis = match Self::analyze(&bars, &reference_bars, today, tz) {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("Aborting {}: {}", watch.name(), e);
                return Outcome::Aborted(e);
            }
        };

        let s = analysis.snapshot;
        info!(
            "{} - Close: {}, Prev H/L: {}/{}, AVWAP(H): {:.2}, AVWAP(L): {:.2}, RS: {:.4}, Pattern: {}",
            watch.name(),
            s.close,
            analysis.prev_high,
            analysis.prev_low,
            s.avwap_high,
            s.avwap_low,
            s.rs,
            s.pattern
        );

        let decision = self.evaluator.evaluate(&s);
        dedup.mark_processed(key.clone());

        let alert = Self::build_alert(watch.name(), &analysis, &decision, latest, now);
        if let Some(record) = &alert {
            info!("{} SIGNAL for {}", record.signal, record.symbol);
            if let Err(e) = self.sink.deliver(record).await {
                error!("Failed to deliver alert for {}: {}", record.symbol, e);
            }
        } else {
            info!("No signal for {}", watch.name());
        }

        Outcome::Evaluated {
            key,
            decision,
            alert,
        }
    }

    /// # Summary
    /// 并发拉取标的与基准的 5 分钟 K 线。
    ///
    /// # Logic
    /// 1. 窗口起点为 `lookback_days` 个日历日之前的 00:00 (市场时区)。
    /// 2. 拉取失败或结果为空均映射为 DataUnavailable。
    async fn fetch_pair(
        &self,
        watch: &WatchedSymbol,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Candle>, Vec<Candle>), EvalError> {
        let start = self.window_start(now)?;

        let (bars, reference_bars) = tokio::join!(
            self.fetch(&watch.instrument, start, now),
            self.fetch(&watch.reference, start, now)
        );
        let (bars, reference_bars) = (bars?, reference_bars?);

        if bars.is_empty() || reference_bars.is_empty() {
            return Err(EvalError::DataUnavailable(format!(
                "insufficient data for {}",
                watch.name()
            )));
        }
        Ok((bars, reference_bars))
    }

    async fn fetch(
        &self,
        instrument: &Instrument,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, EvalError> {
        self.provider
            .fetch_candles(instrument, TimeFrame::Minute5, start, end)
            .await
            .map_err(|e| EvalError::DataUnavailable(format!("{}: {}", instrument.symbol, e)))
    }

    /// # Summary
    /// 计算拉取窗口起点。
    ///
    /// # Returns
    /// `lookback_days` 非正或超出日期范围时返回 DataUnavailable。
    fn window_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, EvalError> {
        let invalid = || {
            EvalError::DataUnavailable(format!(
                "invalid lookback window of {} days",
                self.lookback_days
            ))
        };
        let days = u64::try_from(self.lookback_days)
            .ok()
            .filter(|d| *d > 0)
            .map(Days::new)
            .ok_or_else(invalid)?;

        let local = self.clock.to_local(now);
        let start_day = local.date_naive().checked_sub_days(days).ok_or_else(invalid)?;
        start_day
            .and_hms_opt(0, 0, 0)
            .and_then(|midnight| midnight.and_local_timezone(self.clock.tz()).earliest())
            .map(|t| t.with_timezone(&Utc))
            .or_else(|| now.checked_sub_days(days))
            .ok_or_else(invalid)
    }

    /// # Summary
    /// 由 K 线序列计算评估所需的全部指标。
    ///
    /// # Logic
    /// 1. 前一交易日极值 (缺失则 DataUnavailable)。
    /// 2. 当日 K 线上的 prev_high / prev_low 两个锚点 AVWAP (未定义则 UndefinedIndicator)。
    /// 3. 最新收盘价的 RS (未定义则 UndefinedIndicator)。
    /// 4. 最新 K 线的形态。
    ///
    /// # Arguments
    /// * `bars`: 标的 K 线，非空且升序。
    /// * `reference_bars`: 基准 K 线，非空且升序。
    /// * `today`: 市场时区下的当前日期。
    /// * `tz`: 市场时区。
    pub fn analyze(
        bars: &[Candle],
        reference_bars: &[Candle],
        today: NaiveDate,
        tz: Tz,
    ) -> Result<Analysis, EvalError> {
        let latest = bars
            .last()
            .ok_or_else(|| EvalError::DataUnavailable("empty bar series".into()))?;

        let extremes = previous_day_extremes(bars, today, tz).ok_or_else(|| {
            EvalError::DataUnavailable("cannot compute previous day high/low".into())
        })?;

        let today_bars = bars_on_date(bars, today, tz);
        let avwap_high =
            AnchoredVwapCalculator::compute(&today_bars, &extremes, AvwapAnchor::PrevHigh)
                .ok_or_else(|| EvalError::UndefinedIndicator("AVWAP (prev_high)".into()))?;
        let avwap_low =
            AnchoredVwapCalculator::compute(&today_bars, &extremes, AvwapAnchor::PrevLow)
                .ok_or_else(|| EvalError::UndefinedIndicator("AVWAP (prev_low)".into()))?;

        let rs = RelativeStrengthCalculator::compute_latest(bars, reference_bars)
            .ok_or_else(|| EvalError::UndefinedIndicator("relative strength".into()))?;

        Ok(Analysis {
            snapshot: IndicatorSnapshot {
                close: latest.close,
                avwap_high: avwap_high.value,
                avwap_low: avwap_low.value,
                rs,
                pattern: PatternDetector::detect_candle(latest),
            },
            prev_high: extremes.prev_high,
            prev_low: extremes.prev_low,
        })
    }

    fn build_alert(
        symbol: &str,
        analysis: &Analysis,
        decision: &SignalDecision,
        bar: &Candle,
        now: DateTime<Tz>,
    ) -> Option<AlertRecord> {
        if decision.signal == Signal::None {
            return None;
        }
        Some(AlertRecord {
            symbol: symbol.to_string(),
            signal: decision.signal,
            close: analysis.snapshot.close,
            avwap_value: decision.avwap_used?,
            avwap_anchor: decision.anchor?,
            rs_value: analysis.snapshot.rs,
            pattern: analysis.snapshot.pattern,
            measure: decision.measure?,
            timestamp: now.fixed_offset(),
            bar_time: bar.time,
        })
    }
}
