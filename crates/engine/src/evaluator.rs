use tracing::debug;
use vigil_core::signal::entity::{AvwapAnchor, Pattern, Signal, SignalDecision};

/// # Summary
/// 单根 K 线评估所需的全部指标快照。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub close: f64,
    // 以 prev_high 为锚的 AVWAP
    pub avwap_high: f64,
    // 以 prev_low 为锚的 AVWAP
    pub avwap_low: f64,
    pub rs: f64,
    pub pattern: Pattern,
}

/// 收盘价与某一 AVWAP 的对照结果。
#[derive(Debug, Clone, Copy)]
struct Comparison {
    avwap_used: f64,
    measure: f64,
}

/// # Summary
/// 买卖规则评估器。
///
/// # Invariants
/// - 先评估 BUY 再评估 SELL；两者形态集合互斥，不会同时成立。
/// - 纯计算，无 I/O，不持有状态。
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalEvaluator;

impl SignalEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// # Summary
    /// 对一份指标快照给出 BUY / SELL / NONE 结论。
    ///
    /// # Logic
    /// 1. BUY：收盘价位于某一 AVWAP 之上 (优先高锚)，measure > 0，RS > 0，且为看涨形态。
    /// 2. SELL：收盘价位于某一 AVWAP 之下 (优先高锚)，measure > 0，RS < 0，且为看跌形态。
    /// 3. 锚点标签：avwap_used 等于高锚 AVWAP 时为 prev_high，否则为 prev_low。
    ///
    /// # Arguments
    /// * `snapshot`: 指标快照。
    ///
    /// # Returns
    /// 评估结论，未触发时为 `SignalDecision::none()`。
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> SignalDecision {
        if let Some(cmp) = self.buy_setup(snapshot) {
            return self.decision(Signal::Buy, cmp, snapshot);
        }
        if let Some(cmp) = self.sell_setup(snapshot) {
            return self.decision(Signal::Sell, cmp, snapshot);
        }
        SignalDecision::none()
    }

    fn buy_setup(&self, s: &IndicatorSnapshot) -> Option<Comparison> {
        let comparison = if s.close > s.avwap_high {
            Some(Comparison {
                avwap_used: s.avwap_high,
                measure: (s.close - s.avwap_high) / s.avwap_high,
            })
        } else if s.close > s.avwap_low {
            Some(Comparison {
                avwap_used: s.avwap_low,
                measure: (s.close - s.avwap_low) / s.avwap_low,
            })
        } else {
            None
        };

        let measure_positive = comparison.is_some_and(|c| c.measure > 0.0);
        let rs_positive = s.rs > 0.0;
        let bullish = s.pattern.is_bullish();
        debug!(
            "BUY evaluation - CMP above AVWAP: {}, Measure > 0: {}, RS > 0: {}, Bullish pattern: {}",
            comparison.is_some(),
            measure_positive,
            rs_positive,
            bullish
        );

        comparison.filter(|_| measure_positive && rs_positive && bullish)
    }

    fn sell_setup(&self, s: &IndicatorSnapshot) -> Option<Comparison> {
        let comparison = if s.close < s.avwap_high {
            Some(Comparison {
                avwap_used: s.avwap_high,
                measure: (s.avwap_high - s.close) / s.avwap_high,
            })
        } else if s.close < s.avwap_low {
            Some(Comparison {
                avwap_used: s.avwap_low,
                measure: (s.avwap_low - s.close) / s.avwap_low,
            })
        } else {
            None
        };

        let measure_positive = comparison.is_some_and(|c| c.measure > 0.0);
        let rs_negative = s.rs < 0.0;
        let bearish = s.pattern.is_bearish();
        debug!(
            "SELL evaluation - CMP below AVWAP: {}, Measure > 0: {}, RS < 0: {}, Bearish pattern: {}",
            comparison.is_some(),
            measure_positive,
            rs_negative,
            bearish
        );

        comparison.filter(|_| measure_positive && rs_negative && bearish)
    }

    fn decision(&self, signal: Signal, cmp: Comparison, s: &IndicatorSnapshot) -> SignalDecision {
        let anchor = if cmp.avwap_used == s.avwap_high {
            AvwapAnchor::PrevHigh
        } else {
            AvwapAnchor::PrevLow
        };
        SignalDecision {
            signal,
            avwap_used: Some(cmp.avwap_used),
            measure: Some(cmp.measure),
            anchor: Some(anchor),
        }
    }
}
