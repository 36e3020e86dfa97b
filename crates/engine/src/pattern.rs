use tracing::warn;
use vigil_core::market::entity::Candle;
use vigil_core::signal::entity::Pattern;

/// # Summary
/// 单根 K 线的锤子线家族形态识别器。
///
/// # Invariants
/// - 规则按固定顺序匹配，返回第一个命中的形态，保证互斥。
/// - 任一价格为非有限值时返回 `Pattern::None`，不中止评估。
pub struct PatternDetector;

impl PatternDetector {
    /// # Summary
    /// 识别一根 K 线的形态。
    ///
    /// # Logic
    /// 1. GreenHammer: 阳线，下影线 > 2 倍实体，且下影线长于上影线。
    /// 2. RedHammer: 阴线，下影线 > 2 倍实体，且下影线长于上影线。
    /// 3. InvertedHammer: 阴线，上影线 > 2 倍实体，且上影线长于下影线。
    /// 4. InvertedGreenHammer: 阳线，上影线 > 2 倍实体，且上影线长于下影线。
    /// 5. 均不满足时为 None。
    pub fn detect(open: f64, high: f64, low: f64, close: f64) -> Pattern {
        let (o, h, l, c) = (open, high, low, close);
        if ![o, h, l, c].iter().all(|v| v.is_finite()) {
            warn!("Invalid OHLC data provided: o={} h={} l={} c={}", o, h, l, c);
            return Pattern::None;
        }

        if c > o && (o - l) > 2.0 * (c - o) && h >= c && (o - l) > (h - c) {
            return Pattern::GreenHammer;
        }
        if c < o && (c - l) > 2.0 * (o - c) && h >= o && (c - l) > (h - o) {
            return Pattern::RedHammer;
        }
        if c < o && (h - o) > 2.0 * (o - c) && l <= c && (h - o) > (c - l) {
            return Pattern::InvertedHammer;
        }
        if c > o && (h - c) > 2.0 * (c - o) && l <= o && (h - c) > (o - l) {
            return Pattern::InvertedGreenHammer;
        }

        Pattern::None
    }

    pub fn detect_candle(candle: &Candle) -> Pattern {
        Self::detect(candle.open, candle.high, candle.low, candle.close)
    }
}
