use vigil_core::market::entity::Candle;

/// # Summary
/// 相对强弱计算器：RS = 标的收盘 / 基准收盘 - 1。
///
/// # Invariants
/// - 基准收盘为 0、任一输入缺失或非有限值时结果未定义。
pub struct RelativeStrengthCalculator;

impl RelativeStrengthCalculator {
    pub fn compute(symbol_close: f64, reference_close: f64) -> Option<f64> {
        if !symbol_close.is_finite() || !reference_close.is_finite() || reference_close == 0.0 {
            return None;
        }
        Some(symbol_close / reference_close - 1.0)
    }

    /// 用两条序列的最新收盘价计算 RS，任一序列为空时返回 `None`。
    pub fn compute_latest(symbol_bars: &[Candle], reference_bars: &[Candle]) -> Option<f64> {
        let symbol_close = symbol_bars.last()?.close;
        let reference_close = reference_bars.last()?.close;
        Self::compute(symbol_close, reference_close)
    }
}
