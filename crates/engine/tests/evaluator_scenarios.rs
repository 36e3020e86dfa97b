use vigil_core::signal::entity::{AvwapAnchor, Pattern, Signal};
use vigil_engine::evaluator::{IndicatorSnapshot, SignalEvaluator};
use vigil_engine::pattern::PatternDetector;

fn snapshot(close: f64, avwap_high: f64, avwap_low: f64, rs: f64, pattern: Pattern) -> IndicatorSnapshot {
    IndicatorSnapshot {
        close,
        avwap_high,
        avwap_low,
        rs,
        pattern,
    }
}

/// # Summary
/// 场景 A：绿锤线收在高锚 AVWAP 之上且跑赢基准，触发 BUY。
#[test]
fn test_scenario_a_green_hammer_buy() {
    let pattern = PatternDetector::detect(100.0, 102.0, 95.0, 101.0);
    assert_eq!(pattern, Pattern::GreenHammer);

    let decision = SignalEvaluator::new().evaluate(&snapshot(101.0, 97.5, 96.0, 0.02, pattern));

    assert_eq!(decision.signal, Signal::Buy);
    assert_eq!(decision.avwap_used, Some(97.5));
    assert_eq!(decision.anchor, Some(AvwapAnchor::PrevHigh));
    let measure = decision.measure.unwrap();
    assert!((measure - (101.0 - 97.5) / 97.5).abs() < 1e-12);
    assert!((measure - 0.0359).abs() < 1e-4);
}

/// # Summary
/// 场景 B：倒锤线收在高锚 AVWAP 之下且跑输基准，触发 SELL。
#[test]
fn test_scenario_b_inverted_hammer_sell() {
    // low 高于 close 时不构成倒锤线
    assert_eq!(PatternDetector::detect(100.0, 105.0, 99.0, 98.0), Pattern::None);

    let pattern = PatternDetector::detect(100.0, 105.0, 97.0, 98.0);
    assert_eq!(pattern, Pattern::InvertedHammer);

    let decision = SignalEvaluator::new().evaluate(&snapshot(98.0, 99.0, 97.0, -0.01, pattern));

    assert_eq!(decision.signal, Signal::Sell);
    assert_eq!(decision.avwap_used, Some(99.0));
    assert_eq!(decision.anchor, Some(AvwapAnchor::PrevHigh));
    assert!((decision.measure.unwrap() - 1.0 / 99.0).abs() < 1e-12);
}

#[test]
fn test_buy_falls_back_to_low_anchor() {
    // 收盘价低于高锚但高于低锚
    let decision =
        SignalEvaluator::new().evaluate(&snapshot(100.0, 105.0, 98.0, 0.01, Pattern::RedHammer));

    assert_eq!(decision.signal, Signal::Buy);
    assert_eq!(decision.avwap_used, Some(98.0));
    assert_eq!(decision.anchor, Some(AvwapAnchor::PrevLow));
}

#[test]
fn test_sell_falls_back_to_low_anchor() {
    // 高锚低于低锚时，收盘价可能位于两者之间
    let decision = SignalEvaluator::new().evaluate(&snapshot(
        101.0,
        100.0,
        103.0,
        -0.02,
        Pattern::InvertedGreenHammer,
    ));

    assert_eq!(decision.signal, Signal::Sell);
    assert_eq!(decision.anchor, Some(AvwapAnchor::PrevLow));
    assert!((decision.measure.unwrap() - 2.0 / 103.0).abs() < 1e-12);
}

#[test]
fn test_equal_anchors_report_prev_high() {
    let decision =
        SignalEvaluator::new().evaluate(&snapshot(101.0, 99.0, 99.0, 0.01, Pattern::GreenHammer));
    assert_eq!(decision.anchor, Some(AvwapAnchor::PrevHigh));
}

#[test]
fn test_no_signal_when_any_condition_fails() {
    let evaluator = SignalEvaluator::new();

    // RS 方向不符
    let wrong_rs = evaluator.evaluate(&snapshot(101.0, 97.5, 96.0, -0.02, Pattern::GreenHammer));
    assert_eq!(wrong_rs.signal, Signal::None);

    // RS 恰为 0
    let flat_rs = evaluator.evaluate(&snapshot(101.0, 97.5, 96.0, 0.0, Pattern::GreenHammer));
    assert_eq!(flat_rs.signal, Signal::None);

    // 形态方向不符
    let wrong_pattern =
        evaluator.evaluate(&snapshot(101.0, 97.5, 96.0, 0.02, Pattern::InvertedHammer));
    assert_eq!(wrong_pattern.signal, Signal::None);

    // 无形态
    let no_pattern = evaluator.evaluate(&snapshot(101.0, 97.5, 96.0, 0.02, Pattern::None));
    assert_eq!(no_pattern.signal, Signal::None);

    // 收盘价等于两条 AVWAP，既不在上方也不在下方
    let flat = evaluator.evaluate(&snapshot(100.0, 100.0, 100.0, 0.02, Pattern::GreenHammer));
    assert_eq!(flat.signal, Signal::None);
    assert_eq!(flat.avwap_used, None);
    assert_eq!(flat.measure, None);
    assert_eq!(flat.anchor, None);
}

#[test]
fn test_bullish_pattern_below_both_anchors_is_none() {
    let decision =
        SignalEvaluator::new().evaluate(&snapshot(95.0, 97.5, 96.0, 0.02, Pattern::GreenHammer));
    assert_eq!(decision.signal, Signal::None);
}
