//! 信号评估引擎：AVWAP、形态识别、相对强弱、买卖规则与逐 K 线去重。

pub mod avwap;
pub mod dedup;
pub mod dispatch;
pub mod evaluator;
pub mod pattern;
pub mod processor;
pub mod strength;
