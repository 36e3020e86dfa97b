pub mod time;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 行情标的实体，代表系统监控的指数或其基准指数。
///
/// # Invariants
/// - `token` 为数据源侧的合约编号 (instrument token)，在同一数据源内唯一。
/// - `symbol` 仅用于展示与去重键，不参与数据源请求。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    // 展示名 (例如: NIFTY, BANKNIFTY)
    pub symbol: String,
    // 数据源合约编号 (例如: 256265)
    pub token: String,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            token: token.into(),
        }
    }
}

/// # Summary
/// 交易时间周期枚举，定义 K 线的时间跨度。
///
/// # Invariants
/// - 信号引擎只消费 `Minute5`，其余周期供数据源适配器复用。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    // 1分钟
    Minute1,
    // 5分钟
    Minute5,
    // 1小时
    Hour1,
    // 1日
    Day1,
}

impl TimeFrame {
    /// 单根 K 线覆盖的时长。
    pub fn duration(&self) -> TimeDelta {
        match self {
            TimeFrame::Minute1 => TimeDelta::minutes(1),
            TimeFrame::Minute5 => TimeDelta::minutes(5),
            TimeFrame::Hour1 => TimeDelta::hours(1),
            TimeFrame::Day1 => TimeDelta::days(1),
        }
    }
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "minute" | "minute1" => Ok(TimeFrame::Minute1),
            "5m" | "5minute" | "minute5" => Ok(TimeFrame::Minute5),
            "1h" | "60minute" | "hour1" => Ok(TimeFrame::Hour1),
            "1d" | "day" | "day1" => Ok(TimeFrame::Day1),
            _ => Err(format!("Unknown TimeFrame: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFrame::Minute1 => write!(f, "1m"),
            TimeFrame::Minute5 => write!(f, "5m"),
            TimeFrame::Hour1 => write!(f, "1h"),
            TimeFrame::Day1 => write!(f, "1d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parse_accepts_broker_intervals() {
        assert_eq!("5minute".parse::<TimeFrame>(), Ok(TimeFrame::Minute5));
        assert_eq!("5M".parse::<TimeFrame>(), Ok(TimeFrame::Minute5));
        assert_eq!("day".parse::<TimeFrame>(), Ok(TimeFrame::Day1));
        assert!("3minute".parse::<TimeFrame>().is_err());
    }

    #[test]
    fn test_timeframe_duration() {
        assert_eq!(TimeFrame::Minute5.duration(), TimeDelta::minutes(5));
        assert_eq!(TimeFrame::Minute5.to_string(), "5m");
    }
}
