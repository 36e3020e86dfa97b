use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// # Summary
/// 单根 K 线的蜡烛图形态分类。
///
/// # Invariants
/// - 各形态互斥，一根 K 线只会归入其中一类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pattern {
    GreenHammer,
    RedHammer,
    InvertedHammer,
    InvertedGreenHammer,
    None,
}

impl Pattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pattern::GreenHammer => "Green_Hammer",
            Pattern::RedHammer => "Red_Hammer",
            Pattern::InvertedHammer => "Inverted_Hammer",
            Pattern::InvertedGreenHammer => "Inverted_Green_Hammer",
            Pattern::None => "None",
        }
    }

    /// 看涨形态：可支撑 BUY。
    pub fn is_bullish(&self) -> bool {
        matches!(self, Pattern::GreenHammer | Pattern::RedHammer)
    }

    /// 看跌形态：可支撑 SELL。
    pub fn is_bearish(&self) -> bool {
        matches!(self, Pattern::InvertedHammer | Pattern::InvertedGreenHammer)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Pattern::GreenHammer,
            Pattern::RedHammer,
            Pattern::InvertedHammer,
            Pattern::InvertedGreenHammer,
            Pattern::None,
        ]
        .into_iter()
        .find(|p| p.as_str() == s)
        .ok_or_else(|| format!("Unknown pattern: {}", s))
    }
}

/// # Summary
/// 方向信号。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell,
    None,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::None => "NONE",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BUY" => Ok(Signal::Buy),
            "SELL" => Ok(Signal::Sell),
            "NONE" => Ok(Signal::None),
            _ => Err(format!("Unknown signal: {}", s)),
        }
    }
}

/// # Summary
/// AVWAP 所对照的前一交易日参考位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvwapAnchor {
    PrevHigh,
    PrevLow,
}

impl AvwapAnchor {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvwapAnchor::PrevHigh => "prev_high",
            AvwapAnchor::PrevLow => "prev_low",
        }
    }
}

impl fmt::Display for AvwapAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvwapAnchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prev_high" => Ok(AvwapAnchor::PrevHigh),
            "prev_low" => Ok(AvwapAnchor::PrevLow),
            _ => Err(format!("Unknown anchor: {}", s)),
        }
    }
}

/// # Summary
/// 前一交易日的最高价与最低价。
///
/// # Invariants
/// - 只由最近一个早于当日的交易日 K 线推导，日内不可变。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayExtremes {
    pub prev_high: f64,
    pub prev_low: f64,
}

/// # Summary
/// 某个锚点下计算出的 AVWAP 值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AvwapResult {
    pub anchor: AvwapAnchor,
    // 锚点对应的前日参考价
    pub anchor_price: f64,
    pub value: f64,
}

/// # Summary
/// 规则评估的最终结论。
///
/// # Invariants
/// - `signal == Signal::None` 时三个可选字段均为 `None`。
/// - `anchor` 为 `PrevHigh` 当且仅当 `avwap_used` 等于传入的高锚 AVWAP。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalDecision {
    pub signal: Signal,
    pub avwap_used: Option<f64>,
    pub measure: Option<f64>,
    pub anchor: Option<AvwapAnchor>,
}

impl SignalDecision {
    pub fn none() -> Self {
        Self {
            signal: Signal::None,
            avwap_used: None,
            measure: None,
            anchor: None,
        }
    }

    pub fn is_actionable(&self) -> bool {
        self.signal != Signal::None
    }
}

/// # Summary
/// 交付给告警出口的告警记录。
///
/// # Invariants
/// - 每个 (symbol, bar) 至多生成一条，创建后不可变。
/// - `signal` 只可能是 BUY 或 SELL。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub symbol: String,
    pub signal: Signal,
    pub close: f64,
    pub avwap_value: f64,
    pub avwap_anchor: AvwapAnchor,
    pub rs_value: f64,
    pub pattern: Pattern,
    pub measure: f64,
    // 评估时刻 (市场时区)
    pub timestamp: DateTime<FixedOffset>,
    // 触发告警的 K 线开始时间
    pub bar_time: DateTime<Utc>,
}

impl AlertRecord {
    /// 告警标题，例如 `Trading Alert: BUY NIFTY`。
    pub fn subject(&self) -> String {
        format!("Trading Alert: {} {}", self.signal, self.symbol)
    }

    /// 纯文本告警正文。
    pub fn body(&self) -> String {
        format!(
            "TRADING ALERT GENERATED\n\
             \n\
             SIGNAL DETAILS\n\
             Symbol: {symbol}\n\
             Signal: {signal}\n\
             Time: {time}\n\
             Close Price: {close:.2}\n\
             \n\
             TECHNICAL ANALYSIS\n\
             AVWAP: {avwap:.2} (anchored at {anchor})\n\
             Relative Strength: {rs:.4}\n\
             Pattern: {pattern}\n\
             Measure: {measure:.4}\n\
             \n\
             This is an automated alert. Please verify manually before trading.",
            symbol = self.symbol,
            signal = self.signal,
            time = self.timestamp.format("%Y-%m-%d %H:%M:%S %:z"),
            close = self.close,
            avwap = self.avwap_value,
            anchor = self.avwap_anchor,
            rs = self.rs_value,
            pattern = self.pattern,
            measure = self.measure,
        )
    }
}

/// # Summary
/// 去重键：标的 + 截断到分钟的 K 线本地时间。
///
/// # Invariants
/// - 生命周期为当前交易日，跨日由 `DedupTracker` 清理。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessedKey {
    pub symbol: String,
    // 市场时区下截断到分钟的 K 线时间
    pub minute: NaiveDateTime,
}

impl ProcessedKey {
    /// # Summary
    /// 由 K 线时间构建去重键。
    ///
    /// # Logic
    /// 1. 将 UTC 时间换算到市场时区。
    /// 2. 抹去秒与纳秒部分。
    pub fn from_bar(symbol: &str, bar_time: DateTime<Utc>, tz: Tz) -> Self {
        let local = bar_time.with_timezone(&tz).naive_local();
        let minute = local
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(local);
        Self {
            symbol: symbol.to_string(),
            minute,
        }
    }
}

impl fmt::Display for ProcessedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.symbol, self.minute.format("%Y%m%d_%H%M"))
    }
}
