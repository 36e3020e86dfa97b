use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, warn};
use vigil_core::market::entity::Candle;
use vigil_core::signal::entity::{AvwapAnchor, AvwapResult, DayExtremes};

/// # Summary
/// 筛选市场时区下落在指定日历日的 K 线，保持原有时间顺序。
pub fn bars_on_date(bars: &[Candle], date: NaiveDate, tz: Tz) -> Vec<&Candle> {
    bars.iter()
        .filter(|bar| bar.time.with_timezone(&tz).date_naive() == date)
        .collect()
}

/// # Summary
/// 计算前一交易日的最高价与最低价。
///
/// # Logic
/// 1. 取本地日期早于 `today` 的全部 K 线。
/// 2. 在其中找到最近的一个交易日。
/// 3. 该日 high 的最大值为 prev_high，low 的最小值为 prev_low。
///
/// # Arguments
/// * `bars`: 按时间升序排列的 K 线序列。
/// * `today`: 市场时区下的当前日期。
/// * `tz`: 市场时区。
///
/// # Returns
/// 没有任何早于今日的 K 线时返回 `None`。
pub fn previous_day_extremes(bars: &[Candle], today: NaiveDate, tz: Tz) -> Option<DayExtremes> {
    let prev_day = bars
        .iter()
        .map(|bar| bar.time.with_timezone(&tz).date_naive())
        .filter(|date| *date < today)
        .max();

    let Some(prev_day) = prev_day else {
        warn!("No previous day data available before {}", today);
        return None;
    };

    let day_bars = bars_on_date(bars, prev_day, tz);
    let prev_high = day_bars
        .iter()
        .map(|bar| bar.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let prev_low = day_bars
        .iter()
        .map(|bar| bar.low)
        .fold(f64::INFINITY, f64::min);

    if !prev_high.is_finite() || !prev_low.is_finite() {
        return None;
    }

    debug!(
        "Previous day {} high: {}, low: {}",
        prev_day, prev_high, prev_low
    );
    Some(DayExtremes {
        prev_high,
        prev_low,
    })
}

/// # Summary
/// 锚定成交量加权均价 (AVWAP) 计算器。
///
/// # Invariants
/// - 只对当日 K 线累计，锚点标签只决定与哪一个前日参考价对照，
///   不改变加权算术本身，两个锚点因此得到相同的数值。
/// - 累计成交量为 0 时结果未定义 (`None`)，而不是 0。
pub struct AnchoredVwapCalculator;

impl AnchoredVwapCalculator {
    /// # Summary
    /// 计算指定锚点下的 AVWAP。
    ///
    /// # Logic
    /// 1. 逐根计算典型价格 (high + low + close) / 3。
    /// 2. 按时间顺序累计 典型价格 × 成交量 与 成交量。
    /// 3. 结果 = 累计价量 / 累计成交量。
    ///
    /// # Arguments
    /// * `today_bars`: 当日 K 线，按时间升序。
    /// * `extremes`: 前一交易日极值，必须先于 AVWAP 存在。
    /// * `anchor`: 锚点标签。
    ///
    /// # Returns
    /// 无当日 K 线、累计成交量为 0 或结果非有限值时返回 `None`。
    pub fn compute(
        today_bars: &[&Candle],
        extremes: &DayExtremes,
        anchor: AvwapAnchor,
    ) -> Option<AvwapResult> {
        let anchor_price = match anchor {
            AvwapAnchor::PrevHigh => extremes.prev_high,
            AvwapAnchor::PrevLow => extremes.prev_low,
        };

        let value = Self::cumulative_vwap(today_bars)?;
        debug!("AVWAP from {} anchor ({}): {}", anchor, anchor_price, value);

        Some(AvwapResult {
            anchor,
            anchor_price,
            value,
        })
    }

    fn cumulative_vwap(bars: &[&Candle]) -> Option<f64> {
        if bars.is_empty() {
            warn!("No today's data for AVWAP calculation");
            return None;
        }

        let (price_volume, volume) = bars.iter().fold((0.0_f64, 0.0_f64), |(pv, v), bar| {
            (pv + bar.typical_price() * bar.volume, v + bar.volume)
        });

        if volume > 0.0 {
            let value = price_volume / volume;
            value.is_finite().then_some(value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ist() -> Tz {
        chrono_tz::Asia::Kolkata
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        ist()
            .with_ymd_and_hms(2024, 3, day, hour, minute, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn bar(time: DateTime<Utc>, high: f64, low: f64, close: f64, volume: f64) -> Candle {
        Candle {
            time,
            open: close,
            high,
            low,
            close,
            volume,
        }
    }

    #[test]
    fn test_previous_day_uses_most_recent_prior_date() {
        let bars = vec![
            bar(at(1, 9, 15), 200.0, 50.0, 100.0, 10.0),
            bar(at(4, 9, 15), 110.0, 95.0, 100.0, 10.0),
            bar(at(4, 15, 25), 112.0, 98.0, 100.0, 10.0),
            bar(at(5, 9, 15), 130.0, 80.0, 100.0, 10.0),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let extremes = previous_day_extremes(&bars, today, ist()).unwrap();
        assert_eq!(extremes.prev_high, 112.0);
        assert_eq!(extremes.prev_low, 95.0);
    }

    #[test]
    fn test_previous_day_missing() {
        let bars = vec![bar(at(5, 9, 15), 101.0, 99.0, 100.0, 10.0)];
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert!(previous_day_extremes(&bars, today, ist()).is_none());
    }

    #[test]
    fn test_bars_on_date_respects_market_timezone() {
        // 03-04 19:00 UTC 已经是印度时间 03-05 00:30
        let late = Utc.with_ymd_and_hms(2024, 3, 4, 19, 0, 0).unwrap();
        let bars = vec![bar(late, 1.0, 1.0, 1.0, 1.0)];
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(bars_on_date(&bars, today, ist()).len(), 1);
    }

    #[test]
    fn test_cumulative_vwap_weights_by_volume() {
        let extremes = DayExtremes {
            prev_high: 120.0,
            prev_low: 90.0,
        };
        let a = bar(at(5, 9, 15), 103.0, 97.0, 100.0, 100.0); // typical 100
        let b = bar(at(5, 9, 20), 112.0, 108.0, 110.0, 300.0); // typical 110
        let result = AnchoredVwapCalculator::compute(&[&a, &b], &extremes, AvwapAnchor::PrevLow)
            .unwrap();

        assert!((result.value - 107.5).abs() < 1e-9);
        assert_eq!(result.anchor_price, 90.0);
    }
}
