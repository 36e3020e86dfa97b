use chrono::{NaiveTime, Timelike};
use std::time::Duration;

// K 线周期 (秒)
const BAR_SECONDS: u32 = 300;
// 边界后允许触发评估的窗口 (秒)
const BOUNDARY_WINDOW_SECONDS: u32 = 30;

/// # Summary
/// 交易时段闸门：每日截止时刻之后不再评估。
#[derive(Debug, Clone, Copy)]
pub struct MarketSession {
    cutoff: NaiveTime,
}

impl MarketSession {
    /// 以市场时区下的截止时刻构建，时刻非法时返回 `None`。
    pub fn new(cutoff_hour: u32, cutoff_minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(cutoff_hour, cutoff_minute, 0).map(|cutoff| Self { cutoff })
    }

    /// 当日本地时间早于截止时刻时返回 true。
    pub fn is_open<T: Timelike>(&self, now_local: &T) -> bool {
        let now = NaiveTime::from_hms_opt(now_local.hour(), now_local.minute(), now_local.second());
        now.is_some_and(|t| t < self.cutoff)
    }

    pub fn cutoff(&self) -> NaiveTime {
        self.cutoff
    }
}

/// 处于 5 分钟边界后的前 30 秒内时返回 true。
pub fn is_bar_boundary<T: Timelike>(now: &T) -> bool {
    now.minute() % 5 == 0 && now.second() < BOUNDARY_WINDOW_SECONDS
}

/// # Summary
/// 距离下一个 5 分钟边界的等待时长。
///
/// # Logic
/// 1. 计算自上一个边界以来经过的整秒数。
/// 2. 以周期减去已过秒数，再扣除当前秒内的亚秒部分。
pub fn until_next_boundary<T: Timelike>(now: &T) -> Duration {
    let elapsed = (now.minute() % 5) * 60 + now.second().min(59);
    let remaining = Duration::from_secs(u64::from(BAR_SECONDS - elapsed));
    let nanos = Duration::from_nanos(u64::from(now.nanosecond() % 1_000_000_000));
    remaining.saturating_sub(nanos)
}
