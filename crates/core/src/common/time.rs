use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::{Arc, RwLock};

/// # Summary
/// 时间供给器接口，用于隔离物理系统时钟。
/// 引擎内所有 "今天" 与 "现在" 的判定都必须经由此接口获取。
pub trait TimeProvider: Send + Sync {
    /// 获取当前挂载的时间
    fn now(&self) -> DateTime<Utc>;
}

/// # Summary
/// 实盘运行使用的真实时钟，直接返回操作系统当前时间。
pub struct RealTimeProvider;

impl TimeProvider for RealTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// # Summary
/// 测试专用虚拟时钟，允许主动拨快或回退时间。
///
/// # Invariants
/// - 并发安全：内部利用 `RwLock` 提供多线程安全的读写。
/// - 锁中毒时沿用中毒前的值，不向调用方传播 panic。
pub struct FakeClockProvider {
    current_time: RwLock<DateTime<Utc>>,
}

impl FakeClockProvider {
    /// 使用指定的初始时间创建虚拟时钟
    pub fn new(initial_time: DateTime<Utc>) -> Self {
        Self {
            current_time: RwLock::new(initial_time),
        }
    }

    /// 强制修改时钟的当前时间
    pub fn set_time(&self, new_time: DateTime<Utc>) {
        let mut time = self
            .current_time
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *time = new_time;
    }
}

impl TimeProvider for FakeClockProvider {
    fn now(&self) -> DateTime<Utc> {
        *self
            .current_time
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// # Summary
/// 绑定交易所时区的市场时钟，是 "today" / "now" 的唯一来源。
///
/// # Invariants
/// - 所有日期切分 (当日 / 前一交易日) 均以 `tz` 的日历日期为准。
/// - 克隆代价低廉，内部仅持有时间源的共享指针。
#[derive(Clone)]
pub struct MarketClock {
    provider: Arc<dyn TimeProvider>,
    tz: Tz,
}

impl MarketClock {
    pub fn new(provider: Arc<dyn TimeProvider>, tz: Tz) -> Self {
        Self { provider, tz }
    }

    /// # Summary
    /// 根据 IANA 时区名构建市场时钟。
    ///
    /// # Arguments
    /// * `provider`: 时间源。
    /// * `tz_name`: 时区名，例如 "Asia/Kolkata"。
    ///
    /// # Returns
    /// 时区名非法时返回错误描述。
    pub fn with_zone_name(provider: Arc<dyn TimeProvider>, tz_name: &str) -> Result<Self, String> {
        let tz = tz_name
            .parse::<Tz>()
            .map_err(|e| format!("Unknown timezone {}: {}", tz_name, e))?;
        Ok(Self::new(provider, tz))
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// 市场时区下的当前时间。
    pub fn now_local(&self) -> DateTime<Tz> {
        self.provider.now().with_timezone(&self.tz)
    }

    /// 市场时区下的当前日历日期。
    pub fn today(&self) -> NaiveDate {
        self.now_local().date_naive()
    }

    /// 将任意 UTC 时间换算为市场时区。
    pub fn to_local(&self, time: DateTime<Utc>) -> DateTime<Tz> {
        time.with_timezone(&self.tz)
    }
}
