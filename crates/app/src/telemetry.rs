use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use vigil_core::config::LogConfig;

/// 日志文件名前缀，按天滚动
const LOG_FILE: &str = "vigil.log";

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. 过滤级别优先取 `RUST_LOG`，否则取配置 `log.level`。
/// 2. 同时输出到标准输出与 `log.dir` 下按天滚动的文件。
///
/// # Returns
/// 文件写入器的 guard，必须持有到进程退出，否则尾部日志会丢失。
pub fn init(log: &LogConfig) -> anyhow::Result<WorkerGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&log.level)?,
    };

    let file_appender = tracing_appender::rolling::daily(&log.dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()?;

    Ok(guard)
}
