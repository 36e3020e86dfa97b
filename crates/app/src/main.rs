mod monitor;
mod schedule;
mod settings;
mod telemetry;

use anyhow::{Context, bail};
use monitor::Monitor;
use schedule::MarketSession;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use vigil_core::common::Instrument;
use vigil_core::common::time::{MarketClock, RealTimeProvider};
use vigil_core::notify::port::Notifier;
use vigil_engine::dispatch::AlertDispatcher;
use vigil_engine::processor::{SymbolProcessor, WatchedSymbol};
use vigil_feed::kite::KiteProvider;
use vigil_notify::dry_run::DryRunNotifier;
use vigil_notify::email::EmailNotifier;
use vigil_store::alert::SqliteAlertStore;
use vigil_store::config::set_root_dir;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责加载配置、实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到引擎。
///
/// # Logic
/// 1. 加载 .env 与分层配置，初始化全局日志。
/// 2. 校验必填项与取值范围，不合法则拒绝启动。
/// 3. 实例化基础设施层（Feed、Store、Notifier）。
/// 4. 构造引擎（SymbolProcessor）与监控循环。
/// 5. 运行到截止时刻或收到退出信号。
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 配置与日志
    let dotenv_loaded = dotenvy::dotenv().is_ok();
    let config = settings::load().context("Failed to load configuration")?;
    let _log_guard = telemetry::init(&config.log)?;
    info!(
        "Vigil starting (dry_run = {}, .env loaded = {})...",
        config.dry_run, dotenv_loaded
    );

    // reqwest 使用 rustls 且不自带加密后端
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("A rustls crypto provider was already installed");
    }

    // 2. 必填项与取值范围校验
    let missing = config.missing_required();
    if !missing.is_empty() {
        bail!("Missing required settings: {}", missing.join(", "));
    }
    let invalid = config.out_of_range();
    if !invalid.is_empty() {
        bail!("Settings out of range: {}", invalid.join(", "));
    }

    let clock = MarketClock::with_zone_name(Arc::new(RealTimeProvider), &config.market.timezone)
        .map_err(anyhow::Error::msg)?;
    let session = MarketSession::new(config.market.cutoff_hour, config.market.cutoff_minute)
        .context("Invalid market cutoff time")?;

    // 3. 基础设施层
    let feed = Arc::new(KiteProvider::new(
        &config.broker.base_url,
        &config.broker.api_key,
        &config.broker.access_token,
        clock.tz(),
    )?);
    feed.test_connection()
        .await
        .context("Kite connection check failed")?;

    set_root_dir(PathBuf::from(&config.storage.data_dir));
    let store = Arc::new(SqliteAlertStore::new(clock.tz()).await?);

    let notifier: Arc<dyn Notifier> = if config.dry_run {
        Arc::new(DryRunNotifier::new(config.recipients()))
    } else {
        let email = EmailNotifier::new(
            &config.email.host,
            config.email.port,
            &config.email.user,
            &config.email.pass,
            &config.email.user,
            &config.recipients(),
        )?;
        email
            .test_connection()
            .await
            .context("SMTP connection check failed")?;
        Arc::new(email)
    };

    // 4. 引擎与监控循环
    let sink = Arc::new(AlertDispatcher::new(notifier, store));
    let processor = SymbolProcessor::new(feed, sink, clock.clone(), config.market.lookback_days);

    let symbols: Vec<WatchedSymbol> = config
        .market
        .symbols
        .iter()
        .map(|w| {
            WatchedSymbol::new(
                Instrument::new(&w.name, &w.token),
                Instrument::new(format!("{}_REF", w.name), &w.reference_token),
            )
        })
        .collect();

    // 5. 运行
    Monitor::new(processor, clock, session, symbols).run().await;
    info!("Vigil stopped");

    Ok(())
}
