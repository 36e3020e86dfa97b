use chrono::{Duration as ChronoDuration, Utc};
use std::env;
use vigil_core::common::{Instrument, TimeFrame};
use vigil_core::market::port::MarketDataProvider;
use vigil_feed::kite::KiteProvider;

/// # Summary
/// Kite Connect 历史 K 线抓取的集成测试。
///
/// # Logic
/// 1. 加载 .env 环境变量并安装 rustls 加密后端。
/// 2. 初始化 KiteProvider 并校验连接。
/// 3. 抓取 NIFTY 50 过去 4 天的 5 分钟线。
/// 4. 断言返回成功且时间严格递增。
#[tokio::test]
#[ignore] // 需要有效的 access token，仅手动运行
async fn test_kite_real_fetch() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let api_key = env::var("VIGIL__BROKER__API_KEY")?;
    let access_token = env::var("VIGIL__BROKER__ACCESS_TOKEN")?;
    let provider = KiteProvider::new(
        "https://api.kite.trade",
        &api_key,
        &access_token,
        chrono_tz::Asia::Kolkata,
    )?;
    provider.test_connection().await?;

    let end = Utc::now();
    let start = end - ChronoDuration::days(4);
    let candles = provider
        .fetch_candles(
            &Instrument::new("NIFTY", "256265"),
            TimeFrame::Minute5,
            start,
            end,
        )
        .await?;

    println!("Successfully fetched {} candles for NIFTY", candles.len());
    assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
    Ok(())
}
