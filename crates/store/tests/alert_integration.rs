use chrono::{TimeZone, Utc};
use tempfile::tempdir;
use vigil_core::signal::entity::{AlertRecord, AvwapAnchor, Pattern, Signal};
use vigil_core::store::port::AlertStore;
use vigil_store::alert::SqliteAlertStore;
use vigil_store::config::{alerts_db_path, get_root_dir, set_root_dir};

fn record(symbol: &str, signal: Signal, minute: u32) -> AlertRecord {
    let tz = ist_offset();
    let bar_time = Utc.with_ymd_and_hms(2024, 3, 5, 3, minute, 0).unwrap();
    AlertRecord {
        symbol: symbol.to_string(),
        signal,
        close: 101.0,
        avwap_value: 97.5,
        avwap_anchor: AvwapAnchor::PrevHigh,
        rs_value: 0.02,
        pattern: Pattern::GreenHammer,
        measure: 3.5 / 97.5,
        timestamp: bar_time.with_timezone(&tz),
        bar_time,
    }
}

fn ist_offset() -> chrono::FixedOffset {
    chrono::FixedOffset::east_opt(5 * 3600 + 1800).unwrap()
}

#[tokio::test]
async fn test_alert_journal_roundtrip() -> anyhow::Result<()> {
    // 1. 初始化临时测试环境
    let tmp_dir = tempdir()?;
    let db_path = tmp_dir.path().join("nested").join("alerts.db");
    let store = SqliteAlertStore::open(&db_path, chrono_tz::Asia::Kolkata).await?;
    assert!(db_path.exists());

    // 2. 追加三条告警
    store.append(&record("NIFTY", Signal::Buy, 45)).await?;
    store.append(&record("BANKNIFTY", Signal::Sell, 50)).await?;
    store.append(&record("NIFTY", Signal::Sell, 55)).await?;

    // 3. 倒序读取
    let recent = store.recent(2).await?;
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].symbol, "NIFTY");
    assert_eq!(recent[0].signal, Signal::Sell);
    assert_eq!(recent[1].symbol, "BANKNIFTY");

    let first = &store.recent(10).await?[2];
    assert_eq!(*first, record("NIFTY", Signal::Buy, 45));
    assert_eq!(first.timestamp.offset().local_minus_utc(), 19800);
    Ok(())
}

#[tokio::test]
async fn test_reopen_keeps_rows() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let db_path = tmp_dir.path().join("alerts.db");

    {
        let store = SqliteAlertStore::open(&db_path, chrono_tz::Asia::Kolkata).await?;
        store.append(&record("NIFTY", Signal::Buy, 45)).await?;
    }

    let store = SqliteAlertStore::open(&db_path, chrono_tz::Asia::Kolkata).await?;
    assert_eq!(store.recent(10).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_store_under_root_dir() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    set_root_dir(tmp_dir.path().to_path_buf());
    assert_eq!(get_root_dir(), tmp_dir.path());
    assert_eq!(alerts_db_path(), tmp_dir.path().join("alerts.db"));

    let store = SqliteAlertStore::new(chrono_tz::Asia::Kolkata).await?;
    assert!(store.recent(5).await?.is_empty());
    assert!(alerts_db_path().exists());
    Ok(())
}

/// # Summary
/// 告警时间在流水中以市场时区的 `YYYY-MM-DD HH:MM:SS` 保存，读回后仍为同一时刻。
#[tokio::test]
async fn test_timestamp_column_uses_market_local_format() -> anyhow::Result<()> {
    let tmp_dir = tempdir()?;
    let db_path = tmp_dir.path().join("alerts.db");
    let store = SqliteAlertStore::open(&db_path, chrono_tz::Asia::Kolkata).await?;

    // 以 UTC 偏移传入，落盘时仍按 IST 渲染
    let mut alert = record("NIFTY", Signal::Buy, 45);
    alert.timestamp = alert.bar_time.fixed_offset();
    store.append(&alert).await?;

    let pool = sqlx::SqlitePool::connect(&format!("sqlite://{}", db_path.display())).await?;
    let (raw,): (String,) = sqlx::query_as("SELECT timestamp_ist FROM alerts")
        .fetch_one(&pool)
        .await?;
    assert_eq!(raw, "2024-03-05 09:15:00");

    let stored = &store.recent(1).await?[0];
    assert_eq!(stored.timestamp, alert.timestamp);
    assert_eq!(stored.timestamp.offset().local_minus_utc(), 19800);
    Ok(())
}
