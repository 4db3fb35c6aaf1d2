use std::collections::{HashMap, HashSet};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

use crate::{
    config::{App, Tracker},
    crawler::{tankerkoenig::Tankerkoenig, FuelPriceSource},
    declare::{PriceQuote, Station},
    history::{self, store, Snapshot},
    logging,
    util::datetime,
};

/// 以目前設定向 Tankerkönig 抓一次油價
pub async fn execute(app: &App) -> Result<()> {
    let source = Tankerkoenig::new(&app.tankerkoenig);
    fetch_prices(&source, &app.tracker, datetime::now_in_seconds()).await;

    Ok(())
}

/// 執行一次完整的抓取：清單、報價、合併、寫入歷史
///
/// 任何失敗都只記錄下來，不往外拋；失敗時不會動到既有的歷史檔。
pub async fn fetch_prices<S>(source: &S, tracker: &Tracker, now: DateTime<Utc>)
where
    S: FuelPriceSource + ?Sized,
{
    let path = tracker.history_path();

    match snapshot_and_persist(source, tracker, now).await {
        Ok(count) => {
            let msg = format!(
                "Successfully fetched prices of {} stations at {} and saved in {}.",
                count,
                datetime::to_iso8601(&now),
                path.display()
            );
            logging::info_file_async(msg.clone());
            logging::info_console(msg);
        }
        Err(why) => {
            let msg = format!("Failed to fetch prices because {:#}", why);
            logging::error_file_async(msg.clone());
            logging::error_console(msg);
        }
    }
}

async fn snapshot_and_persist<S>(source: &S, tracker: &Tracker, now: DateTime<Utc>) -> Result<usize>
where
    S: FuelPriceSource + ?Sized,
{
    let snapshot = snapshot(source, tracker, now).await?;
    let count = snapshot.stations.len();
    let path = tracker.history_path();

    let mut history = store::load(&path);
    history.push(snapshot);
    let history = history::retain_recent(history, now, tracker.retention());

    store::save(&path, &history)?;

    Ok(count)
}

/// 取得站點與報價並合併成一筆快照，不寫入任何檔案
pub async fn snapshot<S>(source: &S, tracker: &Tracker, now: DateTime<Utc>) -> Result<Snapshot>
where
    S: FuelPriceSource + ?Sized,
{
    let mut stations = source
        .list_stations(tracker)
        .await
        .context("Failed to list stations")?;

    let mut seen = HashSet::with_capacity(stations.len());
    stations.retain(|station| seen.insert(station.id.clone()));

    if stations.is_empty() {
        return Err(anyhow!("No stations found in area"));
    }

    logging::info_console(format!("{} stations found in area.", stations.len()));

    let station_ids: Vec<String> = stations.iter().map(|s| s.id.clone()).collect();
    let prices = source
        .fetch_prices(&station_ids)
        .await
        .context("Failed to fetch prices")?;

    logging::debug_file_async(format!(
        "Received {} price quotes for {} stations",
        prices.len(),
        station_ids.len()
    ));

    merge(&mut stations, &prices);

    Ok(Snapshot::new(now, stations))
}

/// 把報價寫進對應的站點；沒有報價的站點維持原樣，多出來的報價忽略
pub fn merge(stations: &mut [Station], prices: &HashMap<String, PriceQuote>) {
    for station in stations.iter_mut() {
        if let Some(quote) = prices.get(&station.id) {
            station.apply_price(quote);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use chrono::{TimeDelta, TimeZone};

    use super::*;
    use crate::{config, util::http};

    struct FakeSource {
        stations: Result<Vec<Station>, String>,
        prices: Result<HashMap<String, PriceQuote>, String>,
        price_calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(
            stations: Result<Vec<Station>, String>,
            prices: Result<HashMap<String, PriceQuote>, String>,
        ) -> Self {
            FakeSource {
                stations,
                prices,
                price_calls: AtomicUsize::new(0),
            }
        }

        fn ok() -> Self {
            Self::new(Ok(stations()), Ok(prices()))
        }
    }

    #[async_trait]
    impl FuelPriceSource for FakeSource {
        async fn list_stations(&self, _tracker: &Tracker) -> Result<Vec<Station>> {
            self.stations.clone().map_err(|why| anyhow!(why))
        }

        async fn fetch_prices(&self, _station_ids: &[String]) -> Result<HashMap<String, PriceQuote>> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            self.prices.clone().map_err(|why| anyhow!(why))
        }
    }

    fn stations() -> Vec<Station> {
        ["a", "b", "a"]
            .iter()
            .map(|id| {
                let mut station = Station::new(id.to_string());
                station.name = format!("Station {}", id);
                station.brand = "ARAL".to_string();
                station
            })
            .collect()
    }

    fn prices() -> HashMap<String, PriceQuote> {
        HashMap::from([
            (
                "a".to_string(),
                PriceQuote {
                    status: "open".to_string(),
                    e5: Some(1.829),
                    e10: Some(1.769),
                    diesel: Some(1.659),
                },
            ),
            (
                "unknown".to_string(),
                PriceQuote {
                    status: "open".to_string(),
                    e5: Some(1.0),
                    ..Default::default()
                },
            ),
        ])
    }

    fn tracker(dir: &tempfile::TempDir) -> Tracker {
        Tracker {
            output_dir: dir.path().join("data").to_string_lossy().to_string(),
            ..Default::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_merge() {
        let mut stations = stations();
        stations.truncate(2);
        merge(&mut stations, &prices());

        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].is_open, Some(true));
        assert_eq!(stations[0].e5, Some(1.829));
        assert_eq!(stations[0].name, "Station a");

        assert_eq!(stations[1].name, "Station b");
        assert_eq!(stations[1].brand, "ARAL");
        assert_eq!(stations[1].status, None);
        assert_eq!(stations[1].is_open, None);
        assert_eq!(stations[1].e5, None);
    }

    #[tokio::test]
    async fn test_snapshot_dedupes_stations() {
        let source = FakeSource::ok();
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot(&source, &tracker(&dir), now()).await.unwrap();

        let ids: Vec<&str> = snapshot.stations.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.timestamp, now());
    }

    #[tokio::test]
    async fn test_first_run_writes_one_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);

        fetch_prices(&FakeSource::ok(), &tracker, now()).await;

        let history = store::load(&tracker.history_path());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, now());
        assert_eq!(history[0].stations.len(), 2);
    }

    #[tokio::test]
    async fn test_appends_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let old = Snapshot::new(now() - TimeDelta::days(14), vec![]);
        let recent = Snapshot::new(now() - TimeDelta::days(14) + TimeDelta::seconds(1), vec![]);
        store::save(&tracker.history_path(), &[old, recent.clone()]).unwrap();

        fetch_prices(&FakeSource::ok(), &tracker, now()).await;

        let history = store::load(&tracker.history_path());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], recent);
        assert_eq!(history[1].timestamp, now());
    }

    #[tokio::test]
    async fn test_no_stations_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let source = FakeSource::new(Ok(vec![]), Ok(prices()));

        fetch_prices(&source, &tracker, now()).await;

        assert!(!tracker.history_path().exists());
        assert_eq!(source.price_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_list_error_skips_prices() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let source = FakeSource::new(
            Err("Error or no stations found: apikey nicht angegeben".to_string()),
            Ok(prices()),
        );

        let why = snapshot(&source, &tracker, now()).await.unwrap_err();
        assert!(format!("{:#}", why).contains("apikey nicht angegeben"));
        assert_eq!(source.price_calls.load(Ordering::SeqCst), 0);

        fetch_prices(&source, &tracker, now()).await;
        assert!(!tracker.history_path().exists());
    }

    #[tokio::test]
    async fn test_upstream_server_error_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let addr = http::spawn_status_server("500 Internal Server Error").await;
        let source = Tankerkoenig::new(&config::Tankerkoenig {
            api_key: "secret".to_string(),
            base_url: format!("http://{}/", addr),
        });

        let why = source.list_stations(&tracker).await.unwrap_err().to_string();
        assert!(why.contains("apikey=***"));
        assert!(!why.contains("secret"));

        fetch_prices(&source, &tracker, now()).await;
        assert!(!tracker.history_path().exists());
    }

    #[tokio::test]
    async fn test_price_error_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        let prior = vec![Snapshot::new(now() - TimeDelta::hours(1), stations())];
        store::save(&tracker.history_path(), &prior).unwrap();
        let before = fs::read(tracker.history_path()).unwrap();

        let source = FakeSource::new(
            Ok(stations()),
            Err("Failed to send request: connection refused".to_string()),
        );
        fetch_prices(&source, &tracker, now()).await;

        assert_eq!(source.price_calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read(tracker.history_path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_corrupt_history_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = tracker(&dir);
        fs::create_dir_all(&tracker.output_dir).unwrap();
        fs::write(tracker.history_path(), "[{ not json").unwrap();

        fetch_prices(&FakeSource::ok(), &tracker, now()).await;

        let history = store::load(&tracker.history_path());
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].timestamp, now());
    }
}
