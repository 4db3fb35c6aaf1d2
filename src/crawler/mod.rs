use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    config::Tracker,
    declare::{PriceQuote, Station},
};

/// Tankerkönig 開放油價資料 (creativecommons.tankerkoenig.de)
pub mod tankerkoenig;

/// 加油站與油價的資料來源
#[async_trait]
pub trait FuelPriceSource: Send + Sync {
    /// 依照追蹤區域取得附近的加油站，只保留靜態資料
    async fn list_stations(&self, tracker: &Tracker) -> Result<Vec<Station>>;

    /// 一次取得多個加油站的即時報價，以站點代碼為鍵
    async fn fetch_prices(&self, station_ids: &[String]) -> Result<HashMap<String, PriceQuote>>;
}
