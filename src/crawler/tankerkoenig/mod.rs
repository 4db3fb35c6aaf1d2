//! # Tankerkönig 油價採集模組
//!
//! 透過 Tankerkönig 的開放 JSON API 取得德國加油站與即時油價。
//!
//! - 站點清單：`/json/list.php`，依座標與半徑搜尋
//! - 即時報價：`/json/prices.php`，一次查詢多個站點
//!
//! 報價端點每次最多接受 10 個站點 id，超過時上游會回傳錯誤。
//! 所有站點仍只送一次請求，站點過多時請縮小 `radius`。
//!
//! 兩個端點都以 `apikey` 參數驗證，回應中以 `ok` (或 `status`) 表示成功與否，
//! 失敗時附帶 `message`。

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config,
    crawler::FuelPriceSource,
    declare::{PriceQuote, Station},
    logging,
    util::http,
};

/// 站點清單
pub mod list;
/// 即時報價
pub mod prices;

const UNKNOWN_ERROR: &str = "unknown error";

/// Tankerkönig 採集器
pub struct Tankerkoenig {
    base_url: String,
    api_key: String,
}

impl Tankerkoenig {
    pub fn new(settings: &config::Tankerkoenig) -> Self {
        Tankerkoenig {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        }
    }
}

#[async_trait]
impl FuelPriceSource for Tankerkoenig {
    async fn list_stations(&self, tracker: &config::Tracker) -> Result<Vec<Station>> {
        let url = list::build_url(&self.base_url, &self.api_key, tracker);
        let res = http::get_json::<list::ListResponse>(&url).await?;
        list::parse(res)
    }

    async fn fetch_prices(&self, station_ids: &[String]) -> Result<HashMap<String, PriceQuote>> {
        if prices::exceeds_batch_limit(station_ids) {
            logging::warn_console(format!(
                "Requesting prices of {} stations, the prices endpoint accepts at most {}",
                station_ids.len(),
                prices::MAX_IDS_PER_REQUEST
            ));
        }

        let url = prices::build_url(&self.base_url, &self.api_key, station_ids);
        let res = http::get_json::<prices::PricesResponse>(&url).await?;
        prices::parse(res)
    }
}

/// 兩個端點共用的回應狀態欄位
#[derive(Deserialize, Debug, Default)]
pub(super) struct Envelope {
    #[serde(default)]
    ok: Value,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Envelope {
    /// `ok` 可能是布林值或字串；舊版端點只回傳 `status: "ok"`
    fn is_ok(&self) -> bool {
        let ok = match &self.ok {
            Value::Bool(ok) => *ok,
            Value::String(text) => text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("ok"),
            _ => false,
        };

        ok || self
            .status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case("ok"))
    }

    fn message(&self) -> &str {
        self.message.as_deref().unwrap_or(UNKNOWN_ERROR)
    }
}
