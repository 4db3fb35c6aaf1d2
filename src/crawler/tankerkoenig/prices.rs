use std::collections::HashMap;

use anyhow::{anyhow, Result};
use concat_string::concat_string;
use serde::Deserialize;
use serde_json::Value;

use crate::{crawler::tankerkoenig::Envelope, declare::PriceQuote};

#[derive(Deserialize, Debug)]
pub struct PricesResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default)]
    prices: HashMap<String, PriceEntry>,
}

/// 沒有販售或沒有報價的油品會是 `false` 或直接缺少
#[derive(Deserialize, Debug)]
struct PriceEntry {
    #[serde(default)]
    status: String,
    #[serde(default)]
    e5: Value,
    #[serde(default)]
    e10: Value,
    #[serde(default)]
    diesel: Value,
}

impl From<PriceEntry> for PriceQuote {
    fn from(entry: PriceEntry) -> Self {
        PriceQuote {
            status: entry.status,
            e5: entry.e5.as_f64(),
            e10: entry.e10.as_f64(),
            diesel: entry.diesel.as_f64(),
        }
    }
}

/// 報價端點單次請求可查詢的站點數上限
pub const MAX_IDS_PER_REQUEST: usize = 10;

pub(super) fn exceeds_batch_limit(station_ids: &[String]) -> bool {
    station_ids.len() > MAX_IDS_PER_REQUEST
}

pub(super) fn build_url(base_url: &str, api_key: &str, station_ids: &[String]) -> String {
    let ids = station_ids
        .iter()
        .map(|id| urlencoding::encode(id).into_owned())
        .collect::<Vec<String>>()
        .join(",");

    concat_string!(
        base_url,
        "/json/prices.php?ids=",
        ids,
        "&apikey=",
        urlencoding::encode(api_key)
    )
}

pub(super) fn parse(res: PricesResponse) -> Result<HashMap<String, PriceQuote>> {
    if !res.envelope.is_ok() {
        return Err(anyhow!(
            "Error trying to access prices: {}",
            res.envelope.message()
        ));
    }

    Ok(res
        .prices
        .into_iter()
        .map(|(id, entry)| (id, PriceQuote::from(entry)))
        .collect())
}
