use anyhow::{anyhow, Result};
use concat_string::concat_string;
use serde::Deserialize;
use serde_json::Value;

use crate::{config::Tracker, crawler::tankerkoenig::Envelope, declare::Station};

#[derive(Deserialize, Debug)]
pub struct ListResponse {
    #[serde(flatten)]
    envelope: Envelope,
    #[serde(default)]
    stations: Vec<ListedStation>,
}

/// 清單中的站點；`type=all` 時也會附帶價格，但這裡只取靜態資料
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListedStation {
    id: String,
    name: Option<String>,
    brand: Option<String>,
    street: Option<String>,
    house_number: Option<String>,
    #[serde(default)]
    post_code: Value,
    place: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    dist: Option<f64>,
}

impl From<ListedStation> for Station {
    fn from(listed: ListedStation) -> Self {
        Station {
            name: listed.name.unwrap_or_default(),
            brand: listed.brand.unwrap_or_default().trim().to_string(),
            street: listed.street.unwrap_or_default(),
            house_number: listed.house_number.unwrap_or_default().trim().to_string(),
            post_code: parse_post_code(&listed.post_code),
            place: listed.place.unwrap_or_default(),
            lat: listed.lat.unwrap_or_default(),
            lng: listed.lng.unwrap_or_default(),
            dist: listed.dist,
            ..Station::new(listed.id)
        }
    }
}

/// 郵遞區號通常是數字，少數站點會回傳字串
fn parse_post_code(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(super) fn build_url(base_url: &str, api_key: &str, tracker: &Tracker) -> String {
    concat_string!(
        base_url,
        "/json/list.php?lat=",
        tracker.lat.to_string(),
        "&lng=",
        tracker.lng.to_string(),
        "&rad=",
        tracker.radius.to_string(),
        "&sort=dist&type=",
        tracker.fuel_type.as_ref(),
        "&apikey=",
        urlencoding::encode(api_key)
    )
}

/// 檢查回應並取出站點
pub(super) fn parse(res: ListResponse) -> Result<Vec<Station>> {
    if !res.envelope.is_ok() || res.stations.is_empty() {
        return Err(anyhow!(
            "Error or no stations found: {}",
            res.envelope.message()
        ));
    }

    Ok(res.stations.into_iter().map(Station::from).collect())
}
