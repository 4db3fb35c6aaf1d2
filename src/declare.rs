use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// 查詢加油站時的油品篩選
#[derive(
    Serialize, Deserialize, Display, EnumString, AsRefStr, Debug, Default, Copy, Clone, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FuelType {
    /// 全部油品
    #[default]
    All,
    /// Super E5
    E5,
    /// Super E10
    E10,
    /// 柴油
    Diesel,
}

/// 加油站的營業狀態，來自報價 API 的 `status`
pub const STATUS_OPEN: &str = "open";

/// 加油站
///
/// 靜態欄位來自站點清單；`status`、`is_open` 與各油品價格只在報價回應中
/// 有這個站點時才會填入，沒有的欄位在 JSON 中直接省略。
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub house_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_code: Option<u32>,
    #[serde(default)]
    pub place: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
    /// 與查詢座標的距離 (km)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e10: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diesel: Option<f64>,
}

impl Station {
    pub fn new(id: String) -> Self {
        Station {
            id,
            ..Default::default()
        }
    }

    /// 將報價寫入站點，覆蓋原有的價格欄位
    pub fn apply_price(&mut self, quote: &PriceQuote) {
        self.is_open = Some(quote.status == STATUS_OPEN);
        self.status = Some(quote.status.clone());
        self.e5 = quote.e5;
        self.e10 = quote.e10;
        self.diesel = quote.diesel;
    }
}

/// 單一站點的即時報價
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PriceQuote {
    /// `open`、`closed` 或 `no prices`
    pub status: String,
    pub e5: Option<f64>,
    pub e10: Option<f64>,
    pub diesel: Option<f64>,
}
