use std::{
    env,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Result};
use chrono::TimeDelta;
use config::{Config as config_config, File as config_file};
use serde::{Deserialize, Serialize};

use crate::{declare::FuelType, logging};

const CONFIG_PATH: &str = "app.json";

/// 價格歷史檔的檔名，存放在 `tracker.output_dir` 之下
pub const HISTORY_FILE_NAME: &str = "prices.json";

/// Tankerkönig 允許的最大搜尋半徑 (km)
pub const MAX_RADIUS_KM: f64 = 25.0;

/// 歷史資料最多保留的天數
pub const MAX_RETENTION_DAYS: i64 = 3650;

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct App {
    pub tankerkoenig: Tankerkoenig,
    pub tracker: Tracker,
    pub system: System,
}

const TANKERKOENIG_API_KEY: &str = "TANKERKOENIG_API_KEY";
const DEFAULT_BASE_URL: &str = "https://creativecommons.tankerkoenig.de";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Tankerkoenig {
    pub api_key: String,
    /// 含 scheme 的 API 位址，結尾不加 `/`
    pub base_url: String,
}

impl Default for Tankerkoenig {
    fn default() -> Self {
        Tankerkoenig {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

const FUEL_LAT: &str = "FUEL_LAT";
const FUEL_LNG: &str = "FUEL_LNG";
const FUEL_RADIUS: &str = "FUEL_RADIUS";
const FUEL_TYPE: &str = "FUEL_TYPE";
const FUEL_OUTPUT_DIR: &str = "FUEL_OUTPUT_DIR";
const FUEL_RETENTION_DAYS: &str = "FUEL_RETENTION_DAYS";

/// 要追蹤的區域與輸出位置
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Tracker {
    pub lat: f64,
    pub lng: f64,
    /// 搜尋半徑 (km)
    pub radius: f64,
    pub fuel_type: FuelType,
    pub output_dir: String,
    /// 歷史資料保留天數
    pub retention_days: i64,
}

impl Default for Tracker {
    fn default() -> Self {
        Tracker {
            lat: 51.3552,
            lng: 11.9961,
            radius: 5.0,
            fuel_type: FuelType::All,
            output_dir: "data".to_string(),
            retention_days: 14,
        }
    }
}

impl Tracker {
    pub fn history_path(&self) -> PathBuf {
        Path::new(&self.output_dir).join(HISTORY_FILE_NAME)
    }

    pub fn retention(&self) -> TimeDelta {
        TimeDelta::try_days(self.retention_days).unwrap_or(TimeDelta::days(14))
    }
}

const FUEL_SCHEDULE: &str = "FUEL_SCHEDULE";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct System {
    /// cron 表示式 (秒 分 時 日 月 週，UTC)；空字串表示只執行一次
    pub schedule: String,
}

impl App {
    /// 讀取 app.json (若存在) 並以環境變數覆蓋，最後檢查設定值
    pub fn get() -> Result<Self> {
        Self::load(Path::new(CONFIG_PATH), |key| env::var(key).ok())
    }

    fn load(config_path: &Path, var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let app = if config_path.exists() {
            config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize::<App>()?
        } else {
            App::default()
        };

        let app = app.override_with(var);
        app.validate()?;

        Ok(app)
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(api_key) = var(TANKERKOENIG_API_KEY) {
            self.tankerkoenig.api_key = api_key.trim().to_string();
        }

        if let Some(lat) = parse_var(&var, FUEL_LAT) {
            self.tracker.lat = lat;
        }

        if let Some(lng) = parse_var(&var, FUEL_LNG) {
            self.tracker.lng = lng;
        }

        if let Some(radius) = parse_var(&var, FUEL_RADIUS) {
            self.tracker.radius = radius;
        }

        if let Some(fuel_type) = parse_var(&var, FUEL_TYPE) {
            self.tracker.fuel_type = fuel_type;
        }

        if let Some(output_dir) = var(FUEL_OUTPUT_DIR) {
            self.tracker.output_dir = output_dir;
        }

        if let Some(days) = parse_var(&var, FUEL_RETENTION_DAYS) {
            self.tracker.retention_days = days;
        }

        if let Some(schedule) = var(FUEL_SCHEDULE) {
            self.system.schedule = schedule.trim().to_string();
        }

        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.tankerkoenig.api_key.is_empty() {
            return Err(anyhow!("{} not set", TANKERKOENIG_API_KEY));
        }

        let tracker = &self.tracker;
        if !(-90.0..=90.0).contains(&tracker.lat) {
            return Err(anyhow!("Latitude {} is out of range", tracker.lat));
        }

        if !(-180.0..=180.0).contains(&tracker.lng) {
            return Err(anyhow!("Longitude {} is out of range", tracker.lng));
        }

        if tracker.radius <= 0.0 || tracker.radius > MAX_RADIUS_KM {
            return Err(anyhow!(
                "Radius {} km must be greater than 0 and at most {} km",
                tracker.radius,
                MAX_RADIUS_KM
            ));
        }

        if !(1..=MAX_RETENTION_DAYS).contains(&tracker.retention_days) {
            return Err(anyhow!(
                "Retention days must be between 1 and {}, got {}",
                MAX_RETENTION_DAYS,
                tracker.retention_days
            ));
        }

        if tracker.output_dir.trim().is_empty() {
            return Err(anyhow!("Output directory is empty"));
        }

        Ok(())
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            logging::warn_console(format!("Ignore {}={} because it can't be parsed", key, raw));
            None
        }
    }
}
