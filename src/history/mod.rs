use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{declare::Station, util::datetime};

/// 價格歷史檔的讀寫
pub mod store;

/// 某個時間點所有追蹤站點的價格
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Snapshot {
    #[serde(with = "datetime::timestamp")]
    pub timestamp: DateTime<Utc>,
    /// 舊版檔案的項目可能沒有這個欄位
    #[serde(default)]
    pub stations: Vec<Station>,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>, stations: Vec<Station>) -> Self {
        Snapshot {
            timestamp,
            stations,
        }
    }
}

/// 只保留時間晚於 `now - retention` 的快照，順序不變
///
/// 剛好落在邊界上的快照會被移除；`now - retention` 超出可表示的日期範圍時全部保留。
pub fn retain_recent(
    mut history: Vec<Snapshot>,
    now: DateTime<Utc>,
    retention: TimeDelta,
) -> Vec<Snapshot> {
    if let Some(cut_off) = now.checked_sub_signed(retention) {
        history.retain(|snapshot| snapshot.timestamp > cut_off);
    }

    history
}
