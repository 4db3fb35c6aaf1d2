use chrono::{DateTime, SecondsFormat, SubsecRound, TimeZone, Utc};

/// 取得目前的 UTC 時間，去掉秒以下的部分
///
/// 歷史檔的時間只記錄到秒，寫入後再讀回來才會得到相同的值。
pub fn now_in_seconds() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Formats a UTC time as an ISO-8601 string such as `2026-10-19T08:30:00Z`.
pub fn to_iso8601(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Converts epoch seconds (possibly fractional) to a UTC time.
pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }

    let whole = secs.floor();
    let nanos = ((secs - whole) * 1_000_000_000.0).round() as u32;

    Utc.timestamp_opt(whole as i64, nanos.min(999_999_999)).single()
}

/// 歷史檔 `timestamp` 欄位的序列化方式
///
/// 寫入一律使用 ISO-8601 字串；讀取時也接受舊版留下的 epoch 秒數。
pub mod timestamp {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Epoch(f64),
    }

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_iso8601(dt))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => DateTime::parse_from_rfc3339(&text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|why| de::Error::custom(format!("invalid timestamp '{}': {}", text, why))),
            Raw::Epoch(secs) => super::from_epoch_seconds(secs)
                .ok_or_else(|| de::Error::custom(format!("invalid epoch timestamp {}", secs))),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Stamped {
        #[serde(with = "timestamp")]
        at: DateTime<Utc>,
    }

    #[test]
    fn test_now_in_seconds() {
        assert_eq!(now_in_seconds().nanosecond(), 0);
    }

    #[test]
    fn test_serialize_iso8601() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        let json = serde_json::to_string(&Stamped { at }).unwrap();
        assert_eq!(json, r#"{"at":"2026-10-19T08:30:00Z"}"#);
    }

    #[test]
    fn test_deserialize_offset_and_epoch() {
        let expected = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();

        let with_offset: Stamped =
            serde_json::from_str(r#"{"at":"2026-10-19T10:30:00+02:00"}"#).unwrap();
        assert_eq!(with_offset.at, expected);

        let epoch: Stamped = serde_json::from_str(&format!(
            r#"{{"at":{}}}"#,
            expected.timestamp()
        ))
        .unwrap();
        assert_eq!(epoch.at, expected);

        let fractional: Stamped = serde_json::from_str(r#"{"at":1760862600.5}"#).unwrap();
        assert_eq!(fractional.at.timestamp(), 1_760_862_600);
        assert_eq!(fractional.at.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Stamped>(r#"{"at":"yesterday"}"#).is_err());
        assert!(serde_json::from_str::<Stamped>(r#"{"at":true}"#).is_err());
    }
}
