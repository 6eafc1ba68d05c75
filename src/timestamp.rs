//! Serde adapter and clock helpers for station timestamps.
//!
//! Timestamps are always UTC and are rendered as ISO-8601 with microsecond
//! precision and no offset suffix, e.g. `2024-01-01T00:00:00.000000`.

use crate::{Error, TIMESTAMP_FORMAT};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};
use tracing::warn;

pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&format(timestamp))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse(&text).map_err(de::Error::custom)
}

pub fn format(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses the canonical form, falling back to RFC 3339 with an explicit
/// offset which is then normalized to UTC.
pub fn parse(text: &str) -> Result<DateTime<Utc>, Error> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    match DateTime::parse_from_rfc3339(text) {
        Ok(timestamp) => Ok(timestamp.with_timezone(&Utc)),
        Err(err) => Err(Error::ValidationError(format!(
            "Could not parse timestamp \"{}\" ({}).",
            text, err
        ))),
    }
}

/// Current UTC time, never earlier than `previous`.
pub fn now_after(previous: &DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now < *previous {
        warn!(%now, %previous, "clock went backwards, keeping previous timestamp");
        return *previous;
    }
    now
}
