use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::ops::Sub;

pub fn now() -> Timestamp {
    Timestamp(chrono::Utc::now())
}

/// A UTC timestamp stored as an RFC 3339 string, so that `ORDER BY` on the
/// stored value is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(chrono::DateTime<chrono::Utc>);

impl Timestamp {
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        now()
    }
}

impl From<chrono::DateTime<chrono::Utc>> for Timestamp {
    fn from(datetime: chrono::DateTime<chrono::Utc>) -> Self {
        Self(datetime)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.to_rfc3339().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        chrono::DateTime::parse_from_rfc3339(&s)
            .map(|dt| Self(dt.into()))
            .map_err(serde::de::Error::custom)
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0 - rhs.0
    }
}
