use std::ops::{Add, Deref, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// A date, time, and timezone. Serialized to rfc3339, stored as unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[schema(value_type = String, examples("2025-01-01T00:00:00Z"))]
pub struct Time(
    #[serde(
        serialize_with = "time::serde::rfc3339::serialize",
        deserialize_with = "time::serde::rfc3339::deserialize"
    )]
    OffsetDateTime,
);

impl Time {
    pub fn now_utc() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// unix seconds, as stored in the database
    pub fn unix(&self) -> i64 {
        self.0.unix_timestamp()
    }

    pub fn from_unix(secs: i64) -> Self {
        Self(
            OffsetDateTime::from_unix_timestamp(secs)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
        )
    }

    pub fn into_inner(self) -> OffsetDateTime {
        self.0
    }
}

impl Deref for Time {
    type Target = OffsetDateTime;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<OffsetDateTime> for Time {
    fn from(value: OffsetDateTime) -> Self {
        Self(value)
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0 - rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_round_trips() {
        let t = Time::now_utc();
        assert_eq!(Time::from_unix(t.unix()).unix(), t.unix());
    }

    #[test]
    fn ordering_follows_time() {
        let t = Time::now_utc();
        assert!(t + Duration::from_secs(1) > t);
        assert!(t - Duration::from_secs(1) < t);
    }

    #[test]
    fn schema_is_an_rfc3339_string() {
        use utoipa::PartialSchema;
        let schema = serde_json::to_value(Time::schema()).unwrap();
        assert_eq!(schema["type"], "string");
    }
}
