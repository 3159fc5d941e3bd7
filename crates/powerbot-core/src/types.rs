use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical identity id. Stable 64-bit integer, matches the source's
/// auto-increment primary key rather than a UUID — the link graph
/// (IdLinkMap) is keyed by this integer and small integers keep the
/// merge/split SQL readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(v: i64) -> Self {
        Self(v)
    }
}

/// The external platforms a PlatformProfile can live on. `Other` covers
/// platforms onboarded later without a schema migration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Discord,
    Youtube,
    Other(String),
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Discord => write!(f, "discord"),
            Platform::Youtube => write!(f, "youtube"),
            Platform::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "discord" => Platform::Discord,
            "youtube" => Platform::Youtube,
            other => Platform::Other(other.to_string()),
        })
    }
}

/// Round to 2 decimal places, half-to-even, matching the source's
/// `_round_amount`. Every economy write path runs balances through this
/// before storing or comparing them.
pub fn round_half_even(amount: f64) -> f64 {
    let scaled = amount * 100.0;
    let floor = scaled.floor();
    let diff = scaled - floor;
    let rounded = if (diff - 0.5).abs() < f64::EPSILON {
        if (floor as i64) % 2 == 0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / 100.0
}

/// Current UTC instant as an RFC3339 string, the timestamp format used
/// across every table in the data model.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_half_even(10.005), 10.0);
        assert_eq!(round_half_even(10.015), 10.02);
        assert_eq!(round_half_even(1.0), 1.0);
    }

    #[test]
    fn platform_round_trips_through_display() {
        let p: Platform = "discord".parse().unwrap();
        assert_eq!(p.to_string(), "discord");
        let other: Platform = "twitch".parse().unwrap();
        assert_eq!(other.to_string(), "twitch");
    }
}
