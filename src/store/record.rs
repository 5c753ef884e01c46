use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-URL statistics. A record exists only for URLs that have completed at
/// least one successful fetch; `count` always equals `successes + failures`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub url: String,
    pub count: u64,
    pub successes: u64,
    pub failures: u64,
    /// Latency of the most recent successful fetch. Failures leave it as-is.
    pub last_latency_ms: u64,
    /// Time of the most recent submission that touched this record.
    pub last_seen: DateTime<Utc>,
}

impl UrlRecord {
    pub fn new(url: String, latency_ms: u64, now: DateTime<Utc>) -> Self {
        Self {
            url,
            count: 1,
            successes: 1,
            failures: 0,
            last_latency_ms: latency_ms,
            last_seen: now,
        }
    }
}

/// Which ranking view a `top` query reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Descending submission count, ties broken by most-recent `last_seen`.
    Count,
    /// Descending `last_seen`, ties broken by higher count.
    Recency,
}

impl FromStr for OrderBy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "count" => Ok(OrderBy::Count),
            "recency" => Ok(OrderBy::Recency),
            other => Err(Error::InvalidArgument(format!(
                "unknown ordering {:?}, expected \"count\" or \"recency\"",
                other
            ))),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderBy::Count => write!(f, "count"),
            OrderBy::Recency => write!(f, "recency"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_parses_known_values() {
        assert_eq!("count".parse::<OrderBy>().unwrap(), OrderBy::Count);
        assert_eq!("recency".parse::<OrderBy>().unwrap(), OrderBy::Recency);
    }

    #[test]
    fn order_by_rejects_unknown_values() {
        assert!(matches!(
            "latest".parse::<OrderBy>(),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!("".parse::<OrderBy>(), Err(Error::InvalidArgument(_))));
    }
}
