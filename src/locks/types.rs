//! Lock information structures.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// State of the lock row as seen by an operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockInfo {
    /// The lock table name.
    pub table: String,

    /// Whether the native lock is set.
    pub locked: bool,

    /// The recorded holder, if locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// When the lease was last stamped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub granted_at: Option<DateTime<Utc>>,

    /// Milliseconds since the last stamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_millis: Option<i64>,

    /// Whether the lock is held on a lease older than the staleness threshold.
    pub is_stale: bool,
}

impl LockInfo {
    /// Format the time since the last stamp as a human-readable string.
    pub fn age_string(&self) -> String {
        let Some(millis) = self.idle_millis else {
            return "never".to_string();
        };
        let minutes = millis / 60_000;
        let hours = minutes / 60;
        let days = hours / 24;

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else if minutes > 0 {
            format!("{}m", minutes)
        } else {
            format!("{}s", millis.max(0) / 1000)
        }
    }
}

impl std::fmt::Display for LockInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.locked {
            write!(
                f,
                "{} (locked by {}, last refreshed {} ago{})",
                self.table,
                self.owner.as_deref().unwrap_or("unknown"),
                self.age_string(),
                if self.is_stale { ", STALE" } else { "" }
            )
        } else {
            write!(f, "{} (unlocked)", self.table)
        }
    }
}
