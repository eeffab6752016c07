//! Ranking metrics, periods, and key layout
//!
//! Keys follow `<namespace>:<metric>:<period>[:<suffix>]`, the layout
//! the external sorted-set store is organized around.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What is being ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Xp,
    Streak,
    CombatWins,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Xp => "xp",
            Metric::Streak => "streak",
            Metric::CombatWins => "combat_wins",
        }
    }

    /// XP and combat wins accumulate; streak is a point-in-time gauge
    /// whose score is replaced, not summed.
    pub fn is_incremental(&self) -> bool {
        !matches!(self, Metric::Streak)
    }
}

/// Ranking window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    AllTime,
}

impl Period {
    pub const ALL: [Period; 4] = [Period::Daily, Period::Weekly, Period::Monthly, Period::AllTime];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::AllTime => "alltime",
        }
    }

    /// Dated suffix for the period containing `now`; all-time has none
    pub fn suffix(&self, now: DateTime<Utc>) -> Option<String> {
        match self {
            Period::Daily => Some(now.format("%Y-%m-%d").to_string()),
            Period::Weekly => Some(now.format("%G-W%V").to_string()),
            Period::Monthly => Some(now.format("%Y-%m").to_string()),
            Period::AllTime => None,
        }
    }

    /// Key time-to-live, proportional to granularity; all-time keys
    /// never expire
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Period::Daily => Some(Duration::days(2)),
            Period::Weekly => Some(Duration::days(14)),
            Period::Monthly => Some(Duration::days(62)),
            Period::AllTime => None,
        }
    }
}

/// Build the ranking key for a metric/period at an instant
pub fn ranking_key(namespace: &str, metric: Metric, period: Period, now: DateTime<Utc>) -> String {
    match period.suffix(now) {
        Some(suffix) => format!("{}:{}:{}:{}", namespace, metric.as_str(), period.as_str(), suffix),
        None => format!("{}:{}:{}", namespace, metric.as_str(), period.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_key_layout() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(
            ranking_key("hf", Metric::Xp, Period::Daily, now),
            "hf:xp:daily:2026-08-06"
        );
        assert_eq!(
            ranking_key("hf", Metric::Streak, Period::Weekly, now),
            "hf:streak:weekly:2026-W32"
        );
        assert_eq!(
            ranking_key("hf", Metric::CombatWins, Period::Monthly, now),
            "hf:combat_wins:monthly:2026-08"
        );
        assert_eq!(
            ranking_key("hf", Metric::Xp, Period::AllTime, now),
            "hf:xp:alltime"
        );
    }

    #[test]
    fn test_iso_week_suffix_at_year_boundary() {
        // 2027-01-01 falls in ISO week 2026-W53
        let now = Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(Period::Weekly.suffix(now).unwrap(), "2026-W53");
    }

    #[test]
    fn test_ttls() {
        assert_eq!(Period::Daily.ttl(), Some(Duration::days(2)));
        assert_eq!(Period::Weekly.ttl(), Some(Duration::days(14)));
        assert!(Period::AllTime.ttl().is_none());
    }

    #[test]
    fn test_streak_is_absolute() {
        assert!(Metric::Xp.is_incremental());
        assert!(Metric::CombatWins.is_incremental());
        assert!(!Metric::Streak.is_incremental());
    }
}
