//! Badge system
//!
//! Definitions, the condition-dispatch registry, unlock sweeps, and
//! progress reporting for locked badges.

pub mod catalog;
pub mod conditions;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use catalog::{default_badges, load_badges};
pub use conditions::{BadgeContext, BadgeProgress, ConditionEvaluator, ConditionRegistry};

/// A badge definition. `condition_type` selects an evaluator from the
/// registry; `condition_params` is that evaluator's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub code: String,
    pub name: String,
    pub description: String,
    pub condition_type: String,
    #[serde(default)]
    pub condition_params: serde_json::Value,
    pub xp_reward: i64,
    /// Hidden from locked-badge listings until unlocked
    #[serde(default)]
    pub secret: bool,
}

/// An unlocked badge row. The (user, badge) pair is unique: a badge
/// unlocks at most once per user, enforced by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBadge {
    pub user_id: crate::types::UserId,
    pub code: String,
    pub unlocked_at: DateTime<Utc>,
    /// Showcased on the user's profile
    #[serde(default)]
    pub pinned: bool,
}

/// Evaluate every badge the user does not own yet and return the ones
/// whose condition is satisfied. The caller performs the actual unlock
/// through the store's uniqueness guard and grants `xp_reward`.
pub fn check_all_badges<'a>(
    registry: &ConditionRegistry,
    catalog: &'a [Badge],
    ctx: &BadgeContext<'_>,
    owned: &HashSet<String>,
) -> Vec<&'a Badge> {
    catalog
        .iter()
        .filter(|badge| !owned.contains(&badge.code))
        .filter(|badge| registry.evaluate(&badge.condition_type, ctx, &badge.condition_params))
        .collect()
}

/// Progress toward one locked badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeProgressReport {
    pub code: String,
    pub name: String,
    pub secret: bool,
    pub current: u64,
    pub target: u64,
}

/// `current/target` ratios for every locked, non-secret badge whose
/// condition type supports progress reporting.
pub fn badge_progress(
    registry: &ConditionRegistry,
    catalog: &[Badge],
    ctx: &BadgeContext<'_>,
    owned: &HashSet<String>,
) -> Vec<BadgeProgressReport> {
    catalog
        .iter()
        .filter(|badge| !owned.contains(&badge.code) && !badge.secret)
        .filter_map(|badge| {
            registry
                .progress(&badge.condition_type, ctx, &badge.condition_params)
                .map(|p| BadgeProgressReport {
                    code: badge.code.clone(),
                    name: badge.name.clone(),
                    secret: badge.secret,
                    current: p.current,
                    target: p.target,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryQuery;
    use crate::types::{UserId, UserProgression};
    use chrono::NaiveDate;

    struct EmptyHistory;

    impl HistoryQuery for EmptyHistory {
        fn completion_count(&self, _: UserId, _: Option<&str>) -> u64 {
            0
        }
        fn completions_in_hours(&self, _: UserId, _: u32, _: u32) -> u64 {
            0
        }
        fn combat_wins(&self, _: UserId) -> u64 {
            0
        }
        fn friend_count(&self, _: UserId) -> u64 {
            0
        }
        fn streak_breaks(&self, _: UserId) -> u64 {
            0
        }
        fn comebacks(&self, _: UserId) -> u64 {
            0
        }
    }

    #[test]
    fn test_owned_badges_skipped() {
        let registry = ConditionRegistry::with_defaults();
        let catalog = default_badges();
        let mut prog = UserProgression::new(UserId(1));
        prog.current_streak = 7;
        let history = EmptyHistory;
        let ctx = BadgeContext {
            progression: &prog,
            history: &history,
            today: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        };

        let unlocked = check_all_badges(&registry, &catalog, &ctx, &HashSet::new());
        assert!(unlocked.iter().any(|b| b.code == "streak_7"));

        let owned: HashSet<String> = unlocked.iter().map(|b| b.code.clone()).collect();
        let again = check_all_badges(&registry, &catalog, &ctx, &owned);
        assert!(again.is_empty());
    }

    #[test]
    fn test_progress_excludes_secret_badges() {
        let registry = ConditionRegistry::with_defaults();
        let catalog = default_badges();
        let prog = UserProgression::new(UserId(1));
        let history = EmptyHistory;
        let ctx = BadgeContext {
            progression: &prog,
            history: &history,
            today: NaiveDate::from_ymd_opt(2026, 8, 6).unwrap(),
        };
        let reports = badge_progress(&registry, &catalog, &ctx, &HashSet::new());
        assert!(!reports.is_empty());
        assert!(reports.iter().all(|r| !r.secret));
    }
}
