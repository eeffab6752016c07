//! Streak tracking
//!
//! Consecutive-day streak state machine with freeze protection and the
//! weekly/monthly freeze economy.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::types::UserProgression;

/// Multiplier grows 2% per streak day
const MULTIPLIER_STEP: f64 = 0.02;
/// Cap reached at a 50-day streak
const MULTIPLIER_CAP: f64 = 2.0;

/// Streak day counts that carry a badge
pub const STREAK_BADGE_THRESHOLDS: &[u32] = &[7, 14, 30, 60, 90, 180, 365];

/// Reward multiplier for a streak of `n` days: `min(2.0, 1.0 + 0.02n)`
pub fn streak_multiplier(n: u32) -> f64 {
    (1.0 + n as f64 * MULTIPLIER_STEP).min(MULTIPLIER_CAP)
}

/// Outcome of recording one day's activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakUpdate {
    /// Streak after the update
    pub streak: u32,
    /// Days since the previous activity (0 for the first ever / same day)
    pub gap_days: i64,
    /// The streak grew by one
    pub extended: bool,
    /// A freeze was consumed to bridge a missed day
    pub freeze_used: bool,
    /// The streak was broken and reset to 1
    pub streak_lost: bool,
    /// The weekly free freeze was granted by this activity
    pub free_freeze_granted: bool,
    /// Badge thresholds crossed by this update, ascending
    pub crossed_thresholds: Vec<u32>,
}

/// Advance the streak state machine for an activity on `date`.
///
/// Transitions, judged on the day gap to `last_activity_date`:
/// same day is a no-op; a 1-day gap extends; a 2-day gap with a freeze
/// (activated shield or inventory) consumes it and still extends;
/// anything else archives `best_streak` and resets to 1.
pub fn record_activity(prog: &mut UserProgression, date: NaiveDate) -> StreakUpdate {
    let mut update = StreakUpdate {
        streak: prog.current_streak,
        ..StreakUpdate::default()
    };

    // One free freeze on the first activity of each ISO week
    // (weeks begin Monday 00:00 UTC).
    let week = (date.iso_week().year(), date.iso_week().week());
    if prog.last_free_freeze_week != Some(week) {
        prog.last_free_freeze_week = Some(week);
        prog.freeze_available += 1;
        update.free_freeze_granted = true;
        log::debug!("{}: weekly free freeze granted", prog.user_id);
    }

    let previous = prog.current_streak;
    match prog.last_activity_date {
        None => {
            prog.current_streak = 1;
            update.extended = true;
        }
        Some(last) => {
            let gap = (date - last).num_days();
            update.gap_days = gap.max(0);
            if gap <= 0 {
                // Already counted today
                update.streak = prog.current_streak;
                return update;
            }
            if gap == 1 {
                prog.current_streak += 1;
                update.extended = true;
            } else if gap == 2 && shield_covers(prog, last) {
                prog.streak_frozen_until = None;
                prog.current_streak += 1;
                update.extended = true;
                update.freeze_used = true;
            } else if gap == 2 && prog.freeze_available > 0 {
                prog.freeze_available -= 1;
                prog.current_streak += 1;
                update.extended = true;
                update.freeze_used = true;
                log::debug!("{}: freeze consumed, streak preserved", prog.user_id);
            } else {
                prog.best_streak = prog.best_streak.max(prog.current_streak);
                prog.current_streak = 1;
                update.streak_lost = true;
                log::debug!("{}: streak lost after {} day gap", prog.user_id, gap);
            }
        }
    }

    prog.best_streak = prog.best_streak.max(prog.current_streak);
    prog.last_activity_date = Some(date);
    update.streak = prog.current_streak;

    if !update.streak_lost {
        update.crossed_thresholds = STREAK_BADGE_THRESHOLDS
            .iter()
            .copied()
            .filter(|&t| previous < t && prog.current_streak >= t)
            .collect();
    }

    update
}

/// An activated shield covers the gap if it extends past the last
/// activity day into the missed one.
fn shield_covers(prog: &UserProgression, last_activity: NaiveDate) -> bool {
    prog.streak_frozen_until
        .map(|until| until.date_naive() > last_activity)
        .unwrap_or(false)
}

/// Buy one freeze for coins. Capped per calendar month; rejected before
/// any mutation reaches the store.
pub fn purchase_freeze(
    prog: &mut UserProgression,
    now: DateTime<Utc>,
    cost: i64,
    monthly_cap: u32,
) -> EngineResult<()> {
    let month = now.format("%Y-%m").to_string();
    if prog.freeze_purchase_month.as_deref() != Some(month.as_str()) {
        prog.freeze_purchase_month = Some(month);
        prog.freezes_purchased_this_month = 0;
    }
    if prog.freezes_purchased_this_month >= monthly_cap {
        return Err(EngineError::Validation(
            "monthly freeze purchase cap reached".to_string(),
        ));
    }
    if prog.coins < cost {
        return Err(EngineError::Validation(format!(
            "not enough coins: have {}, a freeze costs {}",
            prog.coins, cost
        )));
    }
    prog.coins -= cost;
    prog.freezes_purchased_this_month += 1;
    prog.freeze_available += 1;
    Ok(())
}

/// Activate a freeze from inventory, shielding the streak through the
/// end of the next UTC day. Freezes cannot stack: activation while one
/// is active is rejected.
pub fn activate_freeze(
    prog: &mut UserProgression,
    now: DateTime<Utc>,
) -> EngineResult<DateTime<Utc>> {
    if let Some(until) = prog.streak_frozen_until {
        if until > now {
            return Err(EngineError::Validation(
                "a streak freeze is already active".to_string(),
            ));
        }
    }
    if prog.freeze_available == 0 {
        return Err(EngineError::Validation(
            "no streak freezes available".to_string(),
        ));
    }
    prog.freeze_available -= 1;
    let until = (now.date_naive() + Days::new(2))
        .and_time(NaiveTime::MIN)
        .and_utc();
    prog.streak_frozen_until = Some(until);
    Ok(until)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn user() -> UserProgression {
        UserProgression::new(UserId(1))
    }

    #[test]
    fn test_multiplier_endpoints() {
        assert_eq!(streak_multiplier(0), 1.0);
        assert_eq!(streak_multiplier(5), 1.1);
        assert_eq!(streak_multiplier(50), 2.0);
        assert_eq!(streak_multiplier(365), 2.0);
    }

    #[test]
    fn test_multiplier_monotonic() {
        let mut prev = streak_multiplier(0);
        for n in 1..100 {
            let m = streak_multiplier(n);
            assert!(m >= prev);
            prev = m;
        }
    }

    #[test]
    fn test_first_activity_starts_streak() {
        let mut prog = user();
        let update = record_activity(&mut prog, day(2026, 8, 3));
        assert_eq!(update.streak, 1);
        assert!(update.extended);
        assert!(update.free_freeze_granted);
        assert_eq!(prog.best_streak, 1);
    }

    #[test]
    fn test_same_day_is_noop() {
        let mut prog = user();
        record_activity(&mut prog, day(2026, 8, 3));
        let update = record_activity(&mut prog, day(2026, 8, 3));
        assert_eq!(update.streak, 1);
        assert!(!update.extended);
        assert!(!update.streak_lost);
    }

    #[test]
    fn test_consecutive_days_extend() {
        let mut prog = user();
        record_activity(&mut prog, day(2026, 8, 3));
        let update = record_activity(&mut prog, day(2026, 8, 4));
        assert_eq!(update.streak, 2);
        assert!(update.extended);
    }

    #[test]
    fn test_two_day_gap_consumes_freeze() {
        let mut prog = user();
        record_activity(&mut prog, day(2026, 8, 3));
        assert_eq!(prog.freeze_available, 1); // weekly grant
        let update = record_activity(&mut prog, day(2026, 8, 5));
        assert_eq!(update.streak, 2);
        assert!(update.freeze_used);
        assert_eq!(prog.freeze_available, 0);
    }

    #[test]
    fn test_two_day_gap_without_freeze_resets() {
        let mut prog = user();
        record_activity(&mut prog, day(2026, 8, 3));
        prog.freeze_available = 0;
        let update = record_activity(&mut prog, day(2026, 8, 5));
        assert!(update.streak_lost);
        assert_eq!(update.streak, 1);
        assert_eq!(prog.best_streak, 1);
    }

    #[test]
    fn test_long_gap_archives_best_streak() {
        let mut prog = user();
        for d in 3..=7 {
            record_activity(&mut prog, day(2026, 8, d));
        }
        assert_eq!(prog.current_streak, 5);
        let update = record_activity(&mut prog, day(2026, 8, 20));
        assert!(update.streak_lost);
        assert_eq!(prog.best_streak, 5);
        assert_eq!(prog.current_streak, 1);
    }

    #[test]
    fn test_activated_shield_bridges_gap_without_inventory() {
        let mut prog = user();
        record_activity(&mut prog, day(2026, 8, 3));
        let now = Utc.with_ymd_and_hms(2026, 8, 3, 20, 0, 0).unwrap();
        activate_freeze(&mut prog, now).unwrap();
        assert_eq!(prog.freeze_available, 0);
        // Miss the 4th entirely; the shield covers it
        let update = record_activity(&mut prog, day(2026, 8, 5));
        assert_eq!(update.streak, 2);
        assert!(update.freeze_used);
        assert!(prog.streak_frozen_until.is_none());
    }

    #[test]
    fn test_weekly_grant_once_per_week() {
        let mut prog = user();
        record_activity(&mut prog, day(2026, 8, 3)); // Monday
        let mid_week = record_activity(&mut prog, day(2026, 8, 5));
        assert!(!mid_week.free_freeze_granted);
        // Next Monday grants again
        prog.freeze_available = 0;
        for d in 6..=9 {
            record_activity(&mut prog, day(2026, 8, d));
        }
        let next_monday = record_activity(&mut prog, day(2026, 8, 10));
        assert!(next_monday.free_freeze_granted);
    }

    #[test]
    fn test_threshold_crossing_reported_once() {
        let mut prog = user();
        for d in 1..=7 {
            let update = record_activity(&mut prog, day(2026, 9, d));
            if d == 7 {
                assert_eq!(update.crossed_thresholds, vec![7]);
            } else {
                assert!(update.crossed_thresholds.is_empty());
            }
        }
        let after = record_activity(&mut prog, day(2026, 9, 8));
        assert!(after.crossed_thresholds.is_empty());
    }

    #[test]
    fn test_purchase_respects_coins_and_cap() {
        let mut prog = user();
        prog.coins = 120;
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        purchase_freeze(&mut prog, now, 50, 3).unwrap();
        purchase_freeze(&mut prog, now, 50, 3).unwrap();
        assert_eq!(prog.coins, 20);
        assert_eq!(prog.freeze_available, 2);
        // Third fails on coins
        let err = purchase_freeze(&mut prog, now, 50, 3).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_purchase_monthly_cap() {
        let mut prog = user();
        prog.coins = 1000;
        let aug = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        for _ in 0..3 {
            purchase_freeze(&mut prog, aug, 50, 3).unwrap();
        }
        assert!(purchase_freeze(&mut prog, aug, 50, 3).is_err());
        // Counter resets the next month
        let sep = Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap();
        purchase_freeze(&mut prog, sep, 50, 3).unwrap();
        assert_eq!(prog.freezes_purchased_this_month, 1);
    }

    #[test]
    fn test_activate_rejects_stacking() {
        let mut prog = user();
        prog.freeze_available = 2;
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        activate_freeze(&mut prog, now).unwrap();
        let err = activate_freeze(&mut prog, now).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(prog.freeze_available, 1);
    }

    #[test]
    fn test_activate_requires_inventory() {
        let mut prog = user();
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert!(activate_freeze(&mut prog, now).is_err());
    }
}
