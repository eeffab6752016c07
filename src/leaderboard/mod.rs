//! Leaderboard service
//!
//! Windowed ranking over a sorted-set-capable store, fed by every XP,
//! streak, and combat change. The rankings are a derived view: they are
//! updated best-effort after the authoritative write and can always be
//! rebuilt by replaying the ledger.

pub mod period;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{LeaderboardSnapshot, UserId};

pub use period::{ranking_key, Metric, Period};
pub use store::{MemoryRankingStore, RankingError, RankingStore};

/// One row of a ranking listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based rank
    pub rank: u64,
    pub user_id: UserId,
    pub score: i64,
}

/// Ranking reads and writes for one namespace
pub struct LeaderboardService {
    store: Arc<dyn RankingStore>,
    namespace: String,
    /// Last rank handed out per (key, user), for rank-change detection
    previous_ranks: RwLock<HashMap<(String, UserId), u64>>,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn RankingStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            previous_ranks: RwLock::new(HashMap::new()),
        }
    }

    fn key(&self, metric: Metric, period: Period, now: DateTime<Utc>) -> String {
        ranking_key(&self.namespace, metric, period, now)
    }

    /// Write one metric across all periods. Incremental metrics add the
    /// delta; the streak gauge replaces its score.
    fn write(&self, metric: Metric, user: UserId, value: i64, now: DateTime<Utc>) -> Result<(), RankingError> {
        for period in Period::ALL {
            let key = self.key(metric, period, now);
            if metric.is_incremental() {
                self.store.add_score(&key, user, value)?;
            } else {
                self.store.set_score(&key, user, value)?;
            }
            if let Some(ttl) = period.ttl() {
                self.store.expire_at(&key, now + ttl)?;
            }
        }
        Ok(())
    }

    /// Add an XP delta to every period's ranking
    pub fn record_xp(&self, user: UserId, delta: i64, now: DateTime<Utc>) -> Result<(), RankingError> {
        self.record(Metric::Xp, user, delta, now)
    }

    /// Replace the streak gauge in every period's ranking
    pub fn record_streak(&self, user: UserId, streak: u32, now: DateTime<Utc>) -> Result<(), RankingError> {
        self.record(Metric::Streak, user, streak as i64, now)
    }

    /// Count one combat win in every period's ranking
    pub fn record_combat_win(&self, user: UserId, now: DateTime<Utc>) -> Result<(), RankingError> {
        self.record(Metric::CombatWins, user, 1, now)
    }

    /// Generic write entry point (used by the specific helpers above)
    pub fn record(&self, metric: Metric, user: UserId, value: i64, now: DateTime<Utc>) -> Result<(), RankingError> {
        self.write(metric, user, value, now)
    }

    /// Top of the board, `limit` entries starting at `offset`
    pub fn top(
        &self,
        metric: Metric,
        period: Period,
        now: DateTime<Utc>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<RankedEntry>, RankingError> {
        let key = self.key(metric, period, now);
        let members = self.store.top(&key, offset, limit)?;
        Ok(members
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, score))| RankedEntry {
                rank: offset + i as u64 + 1,
                user_id,
                score,
            })
            .collect())
    }

    /// Ranking restricted to a caller-supplied friend set, re-sorted
    /// locally. Friends without a score are omitted.
    pub fn friends_view(
        &self,
        metric: Metric,
        period: Period,
        now: DateTime<Utc>,
        friends: &[UserId],
    ) -> Result<Vec<RankedEntry>, RankingError> {
        let key = self.key(metric, period, now);
        let mut scored = Vec::with_capacity(friends.len());
        for &friend in friends {
            if let Some(score) = self.store.score(&key, friend)? {
                scored.push((friend, score));
            }
        }
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(scored
            .into_iter()
            .enumerate()
            .map(|(i, (user_id, score))| RankedEntry {
                rank: i as u64 + 1,
                user_id,
                score,
            })
            .collect())
    }

    /// One user's rank, score, and the total participant count
    pub fn snapshot_for(
        &self,
        metric: Metric,
        period: Period,
        now: DateTime<Utc>,
        user: UserId,
    ) -> Result<Option<LeaderboardSnapshot>, RankingError> {
        let key = self.key(metric, period, now);
        let Some(rank) = self.store.rank(&key, user)? else {
            return Ok(None);
        };
        let Some(score) = self.store.score(&key, user)? else {
            return Ok(None);
        };
        Ok(Some(LeaderboardSnapshot {
            rank: rank + 1,
            score,
            total_participants: self.store.count(&key)?,
        }))
    }

    /// A window of `radius` ranks either side of the user
    pub fn around(
        &self,
        metric: Metric,
        period: Period,
        now: DateTime<Utc>,
        user: UserId,
        radius: u64,
    ) -> Result<Vec<RankedEntry>, RankingError> {
        let key = self.key(metric, period, now);
        let Some(rank) = self.store.rank(&key, user)? else {
            return Ok(Vec::new());
        };
        let start = rank.saturating_sub(radius);
        self.top(metric, period, now, start, radius * 2 + 1)
    }

    /// Rank movement since the last call for this user/board. Positive
    /// means the user climbed. First observation returns `None`.
    pub fn rank_change(
        &self,
        metric: Metric,
        period: Period,
        now: DateTime<Utc>,
        user: UserId,
    ) -> Result<Option<i64>, RankingError> {
        let key = self.key(metric, period, now);
        let Some(rank) = self.store.rank(&key, user)? else {
            return Ok(None);
        };
        let previous = self
            .previous_ranks
            .write()
            .insert((key, user), rank);
        Ok(previous.map(|p| p as i64 - rank as i64))
    }

    /// Drop expired dated keys; returns how many were removed
    pub fn sweep(&self, now: DateTime<Utc>) -> Result<u64, RankingError> {
        let dropped = self.store.sweep_expired(now)?;
        if dropped > 0 {
            log::debug!("leaderboard sweep removed {} expired keys", dropped);
        }
        Ok(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn service() -> LeaderboardService {
        LeaderboardService::new(Arc::new(MemoryRankingStore::new()), "hf")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_lone_participant_ranks_first() {
        let lb = service();
        lb.record_xp(UserId(1), 25, now()).unwrap();
        let snapshot = lb
            .snapshot_for(Metric::Xp, Period::AllTime, now(), UserId(1))
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.rank, 1);
        assert_eq!(snapshot.score, 25);
        assert_eq!(snapshot.total_participants, 1);
    }

    #[test]
    fn test_xp_accumulates_streak_replaces() {
        let lb = service();
        lb.record_xp(UserId(1), 10, now()).unwrap();
        lb.record_xp(UserId(1), 10, now()).unwrap();
        lb.record_streak(UserId(1), 9, now()).unwrap();
        lb.record_streak(UserId(1), 3, now()).unwrap();

        let xp = lb.snapshot_for(Metric::Xp, Period::Daily, now(), UserId(1)).unwrap().unwrap();
        assert_eq!(xp.score, 20);
        let streak = lb
            .snapshot_for(Metric::Streak, Period::Daily, now(), UserId(1))
            .unwrap()
            .unwrap();
        assert_eq!(streak.score, 3);
    }

    #[test]
    fn test_top_pagination() {
        let lb = service();
        for i in 1..=10 {
            lb.record_xp(UserId(i), (i * 100) as i64, now()).unwrap();
        }
        let page = lb.top(Metric::Xp, Period::Weekly, now(), 2, 3).unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].rank, 3);
        assert_eq!(page[0].user_id, UserId(8));
    }

    #[test]
    fn test_friends_view_scoped_and_sorted() {
        let lb = service();
        for i in 1..=6 {
            lb.record_xp(UserId(i), (i * 10) as i64, now()).unwrap();
        }
        let view = lb
            .friends_view(Metric::Xp, Period::AllTime, now(), &[UserId(2), UserId(5), UserId(99)])
            .unwrap();
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].user_id, UserId(5));
        assert_eq!(view[0].rank, 1);
        assert_eq!(view[1].user_id, UserId(2));
    }

    #[test]
    fn test_around_window() {
        let lb = service();
        for i in 1..=9 {
            lb.record_xp(UserId(i), (i * 10) as i64, now()).unwrap();
        }
        // User 5 sits at rank 5; a radius-1 window is ranks 4..=6
        let window = lb.around(Metric::Xp, Period::AllTime, now(), UserId(5), 1).unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].user_id, UserId(6));
        assert_eq!(window[1].user_id, UserId(5));
        assert_eq!(window[2].user_id, UserId(4));
    }

    #[test]
    fn test_rank_change_detection() {
        let lb = service();
        lb.record_xp(UserId(1), 100, now()).unwrap();
        lb.record_xp(UserId(2), 200, now()).unwrap();

        // First observation: nothing to diff against
        assert_eq!(lb.rank_change(Metric::Xp, Period::AllTime, now(), UserId(1)).unwrap(), None);
        // User 1 overtakes user 2
        lb.record_xp(UserId(1), 500, now()).unwrap();
        assert_eq!(
            lb.rank_change(Metric::Xp, Period::AllTime, now(), UserId(1)).unwrap(),
            Some(1)
        );
        // No further movement
        assert_eq!(
            lb.rank_change(Metric::Xp, Period::AllTime, now(), UserId(1)).unwrap(),
            Some(0)
        );
    }

    #[test]
    fn test_sweep_expires_dated_periods() {
        let lb = service();
        lb.record_xp(UserId(1), 10, now()).unwrap();
        // Three days later the daily key is gone, all-time remains
        let later = now() + chrono::Duration::days(3);
        let dropped = lb.sweep(later).unwrap();
        assert!(dropped >= 1);
        assert!(lb
            .snapshot_for(Metric::Xp, Period::AllTime, later, UserId(1))
            .unwrap()
            .is_some());
    }
}
