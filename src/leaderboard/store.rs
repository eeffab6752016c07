//! Sorted-set ranking store
//!
//! Trait over the external ranking backend (Redis-shaped: ZINCRBY,
//! ZADD, ZREVRANK, EXPIREAT) plus an in-memory reference
//! implementation. The store is a derived view, never the source of
//! truth; callers treat every failure as non-fatal.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::types::UserId;

/// The ranking backend failed
#[derive(Debug, Clone, Error)]
#[error("ranking store unavailable: {0}")]
pub struct RankingError(pub String);

/// Sorted-set operations over ranking keys. Ranks are 0-based and
/// descending by score (ties broken by user id, ascending).
pub trait RankingStore: Send + Sync {
    /// Add `delta` to the member's score, returning the new score
    fn add_score(&self, key: &str, user: UserId, delta: i64) -> Result<i64, RankingError>;

    /// Replace the member's score
    fn set_score(&self, key: &str, user: UserId, score: i64) -> Result<(), RankingError>;

    /// Schedule the whole key to expire at `when`
    fn expire_at(&self, key: &str, when: DateTime<Utc>) -> Result<(), RankingError>;

    fn score(&self, key: &str, user: UserId) -> Result<Option<i64>, RankingError>;

    fn rank(&self, key: &str, user: UserId) -> Result<Option<u64>, RankingError>;

    /// Number of members under the key
    fn count(&self, key: &str) -> Result<u64, RankingError>;

    /// Members ordered best-first, starting at `offset`
    fn top(&self, key: &str, offset: u64, limit: u64) -> Result<Vec<(UserId, i64)>, RankingError>;

    /// Drop every key whose expiry has passed, returning how many
    fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, RankingError>;
}

#[derive(Debug, Default)]
struct SortedSet {
    scores: HashMap<UserId, i64>,
    expires_at: Option<DateTime<Utc>>,
}

impl SortedSet {
    /// Members sorted descending by score, user id ascending on ties
    fn ordered(&self) -> Vec<(UserId, i64)> {
        let mut members: Vec<_> = self.scores.iter().map(|(&u, &s)| (u, s)).collect();
        members.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        members
    }
}

/// In-memory reference implementation of [`RankingStore`]
#[derive(Default)]
pub struct MemoryRankingStore {
    sets: RwLock<HashMap<String, SortedSet>>,
}

impl MemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingStore for MemoryRankingStore {
    fn add_score(&self, key: &str, user: UserId, delta: i64) -> Result<i64, RankingError> {
        let mut sets = self.sets.write();
        let entry = sets.entry(key.to_string()).or_default();
        let score = entry.scores.entry(user).or_insert(0);
        *score += delta;
        Ok(*score)
    }

    fn set_score(&self, key: &str, user: UserId, score: i64) -> Result<(), RankingError> {
        let mut sets = self.sets.write();
        sets.entry(key.to_string()).or_default().scores.insert(user, score);
        Ok(())
    }

    fn expire_at(&self, key: &str, when: DateTime<Utc>) -> Result<(), RankingError> {
        let mut sets = self.sets.write();
        if let Some(set) = sets.get_mut(key) {
            set.expires_at = Some(when);
        }
        Ok(())
    }

    fn score(&self, key: &str, user: UserId) -> Result<Option<i64>, RankingError> {
        Ok(self.sets.read().get(key).and_then(|s| s.scores.get(&user).copied()))
    }

    fn rank(&self, key: &str, user: UserId) -> Result<Option<u64>, RankingError> {
        Ok(self.sets.read().get(key).and_then(|set| {
            set.ordered()
                .iter()
                .position(|&(u, _)| u == user)
                .map(|p| p as u64)
        }))
    }

    fn count(&self, key: &str) -> Result<u64, RankingError> {
        Ok(self.sets.read().get(key).map(|s| s.scores.len() as u64).unwrap_or(0))
    }

    fn top(&self, key: &str, offset: u64, limit: u64) -> Result<Vec<(UserId, i64)>, RankingError> {
        Ok(self
            .sets
            .read()
            .get(key)
            .map(|set| {
                set.ordered()
                    .into_iter()
                    .skip(offset as usize)
                    .take(limit as usize)
                    .collect()
            })
            .unwrap_or_default())
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> Result<u64, RankingError> {
        let mut sets = self.sets.write();
        let before = sets.len();
        sets.retain(|_, set| set.expires_at.map(|at| at > now).unwrap_or(true));
        Ok((before - sets.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_add_and_rank_descending() {
        let store = MemoryRankingStore::new();
        store.add_score("k", UserId(1), 100).unwrap();
        store.add_score("k", UserId(2), 300).unwrap();
        store.add_score("k", UserId(3), 200).unwrap();

        assert_eq!(store.rank("k", UserId(2)).unwrap(), Some(0));
        assert_eq!(store.rank("k", UserId(3)).unwrap(), Some(1));
        assert_eq!(store.rank("k", UserId(1)).unwrap(), Some(2));
        assert_eq!(store.count("k").unwrap(), 3);
    }

    #[test]
    fn test_add_accumulates_set_replaces() {
        let store = MemoryRankingStore::new();
        store.add_score("k", UserId(1), 10).unwrap();
        let total = store.add_score("k", UserId(1), 5).unwrap();
        assert_eq!(total, 15);

        store.set_score("k", UserId(1), 3).unwrap();
        assert_eq!(store.score("k", UserId(1)).unwrap(), Some(3));
    }

    #[test]
    fn test_top_with_offset() {
        let store = MemoryRankingStore::new();
        for i in 1..=5 {
            store.add_score("k", UserId(i), (i * 10) as i64).unwrap();
        }
        let page = store.top("k", 1, 2).unwrap();
        assert_eq!(page, vec![(UserId(4), 40), (UserId(3), 30)]);
    }

    #[test]
    fn test_tie_broken_by_user_id() {
        let store = MemoryRankingStore::new();
        store.add_score("k", UserId(9), 50).unwrap();
        store.add_score("k", UserId(3), 50).unwrap();
        let all = store.top("k", 0, 10).unwrap();
        assert_eq!(all, vec![(UserId(3), 50), (UserId(9), 50)]);
    }

    #[test]
    fn test_sweep_drops_expired_keys_only() {
        let store = MemoryRankingStore::new();
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 0, 0, 0).unwrap();
        store.add_score("dated", UserId(1), 1).unwrap();
        store.expire_at("dated", now - chrono::Duration::hours(1)).unwrap();
        store.add_score("alltime", UserId(1), 1).unwrap();

        let dropped = store.sweep_expired(now).unwrap();
        assert_eq!(dropped, 1);
        assert_eq!(store.count("dated").unwrap(), 0);
        assert_eq!(store.count("alltime").unwrap(), 1);
    }

    #[test]
    fn test_missing_key_reads() {
        let store = MemoryRankingStore::new();
        assert_eq!(store.score("nope", UserId(1)).unwrap(), None);
        assert_eq!(store.rank("nope", UserId(1)).unwrap(), None);
        assert_eq!(store.count("nope").unwrap(), 0);
        assert!(store.top("nope", 0, 10).unwrap().is_empty());
    }
}
