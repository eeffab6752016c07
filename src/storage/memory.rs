//! In-memory stores
//!
//! Reference implementations of every storage seam, guarded by
//! `parking_lot` locks. One [`MemoryStore`] value implements all of the
//! store traits; share it via `Arc`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::badges::UserBadge;
use crate::combat::CombatRecord;
use crate::error::{EngineError, EngineResult};
use crate::history::HistoryQuery;
use crate::storage::{
    BadgeStore, CombatStore, HistoryStore, LedgerStore, ProgressionStore, Versioned,
};
use crate::types::{ActivityStats, CompletionRecord, LedgerEntry, UserId, UserProgression};

/// All engine state, in memory
#[derive(Default)]
pub struct MemoryStore {
    progressions: RwLock<HashMap<UserId, Versioned<UserProgression>>>,
    xp_ledger: RwLock<Vec<LedgerEntry>>,
    coin_ledger: RwLock<Vec<LedgerEntry>>,
    /// The uniqueness constraint on (user, badge)
    badge_keys: RwLock<HashSet<(UserId, String)>>,
    badge_rows: RwLock<Vec<UserBadge>>,
    combats: RwLock<Vec<CombatRecord>>,
    completions: RwLock<Vec<CompletionRecord>>,
    stats: RwLock<HashMap<UserId, ActivityStats>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressionStore for MemoryStore {
    fn create(&self, progression: UserProgression) -> EngineResult<()> {
        let mut rows = self.progressions.write();
        if rows.contains_key(&progression.user_id) {
            return Err(EngineError::Validation(format!(
                "{} already exists",
                progression.user_id
            )));
        }
        rows.insert(
            progression.user_id,
            Versioned {
                value: progression,
                version: 0,
            },
        );
        Ok(())
    }

    fn get(&self, user: UserId) -> EngineResult<Versioned<UserProgression>> {
        self.progressions
            .read()
            .get(&user)
            .cloned()
            .ok_or(EngineError::UserNotFound(user))
    }

    fn update(&self, expected_version: u64, progression: UserProgression) -> EngineResult<()> {
        let mut rows = self.progressions.write();
        let user = progression.user_id;
        let row = rows.get_mut(&user).ok_or(EngineError::UserNotFound(user))?;
        if row.version != expected_version {
            return Err(EngineError::Conflict(user));
        }
        row.value = progression;
        row.version += 1;
        Ok(())
    }
}

impl LedgerStore for MemoryStore {
    fn append_xp(&self, entry: LedgerEntry) -> EngineResult<()> {
        self.xp_ledger.write().push(entry);
        Ok(())
    }

    fn append_coins(&self, entry: LedgerEntry) -> EngineResult<()> {
        self.coin_ledger.write().push(entry);
        Ok(())
    }

    fn xp_entries(&self, user: UserId) -> EngineResult<Vec<LedgerEntry>> {
        Ok(self
            .xp_ledger
            .read()
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect())
    }

    fn coin_entries(&self, user: UserId) -> EngineResult<Vec<LedgerEntry>> {
        Ok(self
            .coin_ledger
            .read()
            .iter()
            .filter(|e| e.user_id == user)
            .cloned()
            .collect())
    }
}

impl BadgeStore for MemoryStore {
    fn unlock(&self, user: UserId, code: &str, at: DateTime<Utc>) -> EngineResult<bool> {
        // The set insert is the uniqueness guard; no check-then-insert
        let inserted = self.badge_keys.write().insert((user, code.to_string()));
        if inserted {
            self.badge_rows.write().push(UserBadge {
                user_id: user,
                code: code.to_string(),
                unlocked_at: at,
                pinned: false,
            });
        }
        Ok(inserted)
    }

    fn owned(&self, user: UserId) -> EngineResult<HashSet<String>> {
        Ok(self
            .badge_keys
            .read()
            .iter()
            .filter(|(u, _)| *u == user)
            .map(|(_, code)| code.clone())
            .collect())
    }

    fn badges(&self, user: UserId) -> EngineResult<Vec<UserBadge>> {
        Ok(self
            .badge_rows
            .read()
            .iter()
            .filter(|b| b.user_id == user)
            .cloned()
            .collect())
    }
}

impl CombatStore for MemoryStore {
    fn append(&self, record: CombatRecord) -> EngineResult<()> {
        self.combats.write().push(record);
        Ok(())
    }

    fn records(&self, user: UserId) -> EngineResult<Vec<CombatRecord>> {
        Ok(self
            .combats
            .read()
            .iter()
            .filter(|r| r.challenger.user_id == user || r.defender.user_id == user)
            .cloned()
            .collect())
    }
}

impl HistoryQuery for MemoryStore {
    fn completion_count(&self, user: UserId, category: Option<&str>) -> u64 {
        let stats = self.stats.read();
        let Some(stats) = stats.get(&user) else {
            return 0;
        };
        match category {
            Some(category) => stats.by_category.get(category).copied().unwrap_or(0),
            None => stats.total_completions,
        }
    }

    fn completions_in_hours(&self, user: UserId, start_hour: u32, end_hour: u32) -> u64 {
        let stats = self.stats.read();
        let Some(stats) = stats.get(&user) else {
            return 0;
        };
        (start_hour..=end_hour.min(23))
            .map(|h| stats.by_hour[h as usize])
            .sum()
    }

    fn combat_wins(&self, user: UserId) -> u64 {
        self.stats.read().get(&user).map(|s| s.combat_wins).unwrap_or(0)
    }

    fn friend_count(&self, user: UserId) -> u64 {
        self.stats.read().get(&user).map(|s| s.friends).unwrap_or(0)
    }

    fn streak_breaks(&self, user: UserId) -> u64 {
        self.stats.read().get(&user).map(|s| s.streak_breaks).unwrap_or(0)
    }

    fn comebacks(&self, user: UserId) -> u64 {
        self.stats.read().get(&user).map(|s| s.comebacks).unwrap_or(0)
    }
}

impl HistoryStore for MemoryStore {
    fn record_completion(&self, record: CompletionRecord) -> EngineResult<()> {
        {
            let mut stats = self.stats.write();
            let stats = stats.entry(record.user_id).or_default();
            stats.total_completions += 1;
            if let Some(category) = &record.category {
                *stats.by_category.entry(category.clone()).or_insert(0) += 1;
            }
            stats.by_hour[record.hour.min(23) as usize] += 1;
        }
        self.completions.write().push(record);
        Ok(())
    }

    fn completed_on(&self, user: UserId, source_id: u64, date: NaiveDate) -> EngineResult<bool> {
        Ok(self.completions.read().iter().any(|c| {
            c.user_id == user && c.source_id == source_id && c.date == date && !c.undone
        }))
    }

    fn mark_undone(&self, user: UserId, source_id: u64) -> EngineResult<Option<CompletionRecord>> {
        let mut completions = self.completions.write();
        let Some(record) = completions
            .iter_mut()
            .rev()
            .find(|c| c.user_id == user && c.source_id == source_id && !c.undone)
        else {
            return Ok(None);
        };
        record.undone = true;
        let record = record.clone();
        drop(completions);

        let mut stats = self.stats.write();
        let stats = stats.entry(user).or_default();
        stats.total_completions = stats.total_completions.saturating_sub(1);
        if let Some(category) = &record.category {
            if let Some(count) = stats.by_category.get_mut(category) {
                *count = count.saturating_sub(1);
            }
        }
        let hour = record.hour.min(23) as usize;
        stats.by_hour[hour] = stats.by_hour[hour].saturating_sub(1);

        Ok(Some(record))
    }

    fn record_combat(&self, winner: Option<UserId>, loser: Option<UserId>) -> EngineResult<()> {
        let mut stats = self.stats.write();
        if let Some(winner) = winner {
            stats.entry(winner).or_default().combat_wins += 1;
        }
        if let Some(loser) = loser {
            stats.entry(loser).or_default().combat_losses += 1;
        }
        Ok(())
    }

    fn record_streak_break(&self, user: UserId) -> EngineResult<()> {
        self.stats.write().entry(user).or_default().streak_breaks += 1;
        Ok(())
    }

    fn record_comeback(&self, user: UserId) -> EngineResult<()> {
        self.stats.write().entry(user).or_default().comebacks += 1;
        Ok(())
    }

    fn set_friend_count(&self, user: UserId, count: u64) -> EngineResult<()> {
        self.stats.write().entry(user).or_default().friends = count;
        Ok(())
    }
}
