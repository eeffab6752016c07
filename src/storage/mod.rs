//! Storage seams
//!
//! Trait boundaries the engine talks to. Real deployments back these
//! with a database; [`memory::MemoryStore`] is the reference
//! implementation used by tests and the demo binary.

pub mod memory;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::badges::UserBadge;
use crate::combat::CombatRecord;
use crate::error::EngineResult;
use crate::history::HistoryQuery;
use crate::types::{CompletionRecord, LedgerEntry, UserId, UserProgression};

pub use memory::MemoryStore;

/// A value paired with its optimistic-concurrency version
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// Progression rows, one per user. Writes are compare-and-swap on the
/// version read; a mismatch surfaces as a retryable conflict.
pub trait ProgressionStore: Send + Sync {
    fn create(&self, progression: UserProgression) -> EngineResult<()>;

    fn get(&self, user: UserId) -> EngineResult<Versioned<UserProgression>>;

    /// Commit `progression` if the row's version still equals
    /// `expected_version`; returns `EngineError::Conflict` otherwise.
    fn update(&self, expected_version: u64, progression: UserProgression) -> EngineResult<()>;
}

/// Append-only XP and coin transaction ledgers
pub trait LedgerStore: Send + Sync {
    fn append_xp(&self, entry: LedgerEntry) -> EngineResult<()>;
    fn append_coins(&self, entry: LedgerEntry) -> EngineResult<()>;
    fn xp_entries(&self, user: UserId) -> EngineResult<Vec<LedgerEntry>>;
    fn coin_entries(&self, user: UserId) -> EngineResult<Vec<LedgerEntry>>;
}

/// Unlocked-badge rows with a uniqueness guard on (user, badge)
pub trait BadgeStore: Send + Sync {
    /// Insert the unlock row. Returns `true` if the row is new, `false`
    /// for an already-owned badge (a successful no-op, never an error).
    /// The guard is the insert itself, not a prior existence check.
    fn unlock(&self, user: UserId, code: &str, at: DateTime<Utc>) -> EngineResult<bool>;

    fn owned(&self, user: UserId) -> EngineResult<HashSet<String>>;

    fn badges(&self, user: UserId) -> EngineResult<Vec<UserBadge>>;
}

/// Immutable combat records
pub trait CombatStore: Send + Sync {
    fn append(&self, record: CombatRecord) -> EngineResult<()>;
    fn records(&self, user: UserId) -> EngineResult<Vec<CombatRecord>>;
}

/// Completion history plus the activity counters behind badge
/// conditions. Implementations also answer [`HistoryQuery`].
pub trait HistoryStore: HistoryQuery {
    fn record_completion(&self, record: CompletionRecord) -> EngineResult<()>;

    /// Whether an un-undone completion of `source_id` exists on `date`
    fn completed_on(&self, user: UserId, source_id: u64, date: NaiveDate) -> EngineResult<bool>;

    /// Tombstone the most recent un-undone completion of `source_id`
    /// and return it
    fn mark_undone(&self, user: UserId, source_id: u64) -> EngineResult<Option<CompletionRecord>>;

    fn record_combat(&self, winner: Option<UserId>, loser: Option<UserId>) -> EngineResult<()>;

    fn record_streak_break(&self, user: UserId) -> EngineResult<()>;

    fn record_comeback(&self, user: UserId) -> EngineResult<()>;

    /// Resolved friend count pushed in by the social collaborator
    fn set_friend_count(&self, user: UserId, count: u64) -> EngineResult<()>;
}
