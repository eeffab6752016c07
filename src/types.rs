//! Core domain types
//!
//! Identifiers, events, progression state, and the DTOs exchanged with
//! the surrounding system.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique user identifier
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user#{}", self.0)
    }
}

// ============================================================================
// Completion events
// ============================================================================

/// What produced a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Habit,
    Task,
}

/// Habit difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitDifficulty {
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl HabitDifficulty {
    /// Base XP before any bonuses
    pub fn base_xp(&self) -> i64 {
        match self {
            HabitDifficulty::Easy => 10,
            HabitDifficulty::Medium => 15,
            HabitDifficulty::Hard => 20,
            HabitDifficulty::VeryHard => 25,
        }
    }
}

/// Task difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskDifficulty {
    Trivial,
    Easy,
    Medium,
    Hard,
    VeryHard,
    Epic,
    Legendary,
}

impl TaskDifficulty {
    /// Base XP before any bonuses
    pub fn base_xp(&self) -> i64 {
        match self {
            TaskDifficulty::Trivial => 5,
            TaskDifficulty::Easy => 15,
            TaskDifficulty::Medium => 30,
            TaskDifficulty::Hard => 60,
            TaskDifficulty::VeryHard => 120,
            TaskDifficulty::Epic => 200,
            TaskDifficulty::Legendary => 300,
        }
    }
}

/// A completion entering the engine. Not persisted as-is; the engine
/// derives a [`CompletionRecord`] from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionEvent {
    pub user_id: UserId,
    /// Id of the habit or task that was completed
    pub source_id: u64,
    pub kind: CompletionKind,
    /// Category tag ("health", "work", ...) for habits
    pub category: Option<String>,
    /// Actor intelligence at completion time
    pub intelligence: u32,
    pub timestamp: DateTime<Utc>,
    /// Task was finished before its due date
    #[serde(default)]
    pub completed_early: bool,
}

/// Pre-computed task evaluation supplied by the external evaluator.
/// When `xp`/`coins` are present they override the difficulty table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEvaluation {
    pub difficulty: TaskDifficulty,
    #[serde(default)]
    pub xp: Option<i64>,
    #[serde(default)]
    pub coins: Option<i64>,
}

// ============================================================================
// Progression state
// ============================================================================

/// Combat-relevant attributes, grown through level rewards and gear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroStats {
    pub strength: u32,
    pub agility: u32,
    pub endurance: u32,
    pub intelligence: u32,
    pub weapon_bonus: u32,
    pub armor_bonus: u32,
}

/// A request to spend earned stat points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatAllocation {
    pub strength: u32,
    pub agility: u32,
    pub endurance: u32,
    pub intelligence: u32,
}

impl StatAllocation {
    pub fn total(&self) -> u32 {
        self.strength + self.agility + self.endurance + self.intelligence
    }
}

/// Per-user progression row. Mutated exclusively through engine
/// operations; `level` is always a cache of `level_from_xp(total_xp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProgression {
    pub user_id: UserId,
    pub level: u32,
    pub total_xp: i64,
    pub coins: i64,
    pub stat_points: u32,
    pub stats: HeroStats,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_activity_date: Option<NaiveDate>,
    /// Streak freezes in inventory
    pub freeze_available: u32,
    /// An activated freeze shields missed days up to this instant
    pub streak_frozen_until: Option<DateTime<Utc>>,
    /// ISO (year, week) of the last free weekly freeze grant
    pub last_free_freeze_week: Option<(i32, u32)>,
    /// `%Y-%m` month the purchase counter below refers to
    pub freeze_purchase_month: Option<String>,
    pub freezes_purchased_this_month: u32,
    pub titles: Vec<String>,
    pub unlocked_items: Vec<String>,
    pub features: Vec<String>,
}

impl UserProgression {
    /// Fresh level-1 progression
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            level: 1,
            total_xp: 0,
            coins: 0,
            stat_points: 0,
            stats: HeroStats::default(),
            current_streak: 0,
            best_streak: 0,
            last_activity_date: None,
            freeze_available: 0,
            streak_frozen_until: None,
            last_free_freeze_week: None,
            freeze_purchase_month: None,
            freezes_purchased_this_month: 0,
            titles: Vec::new(),
            unlocked_items: Vec::new(),
            features: Vec::new(),
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Where a ledger amount came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxnSource {
    Habit,
    Task,
    Badge,
    Combat,
    LevelReward,
    FreezePurchase,
    Undo,
}

/// One append-only ledger row (XP or coins, depending on which ledger
/// it lives in). Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub user_id: UserId,
    pub amount: i64,
    pub source: TxnSource,
    pub source_id: u64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Completion history
// ============================================================================

/// Persisted record of one completion, used for same-day validation,
/// badge history queries, and undo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub user_id: UserId,
    pub source_id: u64,
    pub kind: CompletionKind,
    pub category: Option<String>,
    pub date: NaiveDate,
    pub hour: u32,
    pub xp: i64,
    pub coins: i64,
    /// Milestone coins granted by level-ups this completion caused;
    /// undo compensates these as well.
    pub milestone_coins: i64,
    pub undone: bool,
}

/// Per-user activity counters backing badge history queries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityStats {
    pub total_completions: u64,
    pub by_category: HashMap<String, u64>,
    pub by_hour: [u64; 24],
    pub combat_wins: u64,
    pub combat_losses: u64,
    pub streak_breaks: u64,
    pub comebacks: u64,
    pub friends: u64,
}

// ============================================================================
// Results
// ============================================================================

/// Everything a completion earned, returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardResult {
    pub xp_earned: i64,
    pub coins_earned: i64,
    pub base_xp: i64,
    pub base_coins: i64,
    pub streak_multiplier: f64,
    pub new_streak: u32,
    pub leveled_up: bool,
    pub new_level: Option<u32>,
    /// Codes of badges unlocked by this completion
    pub badges_earned: Vec<String>,
}

/// A combat challenge entering the engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CombatRequest {
    pub challenger_id: UserId,
    pub defender_id: UserId,
    pub wager_coins: i64,
}

/// One user's standing on a leaderboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    /// 1-based rank
    pub rank: u64,
    pub score: i64,
    pub total_participants: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_habit_base_xp() {
        assert_eq!(HabitDifficulty::Easy.base_xp(), 10);
        assert_eq!(HabitDifficulty::Medium.base_xp(), 15);
        assert_eq!(HabitDifficulty::Hard.base_xp(), 20);
        assert_eq!(HabitDifficulty::VeryHard.base_xp(), 25);
    }

    #[test]
    fn test_task_table_endpoints() {
        assert_eq!(TaskDifficulty::Trivial.base_xp(), 5);
        assert_eq!(TaskDifficulty::Legendary.base_xp(), 300);
    }

    #[test]
    fn test_new_progression_invariants() {
        let prog = UserProgression::new(UserId(7));
        assert_eq!(prog.level, 1);
        assert_eq!(prog.total_xp, 0);
        assert_eq!(prog.coins, 0);
        assert_eq!(prog.current_streak, 0);
    }
}
