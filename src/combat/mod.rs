//! PvP combat
//!
//! Derived stat formulas and the seeded turn-based duel simulator.

pub mod simulator;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{HeroStats, UserId};

pub use simulator::{simulate, CombatOutcome};

pub const BASE_HP: i32 = 100;
pub const HP_PER_ENDURANCE: i32 = 5;
/// 0.5% dodge per agility point, capped at 30%
const DODGE_PER_AGILITY: f64 = 0.005;
const DODGE_CAP: f64 = 0.30;
/// 0.3% crit per intelligence point, capped at 20%
const CRIT_PER_INTELLIGENCE: f64 = 0.003;
const CRIT_CAP: f64 = 0.20;
pub const CRIT_MULTIPLIER: f64 = 1.5;
/// 2% damage reduction per armor point, capped at 50%
const ARMOR_REDUCTION_PER_POINT: f64 = 0.02;
const ARMOR_REDUCTION_CAP: f64 = 0.50;
/// Damage variance range
pub const VARIANCE_MIN: f64 = 0.8;
pub const VARIANCE_MAX: f64 = 1.2;
/// Duels end after this many turns at the latest
pub const MAX_TURNS: u32 = 50;

/// Maximum hit points from endurance
pub fn max_hp(endurance: u32) -> i32 {
    BASE_HP + endurance as i32 * HP_PER_ENDURANCE
}

/// Chance for an incoming attack to be dodged, in [0, 0.30]
pub fn dodge_chance(agility: u32) -> f64 {
    (agility as f64 * DODGE_PER_AGILITY).min(DODGE_CAP)
}

/// Chance for an outgoing attack to crit, in [0, 0.20]
pub fn crit_chance(intelligence: u32) -> f64 {
    (intelligence as f64 * CRIT_PER_INTELLIGENCE).min(CRIT_CAP)
}

/// Fraction of damage absorbed by armor, in [0, 0.50]
pub fn armor_reduction(armor_bonus: u32) -> f64 {
    (armor_bonus as f64 * ARMOR_REDUCTION_PER_POINT).min(ARMOR_REDUCTION_CAP)
}

/// Frozen view of one combatant, taken once at combat start.
/// Concurrent stat changes during the simulation are never observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub user_id: UserId,
    pub level: u32,
    pub stats: HeroStats,
}

/// One resolved attack in the turn log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub turn: u32,
    pub attacker: UserId,
    pub defender: UserId,
    pub damage: i32,
    pub crit: bool,
    pub dodged: bool,
    /// Defender HP after this attack
    pub defender_hp: i32,
}

/// Rewards distributed when a combat resolves
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRewards {
    pub winner_xp: i64,
    pub winner_coins: i64,
    pub loser_xp: i64,
}

/// Immutable record of a resolved combat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatRecord {
    pub challenger: CombatantSnapshot,
    pub defender: CombatantSnapshot,
    pub seed: u64,
    pub wager: i64,
    pub turn_log: Vec<TurnEntry>,
    pub challenger_hp: i32,
    pub defender_hp: i32,
    /// `None` means a draw
    pub winner_id: Option<UserId>,
    pub rewards: CombatRewards,
    pub created_at: DateTime<Utc>,
}

/// Combat result returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatResult {
    pub winner_id: Option<UserId>,
    pub loser_id: Option<UserId>,
    pub is_draw: bool,
    pub turn_log: Vec<TurnEntry>,
    pub challenger_hp: i32,
    pub defender_hp: i32,
    pub rewards: CombatRewards,
}
