//! Engine configuration
//!
//! Tunables are passed in by the caller at construction time; there are
//! no process-wide singletons.

use serde::{Deserialize, Serialize};

/// Tunable engine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Key namespace prefix for the ranking store
    pub leaderboard_namespace: String,
    /// Coin price of one purchased streak freeze
    pub freeze_coin_cost: i64,
    /// Maximum freeze purchases per calendar month
    pub monthly_freeze_purchase_cap: u32,
    /// Base XP for a combat winner
    pub combat_win_xp: i64,
    /// Base coins for a combat winner (wager is added on top)
    pub combat_win_coins: i64,
    /// Flat consolation XP for a combat loser
    pub combat_loss_xp: i64,
    /// Extra winner XP per level the loser exceeds the winner
    pub combat_level_bonus_xp: i64,
    /// Attempts before an optimistic update conflict is surfaced
    pub max_update_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            leaderboard_namespace: "habitforge".to_string(),
            freeze_coin_cost: 50,
            monthly_freeze_purchase_cap: 3,
            combat_win_xp: 50,
            combat_win_coins: 25,
            combat_loss_xp: 10,
            combat_level_bonus_xp: 10,
            max_update_retries: 3,
        }
    }
}
