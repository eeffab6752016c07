//! Reward calculation
//!
//! Turns completions into XP and coins, and applies XP with cascading
//! level-up rewards.
//!
//! The habit pipeline truncates to an integer at each stage (after the
//! time-of-day bonus, after the streak multiplier, after the
//! intelligence bonus). The staged truncation is load-bearing: a single
//! multiply-then-round at the end yields different totals.

use crate::progression::level::{level_from_xp, rewards_for_level, LevelRewards};
use crate::progression::streak::streak_multiplier;
use crate::types::{HabitDifficulty, TaskEvaluation, UserProgression};

/// Coins are always half the XP earned, truncated
pub const COIN_RATIO: f64 = 0.5;

/// Morning window bonus, [06:00, 09:00)
const MORNING_BONUS: f64 = 0.10;
/// Late window bonus, [22:00, 24:00)
const LATE_BONUS: f64 = 0.05;
/// Bonus for finishing a task before its due date
const EARLY_TASK_BONUS: f64 = 0.20;
/// +0.5% XP per intelligence point, uncapped
const INTELLIGENCE_STEP: f64 = 0.005;

/// Time-of-day XP bonus for the given UTC hour
pub fn time_of_day_bonus(hour: u32) -> f64 {
    match hour {
        6..=8 => MORNING_BONUS,
        22..=23 => LATE_BONUS,
        _ => 0.0,
    }
}

/// A computed reward, before it is applied to progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardBreakdown {
    pub base_xp: i64,
    pub base_coins: i64,
    pub xp: i64,
    pub coins: i64,
    pub streak_multiplier: f64,
}

/// XP for a habit completion: difficulty base, time-of-day bonus,
/// streak multiplier, then intelligence bonus, truncating after each
/// stage.
pub fn habit_xp(
    difficulty: HabitDifficulty,
    hour: u32,
    streak: u32,
    intelligence: u32,
) -> RewardBreakdown {
    let base = difficulty.base_xp();
    let mult = streak_multiplier(streak);

    let mut xp = (base as f64 * (1.0 + time_of_day_bonus(hour))) as i64;
    xp = (xp as f64 * mult) as i64;
    xp = (xp as f64 * (1.0 + intelligence as f64 * INTELLIGENCE_STEP)) as i64;

    RewardBreakdown {
        base_xp: base,
        base_coins: (base as f64 * COIN_RATIO) as i64,
        xp,
        coins: (xp as f64 * COIN_RATIO) as i64,
        streak_multiplier: mult,
    }
}

/// XP for a task completion: the difficulty table or the external
/// evaluator's override, plus the early-completion bonus.
pub fn task_xp(evaluation: &TaskEvaluation, completed_early: bool) -> RewardBreakdown {
    let base = evaluation.xp.unwrap_or_else(|| evaluation.difficulty.base_xp());
    let mut xp = base;
    if completed_early {
        xp = (xp as f64 * (1.0 + EARLY_TASK_BONUS)) as i64;
    }
    let coins = evaluation
        .coins
        .unwrap_or_else(|| (xp as f64 * COIN_RATIO) as i64);

    RewardBreakdown {
        base_xp: base,
        base_coins: (base as f64 * COIN_RATIO) as i64,
        xp,
        coins,
        streak_multiplier: 1.0,
    }
}

/// Result of applying an XP delta to a progression row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XpApplied {
    pub new_total: i64,
    pub new_level: u32,
    pub leveled_up: bool,
    /// Levels crossed by this grant, ascending; rewards were applied
    /// for each one in order
    pub levels_crossed: Vec<u32>,
    /// Milestone coins granted while crossing levels
    pub milestone_coins: i64,
}

/// Apply a signed XP amount: clamp the total at zero, recompute the
/// level cache, and walk every crossed level in ascending order so
/// intermediate milestone rewards are not skipped. Negative deltas
/// (undo) only re-derive the level; previously granted rewards stand.
pub fn apply_xp(prog: &mut UserProgression, amount: i64) -> XpApplied {
    let old_level = prog.level;
    prog.total_xp = (prog.total_xp + amount).max(0);
    let new_level = level_from_xp(prog.total_xp);

    let mut applied = XpApplied {
        new_total: prog.total_xp,
        new_level,
        ..XpApplied::default()
    };

    if new_level > old_level {
        for level in (old_level + 1)..=new_level {
            let LevelRewards {
                stat_points,
                coins,
                title,
                items,
                feature,
            } = rewards_for_level(level);
            prog.stat_points += stat_points;
            prog.coins += coins;
            applied.milestone_coins += coins;
            if let Some(title) = title {
                prog.titles.push(title);
            }
            prog.unlocked_items.extend(items);
            if let Some(feature) = feature {
                prog.features.push(feature);
            }
            applied.levels_crossed.push(level);
            log::info!("{} reached level {}", prog.user_id, level);
        }
        applied.leveled_up = true;
    }

    prog.level = new_level;
    applied
}
