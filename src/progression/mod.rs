//! Progression systems

pub mod level;
pub mod rewards;
pub mod streak;

pub use level::{level_from_xp, next_milestone, rewards_for_level, xp_for_level, LevelRewards};
pub use rewards::{apply_xp, habit_xp, task_xp, RewardBreakdown, XpApplied, COIN_RATIO};
pub use streak::{record_activity, streak_multiplier, StreakUpdate, STREAK_BADGE_THRESHOLDS};
