//! Experience and leveling
//!
//! XP threshold curve, level lookup, and per-level reward tables.

use serde::{Deserialize, Serialize};

/// Curve base: XP cost of a level scales on `BASE * level^EXPONENT`
const XP_BASE: f64 = 100.0;
const XP_EXPONENT: f64 = 1.8;

/// Hard level cap
pub const MAX_LEVEL: u32 = 200;

/// Stat points granted on every level-up
const STAT_POINTS_PER_LEVEL: u32 = 3;

/// Levels that carry bonus rewards beyond the default stat grant
pub const MILESTONE_LEVELS: &[u32] = &[5, 10, 15, 20, 25, 30, 40, 50, 75, 100];

/// Cumulative XP required to reach `level`.
///
/// Each per-level term is truncated to an integer before summation;
/// collapsing this into a closed form changes thresholds at higher
/// levels.
pub fn xp_for_level(level: u32) -> i64 {
    if level <= 1 {
        return 0;
    }
    (2..=level.min(MAX_LEVEL))
        .map(|l| (XP_BASE * (l as f64).powf(XP_EXPONENT)) as i64)
        .sum()
}

/// Largest level (capped at [`MAX_LEVEL`]) whose threshold fits in
/// `total_xp`. Binary search; the curve is strictly increasing.
pub fn level_from_xp(total_xp: i64) -> u32 {
    let mut lo = 1u32;
    let mut hi = MAX_LEVEL;
    while lo < hi {
        let mid = (lo + hi + 1) / 2;
        if xp_for_level(mid) <= total_xp {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Rewards granted on reaching a level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelRewards {
    pub stat_points: u32,
    pub coins: i64,
    pub title: Option<String>,
    pub items: Vec<String>,
    pub feature: Option<String>,
}

/// Rewards for a single level. Every level grants stat points;
/// milestone levels add coins, a title, cosmetics, and sometimes a
/// feature unlock.
pub fn rewards_for_level(level: u32) -> LevelRewards {
    let mut rewards = LevelRewards {
        stat_points: STAT_POINTS_PER_LEVEL,
        ..LevelRewards::default()
    };

    match level {
        5 => {
            rewards.coins = 50;
            rewards.title = Some("Initiate".to_string());
            rewards.items.push("chest_bronze".to_string());
        }
        10 => {
            rewards.coins = 100;
            rewards.title = Some("Adventurer".to_string());
            rewards.items.push("chest_silver".to_string());
            rewards.feature = Some("combat_arena".to_string());
        }
        15 => {
            rewards.coins = 150;
            rewards.title = Some("Disciplined".to_string());
            rewards.items.push("avatar_frame_iron".to_string());
        }
        20 => {
            rewards.coins = 200;
            rewards.title = Some("Veteran".to_string());
            rewards.items.push("avatar_frame_steel".to_string());
            rewards.feature = Some("custom_categories".to_string());
        }
        25 => {
            rewards.coins = 250;
            rewards.title = Some("Relentless".to_string());
            rewards.items.push("chest_gold".to_string());
        }
        30 => {
            rewards.coins = 300;
            rewards.title = Some("Elite".to_string());
            rewards.items.push("banner_elite".to_string());
        }
        40 => {
            rewards.coins = 400;
            rewards.title = Some("Unyielding".to_string());
            rewards.items.push("avatar_frame_gold".to_string());
        }
        50 => {
            rewards.coins = 500;
            rewards.title = Some("Champion".to_string());
            rewards.items.push("chest_platinum".to_string());
        }
        75 => {
            rewards.coins = 750;
            rewards.title = Some("Grandmaster".to_string());
            rewards.items.push("chest_diamond".to_string());
        }
        100 => {
            rewards.coins = 1000;
            rewards.title = Some("Centurion".to_string());
            rewards.items.push("chest_mythic".to_string());
            rewards.feature = Some("prestige".to_string());
        }
        _ => {}
    }

    rewards
}

/// The next milestone ahead of `level` and the XP still needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextMilestone {
    pub level: u32,
    pub xp_required: i64,
    pub xp_remaining: i64,
}

/// Scan forward for the next milestone level. `None` past level 100.
pub fn next_milestone(level: u32, total_xp: i64) -> Option<NextMilestone> {
    MILESTONE_LEVELS.iter().copied().find(|&m| m > level).map(|m| {
        let xp_required = xp_for_level(m);
        NextMilestone {
            level: m,
            xp_required,
            xp_remaining: (xp_required - total_xp).max(0),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xp_for_level_base_cases() {
        assert_eq!(xp_for_level(1), 0);
        // floor(100 * 2^1.8) = floor(348.22) = 348
        assert_eq!(xp_for_level(2), 348);
        // + floor(100 * 3^1.8) = 348 + floor(722.46)
        assert_eq!(xp_for_level(3), 348 + 722);
    }

    #[test]
    fn test_thresholds_strictly_increasing() {
        let mut prev = xp_for_level(1);
        for level in 2..=MAX_LEVEL {
            let xp = xp_for_level(level);
            assert!(xp > prev, "threshold not increasing at level {}", level);
            prev = xp;
        }
    }

    #[test]
    fn test_level_from_xp_roundtrip() {
        for level in 1..=100 {
            assert_eq!(level_from_xp(xp_for_level(level)), level);
        }
    }

    #[test]
    fn test_level_from_xp_between_thresholds() {
        assert_eq!(level_from_xp(0), 1);
        assert_eq!(level_from_xp(347), 1);
        assert_eq!(level_from_xp(348), 2);
        assert_eq!(level_from_xp(xp_for_level(10) - 1), 9);
    }

    #[test]
    fn test_level_capped() {
        assert_eq!(level_from_xp(i64::MAX), MAX_LEVEL);
    }

    #[test]
    fn test_milestone_rewards() {
        assert_eq!(rewards_for_level(5).coins, 50);
        assert_eq!(rewards_for_level(100).coins, 1000);
        assert_eq!(rewards_for_level(10).feature.as_deref(), Some("combat_arena"));
        // Non-milestone levels still grant stat points
        let plain = rewards_for_level(7);
        assert_eq!(plain.stat_points, 3);
        assert_eq!(plain.coins, 0);
        assert!(plain.title.is_none());
    }

    #[test]
    fn test_next_milestone() {
        let next = next_milestone(1, 0).unwrap();
        assert_eq!(next.level, 5);
        assert_eq!(next.xp_remaining, xp_for_level(5));

        let next = next_milestone(30, xp_for_level(30)).unwrap();
        assert_eq!(next.level, 40);

        assert!(next_milestone(100, xp_for_level(100)).is_none());
    }

    #[test]
    fn test_next_milestone_remaining_clamped() {
        // Already past the milestone threshold XP but not the level
        let next = next_milestone(4, xp_for_level(6)).unwrap();
        assert_eq!(next.level, 5);
        assert_eq!(next.xp_remaining, 0);
    }
}
