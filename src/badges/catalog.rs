//! Badge catalog
//!
//! Loads badge definitions from an external RON file, with fallback to
//! the compiled-in defaults.

use std::fs;
use std::path::Path;

use serde_json::json;

use super::Badge;

/// Load the badge catalog from a RON file, falling back to
/// [`default_badges`] if the file is missing or malformed.
pub fn load_badges(path: &Path) -> Vec<Badge> {
    if path.exists() {
        match fs::read_to_string(path) {
            Ok(content) => match ron::from_str(&content) {
                Ok(badges) => return badges,
                Err(e) => log::warn!("failed to parse {}: {}, using defaults", path.display(), e),
            },
            Err(e) => log::warn!("failed to read {}: {}, using defaults", path.display(), e),
        }
    }
    default_badges()
}

fn badge(
    code: &str,
    name: &str,
    description: &str,
    condition_type: &str,
    condition_params: serde_json::Value,
    xp_reward: i64,
) -> Badge {
    Badge {
        code: code.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        condition_type: condition_type.to_string(),
        condition_params,
        xp_reward,
        secret: false,
    }
}

/// The built-in badge catalog
pub fn default_badges() -> Vec<Badge> {
    let mut badges = vec![
        // Streak badges, one per threshold
        badge("streak_7", "One Week Strong", "Reach a 7-day streak", "streak", json!({"days": 7}), 50),
        badge("streak_14", "Fortnight Fighter", "Reach a 14-day streak", "streak", json!({"days": 14}), 75),
        badge("streak_30", "Monthly Devotee", "Reach a 30-day streak", "streak", json!({"days": 30}), 150),
        badge("streak_60", "Two-Month Titan", "Reach a 60-day streak", "streak", json!({"days": 60}), 250),
        badge("streak_90", "Quarterly Champion", "Reach a 90-day streak", "streak", json!({"days": 90}), 400),
        badge("streak_180", "Half-Year Hero", "Reach a 180-day streak", "streak", json!({"days": 180}), 750),
        badge("streak_365", "Year of Iron", "Reach a 365-day streak", "streak", json!({"days": 365}), 1500),
        // Completion counts
        badge("completions_1", "First Steps", "Complete your first habit or task", "completions", json!({"count": 1}), 10),
        badge("completions_100", "Centurion of Habit", "Complete 100 habits or tasks", "completions", json!({"count": 100}), 200),
        badge("completions_1000", "Unstoppable", "Complete 1,000 habits or tasks", "completions", json!({"count": 1000}), 1000),
        // Levels
        badge("level_10", "Rising Star", "Reach level 10", "level", json!({"level": 10}), 100),
        badge("level_25", "Seasoned", "Reach level 25", "level", json!({"level": 25}), 250),
        badge("level_50", "Halfway to Glory", "Reach level 50", "level", json!({"level": 50}), 500),
        // Time windows
        badge("early_bird", "Early Bird", "Complete 10 habits before 8am", "time", json!({"count": 10, "start_hour": 4, "end_hour": 7}), 100),
        badge("night_owl", "Night Owl", "Complete 10 habits after 10pm", "time", json!({"count": 10, "start_hour": 22, "end_hour": 23}), 100),
        // Combat
        badge("combat_first_win", "First Blood", "Win your first duel", "combat_wins", json!({"count": 1}), 50),
        badge("combat_10_wins", "Gladiator", "Win 10 duels", "combat_wins", json!({"count": 10}), 250),
        // Wealth
        badge("coins_1000", "Hoarder", "Hold 1,000 coins at once", "coins", json!({"amount": 1000}), 100),
        // Categories
        badge("health_nut", "Health Nut", "Complete 50 health habits", "habit_category", json!({"category": "health", "count": 50}), 150),
        badge("bookworm", "Bookworm", "Complete 50 learning habits", "habit_category", json!({"category": "learning", "count": 50}), 150),
        // Social
        badge("social_butterfly", "Social Butterfly", "Make 5 friends", "friends", json!({"count": 5}), 100),
        // Seasonal
        badge("new_year", "Fresh Start", "Complete something on New Year's Day", "date", json!({"month": 1, "day": 1}), 50),
        badge("midwinter", "Midwinter Spirit", "Stay active over the winter holidays", "date", json!({"start_month": 12, "start_day": 20, "end_month": 1, "end_day": 5}), 75),
    ];

    // Hidden badges
    let mut broken = badge(
        "scar_tissue",
        "Scar Tissue",
        "Lose a streak for the first time",
        "secret",
        json!({"heuristic": "first_streak_break"}),
        25,
    );
    broken.secret = true;
    badges.push(broken);

    let mut comeback = badge(
        "the_return",
        "The Return",
        "Come back after a week away",
        "secret",
        json!({"heuristic": "comeback"}),
        50,
    );
    comeback.secret = true;
    badges.push(comeback);

    badges
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_codes_unique() {
        let badges = default_badges();
        let codes: HashSet<_> = badges.iter().map(|b| b.code.as_str()).collect();
        assert_eq!(codes.len(), badges.len());
    }

    #[test]
    fn test_streak_thresholds_all_covered() {
        let badges = default_badges();
        for days in crate::progression::STREAK_BADGE_THRESHOLDS {
            let code = format!("streak_{}", days);
            assert!(
                badges.iter().any(|b| b.code == code),
                "missing streak badge {}",
                code
            );
        }
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let badges = load_badges(Path::new("/nonexistent/badges.ron"));
        assert_eq!(badges.len(), default_badges().len());
    }

    #[test]
    fn test_catalog_round_trips_through_ron() {
        let badges = default_badges();
        let encoded = ron::to_string(&badges).unwrap();
        let decoded: Vec<Badge> = ron::from_str(&encoded).unwrap();
        assert_eq!(decoded, badges);
    }
}
