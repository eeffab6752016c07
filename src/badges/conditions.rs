//! Badge condition evaluators
//!
//! Each condition type is a named predicate over a progression snapshot,
//! structured parameters, and the history query capability. Evaluators
//! are registered once and looked up by tag, so new condition types are
//! additive.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::history::HistoryQuery;
use crate::types::UserProgression;

/// Everything a condition may look at
pub struct BadgeContext<'a> {
    pub progression: &'a UserProgression,
    pub history: &'a dyn HistoryQuery,
    pub today: NaiveDate,
}

/// `current/target` ratio for UI display of a locked badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeProgress {
    pub current: u64,
    pub target: u64,
}

/// A registered condition predicate
pub trait ConditionEvaluator: Send + Sync {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool;

    /// Progress toward the condition, where the type supports it
    fn progress(&self, _ctx: &BadgeContext<'_>, _params: &Value) -> Option<BadgeProgress> {
        None
    }
}

/// Condition registry: tag -> evaluator
#[derive(Default)]
pub struct ConditionRegistry {
    evaluators: HashMap<&'static str, Box<dyn ConditionEvaluator>>,
}

impl ConditionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in condition type
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("streak", Box::new(StreakCondition));
        registry.register("completions", Box::new(CompletionsCondition));
        registry.register("level", Box::new(LevelCondition));
        registry.register("time", Box::new(TimeCondition));
        registry.register("combat_wins", Box::new(CombatWinsCondition));
        registry.register("date", Box::new(DateCondition));
        registry.register("coins", Box::new(CoinsCondition));
        registry.register("habit_category", Box::new(HabitCategoryCondition));
        registry.register("friends", Box::new(FriendsCondition));
        registry.register("secret", Box::new(SecretCondition));
        registry
    }

    pub fn register(&mut self, tag: &'static str, evaluator: Box<dyn ConditionEvaluator>) {
        self.evaluators.insert(tag, evaluator);
    }

    /// Evaluate a condition by tag. Unknown tags and malformed params
    /// never unlock anything.
    pub fn evaluate(&self, tag: &str, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        match self.evaluators.get(tag) {
            Some(evaluator) => evaluator.is_satisfied(ctx, params),
            None => {
                log::warn!("unknown badge condition type `{}`", tag);
                false
            }
        }
    }

    pub fn progress(&self, tag: &str, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        self.evaluators.get(tag)?.progress(ctx, params)
    }
}

/// Parse structured params, logging and failing closed on mismatch
fn parse<P: DeserializeOwned>(params: &Value) -> Option<P> {
    match serde_json::from_value(params.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("malformed badge condition params {}: {}", params, e);
            None
        }
    }
}

// ============================================================================
// Built-in conditions
// ============================================================================

#[derive(Deserialize)]
struct StreakParams {
    days: u32,
}

/// Current or best streak reached `days`
struct StreakCondition;

impl ConditionEvaluator for StreakCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<StreakParams>(params).is_some_and(|p| {
            ctx.progression.current_streak >= p.days || ctx.progression.best_streak >= p.days
        })
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<StreakParams>(params)?;
        Some(BadgeProgress {
            current: ctx.progression.current_streak.max(ctx.progression.best_streak) as u64,
            target: p.days as u64,
        })
    }
}

#[derive(Deserialize)]
struct CompletionsParams {
    count: u64,
    #[serde(default)]
    category: Option<String>,
}

/// Total completions, optionally filtered to one category
struct CompletionsCondition;

impl ConditionEvaluator for CompletionsCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<CompletionsParams>(params).is_some_and(|p| {
            ctx.history
                .completion_count(ctx.progression.user_id, p.category.as_deref())
                >= p.count
        })
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<CompletionsParams>(params)?;
        Some(BadgeProgress {
            current: ctx
                .history
                .completion_count(ctx.progression.user_id, p.category.as_deref()),
            target: p.count,
        })
    }
}

#[derive(Deserialize)]
struct LevelParams {
    level: u32,
}

struct LevelCondition;

impl ConditionEvaluator for LevelCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<LevelParams>(params).is_some_and(|p| ctx.progression.level >= p.level)
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<LevelParams>(params)?;
        Some(BadgeProgress {
            current: ctx.progression.level as u64,
            target: p.level as u64,
        })
    }
}

#[derive(Deserialize)]
struct TimeParams {
    count: u64,
    start_hour: u32,
    end_hour: u32,
}

/// Completions inside an early/late hour-of-day window
struct TimeCondition;

impl ConditionEvaluator for TimeCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<TimeParams>(params).is_some_and(|p| {
            ctx.history
                .completions_in_hours(ctx.progression.user_id, p.start_hour, p.end_hour)
                >= p.count
        })
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<TimeParams>(params)?;
        Some(BadgeProgress {
            current: ctx
                .history
                .completions_in_hours(ctx.progression.user_id, p.start_hour, p.end_hour),
            target: p.count,
        })
    }
}

#[derive(Deserialize)]
struct CombatWinsParams {
    count: u64,
}

struct CombatWinsCondition;

impl ConditionEvaluator for CombatWinsCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<CombatWinsParams>(params)
            .is_some_and(|p| ctx.history.combat_wins(ctx.progression.user_id) >= p.count)
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<CombatWinsParams>(params)?;
        Some(BadgeProgress {
            current: ctx.history.combat_wins(ctx.progression.user_id),
            target: p.count,
        })
    }
}

/// Single day (`month` + `day`) or an inclusive month-day range that
/// may wrap the year end (`start_*`/`end_*`), for seasonal badges.
#[derive(Deserialize)]
struct DateParams {
    #[serde(default)]
    month: Option<u32>,
    #[serde(default)]
    day: Option<u32>,
    #[serde(default)]
    start_month: Option<u32>,
    #[serde(default)]
    start_day: Option<u32>,
    #[serde(default)]
    end_month: Option<u32>,
    #[serde(default)]
    end_day: Option<u32>,
}

struct DateCondition;

impl ConditionEvaluator for DateCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        let Some(p) = parse::<DateParams>(params) else {
            return false;
        };
        let today = (ctx.today.month(), ctx.today.day());

        if let (Some(month), Some(day)) = (p.month, p.day) {
            return today == (month, day);
        }
        if let (Some(sm), Some(sd), Some(em), Some(ed)) =
            (p.start_month, p.start_day, p.end_month, p.end_day)
        {
            let start = (sm, sd);
            let end = (em, ed);
            return if start <= end {
                today >= start && today <= end
            } else {
                // Wrapping range, e.g. Dec 20 - Jan 5
                today >= start || today <= end
            };
        }
        log::warn!("date condition needs month/day or a start/end range");
        false
    }
}

#[derive(Deserialize)]
struct CoinsParams {
    amount: i64,
}

struct CoinsCondition;

impl ConditionEvaluator for CoinsCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<CoinsParams>(params).is_some_and(|p| ctx.progression.coins >= p.amount)
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<CoinsParams>(params)?;
        Some(BadgeProgress {
            current: ctx.progression.coins.max(0) as u64,
            target: p.amount.max(0) as u64,
        })
    }
}

#[derive(Deserialize)]
struct HabitCategoryParams {
    category: String,
    count: u64,
}

/// Completion count within one habit category
struct HabitCategoryCondition;

impl ConditionEvaluator for HabitCategoryCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<HabitCategoryParams>(params).is_some_and(|p| {
            ctx.history
                .completion_count(ctx.progression.user_id, Some(&p.category))
                >= p.count
        })
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<HabitCategoryParams>(params)?;
        Some(BadgeProgress {
            current: ctx
                .history
                .completion_count(ctx.progression.user_id, Some(&p.category)),
            target: p.count,
        })
    }
}

#[derive(Deserialize)]
struct FriendsParams {
    count: u64,
}

/// Accepted friendships (resolved by the social collaborator)
struct FriendsCondition;

impl ConditionEvaluator for FriendsCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        parse::<FriendsParams>(params)
            .is_some_and(|p| ctx.history.friend_count(ctx.progression.user_id) >= p.count)
    }

    fn progress(&self, ctx: &BadgeContext<'_>, params: &Value) -> Option<BadgeProgress> {
        let p = parse::<FriendsParams>(params)?;
        Some(BadgeProgress {
            current: ctx.history.friend_count(ctx.progression.user_id),
            target: p.count,
        })
    }
}

#[derive(Deserialize)]
struct SecretParams {
    heuristic: String,
}

/// Hidden heuristics with no visible progress
struct SecretCondition;

impl ConditionEvaluator for SecretCondition {
    fn is_satisfied(&self, ctx: &BadgeContext<'_>, params: &Value) -> bool {
        let Some(p) = parse::<SecretParams>(params) else {
            return false;
        };
        let user = ctx.progression.user_id;
        match p.heuristic.as_str() {
            "first_streak_break" => ctx.history.streak_breaks(user) >= 1,
            "comeback" => ctx.history.comebacks(user) >= 1,
            other => {
                log::warn!("unknown secret badge heuristic `{}`", other);
                false
            }
        }
    }
}
