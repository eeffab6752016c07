//! Engine facade
//!
//! Composes the leveling engine, streak tracker, reward calculator,
//! badge evaluator, combat simulator, and leaderboard service behind
//! one API. All mutations to a user's progression for a single
//! completion or combat resolution go through optimistic
//! compare-and-swap with bounded retry; the leaderboard is fed
//! best-effort afterwards and never fails the authoritative write.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Timelike, Utc};

use crate::badges::{
    badge_progress, check_all_badges, Badge, BadgeContext, BadgeProgressReport, ConditionRegistry,
    default_badges,
};
use crate::combat::{
    simulate, CombatRecord, CombatRewards, CombatResult, CombatantSnapshot,
};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::history::HistoryQuery;
use crate::leaderboard::{LeaderboardService, MemoryRankingStore, RankingError};
use crate::progression::rewards::RewardBreakdown;
use crate::progression::{
    apply_xp, habit_xp, record_activity, rewards_for_level, task_xp, StreakUpdate, XpApplied,
};
use crate::storage::{
    BadgeStore, CombatStore, HistoryStore, LedgerStore, MemoryStore, ProgressionStore, Versioned,
};
use crate::types::{
    CombatRequest, CompletionEvent, CompletionKind, CompletionRecord, HabitDifficulty,
    LedgerEntry, RewardResult, StatAllocation, TaskEvaluation, TxnSource, UserId,
    UserProgression,
};

/// How long an absence must be for the return to count as a comeback
const COMEBACK_GAP_DAYS: i64 = 7;

/// The gamification engine. Construct one per deployment with the
/// stores injected; every operation is safe to call concurrently.
pub struct Engine {
    config: EngineConfig,
    progression: Arc<dyn ProgressionStore>,
    ledger: Arc<dyn LedgerStore>,
    badge_store: Arc<dyn BadgeStore>,
    combat_store: Arc<dyn CombatStore>,
    history: Arc<dyn HistoryStore>,
    registry: ConditionRegistry,
    catalog: Vec<Badge>,
    leaderboard: LeaderboardService,
}

impl Engine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: EngineConfig,
        progression: Arc<dyn ProgressionStore>,
        ledger: Arc<dyn LedgerStore>,
        badge_store: Arc<dyn BadgeStore>,
        combat_store: Arc<dyn CombatStore>,
        history: Arc<dyn HistoryStore>,
        registry: ConditionRegistry,
        catalog: Vec<Badge>,
        leaderboard: LeaderboardService,
    ) -> Self {
        Self {
            config,
            progression,
            ledger,
            badge_store,
            combat_store,
            history,
            registry,
            catalog,
            leaderboard,
        }
    }

    /// Engine over in-memory stores with the default registry and
    /// badge catalog. Used by tests and the demo binary.
    pub fn with_memory_stores(config: EngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ranking = Arc::new(MemoryRankingStore::new());
        let namespace = config.leaderboard_namespace.clone();
        Self::new(
            config,
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            ConditionRegistry::with_defaults(),
            default_badges(),
            LeaderboardService::new(ranking, namespace),
        )
    }

    /// Create the progression row for a new user
    pub fn register_user(&self, user: UserId) -> EngineResult<()> {
        self.progression.create(UserProgression::new(user))?;
        log::info!("{} registered", user);
        Ok(())
    }

    /// Current progression snapshot
    pub fn progression(&self, user: UserId) -> EngineResult<UserProgression> {
        Ok(self.progression.get(user)?.value)
    }

    /// Ranking reads (top, friends view, rank window, rank change)
    pub fn leaderboard(&self) -> &LeaderboardService {
        &self.leaderboard
    }

    /// Push the resolved friend count for the `friends` badge condition
    pub fn set_friend_count(&self, user: UserId, count: u64) -> EngineResult<()> {
        self.history.set_friend_count(user, count)
    }

    /// Spend earned stat points on combat attributes
    pub fn allocate_stat_points(
        &self,
        user: UserId,
        allocation: StatAllocation,
    ) -> EngineResult<()> {
        let total = allocation.total();
        if total == 0 {
            return Err(EngineError::Validation("nothing to allocate".to_string()));
        }
        self.update_progression(user, |prog| {
            if prog.stat_points < total {
                return Err(EngineError::Validation(format!(
                    "not enough stat points: have {}, need {}",
                    prog.stat_points, total
                )));
            }
            prog.stat_points -= total;
            prog.stats.strength += allocation.strength;
            prog.stats.agility += allocation.agility;
            prog.stats.endurance += allocation.endurance;
            prog.stats.intelligence += allocation.intelligence;
            Ok(())
        })?;
        Ok(())
    }

    // ========================================================================
    // Completions
    // ========================================================================

    /// Resolve a habit completion: streak update, reward pipeline,
    /// level-ups, badge sweep, leaderboard feed.
    pub fn complete_habit(
        &self,
        event: &CompletionEvent,
        difficulty: HabitDifficulty,
    ) -> EngineResult<RewardResult> {
        let date = event.timestamp.date_naive();
        let hour = event.timestamp.hour();

        if self.history.completed_on(event.user_id, event.source_id, date)? {
            return Err(EngineError::Validation(
                "habit already completed today".to_string(),
            ));
        }

        let (prog, (streak, breakdown, applied)) =
            self.update_progression(event.user_id, |prog| {
                let streak = record_activity(prog, date);
                let breakdown =
                    habit_xp(difficulty, hour, prog.current_streak, event.intelligence);
                let applied = apply_xp(prog, breakdown.xp);
                prog.coins += breakdown.coins;
                Ok((streak, breakdown, applied))
            })?;

        self.finish_completion(event, prog, streak, breakdown, applied, date, hour)
    }

    /// Resolve a task completion. Task XP comes from the difficulty
    /// table or the external evaluation; the streak still advances but
    /// its multiplier does not apply.
    pub fn complete_task(
        &self,
        event: &CompletionEvent,
        evaluation: &TaskEvaluation,
    ) -> EngineResult<RewardResult> {
        let date = event.timestamp.date_naive();
        let hour = event.timestamp.hour();

        let (prog, (streak, breakdown, applied)) =
            self.update_progression(event.user_id, |prog| {
                let streak = record_activity(prog, date);
                let breakdown = task_xp(evaluation, event.completed_early);
                let applied = apply_xp(prog, breakdown.xp);
                prog.coins += breakdown.coins;
                Ok((streak, breakdown, applied))
            })?;

        self.finish_completion(event, prog, streak, breakdown, applied, date, hour)
    }

    /// Shared completion tail: ledger rows, history record, streak
    /// bookkeeping, badge sweep, leaderboard feed, result assembly.
    fn finish_completion(
        &self,
        event: &CompletionEvent,
        prog: UserProgression,
        streak: StreakUpdate,
        breakdown: RewardBreakdown,
        applied: XpApplied,
        date: NaiveDate,
        hour: u32,
    ) -> EngineResult<RewardResult> {
        let user = event.user_id;
        let source = match event.kind {
            CompletionKind::Habit => TxnSource::Habit,
            CompletionKind::Task => TxnSource::Task,
        };
        let description = match &event.category {
            Some(category) => format!("{:?} completion ({})", event.kind, category),
            None => format!("{:?} completion", event.kind),
        };

        self.ledger.append_xp(LedgerEntry {
            user_id: user,
            amount: breakdown.xp,
            source,
            source_id: event.source_id,
            description: description.clone(),
            created_at: event.timestamp,
        })?;
        self.ledger.append_coins(LedgerEntry {
            user_id: user,
            amount: breakdown.coins,
            source,
            source_id: event.source_id,
            description,
            created_at: event.timestamp,
        })?;
        self.append_milestone_coin_entries(user, &applied, event.timestamp)?;

        self.history.record_completion(CompletionRecord {
            user_id: user,
            source_id: event.source_id,
            kind: event.kind,
            category: event.category.clone(),
            date,
            hour,
            xp: breakdown.xp,
            coins: breakdown.coins,
            milestone_coins: applied.milestone_coins,
            undone: false,
        })?;

        if streak.streak_lost {
            self.history.record_streak_break(user)?;
            if streak.gap_days >= COMEBACK_GAP_DAYS {
                self.history.record_comeback(user)?;
            }
        }

        let (badges_earned, badge_xp) = self.evaluate_badges(&prog, date, event.timestamp)?;

        let xp_delta = breakdown.xp + badge_xp;
        self.feed_leaderboard(|lb| {
            lb.record_xp(user, xp_delta, event.timestamp)?;
            lb.record_streak(user, prog.current_streak, event.timestamp)
        });

        log::info!(
            "{} earned {} xp / {} coins (streak {})",
            user,
            breakdown.xp,
            breakdown.coins,
            prog.current_streak
        );

        Ok(RewardResult {
            xp_earned: breakdown.xp,
            coins_earned: breakdown.coins,
            base_xp: breakdown.base_xp,
            base_coins: breakdown.base_coins,
            streak_multiplier: breakdown.streak_multiplier,
            new_streak: streak.streak,
            leveled_up: applied.leveled_up,
            new_level: applied.leveled_up.then_some(applied.new_level),
            badges_earned,
        })
    }

    /// Undo a completion: compensating ledger entries restore XP and
    /// coins (including any milestone coins the completion's level-ups
    /// granted) to their exact prior values. The streak is deliberately
    /// not recomputed: undo compensates the ledger, it does not replay
    /// streak history. That is a product decision, not an oversight.
    pub fn undo_completion(
        &self,
        user: UserId,
        source_id: u64,
        now: DateTime<Utc>,
    ) -> EngineResult<()> {
        let Some(record) = self.history.mark_undone(user, source_id)? else {
            return Err(EngineError::Validation(
                "no completion to undo".to_string(),
            ));
        };

        let coins_back = record.coins + record.milestone_coins;
        self.credit(user, |prog| {
            apply_xp(prog, -record.xp);
            prog.coins = (prog.coins - coins_back).max(0);
        })?;

        self.ledger.append_xp(LedgerEntry {
            user_id: user,
            amount: -record.xp,
            source: TxnSource::Undo,
            source_id,
            description: "completion undone".to_string(),
            created_at: now,
        })?;
        self.ledger.append_coins(LedgerEntry {
            user_id: user,
            amount: -coins_back,
            source: TxnSource::Undo,
            source_id,
            description: "completion undone".to_string(),
            created_at: now,
        })?;

        self.feed_leaderboard(|lb| lb.record_xp(user, -record.xp, now));
        log::info!("{} undid completion of source {}", user, source_id);
        Ok(())
    }

    // ========================================================================
    // Combat
    // ========================================================================

    /// Resolve a duel synchronously. Both stats are read once up front;
    /// a missing participant or an uncoverable wager fails the request
    /// before any record is created.
    pub fn resolve_combat(
        &self,
        request: &CombatRequest,
        seed: u64,
        now: DateTime<Utc>,
    ) -> EngineResult<CombatResult> {
        if request.challenger_id == request.defender_id {
            return Err(EngineError::Validation("cannot duel yourself".to_string()));
        }
        if request.wager_coins < 0 {
            return Err(EngineError::Validation("negative wager".to_string()));
        }

        let challenger = self.progression.get(request.challenger_id)?.value;
        let defender = self.progression.get(request.defender_id)?.value;
        if challenger.coins < request.wager_coins {
            return Err(EngineError::Validation(
                "challenger cannot cover the wager".to_string(),
            ));
        }
        if defender.coins < request.wager_coins {
            return Err(EngineError::Validation(
                "defender cannot cover the wager".to_string(),
            ));
        }

        let challenger_snap = CombatantSnapshot {
            user_id: challenger.user_id,
            level: challenger.level,
            stats: challenger.stats,
        };
        let defender_snap = CombatantSnapshot {
            user_id: defender.user_id,
            level: defender.level,
            stats: defender.stats,
        };

        let outcome = simulate(&challenger_snap, &defender_snap, seed);

        let (winner_id, loser_id) = match outcome.winner {
            Some(winner) if winner == request.challenger_id => {
                (Some(winner), Some(request.defender_id))
            }
            Some(winner) => (Some(winner), Some(request.challenger_id)),
            None => (None, None),
        };

        let mut rewards = CombatRewards::default();
        if let (Some(winner), Some(loser)) = (winner_id, loser_id) {
            let (winner_level, loser_level) = if winner == challenger_snap.user_id {
                (challenger_snap.level, defender_snap.level)
            } else {
                (defender_snap.level, challenger_snap.level)
            };
            // Underdog bonus: 10 XP per level the loser has over the winner
            let level_gap = loser_level.saturating_sub(winner_level) as i64;
            rewards.winner_xp =
                self.config.combat_win_xp + self.config.combat_level_bonus_xp * level_gap;
            rewards.winner_coins = self.config.combat_win_coins + request.wager_coins;
            rewards.loser_xp = self.config.combat_loss_xp;

            let (_, winner_applied) = self.credit(winner, |prog| {
                let applied = apply_xp(prog, rewards.winner_xp);
                prog.coins += rewards.winner_coins;
                applied
            })?;
            self.append_milestone_coin_entries(winner, &winner_applied, now)?;

            let (_, loser_applied) = self.credit(loser, |prog| {
                let applied = apply_xp(prog, rewards.loser_xp);
                prog.coins = (prog.coins - request.wager_coins).max(0);
                applied
            })?;
            self.append_milestone_coin_entries(loser, &loser_applied, now)?;

            self.append_combat_ledger(winner, loser, &rewards, request.wager_coins, now)?;
            self.history.record_combat(Some(winner), Some(loser))?;

            log::info!(
                "duel resolved: {} beat {} for {} xp and {} coins",
                winner,
                loser,
                rewards.winner_xp,
                rewards.winner_coins
            );
        } else {
            // A draw moves nothing; the wager stays where it was
            self.history.record_combat(None, None)?;
            log::info!(
                "duel between {} and {} ended in a draw",
                request.challenger_id,
                request.defender_id
            );
        }

        self.combat_store.append(CombatRecord {
            challenger: challenger_snap,
            defender: defender_snap,
            seed,
            wager: request.wager_coins,
            turn_log: outcome.turn_log.clone(),
            challenger_hp: outcome.challenger_hp,
            defender_hp: outcome.defender_hp,
            winner_id,
            rewards,
            created_at: now,
        })?;

        // Combat-win badges for the winner, level badges for both
        let mut badges: Vec<String> = Vec::new();
        for participant in [request.challenger_id, request.defender_id] {
            let prog = self.progression.get(participant)?.value;
            let (earned, _) = self.evaluate_badges(&prog, now.date_naive(), now)?;
            badges.extend(earned);
        }
        if !badges.is_empty() {
            log::debug!("duel unlocked badges: {:?}", badges);
        }

        if let (Some(winner), Some(loser)) = (winner_id, loser_id) {
            let (winner_xp, loser_xp) = (rewards.winner_xp, rewards.loser_xp);
            self.feed_leaderboard(|lb| {
                lb.record_combat_win(winner, now)?;
                lb.record_xp(winner, winner_xp, now)?;
                lb.record_xp(loser, loser_xp, now)
            });
        }

        Ok(CombatResult {
            winner_id,
            loser_id,
            is_draw: winner_id.is_none(),
            turn_log: outcome.turn_log,
            challenger_hp: outcome.challenger_hp,
            defender_hp: outcome.defender_hp,
            rewards,
        })
    }

    // ========================================================================
    // Freezes
    // ========================================================================

    /// Buy one streak freeze for coins, subject to the monthly cap
    pub fn purchase_freeze(&self, user: UserId, now: DateTime<Utc>) -> EngineResult<()> {
        let cost = self.config.freeze_coin_cost;
        let cap = self.config.monthly_freeze_purchase_cap;
        self.update_progression(user, |prog| {
            crate::progression::streak::purchase_freeze(prog, now, cost, cap)
        })?;
        self.ledger.append_coins(LedgerEntry {
            user_id: user,
            amount: -cost,
            source: TxnSource::FreezePurchase,
            source_id: 0,
            description: "streak freeze purchase".to_string(),
            created_at: now,
        })?;
        log::info!("{} purchased a streak freeze", user);
        Ok(())
    }

    /// Activate a freeze from inventory; rejected while one is active
    pub fn activate_freeze(
        &self,
        user: UserId,
        now: DateTime<Utc>,
    ) -> EngineResult<DateTime<Utc>> {
        let (_, until) = self.update_progression(user, |prog| {
            crate::progression::streak::activate_freeze(prog, now)
        })?;
        log::info!("{} froze their streak until {}", user, until);
        Ok(until)
    }

    // ========================================================================
    // Badges
    // ========================================================================

    /// `current/target` progress for every locked, visible badge
    pub fn badge_progress(
        &self,
        user: UserId,
        today: NaiveDate,
    ) -> EngineResult<Vec<BadgeProgressReport>> {
        let prog = self.progression.get(user)?.value;
        let owned = self.badge_store.owned(user)?;
        let history: &dyn HistoryQuery = self.history.as_ref();
        let ctx = BadgeContext {
            progression: &prog,
            history,
            today,
        };
        Ok(badge_progress(&self.registry, &self.catalog, &ctx, &owned))
    }

    /// Evaluate all unowned badges against the given snapshot, unlock
    /// the satisfied ones, and grant their XP. Duplicate unlocks under
    /// concurrent evaluation collapse into no-ops at the store.
    fn evaluate_badges(
        &self,
        prog: &UserProgression,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> EngineResult<(Vec<String>, i64)> {
        let owned = self.badge_store.owned(prog.user_id)?;
        let history: &dyn HistoryQuery = self.history.as_ref();
        let ctx = BadgeContext {
            progression: prog,
            history,
            today,
        };
        let matched = check_all_badges(&self.registry, &self.catalog, &ctx, &owned);

        let mut earned = Vec::new();
        let mut xp_total = 0;
        for badge in matched {
            if !self.badge_store.unlock(prog.user_id, &badge.code, now)? {
                // Lost the race to a concurrent evaluation; nothing to do
                continue;
            }
            log::info!("{} unlocked badge `{}`", prog.user_id, badge.code);
            if badge.xp_reward > 0 {
                let (_, applied) =
                    self.credit(prog.user_id, |p| apply_xp(p, badge.xp_reward))?;
                self.append_milestone_coin_entries(prog.user_id, &applied, now)?;
                self.ledger.append_xp(LedgerEntry {
                    user_id: prog.user_id,
                    amount: badge.xp_reward,
                    source: TxnSource::Badge,
                    source_id: 0,
                    description: format!("badge `{}`", badge.code),
                    created_at: now,
                })?;
                xp_total += badge.xp_reward;
            }
            earned.push(badge.code.clone());
        }
        Ok((earned, xp_total))
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Read-mutate-write with optimistic retry. The closure runs
    /// against a fresh snapshot on every attempt, so a validation error
    /// inside it rejects the operation before anything is written.
    fn update_progression<T>(
        &self,
        user: UserId,
        mut mutate: impl FnMut(&mut UserProgression) -> EngineResult<T>,
    ) -> EngineResult<(UserProgression, T)> {
        let mut attempt = 0;
        loop {
            let Versioned { mut value, version } = self.progression.get(user)?;
            let out = mutate(&mut value)?;
            match self.progression.update(version, value.clone()) {
                Ok(()) => return Ok((value, out)),
                Err(e @ EngineError::Conflict(_)) => {
                    attempt += 1;
                    if attempt >= self.config.max_update_retries {
                        return Err(e);
                    }
                    log::debug!("{}: optimistic update retry {}", user, attempt);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Blind credit/debit mutation with no validation inside: a
    /// conflict only means another writer committed first, so retry
    /// until the write lands. Used once the operation is already past
    /// its point of no return (badge XP, combat payouts, undo
    /// compensation) so a transient race cannot leave it half-applied.
    fn credit<T>(
        &self,
        user: UserId,
        mut mutate: impl FnMut(&mut UserProgression) -> T,
    ) -> EngineResult<(UserProgression, T)> {
        loop {
            let Versioned { mut value, version } = self.progression.get(user)?;
            let out = mutate(&mut value);
            match self.progression.update(version, value.clone()) {
                Ok(()) => return Ok((value, out)),
                Err(EngineError::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn append_milestone_coin_entries(
        &self,
        user: UserId,
        applied: &XpApplied,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        for &level in &applied.levels_crossed {
            let rewards = rewards_for_level(level);
            if rewards.coins > 0 {
                self.ledger.append_coins(LedgerEntry {
                    user_id: user,
                    amount: rewards.coins,
                    source: TxnSource::LevelReward,
                    source_id: level as u64,
                    description: format!("level {} milestone", level),
                    created_at: at,
                })?;
            }
        }
        Ok(())
    }

    fn append_combat_ledger(
        &self,
        winner: UserId,
        loser: UserId,
        rewards: &CombatRewards,
        wager: i64,
        at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.ledger.append_xp(LedgerEntry {
            user_id: winner,
            amount: rewards.winner_xp,
            source: TxnSource::Combat,
            source_id: 0,
            description: format!("duel won vs {}", loser),
            created_at: at,
        })?;
        self.ledger.append_coins(LedgerEntry {
            user_id: winner,
            amount: rewards.winner_coins,
            source: TxnSource::Combat,
            source_id: 0,
            description: format!("duel won vs {}", loser),
            created_at: at,
        })?;
        self.ledger.append_xp(LedgerEntry {
            user_id: loser,
            amount: rewards.loser_xp,
            source: TxnSource::Combat,
            source_id: 0,
            description: format!("duel lost vs {}", winner),
            created_at: at,
        })?;
        if wager > 0 {
            self.ledger.append_coins(LedgerEntry {
                user_id: loser,
                amount: -wager,
                source: TxnSource::Combat,
                source_id: 0,
                description: format!("wager forfeited vs {}", winner),
                created_at: at,
            })?;
        }
        Ok(())
    }

    /// Run a leaderboard update, logging and swallowing failures: the
    /// rankings are a derived view and must never fail or roll back the
    /// authoritative write.
    fn feed_leaderboard(&self, update: impl FnOnce(&LeaderboardService) -> Result<(), RankingError>) {
        if let Err(e) = update(&self.leaderboard) {
            log::warn!("leaderboard update dropped: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine() -> Engine {
        Engine::with_memory_stores(EngineConfig::default())
    }

    fn habit_event(user: u64, source: u64, ts: DateTime<Utc>) -> CompletionEvent {
        CompletionEvent {
            user_id: UserId(user),
            source_id: source,
            kind: CompletionKind::Habit,
            category: Some("health".to_string()),
            intelligence: 10,
            timestamp: ts,
            completed_early: false,
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_worked_example_through_engine() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();

        // Build a 4-day streak so the completion at 07:00 runs at streak 5
        for d in 1..=4 {
            engine
                .complete_habit(&habit_event(1, d as u64, at(2026, 8, d, 12)), HabitDifficulty::Easy)
                .unwrap();
        }
        let result = engine
            .complete_habit(&habit_event(1, 99, at(2026, 8, 5, 7)), HabitDifficulty::Medium)
            .unwrap();

        assert_eq!(result.new_streak, 5);
        assert_eq!(result.streak_multiplier, 1.1);
        assert_eq!(result.xp_earned, 17);
        assert_eq!(result.coins_earned, 8);
        assert_eq!(result.base_xp, 15);
    }

    #[test]
    fn test_habit_twice_same_day_rejected() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        let event = habit_event(1, 42, at(2026, 8, 3, 9));
        engine.complete_habit(&event, HabitDifficulty::Easy).unwrap();

        let err = engine.complete_habit(&event, HabitDifficulty::Easy).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // Next day is fine
        engine
            .complete_habit(&habit_event(1, 42, at(2026, 8, 4, 9)), HabitDifficulty::Easy)
            .unwrap();
    }

    #[test]
    fn test_undo_restores_exact_values() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        engine
            .complete_habit(&habit_event(1, 1, at(2026, 8, 3, 12)), HabitDifficulty::Easy)
            .unwrap();

        let before = engine.progression(UserId(1)).unwrap();
        engine
            .complete_habit(&habit_event(1, 2, at(2026, 8, 3, 13)), HabitDifficulty::Hard)
            .unwrap();
        engine.undo_completion(UserId(1), 2, at(2026, 8, 3, 14)).unwrap();

        let after = engine.progression(UserId(1)).unwrap();
        assert_eq!(after.total_xp, before.total_xp);
        assert_eq!(after.coins, before.coins);
        assert_eq!(after.level, before.level);
        // The streak is intentionally untouched by undo
        assert_eq!(after.current_streak, before.current_streak);
    }

    #[test]
    fn test_undo_without_completion_rejected() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        let err = engine
            .undo_completion(UserId(1), 404, at(2026, 8, 3, 12))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_first_completion_unlocks_first_steps() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        let result = engine
            .complete_habit(&habit_event(1, 1, at(2026, 8, 3, 12)), HabitDifficulty::Easy)
            .unwrap();
        assert!(result.badges_earned.contains(&"completions_1".to_string()));
    }

    #[test]
    fn test_combat_validation() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        engine.register_user(UserId(2)).unwrap();

        let self_duel = CombatRequest {
            challenger_id: UserId(1),
            defender_id: UserId(1),
            wager_coins: 0,
        };
        assert!(engine.resolve_combat(&self_duel, 1, at(2026, 8, 3, 12)).is_err());

        let broke = CombatRequest {
            challenger_id: UserId(1),
            defender_id: UserId(2),
            wager_coins: 1000,
        };
        assert!(engine.resolve_combat(&broke, 1, at(2026, 8, 3, 12)).is_err());

        let missing = CombatRequest {
            challenger_id: UserId(1),
            defender_id: UserId(99),
            wager_coins: 0,
        };
        assert!(matches!(
            engine.resolve_combat(&missing, 1, at(2026, 8, 3, 12)).unwrap_err(),
            EngineError::UserNotFound(_)
        ));
    }

    #[test]
    fn test_combat_seeded_determinism_through_engine() {
        let build = || {
            let engine = engine();
            engine.register_user(UserId(1)).unwrap();
            engine.register_user(UserId(2)).unwrap();
            engine
        };
        let request = CombatRequest {
            challenger_id: UserId(1),
            defender_id: UserId(2),
            wager_coins: 0,
        };

        let first = build().resolve_combat(&request, 1234, at(2026, 8, 3, 12)).unwrap();
        let second = build().resolve_combat(&request, 1234, at(2026, 8, 3, 12)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_purchase_freeze_writes_ledger_and_rejects_when_broke() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        assert!(engine.purchase_freeze(UserId(1), at(2026, 8, 3, 12)).is_err());

        // Earn some coins, then buy
        for d in 1..=20 {
            engine
                .complete_habit(
                    &habit_event(1, d as u64, at(2026, 8, d, 12)),
                    HabitDifficulty::VeryHard,
                )
                .unwrap();
        }
        let before = engine.progression(UserId(1)).unwrap();
        engine.purchase_freeze(UserId(1), at(2026, 8, 21, 12)).unwrap();
        let after = engine.progression(UserId(1)).unwrap();
        assert_eq!(after.coins, before.coins - 50);
        assert_eq!(after.freeze_available, before.freeze_available + 1);
    }

    #[test]
    fn test_badge_progress_reporting() {
        let engine = engine();
        engine.register_user(UserId(1)).unwrap();
        engine
            .complete_habit(&habit_event(1, 1, at(2026, 8, 3, 12)), HabitDifficulty::Easy)
            .unwrap();

        let reports = engine
            .badge_progress(UserId(1), NaiveDate::from_ymd_opt(2026, 8, 3).unwrap())
            .unwrap();
        let streak7 = reports.iter().find(|r| r.code == "streak_7").unwrap();
        assert_eq!(streak7.current, 1);
        assert_eq!(streak7.target, 7);
    }
}
