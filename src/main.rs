//! HabitForge demo driver
//!
//! Simulates a few days of usage for two users against the in-memory
//! stores: habit completions, a task, a wagered duel, and the
//! leaderboard standings at the end.

use anyhow::Result;
use chrono::{TimeZone, Utc};

use habitforge::combat::max_hp;
use habitforge::leaderboard::{Metric, Period};
use habitforge::types::{
    CombatRequest, CompletionEvent, CompletionKind, HabitDifficulty, StatAllocation,
    TaskDifficulty, TaskEvaluation, UserId,
};
use habitforge::{Engine, EngineConfig};

const COMBAT_SEED: u64 = 0x5EED;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting HabitForge demo v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::with_memory_stores(EngineConfig::default());
    let alice = UserId(1);
    let bob = UserId(2);
    engine.register_user(alice)?;
    engine.register_user(bob)?;

    // A week of morning health habits for Alice, sporadic ones for Bob
    for day in 1..=7 {
        let morning = Utc.with_ymd_and_hms(2026, 8, day, 7, 30, 0).unwrap();
        let result = engine.complete_habit(
            &CompletionEvent {
                user_id: alice,
                source_id: 100,
                kind: CompletionKind::Habit,
                category: Some("health".to_string()),
                intelligence: 10,
                timestamp: morning,
                completed_early: false,
            },
            HabitDifficulty::Medium,
        )?;
        log::info!(
            "day {}: alice earned {} xp, streak {}{}",
            day,
            result.xp_earned,
            result.new_streak,
            if result.badges_earned.is_empty() {
                String::new()
            } else {
                format!(", badges {:?}", result.badges_earned)
            }
        );

        if day % 2 == 1 {
            let evening = Utc.with_ymd_and_hms(2026, 8, day, 22, 15, 0).unwrap();
            engine.complete_habit(
                &CompletionEvent {
                    user_id: bob,
                    source_id: 200,
                    kind: CompletionKind::Habit,
                    category: Some("learning".to_string()),
                    intelligence: 14,
                    timestamp: evening,
                    completed_early: false,
                },
                HabitDifficulty::Hard,
            )?;
        }
    }

    // Bob finishes a big task ahead of its deadline
    let result = engine.complete_task(
        &CompletionEvent {
            user_id: bob,
            source_id: 300,
            kind: CompletionKind::Task,
            category: None,
            intelligence: 14,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 16, 0, 0).unwrap(),
            completed_early: true,
        },
        &TaskEvaluation {
            difficulty: TaskDifficulty::Hard,
            xp: None,
            coins: None,
        },
    )?;
    log::info!(
        "bob finished a task early: {} xp, {} coins",
        result.xp_earned,
        result.coins_earned
    );

    // Alice ships a long-running project, levels up, and spends the
    // stat points on strength before picking a fight
    let result = engine.complete_task(
        &CompletionEvent {
            user_id: alice,
            source_id: 101,
            kind: CompletionKind::Task,
            category: None,
            intelligence: 10,
            timestamp: Utc.with_ymd_and_hms(2026, 8, 7, 17, 0, 0).unwrap(),
            completed_early: false,
        },
        &TaskEvaluation {
            difficulty: TaskDifficulty::Legendary,
            xp: None,
            coins: None,
        },
    )?;
    if let Some(level) = result.new_level {
        log::info!("alice reached level {}", level);
    }
    let points = engine.progression(alice)?.stat_points;
    if points > 0 {
        engine.allocate_stat_points(
            alice,
            StatAllocation {
                strength: points,
                ..StatAllocation::default()
            },
        )?;
    }

    // A wagered duel, reproducible under the fixed seed
    let now = Utc.with_ymd_and_hms(2026, 8, 7, 18, 0, 0).unwrap();
    let duel = engine.resolve_combat(
        &CombatRequest {
            challenger_id: alice,
            defender_id: bob,
            wager_coins: 10,
        },
        COMBAT_SEED,
        now,
    )?;
    match duel.winner_id {
        Some(winner) => log::info!(
            "duel over in {} turns: {} wins with {} xp",
            duel.turn_log.len(),
            winner,
            duel.rewards.winner_xp
        ),
        None => log::info!("duel over in {} turns: draw", duel.turn_log.len()),
    }
    let alice_prog = engine.progression(alice)?;
    log::info!(
        "alice: level {}, {} xp, {} coins, {} max hp",
        alice_prog.level,
        alice_prog.total_xp,
        alice_prog.coins,
        max_hp(alice_prog.stats.endurance)
    );

    // Final standings
    for entry in engine.leaderboard().top(Metric::Xp, Period::Weekly, now, 0, 10)? {
        log::info!("#{} {} - {} xp this week", entry.rank, entry.user_id, entry.score);
    }

    log::info!("HabitForge demo finished");
    Ok(())
}
