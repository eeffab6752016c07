//! Combat simulation benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use habitforge::combat::{simulate, CombatantSnapshot};
use habitforge::types::{HeroStats, UserId};

fn combatant(user: u64, strength: u32, agility: u32) -> CombatantSnapshot {
    CombatantSnapshot {
        user_id: UserId(user),
        level: 10,
        stats: HeroStats {
            strength,
            agility,
            endurance: 20,
            intelligence: 15,
            weapon_bonus: 5,
            armor_bonus: 8,
        },
    }
}

fn bench_simulate(c: &mut Criterion) {
    let challenger = combatant(1, 18, 12);
    let defender = combatant(2, 14, 22);

    c.bench_function("simulate_duel", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            black_box(simulate(&challenger, &defender, seed))
        })
    });
}

criterion_group!(benches, bench_simulate);
criterion_main!(benches);
