//! Combat simulation
//!
//! Deterministic, seeded turn loop. Given the same seed and the same
//! two snapshots, the full turn log is byte-for-byte reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{
    armor_reduction, crit_chance, dodge_chance, max_hp, CombatantSnapshot, TurnEntry,
    CRIT_MULTIPLIER, MAX_TURNS, VARIANCE_MAX, VARIANCE_MIN,
};
use crate::types::UserId;

/// Outcome of a simulated duel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombatOutcome {
    /// `None` means a draw
    pub winner: Option<UserId>,
    pub turn_log: Vec<TurnEntry>,
    pub challenger_hp: i32,
    pub defender_hp: i32,
    pub turns: u32,
}

/// Run a duel to completion against frozen snapshots.
///
/// Turn 1 goes to the higher-agility combatant (challenger on a tie);
/// turns then strictly alternate until one side reaches 0 HP or
/// [`MAX_TURNS`] elapse. On timeout the higher HP-percentage side
/// wins; equal percentages is a draw.
pub fn simulate(
    challenger: &CombatantSnapshot,
    defender: &CombatantSnapshot,
    seed: u64,
) -> CombatOutcome {
    let mut rng = StdRng::seed_from_u64(seed);

    let challenger_max = max_hp(challenger.stats.endurance);
    let defender_max = max_hp(defender.stats.endurance);
    let mut challenger_hp = challenger_max;
    let mut defender_hp = defender_max;

    let challenger_first = challenger.stats.agility >= defender.stats.agility;

    let mut turn_log = Vec::new();
    let mut turn = 0;
    while turn < MAX_TURNS && challenger_hp > 0 && defender_hp > 0 {
        turn += 1;
        let challenger_acts = if challenger_first {
            turn % 2 == 1
        } else {
            turn % 2 == 0
        };

        let entry = if challenger_acts {
            resolve_attack(turn, challenger, defender, &mut defender_hp, &mut rng)
        } else {
            resolve_attack(turn, defender, challenger, &mut challenger_hp, &mut rng)
        };
        turn_log.push(entry);
    }

    let winner = if defender_hp <= 0 {
        Some(challenger.user_id)
    } else if challenger_hp <= 0 {
        Some(defender.user_id)
    } else {
        // Timeout: higher HP percentage wins
        let challenger_pct = challenger_hp as f64 / challenger_max as f64;
        let defender_pct = defender_hp as f64 / defender_max as f64;
        if challenger_pct > defender_pct {
            Some(challenger.user_id)
        } else if defender_pct > challenger_pct {
            Some(defender.user_id)
        } else {
            None
        }
    };

    CombatOutcome {
        winner,
        turn_log,
        challenger_hp,
        defender_hp,
        turns: turn,
    }
}

/// Resolve one attack: dodge roll, variance damage, crit roll, armor
/// reduction, minimum 1 damage.
fn resolve_attack(
    turn: u32,
    attacker: &CombatantSnapshot,
    defender: &CombatantSnapshot,
    defender_hp: &mut i32,
    rng: &mut StdRng,
) -> TurnEntry {
    if rng.gen_bool(dodge_chance(defender.stats.agility)) {
        return TurnEntry {
            turn,
            attacker: attacker.user_id,
            defender: defender.user_id,
            damage: 0,
            crit: false,
            dodged: true,
            defender_hp: *defender_hp,
        };
    }

    let variance = rng.gen_range(VARIANCE_MIN..=VARIANCE_MAX);
    let mut damage =
        (attacker.stats.strength + attacker.stats.weapon_bonus) as f64 * variance;

    let crit = rng.gen_bool(crit_chance(attacker.stats.intelligence));
    if crit {
        damage *= CRIT_MULTIPLIER;
    }

    damage *= 1.0 - armor_reduction(defender.stats.armor_bonus);
    let dealt = (damage as i32).max(1);
    *defender_hp = (*defender_hp - dealt).max(0);

    TurnEntry {
        turn,
        attacker: attacker.user_id,
        defender: defender.user_id,
        damage: dealt,
        crit,
        dodged: false,
        defender_hp: *defender_hp,
    }
}
