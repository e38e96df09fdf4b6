//! Random rewards rolled when an enemy dies.

use crystal_defence_core::{EnemyKind, ResourceKind};
use rand::Rng;

const CRYSTAL_DROP_CHANCE: f64 = 0.30;
const BOSS_ESSENCE_CHANCE: f64 = 0.50;
const TANK_FRAGMENT_CHANCE: f64 = 0.20;
const SPEEDSTER_ESSENCE_CHANCE: f64 = 0.15;
const TECH_POINT_CHANCE: f64 = 0.05;

/// Outcome of the loot rolls for a single death.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct LootRoll {
    /// Drops to place at the death position, with their values.
    pub(crate) drops: Vec<(ResourceKind, f64)>,
    /// Whether a tech point is granted immediately.
    pub(crate) tech_point: bool,
}

/// Rolls every independent loot chance in a fixed order.
pub(crate) fn roll_loot<R: Rng>(kind: EnemyKind, rng: &mut R) -> LootRoll {
    let mut roll = LootRoll::default();

    if rng.gen_bool(CRYSTAL_DROP_CHANCE) {
        let value = rng.gen_range(10_u32..=29);
        roll.drops.push((ResourceKind::Crystal, f64::from(value)));
    }

    match kind {
        EnemyKind::Boss => {
            roll.drops.push((ResourceKind::Core, 1.0));
            if rng.gen_bool(BOSS_ESSENCE_CHANCE) {
                roll.drops.push((ResourceKind::Essence, 1.0));
            }
        }
        EnemyKind::Tank => {
            if rng.gen_bool(TANK_FRAGMENT_CHANCE) {
                roll.drops.push((ResourceKind::Fragment, 1.0));
            }
        }
        EnemyKind::Speedster => {
            if rng.gen_bool(SPEEDSTER_ESSENCE_CHANCE) {
                roll.drops.push((ResourceKind::Essence, 1.0));
            }
        }
        EnemyKind::Scout | EnemyKind::Fighter => {}
    }

    roll.tech_point = rng.gen_bool(TECH_POINT_CHANCE);
    roll
}
