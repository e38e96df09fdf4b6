#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that fires tower volleys and resolves projectile hits into
//! damage and status-effect commands.

use crystal_defence_core::{
    Ability, Command, EnemyId, EnemySnapshot, EnemyView, ProjectileSnapshot, TowerView, Vec2,
};

/// Fraction of projectile damage dealt at the centre of a splash.
pub const SPLASH_DAMAGE_FACTOR: f32 = 0.5;
/// Fraction of projectile damage dealt by every chain hop.
pub const CHAIN_DAMAGE_FACTOR: f32 = 0.7;
/// Maximum distance between two links of a chain.
pub const CHAIN_RANGE: f32 = 100.0;
/// Maximum distance from the impact point to the next pierced enemy.
pub const PIERCE_RANGE: f32 = 100.0;

/// Tower combat system that queues volleys for towers ready to fire.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireVolley` entries for towers ready to fire.
    ///
    /// The primary target leads each volley; multishot towers add the
    /// next-nearest distinct enemies in range until the volley is full.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        self.scratch.clear();

        for tower in towers.iter() {
            if tower.ready_in > 0.0 {
                continue;
            }
            let Some(primary) = tower.target.and_then(|enemy| enemies.get_active(enemy)) else {
                continue;
            };

            let mut targets = vec![primary.id];
            let shots = tower.shots_per_volley() as usize;
            if shots > 1 {
                let mut extras: Vec<(f32, EnemyId)> = enemies
                    .active()
                    .filter(|enemy| enemy.id != primary.id)
                    .map(|enemy| (tower.position.distance(enemy.position), enemy.id))
                    .filter(|(distance, _)| *distance < tower.range)
                    .collect();
                extras.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                targets.extend(extras.into_iter().take(shots - 1).map(|(_, id)| id));
            }

            self.scratch.push(Command::FireVolley {
                tower: tower.id,
                targets,
            });
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}

/// Converts a single hit into commands.
///
/// A hit on an enemy that an earlier hit already killed resolves to nothing.
/// Otherwise the struck enemy takes direct damage and the owner's abilities
/// then apply in archetype order; a projectile whose owner was sold deals
/// direct damage only and credits nobody.
pub fn resolve_hit(
    projectile: &ProjectileSnapshot,
    struck: EnemyId,
    impact: Vec2,
    towers: &TowerView,
    enemies: &EnemyView,
    out: &mut Vec<Command>,
) {
    if enemies.get_active(struck).is_none() {
        return;
    }
    let owner = towers.get(projectile.owner);
    let source = owner.map(|tower| tower.id);
    let damage = projectile.damage;

    out.push(Command::DamageEnemy {
        enemy: struck,
        amount: damage,
        source,
    });

    let Some(owner) = owner else {
        return;
    };

    for ability in &owner.abilities {
        match *ability {
            Ability::Splash { radius } => {
                for enemy in enemies.active().filter(|enemy| enemy.id != struck) {
                    let amount = splash_damage(damage, enemy.position.distance(impact), radius);
                    if amount > 0.0 {
                        out.push(Command::DamageEnemy {
                            enemy: enemy.id,
                            amount,
                            source,
                        });
                    }
                }
            }
            Ability::Chain { count } => {
                for enemy in chain_targets(struck, impact, count, enemies) {
                    out.push(Command::DamageEnemy {
                        enemy,
                        amount: damage * CHAIN_DAMAGE_FACTOR,
                        source,
                    });
                }
            }
            Ability::Piercing { damage_multiplier } => {
                if let Some(next) = pierce_target(projectile, struck, impact, enemies) {
                    out.push(Command::RetargetProjectile {
                        projectile: projectile.id,
                        enemy: next,
                        damage: damage * damage_multiplier,
                    });
                }
            }
            Ability::Slow { effect, duration } => out.push(Command::SlowEnemy {
                enemy: struck,
                effect,
                duration,
            }),
            Ability::Dot {
                damage: damage_per_tick,
                duration,
            } => out.push(Command::AttachDamageOverTime {
                enemy: struck,
                damage_per_tick,
                duration,
                source,
            }),
            Ability::Multishot { .. } | Ability::Beam | Ability::Orbital => {}
        }
    }
}

/// Damage dealt by a splash to an enemy `distance` away from the impact.
#[must_use]
pub fn splash_damage(damage: f32, distance: f32, radius: f32) -> f32 {
    if distance >= radius {
        return 0.0;
    }
    damage * (1.0 - distance / radius) * SPLASH_DAMAGE_FACTOR
}

/// Enemies reached by a chain starting at the struck enemy, in hop order.
///
/// Each hop picks the nearest active enemy not yet chained within
/// [`CHAIN_RANGE`] of the previous link and stops early when none remains.
#[must_use]
pub fn chain_targets(
    struck: EnemyId,
    impact: Vec2,
    count: u32,
    enemies: &EnemyView,
) -> Vec<EnemyId> {
    let mut chained = vec![struck];
    let mut previous = enemies
        .get(struck)
        .map_or(impact, |enemy| enemy.position);

    for _ in 0..count {
        let Some(next) = nearest(enemies, previous, CHAIN_RANGE, |enemy| {
            !chained.contains(&enemy.id)
        }) else {
            break;
        };
        chained.push(next.id);
        previous = next.position;
    }

    chained.split_off(1)
}

fn pierce_target(
    projectile: &ProjectileSnapshot,
    struck: EnemyId,
    impact: Vec2,
    enemies: &EnemyView,
) -> Option<EnemyId> {
    nearest(enemies, impact, PIERCE_RANGE, |enemy| {
        enemy.id != struck && !projectile.struck.contains(&enemy.id)
    })
    .map(|enemy| enemy.id)
}

fn nearest<'a>(
    enemies: &'a EnemyView,
    origin: Vec2,
    range: f32,
    mut eligible: impl FnMut(&EnemySnapshot) -> bool,
) -> Option<&'a EnemySnapshot> {
    let mut best: Option<(f32, &EnemySnapshot)> = None;
    for enemy in enemies.active() {
        if !eligible(enemy) {
            continue;
        }
        let distance = origin.distance(enemy.position);
        if distance > range {
            continue;
        }
        match best {
            Some((closest, _)) if closest <= distance => {}
            _ => best = Some((distance, enemy)),
        }
    }
    best.map(|(_, enemy)| enemy)
}
