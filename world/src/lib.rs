#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Crystal Defence.
//!
//! The world owns every mutable entity together with the economy ledger, the
//! simulation clock and the loot random number generator. All mutations flow
//! through [`apply`]; read access goes through the [`query`] module.

mod config;
mod drops;
pub mod economy;
mod effects;
mod enemies;
mod loot;
pub mod path;
mod projectiles;
mod registry;
mod towers;

use std::{collections::BTreeSet, time::Duration};

use crystal_defence_catalog::Catalogs;
use crystal_defence_core::{
    Command, Cost, Currency, DropId, EffectId, EnemyId, Event, GameError, GlobalAbility,
    PlacementError, ProjectileId, TowerId, TowerKind, Vec2,
};
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub use config::WorldConfig;
pub use economy::EconomyLedger;
pub use effects::TimedEffect;
pub use path::{Path, PathError, PathPlanner};

use drops::DropState;
use effects::{AbilityClock, DamageOverTime, BOMB_DAMAGE, FREEZE_SLOW_EFFECT};
use enemies::EnemyState;
use loot::roll_loot;
use projectiles::ProjectileState;
use registry::Registry;
use towers::TowerState;

/// Crystals granted per wave number when a wave is cleared.
const WAVE_BONUS_PER_WAVE: u32 = 50;
/// Score granted per crystal of wave bonus.
const WAVE_SCORE_FACTOR: u32 = 10;

/// Represents the authoritative Crystal Defence world state.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    catalogs: Catalogs,
    path: Path,
    ledger: EconomyLedger,
    unlocked: BTreeSet<TowerKind>,
    towers: Registry<TowerId, TowerState>,
    enemies: Registry<EnemyId, EnemyState>,
    projectiles: Registry<ProjectileId, ProjectileState>,
    effects: Registry<EffectId, DamageOverTime>,
    drops: Registry<DropId, DropState>,
    abilities: AbilityClock,
    base_health: u32,
    wave: u32,
    elapsed: Duration,
    tick_index: u64,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates a world from validated configuration and catalogs.
    pub fn new(config: WorldConfig, catalogs: Catalogs) -> Result<Self, GameError> {
        config.validate()?;
        let path = PathPlanner::new(config.samples_per_segment).plan(&config.control_points())?;
        let unlocked = catalogs
            .towers
            .iter()
            .filter(|archetype| archetype.unlocked)
            .map(|archetype| archetype.kind)
            .collect();

        Ok(Self {
            ledger: EconomyLedger::new(config.starting_crystals),
            base_health: config.base_health,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            catalogs,
            path,
            unlocked,
            towers: Registry::new(),
            enemies: Registry::new(),
            projectiles: Registry::new(),
            effects: Registry::new(),
            drops: Registry::new(),
            abilities: AbilityClock::default(),
            wave: 0,
            elapsed: Duration::ZERO,
            tick_index: 0,
        })
    }

    fn placement_error(&self, position: Vec2) -> Option<PlacementError> {
        let in_field = position.is_finite()
            && (0.0..=self.config.field_width).contains(&position.x)
            && (0.0..=self.config.field_height).contains(&position.y);
        if !in_field {
            return Some(PlacementError::OutOfBounds);
        }

        if self.path.distance_to(position) < self.config.path_half_width {
            return Some(PlacementError::OnPath);
        }

        let cell = self.config.grid_cell;
        self.towers
            .values()
            .find(|tower| {
                (tower.position.x - position.x).abs() < cell
                    && (tower.position.y - position.y).abs() < cell
            })
            .map(|tower| PlacementError::Overlaps(tower.id))
    }

    /// Applies damage through the single routine shared by every source.
    ///
    /// Damage to a missing or already dead enemy is ignored, so each enemy
    /// dies exactly once.
    fn damage_enemy(
        &mut self,
        enemy: EnemyId,
        amount: f32,
        source: Option<TowerId>,
        out_events: &mut Vec<Event>,
    ) {
        let source = source.filter(|tower| self.towers.get(*tower).is_some());
        let Some(state) = self.enemies.get_mut(enemy) else {
            return;
        };
        if !state.is_active() {
            return;
        }

        let applied = state.take_damage(amount, source);
        let snapshot = state.snapshot();
        if let Some(tower) = source.and_then(|tower| self.towers.get_mut(tower)) {
            tower.record_damage(applied);
        }
        out_events.push(Event::EnemyDamaged {
            enemy: snapshot,
            amount,
            source,
        });
    }

    fn damage_base(&mut self, amount: u32, out_events: &mut Vec<Event>) {
        if self.base_health == 0 {
            return;
        }
        self.base_health = self.base_health.saturating_sub(amount);
        out_events.push(Event::BaseDamaged {
            health: self.base_health,
        });
        if self.base_health == 0 {
            info!("base destroyed during wave {}", self.wave);
            out_events.push(Event::BaseDestroyed);
        }
    }

    fn sweep_dead(&mut self, out_events: &mut Vec<Event>) {
        for id in self.enemies.ids_where(|enemy| !enemy.is_active()) {
            let Some(enemy) = self.enemies.remove(id) else {
                continue;
            };
            let reward = self.catalogs.enemies.get(enemy.kind).reward;
            let multiplier = self.ledger.multiplier();
            self.ledger.earn(Currency::Crystals, f64::from(reward));
            self.ledger
                .earn(Currency::Score, f64::from(reward) * multiplier);

            let killer = enemy
                .last_damage_source
                .filter(|tower| self.towers.get(*tower).is_some());
            debug!("{} {:?} killed by {:?}", enemy.kind, enemy.id, killer);
            out_events.push(Event::EnemyKilled {
                enemy: enemy.snapshot(),
                killer,
                reward,
            });

            if let Some(tower) = killer.and_then(|tower| self.towers.get_mut(tower)) {
                tower.record_kill();
                for level in tower.grant_xp(reward / 2) {
                    info!("tower {:?} reached level {level}", tower.id);
                    out_events.push(Event::TowerLeveledUp {
                        tower: tower.id,
                        level,
                    });
                }
            }

            let loot = roll_loot(enemy.kind, &mut self.rng);
            for (kind, value) in loot.drops {
                let lifetime = self.config.drop_lifetime;
                let drop = self.drops.insert_with(|id| {
                    DropState::new(id, kind, enemy.position, value, lifetime)
                });
                if let Some(state) = self.drops.get(drop) {
                    out_events.push(Event::ResourceDropped {
                        drop: state.snapshot(),
                    });
                }
            }
            if loot.tech_point {
                self.ledger.earn(Currency::TechPoints, 1.0);
                out_events.push(Event::TechPointAwarded {
                    total: self.ledger.balance(Currency::TechPoints),
                });
            }
        }

        self.projectiles.retain(|projectile| projectile.active);
        let enemies = &self.enemies;
        self.effects.retain(|effect| {
            !effect.is_finished()
                && enemies
                    .get(effect.target)
                    .is_some_and(EnemyState::is_active)
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands return an error and leave the world untouched.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), GameError> {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.elapsed = world.elapsed.saturating_add(dt);
            let seconds = dt.as_secs_f32();
            world.abilities.advance(seconds);
            for tower in world.towers.values_mut() {
                // At most one tick of overshoot carries into the next volley.
                tower.ready_in = (tower.ready_in - seconds).max(-seconds);
            }
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::PlaceTower { kind, position } => {
            if !world.unlocked.contains(&kind) {
                return Err(GameError::TowerLocked { kind });
            }
            if let Some(reason) = world.placement_error(position) {
                return Err(GameError::InvalidPlacement { position, reason });
            }

            let archetype = world.catalogs.towers.get(kind);
            world
                .ledger
                .spend(&Cost::crystals(f64::from(archetype.cost)))?;
            let id = world
                .towers
                .insert_with(|id| TowerState::new(id, archetype, position));
            if let Some(tower) = world.towers.get(id) {
                info!("placed {kind} tower {id:?} at {position}");
                out_events.push(Event::TowerPlaced {
                    tower: tower.snapshot(world.abilities.fire_rate_scale()),
                });
            }
        }
        Command::UpgradeTower { tower } => {
            let cost = world
                .towers
                .get(tower)
                .map(TowerState::upgrade_cost)
                .ok_or(GameError::UnknownTower { tower })?;
            world.ledger.spend(&cost)?;
            let scale = world.abilities.fire_rate_scale();
            if let Some(state) = world.towers.get_mut(tower) {
                state.apply_upgrade();
                info!("upgraded tower {tower:?}");
                out_events.push(Event::TowerUpgraded {
                    tower: state.snapshot(scale),
                });
            }
        }
        Command::SellTower { tower } => {
            let state = world
                .towers
                .remove(tower)
                .ok_or(GameError::UnknownTower { tower })?;
            let refund = state.refund();
            world.ledger.earn(Currency::Crystals, f64::from(refund));
            info!("sold tower {tower:?} for {refund} crystals");
            out_events.push(Event::TowerSold {
                tower: state.snapshot(world.abilities.fire_rate_scale()),
                refund,
            });
        }
        Command::UnlockTower { kind } => {
            if world.unlocked.contains(&kind) {
                return Err(GameError::AlreadyUnlocked { kind });
            }
            world
                .ledger
                .spend(&world.catalogs.towers.get(kind).unlock_cost)?;
            let _ = world.unlocked.insert(kind);
            info!("unlocked {kind} towers");
            out_events.push(Event::TowerUnlocked { kind });
        }
        Command::SpendSkillPoint { tower, skill } => {
            let state = world
                .towers
                .get_mut(tower)
                .ok_or(GameError::UnknownTower { tower })?;
            let level = state.spend_skill_point(skill)?;
            out_events.push(Event::SkillUpgraded {
                tower,
                skill,
                level,
            });
        }
        Command::ActivateAbility { ability } => {
            world.abilities.activate(ability)?;
            info!("activated {ability}");
            out_events.push(Event::AbilityActivated { ability });
            match ability {
                GlobalAbility::Freeze => {
                    for enemy in world.enemies.values_mut() {
                        if enemy.is_active() {
                            enemy.slow(FREEZE_SLOW_EFFECT, ability.duration_secs());
                        }
                    }
                }
                GlobalAbility::Bomb => {
                    for enemy in world.enemies.ids_where(EnemyState::is_active) {
                        world.damage_enemy(enemy, BOMB_DAMAGE, None, out_events);
                    }
                }
                GlobalAbility::Boost => {}
            }
        }
        Command::CollectDrops { position } => {
            let radius = world.config.pickup_radius;
            for id in world
                .drops
                .ids_where(|drop| drop.position.distance(position) <= radius)
            {
                if let Some(drop) = world.drops.remove(id) {
                    world.ledger.earn(drop.kind.currency(), drop.value);
                    out_events.push(Event::ResourceCollected {
                        drop: drop.snapshot(),
                    });
                }
            }
        }
        Command::StartWave { wave, enemies } => {
            world.wave = wave;
            info!("wave {wave} started with {enemies} enemies");
            out_events.push(Event::WaveStarted { wave, enemies });
        }
        Command::SpawnEnemy { kind } => {
            let archetype = world.catalogs.enemies.get(kind);
            let path = &world.path;
            let id = world
                .enemies
                .insert_with(|id| EnemyState::new(id, archetype, path));
            if let Some(enemy) = world.enemies.get(id) {
                debug!("spawned {kind} {id:?}");
                out_events.push(Event::EnemySpawned {
                    enemy: enemy.snapshot(),
                });
            }
        }
        Command::CompleteWave { wave } => {
            let bonus = wave.saturating_mul(WAVE_BONUS_PER_WAVE);
            world.ledger.earn(Currency::Crystals, f64::from(bonus));
            world.ledger.earn(
                Currency::Score,
                f64::from(bonus) * f64::from(WAVE_SCORE_FACTOR),
            );
            info!("wave {wave} cleared, bonus {bonus} crystals");
            out_events.push(Event::WaveCompleted { wave, bonus });
        }
        Command::SetTowerTarget { tower, enemy } => {
            if let Some(state) = world.towers.get_mut(tower) {
                state.target = enemy;
            }
        }
        Command::FireVolley { tower, targets } => {
            let scale = world.abilities.fire_rate_scale();
            let Some(state) = world.towers.get_mut(tower) else {
                return Ok(());
            };
            if state.ready_in > 0.0 {
                return Ok(());
            }

            let snapshot = state.snapshot(scale);
            let mut fired = false;
            for target in targets {
                if !world
                    .enemies
                    .get(target)
                    .is_some_and(EnemyState::is_active)
                {
                    continue;
                }
                let projectile = world.projectiles.insert_with(|id| {
                    ProjectileState::new(
                        id,
                        tower,
                        target,
                        snapshot.position,
                        snapshot.damage,
                        snapshot.projectile_speed,
                    )
                });
                if let Some(launched) = world.projectiles.get(projectile) {
                    out_events.push(Event::ProjectileFired {
                        projectile: launched.snapshot(),
                    });
                }
                fired = true;
            }
            if fired {
                state.ready_in = (state.ready_in + snapshot.fire_rate).max(0.0);
            }
        }
        Command::AdvanceEnemies { dt } => {
            let seconds = dt.as_secs_f32();
            let path = &world.path;
            let mut escaped = Vec::new();
            for enemy in world.enemies.values_mut() {
                if enemy.is_active() && enemy.advance(path, seconds) {
                    escaped.push(enemy.id);
                }
            }

            for id in escaped {
                let Some(enemy) = world.enemies.remove(id) else {
                    continue;
                };
                debug!("{} {:?} escaped", enemy.kind, enemy.id);
                let damage = world.catalogs.enemies.get(enemy.kind).base_damage;
                out_events.push(Event::EnemyEscaped {
                    enemy: enemy.snapshot(),
                });
                world.damage_base(damage, out_events);
            }
        }
        Command::AdvanceProjectiles { dt } => {
            let seconds = dt.as_secs_f32();
            let enemies = &world.enemies;
            for projectile in world.projectiles.values_mut() {
                if !projectile.active {
                    continue;
                }
                let Some(enemy) = enemies
                    .get(projectile.target)
                    .filter(|enemy| enemy.is_active())
                else {
                    projectile.active = false;
                    continue;
                };
                if projectile.advance_toward(enemy.position, seconds) {
                    out_events.push(Event::ProjectileHit {
                        projectile: projectile.snapshot(),
                        enemy: enemy.id,
                        impact: enemy.position,
                    });
                }
            }
        }
        Command::AdvanceEffects { dt } => {
            let seconds = dt.as_secs_f32();
            let mut due = Vec::new();
            for effect in world.effects.values_mut() {
                let ticks = effect.advance(seconds);
                if ticks > 0 {
                    due.push((effect.target, effect.damage_per_tick, effect.source, ticks));
                }
            }
            for (enemy, damage, source, ticks) in due {
                for _ in 0..ticks {
                    world.damage_enemy(enemy, damage, source, out_events);
                }
            }
        }
        Command::AdvanceDrops { dt } => {
            let seconds = dt.as_secs_f32();
            world.drops.retain(|drop| drop.age(seconds));
        }
        Command::DamageEnemy {
            enemy,
            amount,
            source,
        } => world.damage_enemy(enemy, amount, source, out_events),
        Command::SlowEnemy {
            enemy,
            effect,
            duration,
        } => {
            if let Some(state) = world.enemies.get_mut(enemy) {
                if state.is_active() {
                    state.slow(effect, duration);
                }
            }
        }
        Command::AttachDamageOverTime {
            enemy,
            damage_per_tick,
            duration,
            source,
        } => {
            if world
                .enemies
                .get(enemy)
                .is_some_and(EnemyState::is_active)
            {
                let effect = world.effects.insert_with(|_| {
                    DamageOverTime::new(enemy, damage_per_tick, duration, source)
                });
                debug!("attached damage over time {effect:?} to {enemy:?}");
            }
        }
        Command::RetargetProjectile {
            projectile,
            enemy,
            damage,
        } => {
            if let Some(state) = world.projectiles.get_mut(projectile) {
                state.retarget(enemy, damage);
            }
        }
        Command::SweepDead => world.sweep_dead(out_events),
    }
    Ok(())
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use crystal_defence_catalog::Catalogs;
    use crystal_defence_core::{
        DropSnapshot, EnemyView, GlobalAbility, ProjectileSnapshot, TowerId, TowerKind,
        TowerSnapshot, TowerView,
    };

    use super::{EconomyLedger, Path, TimedEffect, World, WorldConfig};
    use crate::{drops::DropState, enemies::EnemyState, projectiles::ProjectileState};

    /// Configuration the world was built from.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Catalogs the world resolves archetypes from.
    #[must_use]
    pub fn catalogs(world: &World) -> &Catalogs {
        &world.catalogs
    }

    /// Provides read-only access to the currency balances.
    #[must_use]
    pub fn ledger(world: &World) -> &EconomyLedger {
        &world.ledger
    }

    /// Polyline followed by every enemy.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Captures a read-only view of every tower, including active boosts.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let scale = world.abilities.fire_rate_scale();
        TowerView::from_snapshots(
            world
                .towers
                .values()
                .map(|tower| tower.snapshot(scale))
                .collect(),
        )
    }

    /// Snapshot of a single tower.
    #[must_use]
    pub fn tower(world: &World, tower: TowerId) -> Option<TowerSnapshot> {
        let scale = world.abilities.fire_rate_scale();
        world.towers.get(tower).map(|state| state.snapshot(scale))
    }

    /// Identifier the next placed tower will receive.
    #[must_use]
    pub fn next_tower_id(world: &World) -> TowerId {
        world.towers.next_id()
    }

    /// Crystals a tower would return if sold now.
    #[must_use]
    pub fn sell_refund(world: &World, tower: TowerId) -> Option<u32> {
        world.towers.get(tower).map(|state| state.refund())
    }

    /// Captures a read-only view of every enemy, including unswept dead ones.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.values().map(EnemyState::snapshot).collect())
    }

    /// Snapshots of every projectile in flight.
    #[must_use]
    pub fn projectiles(world: &World) -> Vec<ProjectileSnapshot> {
        world
            .projectiles
            .values()
            .filter(|projectile| projectile.active)
            .map(ProjectileState::snapshot)
            .collect()
    }

    /// Snapshots of every collectible drop.
    #[must_use]
    pub fn drops(world: &World) -> Vec<DropSnapshot> {
        world.drops.values().map(DropState::snapshot).collect()
    }

    /// Number of damage-over-time effects still registered.
    #[must_use]
    pub fn damage_over_time_count(world: &World) -> usize {
        world.effects.len()
    }

    /// Reports whether towers of the archetype may be placed.
    #[must_use]
    pub fn is_unlocked(world: &World, kind: TowerKind) -> bool {
        world.unlocked.contains(&kind)
    }

    /// Seconds until the ability may be activated again.
    #[must_use]
    pub fn ability_cooldown(world: &World, ability: GlobalAbility) -> f32 {
        world.abilities.cooldown(ability)
    }

    /// Global ability effects currently in force.
    #[must_use]
    pub fn timed_effects(world: &World) -> &[TimedEffect] {
        world.abilities.effects()
    }

    /// Remaining base health.
    #[must_use]
    pub fn base_health(world: &World) -> u32 {
        world.base_health
    }

    /// Reports whether escaping enemies destroyed the base.
    #[must_use]
    pub fn is_base_destroyed(world: &World) -> bool {
        world.base_health == 0
    }

    /// Most recently started wave, zero before the first wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Total simulated time.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }
}
