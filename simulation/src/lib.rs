#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick orchestrator that owns the world and its systems.
//!
//! [`Simulation`] is the external interface of the engine: adapters place and
//! manage towers, trigger abilities and advance time through it, then drain
//! the events it accumulated. Each call to [`Simulation::step`] runs the
//! systems in a fixed phase order so that no entity is mutated by two phases.

use std::{collections::BTreeMap, time::Duration};

use crystal_defence_catalog::Catalogs;
use crystal_defence_core::{
    Command, Currency, Event, GameError, GlobalAbility, Skill, TowerId, TowerKind, Vec2,
    MAX_TICK,
};
use crystal_defence_system_tower_combat::{resolve_hit, TowerCombat};
use crystal_defence_system_tower_targeting::TowerTargeting;
use crystal_defence_system_waves::{WaveConfig, WaveDirector};
use crystal_defence_world::{self as world, query, World, WorldConfig};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Configuration of a complete simulation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Field, path and economy parameters.
    pub world: WorldConfig,
    /// Wave pacing and enemy selection seed.
    pub waves: WaveConfig,
}

/// Aggregate outcome of a run, suitable for reporting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Summary {
    /// Most recently started wave.
    pub wave: u32,
    /// Simulated seconds elapsed.
    pub elapsed_secs: f64,
    /// Every currency balance.
    pub balances: BTreeMap<Currency, f64>,
    /// Towers currently standing.
    pub towers: usize,
    /// Enemies killed so far.
    pub kills: u32,
    /// Enemies that reached the end of the path.
    pub escapes: u32,
    /// Remaining base health.
    pub base_health: u32,
    /// Indicates whether the run ended with the base destroyed.
    pub base_destroyed: bool,
}

/// Owns the world and drives its systems one tick at a time.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    director: WaveDirector,
    targeting: TowerTargeting,
    combat: TowerCombat,
    events: Vec<Event>,
    commands: Vec<Command>,
    kills: u32,
    escapes: u32,
}

impl Simulation {
    /// Builds a simulation backed by the built-in catalogs.
    pub fn new(config: SimulationConfig) -> Result<Self, GameError> {
        Self::with_catalogs(config, Catalogs::builtin()?)
    }

    /// Builds a simulation backed by the provided catalogs.
    pub fn with_catalogs(config: SimulationConfig, catalogs: Catalogs) -> Result<Self, GameError> {
        let world = World::new(config.world, catalogs)?;
        info!(
            "simulation ready: {} path samples, base health {}, wave seed {}",
            query::path(&world).points().len(),
            query::base_health(&world),
            config.waves.seed
        );
        Ok(Self {
            world,
            director: WaveDirector::new(&config.waves),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            events: Vec::new(),
            commands: Vec::new(),
            kills: 0,
            escapes: 0,
        })
    }

    /// Read-only access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Director pacing the waves.
    #[must_use]
    pub fn director(&self) -> &WaveDirector {
        &self.director
    }

    /// Advances the simulation by `dt`, capped at [`MAX_TICK`].
    ///
    /// Once the base is destroyed the simulation is frozen and further steps
    /// do nothing.
    pub fn step(&mut self, dt: Duration) {
        if query::is_base_destroyed(&self.world) {
            return;
        }
        let dt = dt.min(MAX_TICK);
        let first_event = self.events.len();

        let mut tick_events = Vec::new();
        self.execute(Command::Tick { dt }, &mut tick_events);
        self.director.handle(
            &tick_events,
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.events.append(&mut tick_events);
        self.flush();

        self.targeting.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.flush();

        self.combat.handle(
            &query::tower_view(&self.world),
            &query::enemy_view(&self.world),
            &mut self.commands,
        );
        self.flush();

        self.execute_logged(Command::AdvanceEnemies { dt });

        let mut hits = Vec::new();
        self.execute(Command::AdvanceProjectiles { dt }, &mut hits);
        for event in hits.drain(..) {
            // Each hit sees the damage dealt by the hits resolved before it.
            if let Event::ProjectileHit {
                ref projectile,
                enemy,
                impact,
            } = event
            {
                resolve_hit(
                    projectile,
                    enemy,
                    impact,
                    &query::tower_view(&self.world),
                    &query::enemy_view(&self.world),
                    &mut self.commands,
                );
            }
            self.events.push(event);
            self.flush();
        }

        self.execute_logged(Command::AdvanceEffects { dt });
        self.execute_logged(Command::AdvanceDrops { dt });
        self.execute_logged(Command::SweepDead);

        self.tally(first_event);
    }

    /// Places a tower and returns its identifier.
    pub fn place_tower(&mut self, kind: TowerKind, position: Vec2) -> Result<TowerId, GameError> {
        let tower = query::next_tower_id(&self.world);
        self.apply(Command::PlaceTower { kind, position })?;
        Ok(tower)
    }

    /// Applies a generic upgrade to a tower.
    pub fn upgrade_tower(&mut self, tower: TowerId) -> Result<(), GameError> {
        self.apply(Command::UpgradeTower { tower })
    }

    /// Sells a tower and returns the crystals refunded.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<u32, GameError> {
        let Some(refund) = query::sell_refund(&self.world, tower) else {
            warn!("sell tower rejected: unknown tower {tower:?}");
            return Err(GameError::UnknownTower { tower });
        };
        self.apply(Command::SellTower { tower })?;
        Ok(refund)
    }

    /// Activates a global ability.
    pub fn activate_ability(&mut self, ability: GlobalAbility) -> Result<(), GameError> {
        self.apply(Command::ActivateAbility { ability })
    }

    /// Unlocks a tower archetype.
    pub fn unlock_tower(&mut self, kind: TowerKind) -> Result<(), GameError> {
        self.apply(Command::UnlockTower { kind })
    }

    /// Spends one of a tower's skill points.
    pub fn spend_skill_point(&mut self, tower: TowerId, skill: Skill) -> Result<(), GameError> {
        self.apply(Command::SpendSkillPoint { tower, skill })
    }

    /// Collects every drop within pickup range and returns how many were
    /// collected.
    pub fn collect_at(&mut self, position: Vec2) -> Result<usize, GameError> {
        let first_event = self.events.len();
        self.apply(Command::CollectDrops { position })?;
        Ok(self.events[first_event..]
            .iter()
            .filter(|event| matches!(event, Event::ResourceCollected { .. }))
            .count())
    }

    /// Starts the first wave; later waves follow automatically.
    pub fn start_waves(&mut self) -> Result<(), GameError> {
        self.director
            .start(&mut self.commands)
            .inspect_err(|error| warn!("start waves rejected: {error}"))?;
        self.flush();
        Ok(())
    }

    /// Applies a scripted command, logging and returning any rejection.
    pub fn apply(&mut self, command: Command) -> Result<(), GameError> {
        let label = command_label(&command);
        world::apply(&mut self.world, command, &mut self.events)
            .inspect_err(|error| warn!("{label} rejected: {error}"))
    }

    /// Removes and returns every event accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Aggregates the current state of the run.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            wave: query::wave(&self.world),
            elapsed_secs: query::elapsed(&self.world).as_secs_f64(),
            balances: query::ledger(&self.world).snapshot(),
            towers: query::tower_view(&self.world).len(),
            kills: self.kills,
            escapes: self.escapes,
            base_health: query::base_health(&self.world),
            base_destroyed: query::is_base_destroyed(&self.world),
        }
    }

    fn execute(&mut self, command: Command, out: &mut Vec<Event>) {
        let label = command_label(&command);
        if let Err(error) = world::apply(&mut self.world, command, out) {
            warn!("{label} rejected during step: {error}");
        }
    }

    fn execute_logged(&mut self, command: Command) {
        let mut events = Vec::new();
        self.execute(command, &mut events);
        self.events.append(&mut events);
    }

    fn flush(&mut self) {
        for command in std::mem::take(&mut self.commands) {
            self.execute_logged(command);
        }
    }

    fn tally(&mut self, first_event: usize) {
        for event in &self.events[first_event..] {
            match event {
                Event::EnemyKilled { .. } => self.kills += 1,
                Event::EnemyEscaped { .. } => self.escapes += 1,
                _ => {}
            }
        }
    }
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Tick { .. } => "tick",
        Command::PlaceTower { .. } => "place tower",
        Command::UpgradeTower { .. } => "upgrade tower",
        Command::SellTower { .. } => "sell tower",
        Command::UnlockTower { .. } => "unlock tower",
        Command::SpendSkillPoint { .. } => "spend skill point",
        Command::ActivateAbility { .. } => "activate ability",
        Command::CollectDrops { .. } => "collect drops",
        Command::StartWave { .. } => "start wave",
        Command::SpawnEnemy { .. } => "spawn enemy",
        Command::CompleteWave { .. } => "complete wave",
        Command::SetTowerTarget { .. } => "set tower target",
        Command::FireVolley { .. } => "fire volley",
        Command::AdvanceEnemies { .. } => "advance enemies",
        Command::AdvanceProjectiles { .. } => "advance projectiles",
        Command::AdvanceEffects { .. } => "advance effects",
        Command::AdvanceDrops { .. } => "advance drops",
        Command::DamageEnemy { .. } => "damage enemy",
        Command::SlowEnemy { .. } => "slow enemy",
        Command::AttachDamageOverTime { .. } => "attach damage over time",
        Command::RetargetProjectile { .. } => "retarget projectile",
        Command::SweepDead => "sweep dead",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_defence_core::{PlacementError, WavePhase};

    fn simulation() -> Simulation {
        Simulation::new(SimulationConfig::default()).expect("default simulation")
    }

    #[test]
    fn oversized_steps_are_capped() {
        let mut simulation = simulation();
        simulation.step(Duration::from_secs(2));
        assert_eq!(query::elapsed(simulation.world()), MAX_TICK);
        assert_eq!(
            simulation.drain_events(),
            vec![Event::TimeAdvanced { dt: MAX_TICK }]
        );
        assert!(simulation.drain_events().is_empty());
    }

    #[test]
    fn place_tower_returns_the_new_identifier() {
        let mut simulation = simulation();
        let first = simulation
            .place_tower(TowerKind::Laser, Vec2::new(100.0, 360.0))
            .expect("valid placement");
        let second = simulation
            .place_tower(TowerKind::Laser, Vec2::new(100.0, 420.0))
            .expect("valid placement");
        assert_ne!(first, second);
        assert!(query::tower(simulation.world(), second).is_some());
    }

    #[test]
    fn rejected_placement_changes_nothing() {
        let mut simulation = simulation();
        let error = simulation
            .place_tower(TowerKind::Laser, Vec2::new(100.0, 300.0))
            .expect_err("on the path");
        assert_eq!(
            error,
            GameError::InvalidPlacement {
                position: Vec2::new(100.0, 300.0),
                reason: PlacementError::OnPath,
            }
        );
        assert_eq!(simulation.summary().balances[&Currency::Crystals], 1_000.0);
        assert!(simulation.drain_events().is_empty());
    }

    #[test]
    fn sell_reports_refund_and_unknown_towers() {
        let mut simulation = simulation();
        let tower = simulation
            .place_tower(TowerKind::Plasma, Vec2::new(100.0, 360.0))
            .expect("valid placement");
        assert_eq!(simulation.sell_tower(tower), Ok(105));
        assert_eq!(
            simulation.sell_tower(tower),
            Err(GameError::UnknownTower { tower })
        );
        assert_eq!(simulation.summary().balances[&Currency::Crystals], 955.0);
    }

    #[test]
    fn waves_start_once() {
        let mut simulation = simulation();
        simulation.start_waves().expect("first start");
        assert_eq!(simulation.director().phase(), WavePhase::Spawning);
        assert_eq!(query::wave(simulation.world()), 1);
        assert_eq!(
            simulation.start_waves(),
            Err(GameError::WavesAlreadyStarted)
        );

        simulation.step(Duration::from_millis(16));
        let spawned = simulation
            .drain_events()
            .into_iter()
            .filter(|event| matches!(event, Event::EnemySpawned { .. }))
            .count();
        assert_eq!(spawned, 1);
    }

    #[test]
    fn summary_serializes_balances_by_name() {
        let simulation = simulation();
        let json = serde_json::to_value(simulation.summary()).expect("serialize");
        assert_eq!(json["balances"]["crystals"], 1_000.0);
        assert_eq!(json["wave"], 0);
        assert_eq!(json["base_destroyed"], false);
    }

    #[test]
    fn config_parses_nested_tables() {
        let config: SimulationConfig = toml::from_str(
            r#"
            [world]
            starting_crystals = 250.0

            [waves]
            spawn_interval_ms = 500
            "#,
        )
        .expect("parse");
        assert_eq!(config.world.starting_crystals, 250.0);
        assert_eq!(config.world.base_health, 20);
        assert_eq!(config.waves.spawn_interval_ms, 500);
        assert_eq!(config.waves.reward_delay_ms, 5_000);
    }
}
