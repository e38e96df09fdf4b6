use std::time::Duration;

use crystal_defence_core::{
    Command, Currency, EnemyKind, Event, GameError, GlobalAbility, Skill, TowerKind, Vec2,
};
use crystal_defence_simulation::{Simulation, SimulationConfig};
use crystal_defence_world::query;

const FRAME: Duration = Duration::from_millis(100);

fn simulation() -> Simulation {
    Simulation::new(SimulationConfig::default()).expect("default simulation")
}

fn spawn(simulation: &mut Simulation, kind: EnemyKind) {
    simulation
        .apply(Command::SpawnEnemy { kind })
        .expect("spawn enemy");
}

#[test]
fn bomb_kills_weak_enemies_without_crediting_a_tower() {
    let mut simulation = simulation();
    spawn(&mut simulation, EnemyKind::Scout);
    spawn(&mut simulation, EnemyKind::Scout);
    spawn(&mut simulation, EnemyKind::Tank);

    simulation
        .activate_ability(GlobalAbility::Bomb)
        .expect("bomb ready");
    assert_eq!(
        simulation.activate_ability(GlobalAbility::Bomb),
        Err(GameError::OnCooldown {
            ability: GlobalAbility::Bomb,
            remaining: 15.0,
        })
    );

    simulation.step(FRAME);
    let events = simulation.drain_events();
    let killers: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            Event::EnemyKilled { killer, .. } => Some(*killer),
            _ => None,
        })
        .collect();
    assert_eq!(killers, vec![None, None]);

    let summary = simulation.summary();
    assert_eq!(summary.kills, 2);
    assert_eq!(summary.balances[&Currency::Crystals], 1_020.0);
    assert_eq!(summary.balances[&Currency::Score], 20.0);

    let enemies = query::enemy_view(simulation.world());
    let tank = enemies.iter().next().expect("tank survives");
    assert_eq!(tank.kind, EnemyKind::Tank);
    assert_eq!(tank.health, 200.0);
}

#[test]
fn freeze_and_boost_apply_timed_effects() {
    let mut simulation = simulation();
    let tower = simulation
        .place_tower(TowerKind::Laser, Vec2::new(100.0, 360.0))
        .expect("valid placement");
    spawn(&mut simulation, EnemyKind::Tank);

    simulation
        .activate_ability(GlobalAbility::Freeze)
        .expect("freeze ready");
    simulation
        .activate_ability(GlobalAbility::Boost)
        .expect("boost ready");

    let enemies = query::enemy_view(simulation.world());
    let tank = enemies.iter().next().expect("tank present");
    assert!(tank.slowed);
    assert_eq!(tank.slow_remaining, 3.0);

    let boosted = query::tower(simulation.world(), tower).expect("tower present");
    assert_eq!(boosted.fire_rate, 0.5);

    for _ in 0..60 {
        simulation.step(FRAME);
    }
    let restored = query::tower(simulation.world(), tower).expect("tower present");
    assert_eq!(restored.fire_rate, 1.0, "boost lasts five seconds");
    assert!(query::timed_effects(simulation.world()).is_empty());
}

#[test]
fn boss_always_leaves_a_core_to_collect() {
    let mut simulation = simulation();
    spawn(&mut simulation, EnemyKind::Boss);
    simulation
        .apply(Command::DamageEnemy {
            enemy: query::enemy_view(simulation.world())
                .iter()
                .next()
                .expect("boss present")
                .id,
            amount: 5_000.0,
            source: None,
        })
        .expect("damage accepted");
    simulation.step(FRAME);

    assert_eq!(simulation.collect_at(Vec2::new(500.0, 500.0)), Ok(0));
    let collected = simulation
        .collect_at(Vec2::new(0.0, 300.0))
        .expect("collection never fails");
    assert!(collected >= 1);
    assert_eq!(simulation.summary().balances[&Currency::Cores], 1.0);
    assert!(query::drops(simulation.world()).is_empty());
}

#[test]
fn progression_commands_report_their_preconditions() {
    let mut simulation = simulation();
    assert_eq!(
        simulation.unlock_tower(TowerKind::Tesla),
        Err(GameError::InsufficientFunds {
            currency: Currency::TechPoints,
            required: 1.0,
            available: 0.0,
        })
    );
    assert_eq!(
        simulation.place_tower(TowerKind::Tesla, Vec2::new(100.0, 360.0)),
        Err(GameError::TowerLocked {
            kind: TowerKind::Tesla
        })
    );

    let tower = simulation
        .place_tower(TowerKind::Laser, Vec2::new(100.0, 360.0))
        .expect("valid placement");
    assert_eq!(
        simulation.spend_skill_point(tower, Skill::Damage),
        Err(GameError::NoSkillPoints { tower })
    );

    simulation.upgrade_tower(tower).expect("affordable upgrade");
    let upgraded = query::tower(simulation.world(), tower).expect("tower present");
    assert_eq!(upgraded.upgrade_level, 2);
    assert_eq!(simulation.summary().balances[&Currency::Crystals], 800.0);
    assert_eq!(simulation.sell_tower(tower), Ok(140));
}

#[test]
fn destroyed_base_freezes_the_run() {
    let mut config = SimulationConfig::default();
    config.world.base_health = 1;
    let mut simulation = Simulation::new(config).expect("simulation");
    spawn(&mut simulation, EnemyKind::Speedster);

    for _ in 0..200 {
        simulation.step(FRAME);
    }
    let summary = simulation.summary();
    assert!(summary.base_destroyed);
    assert_eq!(summary.escapes, 1);
    assert_eq!(summary.base_health, 0);

    let destroyed = simulation
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, Event::BaseDestroyed))
        .count();
    assert_eq!(destroyed, 1);

    let elapsed = query::elapsed(simulation.world());
    simulation.step(FRAME);
    assert_eq!(query::elapsed(simulation.world()), elapsed);
    assert!(simulation.drain_events().is_empty());
}
