use std::time::Duration;

use crystal_defence_catalog::Catalogs;
use crystal_defence_core::{Command, Currency, EnemyKind, Event, WavePhase};
use crystal_defence_system_waves::{WaveConfig, WaveDirector};
use crystal_defence_world::{self as world, query, World, WorldConfig};

const TICK: Duration = Duration::from_millis(100);

fn apply(world: &mut World, command: Command, log: &mut Vec<Event>) {
    world::apply(world, command, log).expect("command accepted");
}

#[test]
fn undefended_first_wave_escapes_and_is_still_rewarded() {
    let mut world = World::new(
        WorldConfig::default(),
        Catalogs::builtin().expect("builtin catalogs"),
    )
    .expect("default world");
    let mut director = WaveDirector::new(&WaveConfig::default());
    let mut log = Vec::new();

    let mut commands = Vec::new();
    director.start(&mut commands).expect("start waves");
    for command in commands.drain(..) {
        apply(&mut world, command, &mut log);
    }
    assert_eq!(query::wave(&world), 1);

    for _ in 0..400 {
        let mut tick_events = Vec::new();
        apply(&mut world, Command::Tick { dt: TICK }, &mut tick_events);
        director.handle(&tick_events, &query::enemy_view(&world), &mut commands);
        log.append(&mut tick_events);

        for command in commands.drain(..) {
            apply(&mut world, command, &mut log);
        }
        apply(&mut world, Command::AdvanceEnemies { dt: TICK }, &mut log);
        apply(&mut world, Command::SweepDead, &mut log);
    }

    let first_wave_kinds: Vec<EnemyKind> = log
        .iter()
        .filter_map(|event| match event {
            Event::EnemySpawned { enemy } => Some(enemy.kind),
            _ => None,
        })
        .take(7)
        .collect();
    assert_eq!(first_wave_kinds, vec![EnemyKind::Scout; 7]);

    let escapes = log
        .iter()
        .filter(|event| matches!(event, Event::EnemyEscaped { .. }))
        .count();
    assert_eq!(escapes, 7);
    assert_eq!(query::base_health(&world), 13);

    assert!(log.contains(&Event::WaveCompleted { wave: 1, bonus: 50 }));
    assert!(log.contains(&Event::WaveStarted { wave: 2, enemies: 9 }));
    assert_eq!(query::ledger(&world).balance(Currency::Crystals), 1_050.0);
    assert_eq!(query::ledger(&world).balance(Currency::Score), 500.0);

    assert_eq!(director.wave(), 2);
    assert_eq!(director.phase(), WavePhase::Spawning);
}
