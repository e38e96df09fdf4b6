use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use crystal_defence_catalog::Catalogs;
use crystal_defence_core::{Command, EnemyId, EnemyKind, Event, TowerId, TowerKind, Vec2};
use crystal_defence_system_tower_targeting::TowerTargeting;
use crystal_defence_world::{self as world, query, World, WorldConfig};

#[test]
fn deterministic_replay_keeps_targets_until_they_leave_range() {
    let first = replay(scripted_commands());
    let second = replay(scripted_commands());

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());

    let spawned: Vec<EnemyId> = first
        .events
        .iter()
        .filter_map(|event| match event {
            EventRecord::EnemySpawned { enemy } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(spawned.len(), 2, "expected exactly two spawn events");

    let after_first_spawn = &first.assignments[1];
    assert_eq!(after_first_spawn.targets, vec![(TowerId::new(0), Some(spawned[0]))]);

    let after_second_spawn = &first.assignments[2];
    assert_eq!(
        after_second_spawn.targets,
        vec![(TowerId::new(0), Some(spawned[0]))],
        "the first enemy keeps the tower's attention"
    );

    let last = first.assignments.last().expect("assignments recorded");
    assert!(
        last.targets.iter().all(|(_, enemy)| *enemy != Some(spawned[0])),
        "the lead enemy walked out of range"
    );
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = World::new(
        WorldConfig::default(),
        Catalogs::builtin().expect("builtin catalogs"),
    )
    .expect("default world");
    let mut targeting = TowerTargeting::new();
    let mut assignments = Vec::new();
    let mut events = Vec::new();

    for command in commands {
        let mut generated = Vec::new();
        world::apply(&mut world, command, &mut generated).expect("scripted command accepted");
        events.extend(generated.into_iter().filter_map(EventRecord::from_event));

        let mut retargets = Vec::new();
        targeting.handle(
            &query::tower_view(&world),
            &query::enemy_view(&world),
            &mut retargets,
        );
        for retarget in retargets {
            let mut ignored = Vec::new();
            world::apply(&mut world, retarget, &mut ignored).expect("targets accepted");
        }

        assignments.push(TargetSnapshot {
            targets: query::tower_view(&world)
                .iter()
                .map(|tower| (tower.id, tower.target))
                .collect(),
        });
    }

    ReplayOutcome {
        events,
        assignments,
    }
}

fn scripted_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::PlaceTower {
            kind: TowerKind::Laser,
            position: Vec2::new(100.0, 360.0),
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Scout,
        },
        Command::SpawnEnemy {
            kind: EnemyKind::Fighter,
        },
    ];
    commands.extend((0..80).map(|_| Command::AdvanceEnemies {
        dt: Duration::from_millis(100),
    }));
    commands
}

#[derive(Debug, PartialEq)]
struct ReplayOutcome {
    events: Vec<EventRecord>,
    assignments: Vec<TargetSnapshot>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.events.hash(&mut hasher);
        self.assignments.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    TowerPlaced { tower: TowerId },
    EnemySpawned { enemy: EnemyId },
    EnemyEscaped { enemy: EnemyId },
}

impl EventRecord {
    fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::TowerPlaced { tower } => Some(Self::TowerPlaced { tower: tower.id }),
            Event::EnemySpawned { enemy } => Some(Self::EnemySpawned { enemy: enemy.id }),
            Event::EnemyEscaped { enemy } => Some(Self::EnemyEscaped { enemy: enemy.id }),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TargetSnapshot {
    targets: Vec<(TowerId, Option<EnemyId>)>,
}
