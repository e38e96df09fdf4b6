#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.

use crystal_defence_core::{
    Command, EnemyId, EnemySnapshot, EnemyView, TowerSnapshot, TowerTarget, TowerView,
};

/// Selects the nearest active enemy strictly inside the tower's range.
///
/// Ties are broken by ascending enemy identifier, which is the registry
/// iteration order of the view.
#[must_use]
pub fn acquire_target(tower: &TowerSnapshot, enemies: &EnemyView) -> Option<EnemyId> {
    let mut best: Option<(f32, EnemyId)> = None;
    for enemy in enemies.active() {
        let distance = tower.position.distance(enemy.position);
        if distance >= tower.range {
            continue;
        }
        match best {
            Some((closest, _)) if closest <= distance => {}
            _ => best = Some((distance, enemy.id)),
        }
    }
    best.map(|(_, enemy)| enemy)
}

/// Reports whether a tower may keep its current target.
fn keeps_target(tower: &TowerSnapshot, current: Option<&EnemySnapshot>) -> bool {
    current.is_some_and(|enemy| tower.position.distance(enemy.position) < tower.range)
}

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    assignments: Vec<TowerTarget>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::SetTowerTarget` for every tower whose target changes.
    ///
    /// Re-acquisition is lazy: a tower keeps its target while the enemy is
    /// active and still in range.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<Command>) {
        self.assignments.clear();

        for tower in towers.iter() {
            let current = tower.target.and_then(|enemy| enemies.get_active(enemy));
            if keeps_target(tower, current) {
                continue;
            }

            let enemy = acquire_target(tower, enemies);
            if enemy != tower.target {
                self.assignments.push(TowerTarget {
                    tower: tower.id,
                    enemy,
                });
            }
        }

        out.extend(self.assignments.iter().map(|assignment| Command::SetTowerTarget {
            tower: assignment.tower,
            enemy: assignment.enemy,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crystal_defence_core::{EnemyKind, TowerId, TowerKind, Vec2};

    fn tower(id: u32, position: (f32, f32), target: Option<u32>) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(id),
            kind: TowerKind::Laser,
            position: Vec2::new(position.0, position.1),
            damage: 20.0,
            range: 150.0,
            fire_rate: 1.0,
            projectile_speed: 400.0,
            upgrade_level: 1,
            level: 1,
            xp: 0,
            skill_points: 0,
            kill_count: 0,
            damage_dealt: 0.0,
            ready_in: 0.0,
            target: target.map(EnemyId::new),
            abilities: Vec::new(),
        }
    }

    fn enemy(id: u32, position: (f32, f32), health: f32) -> EnemySnapshot {
        EnemySnapshot {
            id: EnemyId::new(id),
            kind: EnemyKind::Scout,
            position: Vec2::new(position.0, position.1),
            path_index: 0,
            health,
            max_health: 50.0,
            slowed: false,
            slow_remaining: 0.0,
            last_damage_source: None,
        }
    }

    #[test]
    fn nearest_enemy_within_range_is_selected() {
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, (120.0, 0.0), 50.0),
            enemy(2, (60.0, 0.0), 50.0),
            enemy(3, (10.0, 0.0), 0.0),
        ]);
        assert_eq!(
            acquire_target(&tower(0, (0.0, 0.0), None), &enemies),
            Some(EnemyId::new(2))
        );
    }

    #[test]
    fn range_boundary_is_exclusive() {
        let enemies = EnemyView::from_snapshots(vec![enemy(1, (150.0, 0.0), 50.0)]);
        assert_eq!(acquire_target(&tower(0, (0.0, 0.0), None), &enemies), None);
    }

    #[test]
    fn equidistant_enemies_prefer_lower_identifier() {
        let enemies = EnemyView::from_snapshots(vec![
            enemy(7, (-50.0, 0.0), 50.0),
            enemy(4, (50.0, 0.0), 50.0),
        ]);
        assert_eq!(
            acquire_target(&tower(0, (0.0, 0.0), None), &enemies),
            Some(EnemyId::new(4))
        );
    }

    #[test]
    fn current_target_is_kept_while_valid() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![tower(0, (0.0, 0.0), Some(1))]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, (100.0, 0.0), 50.0),
            enemy(2, (10.0, 0.0), 50.0),
        ]);
        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);
        assert!(out.is_empty(), "a closer enemy does not steal the target");
    }

    #[test]
    fn lost_target_is_replaced_or_cleared() {
        let mut system = TowerTargeting::new();
        let towers = TowerView::from_snapshots(vec![
            tower(0, (0.0, 0.0), Some(1)),
            tower(1, (500.0, 500.0), Some(1)),
        ]);
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, (100.0, 0.0), 0.0),
            enemy(2, (10.0, 0.0), 50.0),
        ]);
        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);
        assert_eq!(
            out,
            vec![
                Command::SetTowerTarget {
                    tower: TowerId::new(0),
                    enemy: Some(EnemyId::new(2)),
                },
                Command::SetTowerTarget {
                    tower: TowerId::new(1),
                    enemy: None,
                },
            ]
        );
    }

    #[test]
    fn acquisition_is_idempotent() {
        let enemies = EnemyView::from_snapshots(vec![
            enemy(1, (80.0, 10.0), 50.0),
            enemy(2, (30.0, 90.0), 50.0),
        ]);
        let snapshot = tower(0, (0.0, 0.0), None);
        let first = acquire_target(&snapshot, &enemies);
        assert_eq!(first, acquire_target(&snapshot, &enemies));

        let mut system = TowerTargeting::new();
        let tracked = first.map(|enemy| enemy.get());
        let towers = TowerView::from_snapshots(vec![tower(0, (0.0, 0.0), tracked)]);
        let mut out = Vec::new();
        system.handle(&towers, &enemies, &mut out);
        assert!(out.is_empty());
    }
}
