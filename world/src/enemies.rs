//! Enemy state and path traversal.

use crystal_defence_catalog::EnemyArchetype;
use crystal_defence_core::{EnemyId, EnemyKind, EnemySnapshot, TowerId, Vec2};

use crate::path::Path;

/// State of an enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) position: Vec2,
    path_index: usize,
    pub(crate) health: f32,
    max_health: f32,
    speed: f32,
    slowed: bool,
    slow_effect: f32,
    slow_remaining: f32,
    pub(crate) last_damage_source: Option<TowerId>,
}

impl EnemyState {
    /// Creates an enemy at the head of the path.
    pub(crate) fn new(id: EnemyId, archetype: &EnemyArchetype, path: &Path) -> Self {
        Self {
            id,
            kind: archetype.kind,
            position: path.start(),
            path_index: 0,
            health: archetype.health,
            max_health: archetype.health,
            speed: archetype.speed,
            slowed: false,
            slow_effect: 0.0,
            slow_remaining: 0.0,
            last_damage_source: None,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.health > 0.0
    }

    /// Subtracts damage and returns the amount actually removed.
    pub(crate) fn take_damage(&mut self, amount: f32, source: Option<TowerId>) -> f32 {
        let applied = amount.max(0.0).min(self.health);
        self.health -= applied;
        self.last_damage_source = source;
        applied
    }

    /// Applies a slow, replacing any slow already active.
    pub(crate) fn slow(&mut self, effect: f32, duration: f32) {
        self.slowed = true;
        self.slow_effect = effect.clamp(0.0, 1.0);
        self.slow_remaining = duration;
    }

    /// Moves the enemy along the path and returns `true` once it reaches the
    /// end.
    pub(crate) fn advance(&mut self, path: &Path, dt: f32) -> bool {
        let factor = if self.slowed {
            1.0 - self.slow_effect
        } else {
            1.0
        };
        let mut budget = self.speed * factor * dt;
        let points = path.points();

        while budget > 0.0 {
            let Some(next) = points.get(self.path_index + 1).copied() else {
                break;
            };
            let remaining = self.position.distance(next);
            if remaining <= budget {
                budget -= remaining;
                self.position = next;
                self.path_index += 1;
            } else {
                self.position += (next - self.position) / remaining * budget;
                budget = 0.0;
            }
        }

        if self.slowed {
            self.slow_remaining -= dt;
            if self.slow_remaining <= 0.0 {
                self.slowed = false;
                self.slow_effect = 0.0;
                self.slow_remaining = 0.0;
            }
        }

        self.path_index + 1 >= points.len()
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            path_index: self.path_index,
            health: self.health,
            max_health: self.max_health,
            slowed: self.slowed,
            slow_remaining: self.slow_remaining,
            last_damage_source: self.last_damage_source,
        }
    }
}
