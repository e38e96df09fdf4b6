//! Homing projectile state.

use crystal_defence_core::{EnemyId, ProjectileId, ProjectileSnapshot, TowerId, Vec2};

/// Distance below which a projectile strikes its target.
pub(crate) const HIT_RADIUS: f32 = 10.0;

#[derive(Clone, Debug)]
pub(crate) struct ProjectileState {
    pub(crate) id: ProjectileId,
    pub(crate) owner: TowerId,
    pub(crate) target: EnemyId,
    position: Vec2,
    pub(crate) damage: f32,
    speed: f32,
    pub(crate) active: bool,
    struck: Vec<EnemyId>,
}

impl ProjectileState {
    pub(crate) fn new(
        id: ProjectileId,
        owner: TowerId,
        target: EnemyId,
        position: Vec2,
        damage: f32,
        speed: f32,
    ) -> Self {
        Self {
            id,
            owner,
            target,
            position,
            damage,
            speed,
            active: true,
            struck: Vec::new(),
        }
    }

    /// Moves toward the target position and reports whether it was reached.
    ///
    /// A hit records the target as struck and deactivates the projectile.
    pub(crate) fn advance_toward(&mut self, destination: Vec2, dt: f32) -> bool {
        let step = self.speed * dt;
        let offset = destination - self.position;
        let distance = offset.length();
        if distance <= step {
            self.position = destination;
        } else {
            self.position += offset / distance * step;
        }

        if self.position.distance(destination) < HIT_RADIUS {
            self.struck.push(self.target);
            self.active = false;
            return true;
        }
        false
    }

    /// Sends the projectile on to another enemy after a pierce.
    pub(crate) fn retarget(&mut self, target: EnemyId, damage: f32) {
        self.target = target;
        self.damage = damage;
        self.active = true;
    }

    pub(crate) fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            id: self.id,
            owner: self.owner,
            target: self.target,
            position: self.position,
            damage: self.damage,
            speed: self.speed,
            struck: self.struck.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projectile() -> ProjectileState {
        ProjectileState::new(
            ProjectileId::new(0),
            TowerId::new(0),
            EnemyId::new(3),
            Vec2::ZERO,
            20.0,
            400.0,
        )
    }

    #[test]
    fn projectile_travels_at_its_speed() {
        let mut projectile = projectile();
        assert!(!projectile.advance_toward(Vec2::new(100.0, 0.0), 0.1));
        assert_eq!(projectile.snapshot().position, Vec2::new(40.0, 0.0));
        assert!(projectile.active);
    }

    #[test]
    fn arriving_within_hit_radius_records_the_strike() {
        let mut projectile = projectile();
        assert!(projectile.advance_toward(Vec2::new(45.0, 0.0), 0.1));
        assert!(!projectile.active);
        assert_eq!(projectile.snapshot().struck, vec![EnemyId::new(3)]);

        projectile.retarget(EnemyId::new(4), 12.0);
        assert!(projectile.active);
        assert_eq!(projectile.target, EnemyId::new(4));
        assert_eq!(projectile.damage, 12.0);
    }
}
