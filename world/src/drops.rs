//! Collectible resource drops.

use crystal_defence_core::{DropId, DropSnapshot, ResourceKind, Vec2};

#[derive(Clone, Debug)]
pub(crate) struct DropState {
    pub(crate) id: DropId,
    pub(crate) kind: ResourceKind,
    pub(crate) position: Vec2,
    pub(crate) value: f64,
    remaining: f32,
}

impl DropState {
    pub(crate) fn new(
        id: DropId,
        kind: ResourceKind,
        position: Vec2,
        value: f64,
        lifetime: f32,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            value,
            remaining: lifetime,
        }
    }

    /// Ages the drop and reports whether it is still collectible.
    pub(crate) fn age(&mut self, dt: f32) -> bool {
        self.remaining -= dt;
        self.remaining > 0.0
    }

    pub(crate) fn snapshot(&self) -> DropSnapshot {
        DropSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            value: self.value,
            remaining: self.remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_expires_after_its_lifetime() {
        let mut drop = DropState::new(DropId::new(1), ResourceKind::Core, Vec2::ZERO, 1.0, 10.0);
        assert!(drop.age(9.5));
        assert!(!drop.age(0.5));
        assert!(drop.snapshot().remaining <= 0.0);
    }
}
