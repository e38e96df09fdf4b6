//! Tunable parameters of the world.

use crystal_defence_core::{GameError, Vec2};
use serde::{Deserialize, Serialize};

use crate::path::DEFAULT_SAMPLES_PER_SEGMENT;

/// Configuration consumed by [`crate::World::new`].
///
/// Every field has a default, so partial TOML tables are accepted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Crystals available before the first placement.
    pub starting_crystals: f64,
    /// Seed of the loot random number generator.
    pub seed: u64,
    /// Health of the base defended by the player.
    pub base_health: u32,
    /// Width of the playing field in world units.
    pub field_width: f32,
    /// Height of the playing field in world units.
    pub field_height: f32,
    /// Minimum spacing between tower centres along each axis.
    pub grid_cell: f32,
    /// Control points of the enemy path.
    pub path: Vec<[f32; 2]>,
    /// Interpolated points per path segment.
    pub samples_per_segment: u32,
    /// Distance from the path centre line within which building is refused.
    pub path_half_width: f32,
    /// Radius around a collection point within which drops are picked up.
    pub pickup_radius: f32,
    /// Seconds a drop stays collectible.
    pub drop_lifetime: f32,
}

impl WorldConfig {
    /// Control points of the path as vectors.
    #[must_use]
    pub fn control_points(&self) -> Vec<Vec2> {
        self.path.iter().copied().map(Vec2::from).collect()
    }

    /// Checks the scalar parameters; the path is validated by the planner.
    pub fn validate(&self) -> Result<(), GameError> {
        if !self.starting_crystals.is_finite() || self.starting_crystals < 0.0 {
            return Err(invalid("starting_crystals", self.starting_crystals));
        }
        if self.base_health == 0 {
            return Err(invalid("base_health", 0.0));
        }
        for (field, value) in [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("grid_cell", self.grid_cell),
            ("pickup_radius", self.pickup_radius),
            ("drop_lifetime", self.drop_lifetime),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, f64::from(value)));
            }
        }
        if !self.path_half_width.is_finite() || self.path_half_width < 0.0 {
            return Err(invalid("path_half_width", f64::from(self.path_half_width)));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: f64) -> GameError {
    GameError::Configuration(format!("world field `{field}` has invalid value {value}"))
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            starting_crystals: 1_000.0,
            seed: 0x00c0_ffee,
            base_health: 20,
            field_width: 800.0,
            field_height: 600.0,
            grid_cell: 40.0,
            path: vec![
                [0.0, 300.0],
                [200.0, 300.0],
                [200.0, 100.0],
                [500.0, 100.0],
                [500.0, 500.0],
                [800.0, 500.0],
            ],
            samples_per_segment: DEFAULT_SAMPLES_PER_SEGMENT,
            path_half_width: 25.0,
            pickup_radius: 30.0,
            drop_lifetime: 10.0,
        }
    }
}
