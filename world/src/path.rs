//! Polyline construction for the enemy route.

use crystal_defence_core::{GameError, Vec2};

/// Samples used per segment when none are configured.
pub const DEFAULT_SAMPLES_PER_SEGMENT: u32 = 20;

/// Errors raised while building a path from control points.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PathError {
    /// Fewer than two control points were provided.
    #[error("a path needs at least two control points, got {0}")]
    TooFewPoints(usize),
    /// A control point has a non-finite coordinate.
    #[error("control point {index} is not finite: {point}")]
    NonFinitePoint {
        /// Position of the offending point in the input.
        index: usize,
        /// Offending point.
        point: Vec2,
    },
    /// Zero samples per segment were requested.
    #[error("samples per segment must be positive")]
    ZeroSamples,
}

impl From<PathError> for GameError {
    fn from(error: PathError) -> Self {
        GameError::Configuration(error.to_string())
    }
}

/// Builds dense polylines from sparse control points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathPlanner {
    samples_per_segment: u32,
}

impl PathPlanner {
    /// Creates a planner emitting the provided number of samples per segment.
    #[must_use]
    pub const fn new(samples_per_segment: u32) -> Self {
        Self {
            samples_per_segment,
        }
    }

    /// Interpolates the control points into a polyline.
    ///
    /// Every segment contributes `samples_per_segment` points starting at its
    /// first control point; the final control point closes the polyline.
    pub fn plan(&self, control_points: &[Vec2]) -> Result<Path, PathError> {
        if self.samples_per_segment == 0 {
            return Err(PathError::ZeroSamples);
        }
        if control_points.len() < 2 {
            return Err(PathError::TooFewPoints(control_points.len()));
        }
        if let Some((index, point)) = control_points
            .iter()
            .enumerate()
            .find(|(_, point)| !point.is_finite())
        {
            return Err(PathError::NonFinitePoint {
                index,
                point: *point,
            });
        }

        let samples = self.samples_per_segment as usize;
        let mut points = Vec::with_capacity((control_points.len() - 1) * samples + 1);
        for segment in control_points.windows(2) {
            let (from, to) = (segment[0], segment[1]);
            for step in 0..samples {
                let t = step as f32 / samples as f32;
                points.push(from.lerp(to, t));
            }
        }
        points.extend(control_points.last().copied());

        Ok(Path { points })
    }
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLES_PER_SEGMENT)
    }
}

/// Dense polyline followed by every enemy.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    points: Vec<Vec2>,
}

impl Path {
    /// Points of the polyline in travel order.
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    /// Spawn location of every enemy.
    #[must_use]
    pub fn start(&self) -> Vec2 {
        self.points[0]
    }

    /// Point at which enemies escape.
    #[must_use]
    pub fn end(&self) -> Vec2 {
        self.points[self.points.len() - 1]
    }

    /// Shortest distance from the point to any segment of the polyline.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.points
            .windows(2)
            .map(|segment| distance_to_segment(point, segment[0], segment[1]))
            .fold(f32::INFINITY, f32::min)
    }
}

fn distance_to_segment(point: Vec2, from: Vec2, to: Vec2) -> f32 {
    let span = to - from;
    let length_sq = span.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(from);
    }
    let t = ((point - from).dot(span) / length_sq).clamp(0.0, 1.0);
    point.distance(from + span * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corner() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
        ]
    }

    #[test]
    fn plan_emits_samples_per_segment_plus_final_point() {
        let path = PathPlanner::new(4).plan(&corner()).expect("valid path");
        assert_eq!(path.points().len(), 2 * 4 + 1);
        assert_eq!(path.points()[1], Vec2::new(25.0, 0.0));
        assert_eq!(path.points()[4], Vec2::new(100.0, 0.0));
        assert_eq!(path.start(), Vec2::ZERO);
        assert_eq!(path.end(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn default_planner_uses_twenty_samples() {
        let path = PathPlanner::default().plan(&corner()).expect("valid path");
        assert_eq!(path.points().len(), 41);
    }

    #[test]
    fn plan_rejects_degenerate_input() {
        let planner = PathPlanner::default();
        assert_eq!(
            planner.plan(&[Vec2::ZERO]),
            Err(PathError::TooFewPoints(1))
        );
        assert!(matches!(
            planner.plan(&[Vec2::ZERO, Vec2::new(f32::NAN, 1.0)]),
            Err(PathError::NonFinitePoint { index: 1, .. })
        ));
        assert_eq!(PathPlanner::new(0).plan(&corner()), Err(PathError::ZeroSamples));
    }

    #[test]
    fn path_errors_surface_as_configuration_errors() {
        let error: GameError = PathError::ZeroSamples.into();
        assert!(matches!(error, GameError::Configuration(_)));
    }

    #[test]
    fn distance_measures_against_segments_not_samples() {
        let path = PathPlanner::new(1).plan(&corner()).expect("valid path");
        assert_eq!(path.distance_to(Vec2::new(50.0, 30.0)), 30.0);
        assert_eq!(path.distance_to(Vec2::new(130.0, 50.0)), 30.0);
        assert_eq!(path.distance_to(Vec2::new(-3.0, -4.0)), 5.0);
    }
}
