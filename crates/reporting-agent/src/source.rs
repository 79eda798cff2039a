//! Position sources sampled by the reporting loop.

/// A WGS84 fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Degrees north, within `[-90, 90]`.
    pub latitude: f64,
    /// Degrees east, within `[-180, 180]`.
    pub longitude: f64,
}

/// Supplies the next position to report.
pub trait PositionSource: Send + Sync {
    /// Sample the current position.
    fn next_position(&mut self) -> Position;
}

/// Starting point of the simulated walk (Nairobi CBD).
pub const SIMULATED_ORIGIN: Position = Position {
    latitude: -1.286_389,
    longitude: 36.817_223,
};

const LATITUDE_STEP: f64 = 0.0004;
const LONGITUDE_STEP: f64 = 0.0003;

/// Deterministic walk used when no GPS receiver is available.
///
/// Each sample moves north-east by a fixed step.
///
/// # Examples
///
/// ```
/// use reporting_agent::{PositionSource, SIMULATED_ORIGIN, SimulatedSource};
///
/// let mut source = SimulatedSource::default();
/// assert_eq!(source.next_position(), SIMULATED_ORIGIN);
/// assert!(source.next_position().latitude > SIMULATED_ORIGIN.latitude);
/// ```
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    next: Position,
}

impl SimulatedSource {
    /// Walk from `origin`.
    #[must_use]
    pub const fn starting_at(origin: Position) -> Self {
        Self { next: origin }
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::starting_at(SIMULATED_ORIGIN)
    }
}

impl PositionSource for SimulatedSource {
    #[expect(
        clippy::float_arithmetic,
        reason = "the simulated walk advances coordinates by fixed degree steps"
    )]
    fn next_position(&mut self) -> Position {
        let current = self.next;
        self.next = Position {
            latitude: (current.latitude + LATITUDE_STEP).clamp(-90.0, 90.0),
            longitude: (current.longitude + LONGITUDE_STEP).clamp(-180.0, 180.0),
        };
        current
    }
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedSource(pub Position);

impl PositionSource for FixedSource {
    fn next_position(&mut self) -> Position {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(
        clippy::float_arithmetic,
        reason = "expected coordinates are computed from the step constants"
    )]
    fn simulated_walk_steps_north_east() {
        let mut source = SimulatedSource::default();
        let first = source.next_position();
        let second = source.next_position();

        assert_eq!(first, SIMULATED_ORIGIN);
        assert!((second.latitude - (SIMULATED_ORIGIN.latitude + LATITUDE_STEP)).abs() < 1e-12);
        assert!((second.longitude - (SIMULATED_ORIGIN.longitude + LONGITUDE_STEP)).abs() < 1e-12);
    }

    #[test]
    fn walk_stays_within_wgs84_bounds() {
        let mut source = SimulatedSource::starting_at(Position {
            latitude: 89.9999,
            longitude: 179.9999,
        });
        source.next_position();
        let clamped = source.next_position();
        assert!(clamped.latitude <= 90.0);
        assert!(clamped.longitude <= 180.0);
    }

    #[test]
    fn fixed_source_repeats() {
        let position = Position {
            latitude: 1.0,
            longitude: 2.0,
        };
        let mut source = FixedSource(position);
        assert_eq!(source.next_position(), position);
        assert_eq!(source.next_position(), position);
    }
}
