//! # track-types
//!
//! Shared data structures for the patrol trajectory simulator.
//!
//! These types are used by:
//! - `track-simulator`: the positioning device, the simulator and its observers
//! - downstream consumers of simulated tracks (JSON-lines event streams, reports)
//!
//! ## Coordinate Conventions
//!
//! - **Projected frame**: planar Cartesian (x = easting, y = northing), meters.
//!   Every geometric computation of the simulator happens in this frame.
//! - **Geographic frame**: longitude/latitude in degrees, produced by the
//!   configured coordinate transform. Only used for elevation lookups and output.
//! - **Heading**: compass bearing in degrees, 0 = north, 90 = east.

use serde::{Deserialize, Serialize};

// ── 2D Points ─────────────────────────────────────────────────────────────────

/// 2D point in the projected frame (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }
    pub fn zero() -> Self { Self { x: 0.0, y: 0.0 } }

    /// Point at `distance` from the origin along `angle_rad`
    /// (mathematical convention: 0 = +x, counter-clockwise).
    pub fn from_polar(distance: f64, angle_rad: f64) -> Self {
        Self::new(distance * angle_rad.cos(), distance * angle_rad.sin())
    }

    pub fn dist(&self, other: &Point2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
    pub fn add(&self, other: &Point2) -> Point2 {
        Point2::new(self.x + other.x, self.y + other.y)
    }
    pub fn sub(&self, other: &Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }
    pub fn scale(&self, s: f64) -> Point2 {
        Point2::new(self.x * s, self.y * s)
    }
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Compass bearing of this vector in degrees, `[0, 360)`.
    /// Returns `None` for the zero vector.
    pub fn bearing_deg(&self) -> Option<f64> {
        if self.x == 0.0 && self.y == 0.0 {
            return None;
        }
        Some(self.x.atan2(self.y).to_degrees().rem_euclid(360.0))
    }
}

/// Geographic position (degrees)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self { Self { lon, lat } }
}

// ── Positioning Sample ────────────────────────────────────────────────────────

/// One recorded fix of the simulated positioning receiver.
///
/// Produced only at the sampling instants chosen by the sampling strategy and
/// never modified afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Reported (error-distorted) position, projected frame
    pub position: Point2,
    /// Exact position of the walker. Internal only, never serialized.
    #[serde(skip)]
    pub true_position: Point2,
    /// Reported position in the geographic frame
    pub geo_position: GeoPoint,
    /// Altitude from the elevation provider (meters)
    pub altitude: f64,
    /// Simulated time in seconds
    pub timestamp: f64,
    /// Compass bearing of travel, degrees
    pub heading: f64,
    /// Horizontal accuracy estimate (meters, lower is better)
    pub accuracy: f64,
    /// Signal strength, 0.0–1.0
    pub signal_strength: f64,
}

// ── Recording Lifecycle ───────────────────────────────────────────────────────

/// Recording lifecycle of the positioning device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordingState {
    /// Never started
    Idle,
    /// Recording and sampling
    Recording,
    /// Recording, sampling suspended
    Paused,
    /// Recording finished; a new recording may be started
    Stopped,
}

impl RecordingState {
    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }
}

// ── Validation Outcome ────────────────────────────────────────────────────────

/// Why a generated trajectory was rejected and the attempt retried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryReason {
    /// Fewer than three samples, no enclosed area
    TooFewSamples { count: usize },
    /// Enclosed area undefined (non-finite) or the reference area is zero
    MalformedGeometry,
    /// Area ratio below the configured fidelity threshold
    AreaBelowThreshold { ratio: f64 },
    /// Area ratio above the configured upper bound
    AreaAboveLimit { ratio: f64 },
}

// ── Simulation Events ─────────────────────────────────────────────────────────

/// Every lifecycle and data event published to trajectory observers.
///
/// Serialized with an internal `type` tag, e.g.
/// `{"type":"simulation_attempt","attempt":1,"max_attempts":3}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulationEvent {
    StartRecording,
    StopRecording,
    PauseRecording,
    ResumeRecording,
    /// A sample was captured into the trajectory
    DataUpdate(PositionSample),
    TimeChanged { time: f64 },
    PositionChanged { position: Point2 },
    SimulationAttempt { attempt: u32, max_attempts: u32 },
    SimulationRetry { attempt: u32, max_attempts: u32, reason: RetryReason },
    SimulationSuccess { attempt: u32 },
    SimulationFailure { max_attempts: u32 },
    /// The attempt ran out of ticks before the boundary walk completed
    TickBudgetExhausted { attempt: u32, ticks: u64 },
}

impl SimulationEvent {
    /// Stable snake_case name of the event kind (matches the serde tag).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StartRecording => "start_recording",
            Self::StopRecording => "stop_recording",
            Self::PauseRecording => "pause_recording",
            Self::ResumeRecording => "resume_recording",
            Self::DataUpdate(_) => "data_update",
            Self::TimeChanged { .. } => "time_changed",
            Self::PositionChanged { .. } => "position_changed",
            Self::SimulationAttempt { .. } => "simulation_attempt",
            Self::SimulationRetry { .. } => "simulation_retry",
            Self::SimulationSuccess { .. } => "simulation_success",
            Self::SimulationFailure { .. } => "simulation_failure",
            Self::TickBudgetExhausted { .. } => "tick_budget_exhausted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearing_follows_compass_convention() {
        assert_eq!(Point2::new(0.0, 1.0).bearing_deg(), Some(0.0));
        assert!((Point2::new(1.0, 0.0).bearing_deg().unwrap() - 90.0).abs() < 1e-9);
        assert!((Point2::new(0.0, -1.0).bearing_deg().unwrap() - 180.0).abs() < 1e-9);
        assert!((Point2::new(-1.0, 0.0).bearing_deg().unwrap() - 270.0).abs() < 1e-9);
        assert_eq!(Point2::zero().bearing_deg(), None);
    }

    #[test]
    fn polar_and_distance_agree() {
        let p = Point2::from_polar(5.0, 0.7);
        assert!((p.norm() - 5.0).abs() < 1e-12);
        assert!((Point2::new(3.0, 4.0).dist(&Point2::zero()) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn event_tag_matches_kind() {
        let ev = SimulationEvent::SimulationAttempt { attempt: 1, max_attempts: 3 };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], ev.kind());
        assert_eq!(json["max_attempts"], 3);

        let retry = SimulationEvent::SimulationRetry {
            attempt: 2,
            max_attempts: 3,
            reason: RetryReason::AreaBelowThreshold { ratio: 0.5 },
        };
        let json = serde_json::to_value(&retry).unwrap();
        assert_eq!(json["reason"]["kind"], "area_below_threshold");
    }

    #[test]
    fn sample_hides_true_position() {
        let sample = PositionSample {
            position: Point2::new(1.0, 2.0),
            true_position: Point2::new(9.0, 9.0),
            geo_position: GeoPoint::new(114.0, 30.0),
            altitude: 12.0,
            timestamp: 10.0,
            heading: 90.0,
            accuracy: 3.0,
            signal_strength: 0.9,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert!(json.get("true_position").is_none());
        assert_eq!(json["position"]["x"], 1.0);

        let ev = serde_json::to_value(SimulationEvent::DataUpdate(sample)).unwrap();
        assert_eq!(ev["type"], "data_update");
        assert_eq!(ev["altitude"], 12.0);
    }
}
