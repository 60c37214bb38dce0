//! device.rs — Simulated positioning receiver
//!
//! Owns the walker's true position and the receiver's view of it:
//! 1. Signal strength drifts by a bounded random step each tick
//! 2. Accuracy follows signal strength (strong signal → small accuracy value)
//! 3. Reported position = true position + error:
//!    - fix jump (up to `accuracy`) when the signal improved sharply this tick
//!    - jitter (up to `accuracy / 10`) otherwise
//! 4. Altitude is looked up at the reported position's geographic coordinate
//! 5. The sampling strategy decides whether the fix enters the trajectory
//!
//! All physical quantities are clamped into their configured ranges; nothing
//! here fails on out-of-range inputs. Randomness comes exclusively from the
//! generator passed in by the caller.

use std::f64::consts::TAU;

use rand::RngCore;
use rand_distr::{Distribution, Uniform};
use tracing::{debug, warn};
use track_types::{GeoPoint, Point2, PositionSample, RecordingState};

use crate::config::{GpsConfig, SimConfig, TimeUnit};
use crate::crs::{self, CoordinateTransform};
use crate::elevation::{self, ElevationProvider};
use crate::error::{ConfigError, DeviceError};
use crate::sampling::{self, SampleContext, SamplingStrategy};

/// Uniform draw from the closed interval `[lo, hi]`.
pub(crate) fn uniform(rng: &mut dyn RngCore, lo: f64, hi: f64) -> f64 {
    Uniform::new_inclusive(lo, hi).sample(rng)
}

/// Random displacement with magnitude in `[0, max_distance]`, any direction.
fn random_displacement(rng: &mut dyn RngCore, max_distance: f64) -> Point2 {
    let distance = uniform(rng, 0.0, max_distance);
    let angle = uniform(rng, 0.0, TAU);
    Point2::from_polar(distance, angle)
}

/// Read-only view of the device state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSnapshot {
    pub state: RecordingState,
    pub time: f64,
    pub true_position: Point2,
    pub reported_position: Point2,
    pub geo_position: GeoPoint,
    pub altitude: f64,
    pub heading: f64,
    pub accuracy: f64,
    pub signal_strength: f64,
}

pub struct PositioningDevice {
    cfg: GpsConfig,
    time_factor: f64,
    transform: Box<dyn CoordinateTransform>,
    elevation: Box<dyn ElevationProvider>,
    sampling: Box<dyn SamplingStrategy>,

    state: RecordingState,
    time: f64,
    true_position: Point2,
    reported_position: Point2,
    geo_position: GeoPoint,
    altitude: f64,
    heading: f64,
    accuracy: f64,
    signal_strength: f64,
    last_sampled: Point2,
    trajectory: Vec<PositionSample>,
}

impl PositioningDevice {
    pub fn new(
        cfg: &GpsConfig,
        time_unit: TimeUnit,
        elevation: Box<dyn ElevationProvider>,
        rng: &mut dyn RngCore,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let transform = crs::transform_for(&cfg.coordinate_system)?;
        let signal_strength = uniform(rng, cfg.initial_signal_strength_min, cfg.initial_signal_strength_max)
            .clamp(cfg.min_signal_strength, 1.0);
        let accuracy = cfg.initial_accuracy.clamp(cfg.min_accuracy, cfg.max_accuracy);

        let mut device = Self {
            cfg: cfg.clone(),
            time_factor: time_unit.factor(),
            transform,
            elevation,
            sampling: sampling::strategy_for(cfg),
            state: RecordingState::Idle,
            time: 0.0,
            true_position: Point2::zero(),
            reported_position: Point2::zero(),
            geo_position: GeoPoint::default(),
            altitude: 0.0,
            heading: 0.0,
            accuracy,
            signal_strength,
            last_sampled: Point2::zero(),
            trajectory: Vec::new(),
        };
        device.set_position(Point2::zero());
        debug!(
            "Device ready: crs={} sampling={} signal={:.2} accuracy={:.2}",
            device.transform.identifier(),
            device.sampling.name(),
            device.signal_strength,
            device.accuracy
        );
        Ok(device)
    }

    /// Build from the full configuration with the configured elevation provider.
    pub fn from_config(cfg: &SimConfig, rng: &mut dyn RngCore) -> Result<Self, ConfigError> {
        Self::new(
            &cfg.gps,
            cfg.simulation.time_unit,
            elevation::provider_for(&cfg.elevation),
            rng,
        )
    }

    pub fn set_elevation_provider(&mut self, provider: Box<dyn ElevationProvider>) {
        self.elevation = provider;
        self.refresh_altitude();
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn state(&self) -> RecordingState { self.state }
    pub fn time(&self) -> f64 { self.time }
    pub fn true_position(&self) -> Point2 { self.true_position }
    pub fn reported_position(&self) -> Point2 { self.reported_position }
    pub fn geo_position(&self) -> GeoPoint { self.geo_position }
    pub fn altitude(&self) -> f64 { self.altitude }
    pub fn accuracy(&self) -> f64 { self.accuracy }
    pub fn signal_strength(&self) -> f64 { self.signal_strength }
    pub fn trajectory(&self) -> &[PositionSample] { &self.trajectory }
    pub fn coordinate_system(&self) -> &str { self.transform.identifier() }

    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            state: self.state,
            time: self.time,
            true_position: self.true_position,
            reported_position: self.reported_position,
            geo_position: self.geo_position,
            altitude: self.altitude,
            heading: self.heading,
            accuracy: self.accuracy,
            signal_strength: self.signal_strength,
        }
    }

    /// The fix the device would record right now.
    pub fn current_sample(&self) -> PositionSample {
        PositionSample {
            position: self.reported_position,
            true_position: self.true_position,
            geo_position: self.geo_position,
            altitude: self.altitude,
            timestamp: self.time,
            heading: self.heading,
            accuracy: self.accuracy,
            signal_strength: self.signal_strength,
        }
    }

    // ── Placement ────────────────────────────────────────────────────────────

    /// Teleport: true and reported position both become `position`.
    pub fn set_position(&mut self, position: Point2) {
        self.true_position = position;
        self.reported_position = position;
        self.last_sampled = position;
        self.refresh_geo();
        self.refresh_altitude();
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    /// Prepare for a fresh recording at `time` / `position`. Signal strength and
    /// accuracy carry over; the trajectory buffer is dropped.
    pub fn reset(&mut self, time: f64, position: Point2) {
        self.set_time(time);
        self.set_position(position);
        self.heading = 0.0;
        self.trajectory.clear();
        self.state = RecordingState::Idle;
    }

    // ── Recording lifecycle ──────────────────────────────────────────────────

    /// Idle/Stopped → Recording. Clears the buffer and captures the first fix.
    pub fn start_recording(&mut self) -> Result<PositionSample, DeviceError> {
        if self.state.is_recording() {
            return Err(DeviceError::InvalidTransition { action: "start recording", state: self.state });
        }
        self.state = RecordingState::Recording;
        self.trajectory.clear();
        let ctx = self.sample_context();
        self.sampling.rearm(&ctx);
        Ok(self.capture())
    }

    /// Recording/Paused → Stopped. Captures a final fix unless paused.
    pub fn stop_recording(&mut self) -> Result<Option<PositionSample>, DeviceError> {
        let sample = match self.state {
            RecordingState::Recording => Some(self.capture()),
            RecordingState::Paused => None,
            state => return Err(DeviceError::InvalidTransition { action: "stop recording", state }),
        };
        self.state = RecordingState::Stopped;
        Ok(sample)
    }

    pub fn pause_recording(&mut self) -> Result<(), DeviceError> {
        if self.state != RecordingState::Recording {
            return Err(DeviceError::InvalidTransition { action: "pause recording", state: self.state });
        }
        self.state = RecordingState::Paused;
        Ok(())
    }

    pub fn resume_recording(&mut self) -> Result<(), DeviceError> {
        if self.state != RecordingState::Paused {
            return Err(DeviceError::InvalidTransition { action: "resume recording", state: self.state });
        }
        self.state = RecordingState::Recording;
        Ok(())
    }

    // ── Tick ─────────────────────────────────────────────────────────────────

    /// Advance by `elapsed` time units and move the true position by `offset`.
    /// Returns the captured sample when the sampling strategy asked for one.
    pub fn update(&mut self, rng: &mut dyn RngCore, elapsed: f64, offset: Point2) -> Option<PositionSample> {
        self.time += elapsed * self.time_factor;
        self.true_position = self.true_position.add(&offset);
        if let Some(bearing) = offset.bearing_deg() {
            self.heading = bearing;
        }

        let old_signal = self.signal_strength;
        self.update_signal_strength(rng);
        self.update_accuracy(rng);
        self.update_reported_position(rng, old_signal);
        self.refresh_geo();
        self.refresh_altitude();

        if self.state != RecordingState::Recording {
            return None;
        }
        let ctx = self.sample_context();
        if self.sampling.should_sample(&ctx) {
            Some(self.capture())
        } else {
            None
        }
    }

    fn update_signal_strength(&mut self, rng: &mut dyn RngCore) {
        let drift = self.cfg.signal_drift;
        let change = uniform(rng, -drift, drift);
        self.signal_strength = (self.signal_strength + change).clamp(self.cfg.min_signal_strength, 1.0);
    }

    /// Linear in signal strength: full signal → `min_accuracy`, none → `max_accuracy`.
    fn update_accuracy(&mut self, rng: &mut dyn RngCore) {
        let (min, max) = (self.cfg.min_accuracy, self.cfg.max_accuracy);
        let nominal = max - self.signal_strength * (max - min);
        let jitter = self.cfg.accuracy_jitter;
        self.accuracy = (nominal + uniform(rng, -jitter, jitter)).clamp(min, max);
    }

    fn update_reported_position(&mut self, rng: &mut dyn RngCore, old_signal: f64) {
        let error = if self.signal_strength - old_signal > self.cfg.fix_jump_threshold {
            debug!(
                "Fix jump: signal {:.2} → {:.2}, accuracy {:.2}",
                old_signal, self.signal_strength, self.accuracy
            );
            random_displacement(rng, self.accuracy)
        } else {
            random_displacement(rng, self.accuracy / 10.0)
        };
        self.reported_position = self.true_position.add(&error);
    }

    fn refresh_geo(&mut self) {
        self.geo_position = self.transform.to_geographic(self.reported_position);
    }

    /// Keeps the previous altitude when the provider cannot answer.
    fn refresh_altitude(&mut self) {
        match self.elevation.elevation(self.geo_position) {
            Ok(altitude) => self.altitude = altitude,
            Err(e) => warn!("Elevation lookup failed, keeping {:.1} m: {e}", self.altitude),
        }
    }

    fn sample_context(&self) -> SampleContext {
        SampleContext {
            reported: self.reported_position,
            last_sampled: self.last_sampled,
            time: self.time,
        }
    }

    fn capture(&mut self) -> PositionSample {
        let sample = self.current_sample();
        self.trajectory.push(sample);
        self.last_sampled = self.reported_position;
        sample
    }
}
