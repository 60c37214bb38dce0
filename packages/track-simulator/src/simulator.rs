//! simulator.rs — Attempt loop: walk the ring, record, validate, retry
//!
//! Per attempt:
//! 1. Reset the device to the start time/position, fresh walker and task
//! 2. Start recording (first sample captured immediately)
//! 3. Tick: walker steps from the reported position toward the current
//!    target, device applies the offset, task advances when the reported
//!    position reaches the target
//! 4. Stop recording and compare the recorded area with the input polygon
//!
//! Configured pause windows suspend recording for a run of ticks while the
//! walker keeps moving.
//!
//! An attempt that exceeds `max_ticks_per_attempt` ends the whole run with
//! `SimulationStatus::TickBudgetExhausted`; it is not retried.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};
use track_types::{Point2, PositionSample, RecordingState, RetryReason, SimulationEvent};

use crate::config::{SimConfig, SimulationConfig};
use crate::device::{DeviceSnapshot, PositioningDevice};
use crate::elevation::ElevationProvider;
use crate::error::{DeviceError, SimError};
use crate::geometry::{polygon_area, Ring};
use crate::inspection::InspectionTask;
use crate::movement::Person;
use crate::observer::{ObserverId, ObserverSet, TrajectoryObserver};

// ── Outcome ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationStatus {
    /// Area fidelity met
    Accepted,
    /// Every attempt was rejected; the last trajectory is returned as is
    Exhausted,
    /// An attempt never closed the ring within the tick budget
    TickBudgetExhausted,
}

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub trajectory: Vec<PositionSample>,
    pub status: SimulationStatus,
    /// Attempts started, including the last one
    pub attempts: u32,
    /// Recorded area / input polygon area of the returned trajectory
    pub area_ratio: Option<f64>,
    /// Ticks run across all attempts
    pub ticks: u64,
}

/// Result of walking one attempt.
enum AttemptRun {
    Closed { trajectory: Vec<PositionSample>, ticks: u64 },
    OutOfTicks { trajectory: Vec<PositionSample>, ticks: u64 },
}

type TerrainFn = Box<dyn Fn(&Ring) -> Ring>;

/// Area of the recorded reported positions relative to `reference_area`.
pub fn area_ratio(trajectory: &[PositionSample], reference_area: f64) -> Option<f64> {
    if trajectory.len() < 3 || !(reference_area.is_finite() && reference_area > 0.0) {
        return None;
    }
    let points: Vec<Point2> = trajectory.iter().map(|s| s.position).collect();
    let ratio = polygon_area(&points) / reference_area;
    ratio.is_finite().then_some(ratio)
}

/// Accept or reject one recorded trajectory. `Ok` carries the area ratio.
pub fn validate_trajectory(
    cfg: &SimulationConfig,
    trajectory: &[PositionSample],
    reference_area: f64,
) -> Result<f64, RetryReason> {
    if trajectory.len() < 3 {
        return Err(RetryReason::TooFewSamples { count: trajectory.len() });
    }
    let ratio = area_ratio(trajectory, reference_area).ok_or(RetryReason::MalformedGeometry)?;
    if ratio < cfg.area_threshold {
        return Err(RetryReason::AreaBelowThreshold { ratio });
    }
    if let Some(max) = cfg.max_area_ratio {
        if ratio > max {
            return Err(RetryReason::AreaAboveLimit { ratio });
        }
    }
    Ok(ratio)
}

// ── Simulator ─────────────────────────────────────────────────────────────────

pub struct TrajectorySimulator<R: RngCore = StdRng> {
    config: SimConfig,
    rng: R,
    device: PositioningDevice,
    observers: ObserverSet,
    terrain: TerrainFn,
}

impl TrajectorySimulator<StdRng> {
    /// Seeded from `simulation.seed` when set, from OS entropy otherwise.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        let rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }
}

impl<R: RngCore> TrajectorySimulator<R> {
    pub fn with_rng(config: SimConfig, mut rng: R) -> Result<Self, SimError> {
        config.validate()?;
        let device = PositioningDevice::from_config(&config, &mut rng)?;
        info!(
            "Simulator ready: crs={} movement={:?} sampling={:?} attempts={}",
            device.coordinate_system(),
            config.person.movement_strategy,
            config.gps.sampling_strategy,
            config.simulation.max_attempts
        );
        Ok(Self {
            config,
            rng,
            device,
            observers: ObserverSet::new(),
            terrain: Box::new(Ring::clone),
        })
    }

    pub fn with_elevation(mut self, provider: Box<dyn ElevationProvider>) -> Self {
        self.device.set_elevation_provider(provider);
        self
    }

    /// Adjust the walked ring before every run (e.g. snap to terrain). The
    /// area check still compares against the input polygon.
    pub fn with_terrain(mut self, adjust: impl Fn(&Ring) -> Ring + 'static) -> Self {
        self.terrain = Box::new(adjust);
        self
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceSnapshot {
        self.device.snapshot()
    }

    pub fn add_observer(&mut self, observer: impl TrajectoryObserver + 'static) -> ObserverId {
        self.observers.add(Box::new(observer))
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> Option<Box<dyn TrajectoryObserver>> {
        self.observers.remove(id)
    }

    fn emit(&mut self, event: SimulationEvent) {
        self.observers.notify(&event);
    }

    // ── Manual control ───────────────────────────────────────────────────────

    pub fn set_time(&mut self, time: f64) {
        self.device.set_time(time);
        self.emit(SimulationEvent::TimeChanged { time });
    }

    pub fn set_position(&mut self, position: Point2) {
        self.device.set_position(position);
        self.emit(SimulationEvent::PositionChanged { position });
    }

    pub fn pause_recording(&mut self) -> Result<(), DeviceError> {
        self.device.pause_recording().inspect_err(|e| warn!("{e}"))?;
        self.emit(SimulationEvent::PauseRecording);
        Ok(())
    }

    pub fn resume_recording(&mut self) -> Result<(), DeviceError> {
        self.device.resume_recording().inspect_err(|e| warn!("{e}"))?;
        self.emit(SimulationEvent::ResumeRecording);
        Ok(())
    }

    // ── Run ──────────────────────────────────────────────────────────────────

    /// Walk `polygon` starting at `start_position` / `start_time` until a
    /// recorded trajectory passes validation or attempts run out.
    ///
    /// Fails with `SimError::InvalidInput` before any event is emitted when
    /// the polygon is degenerate.
    pub fn simulate(
        &mut self,
        start_time: f64,
        start_position: Point2,
        polygon: &[Point2],
    ) -> Result<SimulationOutcome, SimError> {
        let reference = Ring::new(polygon)?;
        let walked = (self.terrain)(&reference);
        let result = self.run(start_time, start_position, &reference, &walked);
        self.observers.flush();
        result
    }

    fn run(
        &mut self,
        start_time: f64,
        start_position: Point2,
        reference: &Ring,
        walked: &Ring,
    ) -> Result<SimulationOutcome, SimError> {
        let max_attempts = self.config.simulation.max_attempts;
        let reference_area = reference.area();
        let mut total_ticks = 0;
        let mut last = Vec::new();

        for attempt in 1..=max_attempts {
            self.emit(SimulationEvent::SimulationAttempt { attempt, max_attempts });
            info!(
                "Attempt {attempt}/{max_attempts}: {} vertices, {:.0} m perimeter",
                walked.corners().len(),
                walked.perimeter()
            );

            let trajectory = match self.walk(start_time, start_position, walked)? {
                AttemptRun::Closed { trajectory, ticks } => {
                    total_ticks += ticks;
                    debug!("Ring closed after {ticks} ticks, {} samples", trajectory.len());
                    trajectory
                }
                AttemptRun::OutOfTicks { trajectory, ticks } => {
                    total_ticks += ticks;
                    warn!("Attempt {attempt} did not close the ring within {ticks} ticks");
                    self.emit(SimulationEvent::TickBudgetExhausted { attempt, ticks });
                    return Ok(SimulationOutcome {
                        area_ratio: area_ratio(&trajectory, reference_area),
                        trajectory,
                        status: SimulationStatus::TickBudgetExhausted,
                        attempts: attempt,
                        ticks: total_ticks,
                    });
                }
            };

            match validate_trajectory(&self.config.simulation, &trajectory, reference_area) {
                Ok(ratio) => {
                    info!("Attempt {attempt} accepted, area ratio {ratio:.3}");
                    self.emit(SimulationEvent::SimulationSuccess { attempt });
                    return Ok(SimulationOutcome {
                        trajectory,
                        status: SimulationStatus::Accepted,
                        attempts: attempt,
                        area_ratio: Some(ratio),
                        ticks: total_ticks,
                    });
                }
                Err(reason) => {
                    warn!("Attempt {attempt} rejected: {reason:?}");
                    if attempt < max_attempts {
                        self.emit(SimulationEvent::SimulationRetry { attempt, max_attempts, reason });
                    }
                    last = trajectory;
                }
            }
        }

        self.emit(SimulationEvent::SimulationFailure { max_attempts });
        Ok(SimulationOutcome {
            area_ratio: area_ratio(&last, reference_area),
            trajectory: last,
            status: SimulationStatus::Exhausted,
            attempts: max_attempts,
            ticks: total_ticks,
        })
    }

    /// Pause or resume at the tick boundaries of the configured pause windows.
    /// Runs before the tick's device update, so the first paused tick records
    /// nothing.
    fn apply_pause_schedule(&mut self, sim: &SimulationConfig, tick: u64) -> Result<(), DeviceError> {
        let state = self.device.state();
        if state == RecordingState::Paused && sim.pauses.iter().any(|w| w.end_tick() == tick) {
            self.resume_recording()?;
        }
        if self.device.state() == RecordingState::Recording && sim.pauses.iter().any(|w| w.start_tick == tick) {
            debug!("Pausing recording at tick {tick}");
            self.pause_recording()?;
        }
        Ok(())
    }

    /// One recording around `ring`.
    fn walk(&mut self, start_time: f64, start_position: Point2, ring: &Ring) -> Result<AttemptRun, SimError> {
        let sim = self.config.simulation.clone();

        self.device.reset(start_time, start_position);
        let mut person = Person::new(&self.config.person, ring.clone());
        let mut task = InspectionTask::new(ring, sim.closing_distance());

        let first = self.device.start_recording()?;
        self.emit(SimulationEvent::StartRecording);
        self.emit(SimulationEvent::DataUpdate(first));

        let mut ticks: u64 = 0;
        let mut out_of_ticks = false;
        while let Some(target) = task.next_target() {
            if ticks >= sim.max_ticks_per_attempt {
                out_of_ticks = true;
                break;
            }
            ticks += 1;
            self.apply_pause_schedule(&sim, ticks)?;

            let reported = self.device.reported_position();
            let offset = match person.step(&mut self.rng, reported, target, sim.time_step) {
                Some(candidate) => candidate.sub(&self.device.true_position()),
                None => Point2::zero(),
            };
            if let Some(sample) = self.device.update(&mut self.rng, sim.time_step, offset) {
                self.emit(SimulationEvent::DataUpdate(sample));
            }

            if task.is_on_current_edge(self.device.reported_position(), sim.tolerance) {
                debug!("Edge {} done at tick {ticks}", task.index());
                if !task.advance() {
                    break;
                }
            }
        }

        if let Some(sample) = self.device.stop_recording()? {
            self.emit(SimulationEvent::DataUpdate(sample));
        }
        self.emit(SimulationEvent::StopRecording);

        let trajectory = self.device.trajectory().to_vec();
        Ok(if out_of_ticks {
            AttemptRun::OutOfTicks { trajectory, ticks }
        } else {
            AttemptRun::Closed { trajectory, ticks }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use crate::observer::EventLog;

    fn sample_at(x: f64, y: f64) -> PositionSample {
        PositionSample { position: Point2::new(x, y), ..PositionSample::default() }
    }

    fn square_trajectory(side: f64) -> Vec<PositionSample> {
        vec![sample_at(0.0, 0.0), sample_at(side, 0.0), sample_at(side, side), sample_at(0.0, side)]
    }

    #[test]
    fn validation_reasons() {
        let cfg = SimulationConfig { area_threshold: 0.9, max_area_ratio: Some(1.2), ..SimulationConfig::default() };
        assert_eq!(validate_trajectory(&cfg, &square_trajectory(10.0), 100.0), Ok(1.0));
        assert_eq!(
            validate_trajectory(&cfg, &square_trajectory(10.0)[..2], 100.0),
            Err(RetryReason::TooFewSamples { count: 2 })
        );
        assert!(matches!(
            validate_trajectory(&cfg, &square_trajectory(9.0), 100.0),
            Err(RetryReason::AreaBelowThreshold { .. })
        ));
        assert!(matches!(
            validate_trajectory(&cfg, &square_trajectory(11.0), 100.0),
            Err(RetryReason::AreaAboveLimit { .. })
        ));
        let nan = vec![sample_at(0.0, 0.0), sample_at(f64::NAN, 0.0), sample_at(1.0, 1.0)];
        assert_eq!(validate_trajectory(&cfg, &nan, 100.0), Err(RetryReason::MalformedGeometry));
        assert_eq!(validate_trajectory(&cfg, &square_trajectory(10.0), 0.0), Err(RetryReason::MalformedGeometry));
    }

    #[test]
    fn manual_controls_emit_events() {
        let mut config = SimConfig::default();
        config.gps.coordinate_system = "EPSG:4326".into();
        let mut sim = TrajectorySimulator::with_rng(config, StdRng::seed_from_u64(1)).unwrap();
        let log = EventLog::shared();
        sim.add_observer(log.clone());

        sim.set_time(10.0);
        sim.set_position(Point2::new(3.0, 4.0));
        assert!(sim.pause_recording().is_err());
        assert_eq!(sim.device().time, 10.0);
        assert_eq!(sim.device().true_position, Point2::new(3.0, 4.0));
        assert_eq!(log.borrow().kinds(), vec!["time_changed", "position_changed"]);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let mut config = SimConfig::default();
        config.gps.coordinate_system = "EPSG:999999".into();
        assert!(matches!(
            TrajectorySimulator::new(config),
            Err(SimError::Config(ConfigError::UnknownCrs(_)))
        ));
    }
}
