//! track_simulator — Patrol trajectory simulator
//!
//! A walker patrols the boundary of a polygon while a simulated positioning
//! receiver records noisy fixes. Each recording is checked for area fidelity
//! against the input polygon and retried until it passes or attempts run out.
//!
//! Randomness is a single seedable generator owned by `TrajectorySimulator`
//! and passed down to every stochastic component.

pub mod config;
pub mod crs;
pub mod device;
pub mod elevation;
pub mod error;
pub mod geometry;
pub mod inspection;
pub mod movement;
pub mod observer;
pub mod presets;
pub mod report;
pub mod sampling;
pub mod simulator;

pub use config::SimConfig;
pub use error::{ConfigError, DeviceError, ElevationError, SimError};
pub use geometry::Ring;
pub use observer::{EventLog, JsonLinesObserver, LogObserver, ObserverId, TrajectoryObserver};
pub use report::TrajectoryReport;
pub use simulator::{SimulationOutcome, SimulationStatus, TrajectorySimulator};
pub use track_types::{GeoPoint, Point2, PositionSample, RecordingState, RetryReason, SimulationEvent};
