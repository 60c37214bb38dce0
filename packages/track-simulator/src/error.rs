//! error.rs — Error types of the simulator core
//!
//! Retry exhaustion and tick-budget exhaustion are not errors: they are
//! reported through `SimulationStatus` together with the best-effort trajectory.

use std::path::PathBuf;

use thiserror::Error;
use track_types::RecordingState;

/// Configuration could not be loaded or is out of range.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported coordinate reference system `{0}`")]
    UnknownCrs(String),

    #[error("invalid value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { key, reason: reason.into() }
    }
}

/// Recording lifecycle misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("cannot {action} while the device is {state:?}")]
    InvalidTransition { action: &'static str, state: RecordingState },
}

/// An elevation provider could not answer a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElevationError {
    #[error("elevation lookup failed: {0}")]
    Lookup(String),
}

/// Top-level error of a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// Degenerate input polygon. Raised before any attempt is started.
    #[error("invalid input polygon: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}
