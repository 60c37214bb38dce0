//! elevation.rs — Altitude lookup by geographic coordinate
//!
//! Raster- or terrain-backed providers live outside this crate and plug in
//! through `ElevationProvider`. `FlatElevation` is the fallback whenever
//! nothing else is configured.

use track_types::GeoPoint;

use crate::config::{ElevationConfig, ElevationKind};
use crate::error::ElevationError;

pub trait ElevationProvider {
    fn elevation(&self, at: GeoPoint) -> Result<f64, ElevationError>;

    /// Same order and length as `points`. Fails as a whole if any lookup fails.
    fn batch_elevation(&self, points: &[GeoPoint]) -> Result<Vec<f64>, ElevationError> {
        points.iter().map(|p| self.elevation(*p)).collect()
    }
}

/// Sea level everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatElevation;

impl ElevationProvider for FlatElevation {
    fn elevation(&self, _at: GeoPoint) -> Result<f64, ElevationError> {
        Ok(0.0)
    }

    fn batch_elevation(&self, points: &[GeoPoint]) -> Result<Vec<f64>, ElevationError> {
        Ok(vec![0.0; points.len()])
    }
}

/// A fixed altitude everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantElevation(pub f64);

impl ElevationProvider for ConstantElevation {
    fn elevation(&self, _at: GeoPoint) -> Result<f64, ElevationError> {
        Ok(self.0)
    }
}

pub fn provider_for(cfg: &ElevationConfig) -> Box<dyn ElevationProvider> {
    match cfg.provider {
        ElevationKind::Flat => Box::new(FlatElevation),
        ElevationKind::Constant => Box::new(ConstantElevation(cfg.altitude)),
    }
}
