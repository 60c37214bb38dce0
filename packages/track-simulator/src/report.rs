//! report.rs — Summary of a simulated patrol track
//!
//! The fingerprint hashes every sample's reported position, altitude,
//! timestamp, heading, accuracy and signal strength (little-endian f64 bytes)
//! so two runs can be compared for bit-identical output.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use track_types::{GeoPoint, Point2, PositionSample};

use crate::geometry::{path_length, polygon_area};
use crate::simulator::{SimulationOutcome, SimulationStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub position: Point2,
    pub geo_position: GeoPoint,
    /// RFC 3339 UTC, `None` when the timestamp is out of range
    pub time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrajectoryReport {
    pub status: SimulationStatus,
    pub attempts: u32,
    pub ticks: u64,
    pub points: usize,
    pub start: Option<Endpoint>,
    pub end: Option<Endpoint>,
    /// Seconds between first and last sample
    pub duration: f64,
    /// Walked distance along the reported positions, meters
    pub distance: f64,
    pub min_altitude: Option<f64>,
    pub max_altitude: Option<f64>,
    /// Enclosed area of the reported positions, square meters
    pub area: f64,
    pub area_ratio: Option<f64>,
    pub fingerprint: String,
}

impl TrajectoryReport {
    pub fn from_outcome(outcome: &SimulationOutcome) -> Self {
        let samples = &outcome.trajectory;
        let positions: Vec<Point2> = samples.iter().map(|s| s.position).collect();
        let altitudes = samples.iter().map(|s| s.altitude);

        Self {
            status: outcome.status,
            attempts: outcome.attempts,
            ticks: outcome.ticks,
            points: samples.len(),
            start: samples.first().map(endpoint),
            end: samples.last().map(endpoint),
            duration: match (samples.first(), samples.last()) {
                (Some(a), Some(b)) => b.timestamp - a.timestamp,
                _ => 0.0,
            },
            distance: path_length(&positions),
            min_altitude: altitudes.clone().reduce(f64::min),
            max_altitude: altitudes.reduce(f64::max),
            area: polygon_area(&positions),
            area_ratio: outcome.area_ratio,
            fingerprint: fingerprint(samples),
        }
    }
}

fn endpoint(sample: &PositionSample) -> Endpoint {
    Endpoint {
        position: sample.position,
        geo_position: sample.geo_position,
        time: rfc3339(sample.timestamp),
    }
}

/// Unix seconds → `2021-07-01T00:00:00.000Z`.
pub fn rfc3339(timestamp: f64) -> Option<String> {
    if !timestamp.is_finite() {
        return None;
    }
    let millis = (timestamp * 1000.0).round();
    if millis.abs() > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64).map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// SHA-256 over the sample stream, hex encoded.
pub fn fingerprint(samples: &[PositionSample]) -> String {
    let mut hasher = Sha256::new();
    for s in samples {
        for v in [
            s.position.x,
            s.position.y,
            s.altitude,
            s.timestamp,
            s.heading,
            s.accuracy,
            s.signal_strength,
        ] {
            hasher.update(v.to_le_bytes());
        }
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, t: f64, alt: f64) -> PositionSample {
        PositionSample {
            position: Point2::new(x, y),
            timestamp: t,
            altitude: alt,
            ..PositionSample::default()
        }
    }

    fn outcome(trajectory: Vec<PositionSample>) -> SimulationOutcome {
        SimulationOutcome {
            trajectory,
            status: SimulationStatus::Accepted,
            attempts: 1,
            area_ratio: Some(1.0),
            ticks: 40,
        }
    }

    #[test]
    fn summarises_square_walk() {
        let t0 = 1_625_097_600.0;
        let report = TrajectoryReport::from_outcome(&outcome(vec![
            sample(0.0, 0.0, t0, 12.0),
            sample(10.0, 0.0, t0 + 10.0, 15.0),
            sample(10.0, 10.0, t0 + 20.0, 9.5),
            sample(0.0, 10.0, t0 + 30.0, 11.0),
            sample(0.0, 0.0, t0 + 40.0, 12.0),
        ]));
        assert_eq!(report.points, 5);
        assert_eq!(report.duration, 40.0);
        assert_eq!(report.distance, 40.0);
        assert_eq!(report.area, 100.0);
        assert_eq!(report.min_altitude, Some(9.5));
        assert_eq!(report.max_altitude, Some(15.0));
        assert_eq!(report.start.as_ref().unwrap().time.as_deref(), Some("2021-07-01T00:00:00.000Z"));
        assert_eq!(report.end.as_ref().unwrap().time.as_deref(), Some("2021-07-01T00:00:40.000Z"));
        assert_eq!(report.fingerprint.len(), 64);
    }

    #[test]
    fn empty_trajectory_report() {
        let report = TrajectoryReport::from_outcome(&outcome(Vec::new()));
        assert_eq!(report.points, 0);
        assert!(report.start.is_none() && report.end.is_none());
        assert_eq!(report.min_altitude, None);
        assert_eq!(report.distance, 0.0);
    }

    #[test]
    fn fingerprint_tracks_every_sample() {
        let a = vec![sample(0.0, 0.0, 0.0, 0.0), sample(1.0, 0.0, 1.0, 0.0)];
        let mut b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
        b[1].position.y = 1e-12;
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn rfc3339_rejects_non_finite() {
        assert_eq!(rfc3339(f64::NAN), None);
        assert_eq!(rfc3339(0.5).as_deref(), Some("1970-01-01T00:00:00.500Z"));
    }
}
