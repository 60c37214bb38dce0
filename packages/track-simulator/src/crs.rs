//! crs.rs — Projected → geographic coordinate transforms
//!
//! The simulator works in a planar projected frame; the device converts each
//! reported position to longitude/latitude for elevation lookups and output.
//! Supported identifiers:
//! - `EPSG:4326`, `EPSG:4490`: already geographic, identity (x = lon, y = lat)
//! - `EPSG:3857`: spherical web mercator
//! - `EPSG:32601..32660` / `EPSG:32701..32760`: UTM north / south on WGS84
//! - `EPSG:4491..4554`: CGCS2000 Gauss–Krüger, 6° and 3° zones

use std::f64::consts::{FRAC_PI_2, PI};

use track_types::{GeoPoint, Point2};

use crate::error::ConfigError;

pub trait CoordinateTransform {
    fn to_geographic(&self, p: Point2) -> GeoPoint;
    fn identifier(&self) -> &str;
}

// ── Ellipsoids ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Ellipsoid {
    /// Semi-major axis, meters
    pub a: f64,
    /// Flattening
    pub f: f64,
}

pub const WGS84: Ellipsoid = Ellipsoid { a: 6_378_137.0, f: 1.0 / 298.257_223_563 };
pub const GRS80: Ellipsoid = Ellipsoid { a: 6_378_137.0, f: 1.0 / 298.257_222_101 };

// ── Identity ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Geographic {
    id: String,
}

impl CoordinateTransform for Geographic {
    fn to_geographic(&self, p: Point2) -> GeoPoint {
        GeoPoint::new(p.x, p.y)
    }
    fn identifier(&self) -> &str {
        &self.id
    }
}

// ── Web mercator ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WebMercator {
    id: String,
}

impl CoordinateTransform for WebMercator {
    fn to_geographic(&self, p: Point2) -> GeoPoint {
        let r = WGS84.a;
        let lon = (p.x / r).to_degrees();
        let lat = (2.0 * (p.y / r).exp().atan() - FRAC_PI_2).to_degrees();
        GeoPoint::new(lon, lat)
    }
    fn identifier(&self) -> &str {
        &self.id
    }
}

// ── Transverse mercator ───────────────────────────────────────────────────────

/// Inverse transverse mercator (footpoint-latitude series), latitude of
/// origin on the equator.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    id: String,
    ellipsoid: Ellipsoid,
    central_meridian_deg: f64,
    scale: f64,
    false_easting: f64,
    false_northing: f64,
}

impl TransverseMercator {
    pub fn new(
        id: impl Into<String>,
        ellipsoid: Ellipsoid,
        central_meridian_deg: f64,
        scale: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self {
            id: id.into(),
            ellipsoid,
            central_meridian_deg,
            scale,
            false_easting,
            false_northing,
        }
    }
}

impl CoordinateTransform for TransverseMercator {
    fn to_geographic(&self, p: Point2) -> GeoPoint {
        let Ellipsoid { a, f } = self.ellipsoid;
        let k0 = self.scale;
        let e2 = f * (2.0 - f);
        let ep2 = e2 / (1.0 - e2);

        let x = p.x - self.false_easting;
        let m = (p.y - self.false_northing) / k0;

        let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0));
        let sq = (1.0 - e2).sqrt();
        let e1 = (1.0 - sq) / (1.0 + sq);
        let phi1 = mu
            + (1.5 * e1 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin1, cos1) = phi1.sin_cos();
        let tan1 = sin1 / cos1;
        let t1 = tan1 * tan1;
        let c1 = ep2 * cos1 * cos1;
        let w = 1.0 - e2 * sin1 * sin1;
        let n1 = a / w.sqrt();
        let r1 = a * (1.0 - e2) / w.powf(1.5);
        let d = x / (n1 * k0);

        let lat = phi1
            - (n1 * tan1 / r1)
                * (d.powi(2) / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5)
                / 120.0)
            / cos1;

        let lon = (self.central_meridian_deg.to_radians() + dlon + PI).rem_euclid(2.0 * PI) - PI;
        GeoPoint::new(lon.to_degrees(), lat.to_degrees())
    }

    fn identifier(&self) -> &str {
        &self.id
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

fn parse_epsg(identifier: &str) -> Option<u32> {
    let (authority, code) = identifier.trim().split_once(':')?;
    if !authority.trim().eq_ignore_ascii_case("EPSG") {
        return None;
    }
    code.trim().parse().ok()
}

/// Build the transform for a configured coordinate reference identifier.
pub fn transform_for(identifier: &str) -> Result<Box<dyn CoordinateTransform>, ConfigError> {
    let unknown = || ConfigError::UnknownCrs(identifier.to_string());
    let code = parse_epsg(identifier).ok_or_else(unknown)?;
    let id = format!("EPSG:{code}");

    let tm = |cm: f64, k0: f64, fe: f64, fnorth: f64, ell: Ellipsoid| -> Box<dyn CoordinateTransform> {
        Box::new(TransverseMercator::new(id.clone(), ell, cm, k0, fe, fnorth))
    };

    let transform: Box<dyn CoordinateTransform> = match code {
        4326 | 4490 => Box::new(Geographic { id: id.clone() }),
        3857 => Box::new(WebMercator { id: id.clone() }),
        // UTM north / south
        32601..=32660 => {
            let zone = f64::from(code - 32600);
            tm(zone * 6.0 - 183.0, 0.9996, 500_000.0, 0.0, WGS84)
        }
        32701..=32760 => {
            let zone = f64::from(code - 32700);
            tm(zone * 6.0 - 183.0, 0.9996, 500_000.0, 10_000_000.0, WGS84)
        }
        // CGCS2000 6° zones 13–23, zone number prefixed to the easting
        4491..=4501 => {
            let zone = f64::from(code - 4491 + 13);
            tm(zone * 6.0 - 3.0, 1.0, zone * 1_000_000.0 + 500_000.0, 0.0, GRS80)
        }
        // CGCS2000 6° by central meridian 75E–135E
        4502..=4512 => tm(75.0 + 6.0 * f64::from(code - 4502), 1.0, 500_000.0, 0.0, GRS80),
        // CGCS2000 3° zones 25–45, zone number prefixed to the easting
        4513..=4533 => {
            let zone = f64::from(code - 4513 + 25);
            tm(zone * 3.0, 1.0, zone * 1_000_000.0 + 500_000.0, 0.0, GRS80)
        }
        // CGCS2000 3° by central meridian 75E–135E
        4534..=4554 => tm(75.0 + 3.0 * f64::from(code - 4534), 1.0, 500_000.0, 0.0, GRS80),
        _ => return Err(unknown()),
    };
    Ok(transform)
}
