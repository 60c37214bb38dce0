//! presets.rs — Reference patrol boundaries
//!
//! Coordinates are meters in the projected frame, relative to the first vertex.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use track_types::Point2;

use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// 20-vertex irregular field, roughly 120 × 105 m
    Irregular,
    /// 50 m square
    Square,
    /// Elongated hexagon, 60 m tall
    Hexagon,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Irregular, Preset::Square, Preset::Hexagon];

    pub fn polygon(&self) -> Vec<Point2> {
        let coords: &[(f64, f64)] = match self {
            Preset::Irregular => &[
                (0.0, 0.0), (20.0, 10.0), (40.0, 5.0), (60.0, 15.0), (80.0, 10.0),
                (100.0, 0.0), (110.0, 20.0), (105.0, 40.0), (115.0, 60.0), (110.0, 80.0),
                (100.0, 100.0), (80.0, 95.0), (60.0, 105.0), (40.0, 95.0), (20.0, 105.0),
                (0.0, 100.0), (-10.0, 80.0), (-5.0, 60.0), (-15.0, 40.0), (-10.0, 20.0),
            ],
            Preset::Square => &[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0), (0.0, 50.0)],
            Preset::Hexagon => &[(0.0, 0.0), (30.0, 0.0), (45.0, 30.0), (30.0, 60.0), (0.0, 60.0), (-15.0, 30.0)],
        };
        coords.iter().map(|&(x, y)| Point2::new(x, y)).collect()
    }
}

/// Parse `"x,y x,y ..."` (whitespace or `;` between vertices).
pub fn parse_polygon(raw: &str) -> Result<Vec<Point2>, SimError> {
    raw.split(|c: char| c.is_whitespace() || c == ';')
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            let bad = || SimError::InvalidInput(format!("vertex `{tok}` is not `x,y`"));
            let (x, y) = tok.split_once(',').ok_or_else(bad)?;
            let x: f64 = x.trim().parse().map_err(|_| bad())?;
            let y: f64 = y.trim().parse().map_err(|_| bad())?;
            Ok(Point2::new(x, y))
        })
        .collect()
}
