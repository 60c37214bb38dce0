//! config.rs — Simulator configuration (populated from config.toml)
//!
//! One explicit value, passed by reference into every component constructor.
//! Every key has a default so partial files are accepted; `validate` is the
//! single place that rejects out-of-range values.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crs;
use crate::error::ConfigError;

// ── Enumerated options ────────────────────────────────────────────────────────

/// Unit of the elapsed time handed to the device each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    #[default]
    Second,
    Millisecond,
    Minute,
    Hour,
}

impl TimeUnit {
    /// Seconds per unit
    pub fn factor(&self) -> f64 {
        match self {
            Self::Second => 1.0,
            Self::Millisecond => 0.001,
            Self::Minute => 60.0,
            Self::Hour => 3600.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingKind {
    #[default]
    Distance,
    Time,
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    #[default]
    Realistic,
    Stamina,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationKind {
    #[default]
    #[serde(alias = "default")]
    Flat,
    Constant,
}

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub gps: GpsConfig,
    pub person: PersonConfig,
    pub elevation: ElevationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_attempts: u32,
    /// Minimum recorded-area / polygon-area ratio for acceptance
    pub area_threshold: f64,
    /// Optional upper bound on the same ratio
    pub max_area_ratio: Option<f64>,
    /// Distance to an edge's end vertex that counts as "reached"
    pub tolerance: f64,
    /// Reach distance for the closing edge; falls back to `tolerance`
    pub closing_distance: Option<f64>,
    /// Scales the walked distance per tick
    pub time_step: f64,
    pub time_unit: TimeUnit,
    pub max_ticks_per_attempt: u64,
    pub seed: Option<u64>,
    /// Recording pauses during each attempt; the walker keeps moving
    pub pauses: Vec<PauseWindow>,
}

/// `duration` ticks without recording, starting at tick `start_tick` (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseWindow {
    pub start_tick: u64,
    pub duration: u64,
}

impl PauseWindow {
    /// First tick recording again.
    pub fn end_tick(&self) -> u64 {
        self.start_tick.saturating_add(self.duration)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            area_threshold: 0.9,
            max_area_ratio: None,
            tolerance: 1.0,
            closing_distance: None,
            time_step: 1.0,
            time_unit: TimeUnit::Second,
            max_ticks_per_attempt: 50_000,
            seed: None,
            pauses: Vec::new(),
        }
    }
}

impl SimulationConfig {
    pub fn closing_distance(&self) -> f64 {
        self.closing_distance.unwrap_or(self.tolerance)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub coordinate_system: String,
    pub initial_accuracy: f64,
    pub initial_signal_strength_min: f64,
    pub initial_signal_strength_max: f64,
    pub min_accuracy: f64,
    pub max_accuracy: f64,
    pub min_signal_strength: f64,
    /// Bound of the per-tick signal strength perturbation
    pub signal_drift: f64,
    /// Bound of the per-tick accuracy jitter
    pub accuracy_jitter: f64,
    /// Signal gain within one tick that triggers a fix jump
    pub fix_jump_threshold: f64,
    pub sampling_strategy: SamplingKind,
    pub sampling_distance: f64,
    pub sampling_interval: f64,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self {
            coordinate_system: "EPSG:4510".to_string(),
            initial_accuracy: 5.0,
            initial_signal_strength_min: 0.8,
            initial_signal_strength_max: 1.0,
            min_accuracy: 2.5,
            max_accuracy: 12.0,
            min_signal_strength: 0.4,
            signal_drift: 0.05,
            accuracy_jitter: 0.5,
            fix_jump_threshold: 0.2,
            sampling_strategy: SamplingKind::Distance,
            sampling_distance: 5.0,
            sampling_interval: 1.0,
        }
    }
}

impl GpsConfig {
    /// Receiver settings on their own; the device constructor checks these.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gps = self;
        crs::transform_for(&gps.coordinate_system)?;
        non_negative("gps.min_accuracy", gps.min_accuracy)?;
        ordered("gps.max_accuracy", gps.min_accuracy, gps.max_accuracy)?;
        non_negative("gps.initial_accuracy", gps.initial_accuracy)?;
        unit_interval("gps.min_signal_strength", gps.min_signal_strength)?;
        unit_interval("gps.initial_signal_strength_min", gps.initial_signal_strength_min)?;
        unit_interval("gps.initial_signal_strength_max", gps.initial_signal_strength_max)?;
        ordered(
            "gps.initial_signal_strength_max",
            gps.initial_signal_strength_min,
            gps.initial_signal_strength_max,
        )?;
        non_negative("gps.signal_drift", gps.signal_drift)?;
        non_negative("gps.accuracy_jitter", gps.accuracy_jitter)?;
        non_negative("gps.fix_jump_threshold", gps.fix_jump_threshold)?;
        non_negative("gps.sampling_distance", gps.sampling_distance)?;
        non_negative("gps.sampling_interval", gps.sampling_interval)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonConfig {
    pub movement_strategy: MovementKind,
    pub deviation_probability: f64,
    /// Degrees
    pub max_deviation_angle: f64,
    /// [min, max] walking speed, meters per second
    pub speed_range: [f64; 2],
    /// Distance from the boundary beyond which the step is pulled back
    pub correction_threshold: f64,
    /// 0 = no correction, 1 = snap onto the boundary
    pub correction_factor: f64,
    pub stamina: StaminaConfig,
}

impl Default for PersonConfig {
    fn default() -> Self {
        Self {
            movement_strategy: MovementKind::Realistic,
            deviation_probability: 0.1,
            max_deviation_angle: 10.0,
            speed_range: [0.8, 1.5],
            correction_threshold: 5.0,
            correction_factor: 0.5,
            stamina: StaminaConfig::default(),
        }
    }
}

/// Parameters of the stamina movement model. Kept separate from the
/// realistic model's keys on purpose: the two are calibrated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaminaConfig {
    pub max_speed: f64,
    pub min_speed: f64,
    pub max_stamina: f64,
    pub stamina_consumption_base: f64,
    /// Stamina per second while resting
    pub stamina_recovery_rate: f64,
    /// Fraction of the resting recovery rate applied while walking
    pub walking_recovery_factor: f64,
    pub min_stamina_to_walk: f64,
    /// Degrees
    pub max_deviation_angle: f64,
    pub deviation_probability: f64,
    /// Fraction of the current deviation removed on ticks without a new one
    pub correction_strength: f64,
}

impl Default for StaminaConfig {
    fn default() -> Self {
        Self {
            max_speed: 1.5,
            min_speed: 0.5,
            max_stamina: 100.0,
            stamina_consumption_base: 0.05,
            stamina_recovery_rate: 0.1,
            walking_recovery_factor: 0.3,
            min_stamina_to_walk: 20.0,
            max_deviation_angle: 15.0,
            deviation_probability: 0.3,
            correction_strength: 0.5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    pub provider: ElevationKind,
    /// Altitude returned by the `constant` provider
    pub altitude: f64,
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl SimConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Reject values the components cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.max_attempts == 0 {
            return Err(ConfigError::invalid("simulation.max_attempts", "must be at least 1"));
        }
        positive("simulation.area_threshold", sim.area_threshold)?;
        if let Some(max) = sim.max_area_ratio {
            if !(max.is_finite() && max >= sim.area_threshold) {
                return Err(ConfigError::invalid(
                    "simulation.max_area_ratio",
                    "must be finite and not below simulation.area_threshold",
                ));
            }
        }
        positive("simulation.tolerance", sim.tolerance)?;
        positive("simulation.closing_distance", sim.closing_distance())?;
        positive("simulation.time_step", sim.time_step)?;
        if sim.max_ticks_per_attempt == 0 {
            return Err(ConfigError::invalid("simulation.max_ticks_per_attempt", "must be at least 1"));
        }
        if sim.pauses.iter().any(|w| w.start_tick == 0 || w.duration == 0) {
            return Err(ConfigError::invalid("simulation.pauses", "start_tick and duration must be at least 1"));
        }

        self.gps.validate()?;

        let person = &self.person;
        unit_interval("person.deviation_probability", person.deviation_probability)?;
        non_negative("person.max_deviation_angle", person.max_deviation_angle)?;
        non_negative("person.speed_range", person.speed_range[0])?;
        ordered("person.speed_range", person.speed_range[0], person.speed_range[1])?;
        non_negative("person.correction_threshold", person.correction_threshold)?;
        unit_interval("person.correction_factor", person.correction_factor)?;

        let st = &person.stamina;
        non_negative("person.stamina.min_speed", st.min_speed)?;
        ordered("person.stamina.max_speed", st.min_speed, st.max_speed)?;
        positive("person.stamina.max_stamina", st.max_stamina)?;
        non_negative("person.stamina.stamina_consumption_base", st.stamina_consumption_base)?;
        positive("person.stamina.stamina_recovery_rate", st.stamina_recovery_rate)?;
        unit_interval("person.stamina.walking_recovery_factor", st.walking_recovery_factor)?;
        non_negative("person.stamina.min_stamina_to_walk", st.min_stamina_to_walk)?;
        if st.min_stamina_to_walk > st.max_stamina {
            return Err(ConfigError::invalid(
                "person.stamina.min_stamina_to_walk",
                "must not exceed person.stamina.max_stamina",
            ));
        }
        non_negative("person.stamina.max_deviation_angle", st.max_deviation_angle)?;
        unit_interval("person.stamina.deviation_probability", st.deviation_probability)?;
        unit_interval("person.stamina.correction_strength", st.correction_strength)?;

        if !self.elevation.altitude.is_finite() {
            return Err(ConfigError::invalid("elevation.altitude", "must be finite"));
        }
        Ok(())
    }
}

fn positive(key: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v > 0.0 { Ok(()) } else { Err(ConfigError::invalid(key, format!("{v} is not > 0"))) }
}

fn non_negative(key: &'static str, v: f64) -> Result<(), ConfigError> {
    if v.is_finite() && v >= 0.0 { Ok(()) } else { Err(ConfigError::invalid(key, format!("{v} is not >= 0"))) }
}

fn unit_interval(key: &'static str, v: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&v) { Ok(()) } else { Err(ConfigError::invalid(key, format!("{v} is outside [0, 1]"))) }
}

fn ordered(key: &'static str, lo: f64, hi: f64) -> Result<(), ConfigError> {
    if hi.is_finite() && lo <= hi {
        Ok(())
    } else {
        Err(ConfigError::invalid(key, format!("range [{lo}, {hi}] is empty")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn bundled_config_parses_and_validates() {
        let cfg = SimConfig::from_toml_str(include_str!("../config.toml")).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.simulation.max_attempts, 3);
        assert_eq!(cfg.gps.sampling_strategy, SamplingKind::Distance);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = SimConfig::from_toml_str(
            r#"
            [gps]
            sampling_strategy = "hybrid"
            sampling_interval = 5.0

            [simulation]
            time_unit = "minute"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gps.sampling_strategy, SamplingKind::Hybrid);
        assert_eq!(cfg.gps.sampling_distance, 5.0);
        assert_eq!(cfg.simulation.time_unit.factor(), 60.0);
        assert_eq!(cfg.simulation.closing_distance(), cfg.simulation.tolerance);
    }

    #[test]
    fn unknown_strategy_is_a_parse_error() {
        let err = SimConfig::from_toml_str("[gps]\nsampling_strategy = \"random\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_crs_is_rejected() {
        let mut cfg = SimConfig::default();
        cfg.gps.coordinate_system = "EPSG:99999".into();
        assert!(matches!(cfg.validate(), Err(ConfigError::UnknownCrs(_))));
    }

    #[test]
    fn inverted_accuracy_bounds_are_rejected() {
        let mut cfg = SimConfig::default();
        cfg.gps.min_accuracy = 10.0;
        cfg.gps.max_accuracy = 2.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "gps.max_accuracy", .. }));
    }

    #[test]
    fn pause_windows_parse_and_validate() {
        let cfg = SimConfig::from_toml_str(
            r#"
            [simulation]
            pauses = [{ start_tick = 30, duration = 10 }]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.simulation.pauses, vec![PauseWindow { start_tick: 30, duration: 10 }]);
        assert_eq!(cfg.simulation.pauses[0].end_tick(), 40);
        cfg.validate().unwrap();

        let mut cfg = SimConfig::default();
        cfg.simulation.pauses = vec![PauseWindow { start_tick: 0, duration: 5 }];
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid { key: "simulation.pauses", .. })));
    }

    #[test]
    fn gps_section_validates_alone() {
        GpsConfig::default().validate().unwrap();
        let gps = GpsConfig { initial_signal_strength_min: 0.9, initial_signal_strength_max: 0.5, ..GpsConfig::default() };
        assert!(matches!(gps.validate(), Err(ConfigError::Invalid { key: "gps.initial_signal_strength_max", .. })));
    }

    #[test]
    fn unreachable_threshold_is_still_valid() {
        let mut cfg = SimConfig::default();
        cfg.simulation.area_threshold = 1.1;
        cfg.validate().unwrap();
    }
}
