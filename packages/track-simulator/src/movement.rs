//! movement.rs — How the patrol walker steps toward the next vertex
//!
//! Two interchangeable models behind `MovementStrategy`:
//! - `RealisticMovement`: uniform speed draw, occasional one-tick heading deviation
//! - `StaminaMovement`:   speed follows remaining stamina, persistent deviation
//!                        that decays, rest stops when exhausted
//!
//! `Person` wraps either one and applies course correction back toward the
//! boundary being walked.

use rand::{Rng, RngCore};
use tracing::debug;
use track_types::Point2;

use crate::config::{MovementKind, PersonConfig, StaminaConfig};
use crate::device::uniform;
use crate::geometry::Ring;

pub trait MovementStrategy {
    /// Candidate true position after walking `elapsed` seconds from `from`
    /// toward `target`. `None` means the walker stays where it is this tick.
    fn next_position(&mut self, rng: &mut dyn RngCore, from: Point2, target: Point2, elapsed: f64)
        -> Option<Point2>;

    fn name(&self) -> &'static str;
}

/// Math angle (radians, counter-clockwise from +x) pointing from `from` to `to`.
fn heading_to(from: Point2, to: Point2) -> f64 {
    let d = to.sub(&from);
    d.y.atan2(d.x)
}

// ── Realistic ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RealisticMovement {
    deviation_probability: f64,
    max_deviation: f64, // radians
    min_speed: f64,
    max_speed: f64,
}

impl RealisticMovement {
    pub fn new(cfg: &PersonConfig) -> Self {
        Self {
            deviation_probability: cfg.deviation_probability,
            max_deviation: cfg.max_deviation_angle.to_radians(),
            min_speed: cfg.speed_range[0],
            max_speed: cfg.speed_range[1],
        }
    }
}

impl MovementStrategy for RealisticMovement {
    fn next_position(&mut self, rng: &mut dyn RngCore, from: Point2, target: Point2, elapsed: f64)
        -> Option<Point2>
    {
        let mut heading = heading_to(from, target);
        if rng.gen_bool(self.deviation_probability) {
            heading += uniform(rng, -self.max_deviation, self.max_deviation);
        }
        let speed = uniform(rng, self.min_speed, self.max_speed);
        Some(from.add(&Point2::from_polar(speed * elapsed, heading)))
    }

    fn name(&self) -> &'static str {
        "realistic"
    }
}

// ── Stamina ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StaminaMovement {
    cfg: StaminaConfig,
    stamina: f64,
    deviation: f64, // radians, persists across ticks
    resting: bool,
}

impl StaminaMovement {
    pub fn new(cfg: &StaminaConfig) -> Self {
        Self {
            cfg: cfg.clone(),
            stamina: cfg.max_stamina,
            deviation: 0.0,
            resting: false,
        }
    }

    pub fn stamina(&self) -> f64 {
        self.stamina
    }

    pub fn is_resting(&self) -> bool {
        self.resting
    }

    /// Linear between min and max speed by stamina fraction.
    pub fn current_speed(&self) -> f64 {
        let fraction = self.stamina / self.cfg.max_stamina;
        self.cfg.min_speed + (self.cfg.max_speed - self.cfg.min_speed) * fraction
    }

    /// Walking faster than the minimum costs progressively more per meter.
    fn consume(&mut self, distance: f64, speed: f64) {
        let span = self.cfg.max_speed - self.cfg.min_speed;
        let speed_factor = if span > 0.0 {
            (speed - self.cfg.min_speed + 1.0).ln() / (span + 1.0).ln()
        } else {
            0.0
        };
        let consumed = distance * self.cfg.stamina_consumption_base * (1.0 + speed_factor);
        self.stamina = (self.stamina - consumed).max(0.0);
    }

    fn recover(&mut self, seconds: f64, walking: bool) {
        let factor = if walking { self.cfg.walking_recovery_factor } else { 1.0 };
        let recovered = seconds * self.cfg.stamina_recovery_rate * factor;
        self.stamina = (self.stamina + recovered).min(self.cfg.max_stamina);
    }

    /// Draw a fresh deviation or let the current one decay.
    fn update_deviation(&mut self, rng: &mut dyn RngCore) {
        if rng.gen_bool(self.cfg.deviation_probability) {
            let max = self.cfg.max_deviation_angle.to_radians();
            self.deviation = uniform(rng, -max, max);
        } else {
            self.deviation *= 1.0 - self.cfg.correction_strength;
        }
    }
}

impl MovementStrategy for StaminaMovement {
    fn next_position(&mut self, rng: &mut dyn RngCore, from: Point2, target: Point2, elapsed: f64)
        -> Option<Point2>
    {
        if self.resting {
            self.recover(elapsed, false);
            if self.stamina >= self.cfg.min_stamina_to_walk {
                debug!("Rested back to {:.1} stamina", self.stamina);
                self.resting = false;
            }
            return None;
        }

        self.update_deviation(rng);
        let heading = heading_to(from, target) + self.deviation;
        let speed = self.current_speed();
        let distance = speed * elapsed;

        self.consume(distance, speed);
        self.recover(elapsed, true);
        if self.stamina < self.cfg.min_stamina_to_walk {
            debug!("Stamina down to {:.1}, resting", self.stamina);
            self.resting = true;
        }
        Some(from.add(&Point2::from_polar(distance, heading)))
    }

    fn name(&self) -> &'static str {
        "stamina"
    }
}

pub fn strategy_for(cfg: &PersonConfig) -> Box<dyn MovementStrategy> {
    match cfg.movement_strategy {
        MovementKind::Realistic => Box::new(RealisticMovement::new(cfg)),
        MovementKind::Stamina => Box::new(StaminaMovement::new(&cfg.stamina)),
    }
}

// ── Person ────────────────────────────────────────────────────────────────────

/// The walker: a movement model bound to the boundary it patrols.
pub struct Person {
    strategy: Box<dyn MovementStrategy>,
    boundary: Ring,
    correction_threshold: f64,
    correction_factor: f64,
}

impl Person {
    pub fn new(cfg: &PersonConfig, boundary: Ring) -> Self {
        Self::with_strategy(strategy_for(cfg), cfg, boundary)
    }

    pub fn with_strategy(strategy: Box<dyn MovementStrategy>, cfg: &PersonConfig, boundary: Ring) -> Self {
        Self {
            strategy,
            boundary,
            correction_threshold: cfg.correction_threshold,
            correction_factor: cfg.correction_factor,
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// One tick of walking from the reported position toward `target`.
    pub fn step(&mut self, rng: &mut dyn RngCore, reported: Point2, target: Point2, elapsed: f64) -> Option<Point2> {
        self.strategy
            .next_position(rng, reported, target, elapsed)
            .map(|candidate| self.correct(candidate))
    }

    /// Pull a candidate that strayed past the threshold back toward the
    /// nearest boundary point. Factor 0 leaves it, 1 snaps onto the boundary.
    pub fn correct(&self, candidate: Point2) -> Point2 {
        let nearest = self.boundary.nearest_point(candidate);
        let off = nearest.sub(&candidate);
        if off.norm() > self.correction_threshold {
            candidate.add(&off.scale(self.correction_factor))
        } else {
            candidate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn straight(speed: f64) -> PersonConfig {
        PersonConfig {
            deviation_probability: 0.0,
            speed_range: [speed, speed],
            ..PersonConfig::default()
        }
    }

    fn square() -> Ring {
        Ring::new(&[
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 0.0),
            Point2::new(50.0, 50.0),
            Point2::new(0.0, 50.0),
        ])
        .unwrap()
    }

    #[test]
    fn realistic_walks_straight_without_deviation() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut m = RealisticMovement::new(&straight(1.2));
        let p = m.next_position(&mut rng, Point2::zero(), Point2::new(10.0, 0.0), 2.0).unwrap();
        assert!((p.x - 2.4).abs() < 1e-12 && p.y.abs() < 1e-12);
    }

    #[test]
    fn realistic_step_length_within_speed_range() {
        let mut rng = StdRng::seed_from_u64(2);
        let cfg = PersonConfig { deviation_probability: 1.0, max_deviation_angle: 10.0, ..PersonConfig::default() };
        let mut m = RealisticMovement::new(&cfg);
        let target = Point2::new(0.0, 100.0);
        for _ in 0..500 {
            let p = m.next_position(&mut rng, Point2::zero(), target, 1.0).unwrap();
            let len = p.norm();
            assert!(len > 0.8 - 1e-9 && len < 1.5 + 1e-9, "step {len}");
            // within ±10° of due north
            let off = (p.x / len).asin().to_degrees().abs();
            assert!(off <= 10.0 + 1e-9);
        }
    }

    #[test]
    fn stamina_speed_drops_as_stamina_drains() {
        let mut rng = StdRng::seed_from_u64(3);
        let cfg = StaminaConfig { deviation_probability: 0.0, ..StaminaConfig::default() };
        let mut m = StaminaMovement::new(&cfg);
        assert!((m.current_speed() - cfg.max_speed).abs() < 1e-12);

        let mut from = Point2::zero();
        for _ in 0..100 {
            from = m.next_position(&mut rng, from, Point2::new(1e6, 0.0), 1.0).unwrap();
        }
        assert!(m.stamina() < cfg.max_stamina);
        assert!(m.current_speed() < cfg.max_speed);
        assert!(from.y.abs() < 1e-9);
    }

    #[test]
    fn stamina_rests_in_place_then_walks_again() {
        let mut rng = StdRng::seed_from_u64(4);
        let cfg = StaminaConfig {
            deviation_probability: 0.0,
            stamina_consumption_base: 5.0,
            min_stamina_to_walk: 50.0,
            stamina_recovery_rate: 10.0,
            ..StaminaConfig::default()
        };
        let mut m = StaminaMovement::new(&cfg);
        let target = Point2::new(1e6, 0.0);

        let mut ticks = 0;
        while !m.is_resting() {
            assert!(m.next_position(&mut rng, Point2::zero(), target, 1.0).is_some());
            ticks += 1;
            assert!(ticks < 100);
        }
        let mut rested = 0;
        while m.is_resting() {
            assert!(m.next_position(&mut rng, Point2::zero(), target, 1.0).is_none());
            rested += 1;
            assert!(rested < 100);
        }
        assert!(m.stamina() >= cfg.min_stamina_to_walk);
        assert!(m.next_position(&mut rng, Point2::zero(), target, 1.0).is_some());
    }

    #[test]
    fn stamina_deviation_decays() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut m = StaminaMovement::new(&StaminaConfig { deviation_probability: 0.0, ..StaminaConfig::default() });
        m.deviation = 0.2;
        m.next_position(&mut rng, Point2::zero(), Point2::new(10.0, 0.0), 1.0);
        assert!((m.deviation - 0.1).abs() < 1e-12);
    }

    #[test]
    fn correction_pulls_back_toward_boundary() {
        let cfg = PersonConfig { correction_threshold: 5.0, correction_factor: 0.5, ..PersonConfig::default() };
        let person = Person::new(&cfg, square());
        // 10 m off the bottom edge → pulled halfway back
        assert_eq!(person.correct(Point2::new(25.0, -10.0)), Point2::new(25.0, -5.0));
        // within threshold → untouched
        assert_eq!(person.correct(Point2::new(25.0, -3.0)), Point2::new(25.0, -3.0));

        let snap = Person::new(&PersonConfig { correction_threshold: 0.0, correction_factor: 1.0, ..cfg }, square());
        assert_eq!(snap.correct(Point2::new(25.0, -3.0)), Point2::new(25.0, 0.0));
    }

    #[test]
    fn factory_follows_config() {
        let mut cfg = PersonConfig::default();
        assert_eq!(strategy_for(&cfg).name(), "realistic");
        cfg.movement_strategy = MovementKind::Stamina;
        assert_eq!(Person::new(&cfg, square()).strategy_name(), "stamina");
    }
}
