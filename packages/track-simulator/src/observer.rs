//! observer.rs — Event sinks for simulation runs
//!
//! Observers are notified synchronously from the tick loop with a borrowed
//! event. They never see simulator internals. Sinks that write somewhere
//! buffer and only flush when the run ends.

use std::cell::RefCell;
use std::io::{self, BufWriter, Write};
use std::rc::Rc;

use tracing::{debug, info, warn};
use track_types::SimulationEvent;

pub trait TrajectoryObserver {
    fn on_event(&mut self, event: &SimulationEvent);

    /// Called once at the end of every `simulate` run.
    fn flush(&mut self) {}
}

/// Lets callers keep a handle to an observer they registered.
impl<T: TrajectoryObserver> TrajectoryObserver for Rc<RefCell<T>> {
    fn on_event(&mut self, event: &SimulationEvent) {
        self.borrow_mut().on_event(event);
    }

    fn flush(&mut self) {
        self.borrow_mut().flush();
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

#[derive(Default)]
pub struct ObserverSet {
    next_id: u64,
    observers: Vec<(ObserverId, Box<dyn TrajectoryObserver>)>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Box<dyn TrajectoryObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn remove(&mut self, id: ObserverId) -> Option<Box<dyn TrajectoryObserver>> {
        let pos = self.observers.iter().position(|(oid, _)| *oid == id)?;
        Some(self.observers.remove(pos).1)
    }

    /// Registration order.
    pub fn notify(&mut self, event: &SimulationEvent) {
        for (_, observer) in &mut self.observers {
            observer.on_event(event);
        }
    }

    pub fn flush(&mut self) {
        for (_, observer) in &mut self.observers {
            observer.flush();
        }
    }
}

// ── Console ───────────────────────────────────────────────────────────────────

/// Renders every event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl TrajectoryObserver for LogObserver {
    fn on_event(&mut self, event: &SimulationEvent) {
        match event {
            SimulationEvent::StartRecording => info!("Recording started"),
            SimulationEvent::StopRecording => info!("Recording stopped"),
            SimulationEvent::PauseRecording => info!("Recording paused"),
            SimulationEvent::ResumeRecording => info!("Recording resumed"),
            SimulationEvent::DataUpdate(s) => debug!(
                "Sample t={:.1} pos=({:.2}, {:.2}) geo=({:.6}, {:.6}) alt={:.1} hdg={:.0}° acc={:.2} sig={:.2}",
                s.timestamp,
                s.position.x,
                s.position.y,
                s.geo_position.lon,
                s.geo_position.lat,
                s.altitude,
                s.heading,
                s.accuracy,
                s.signal_strength
            ),
            SimulationEvent::TimeChanged { time } => debug!("Time set to {time}"),
            SimulationEvent::PositionChanged { position } => {
                debug!("Position set to ({:.2}, {:.2})", position.x, position.y)
            }
            SimulationEvent::SimulationAttempt { attempt, max_attempts } => {
                info!("Attempt {attempt}/{max_attempts}")
            }
            SimulationEvent::SimulationRetry { attempt, max_attempts, reason } => {
                warn!("Attempt {attempt}/{max_attempts} rejected: {reason:?}")
            }
            SimulationEvent::SimulationSuccess { attempt } => info!("Trajectory accepted on attempt {attempt}"),
            SimulationEvent::SimulationFailure { max_attempts } => {
                warn!("No acceptable trajectory after {max_attempts} attempts")
            }
            SimulationEvent::TickBudgetExhausted { attempt, ticks } => {
                warn!("Attempt {attempt} ran out of ticks after {ticks}")
            }
        }
    }
}

// ── JSON lines ────────────────────────────────────────────────────────────────

/// One JSON object per event, buffered. Write errors are logged once and
/// further events dropped.
pub struct JsonLinesObserver<W: Write> {
    writer: BufWriter<W>,
    failed: bool,
}

impl<W: Write> JsonLinesObserver<W> {
    pub fn new(inner: W) -> Self {
        Self { writer: BufWriter::new(inner), failed: false }
    }

    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    fn write_event(&mut self, event: &SimulationEvent) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> TrajectoryObserver for JsonLinesObserver<W> {
    fn on_event(&mut self, event: &SimulationEvent) {
        if self.failed {
            return;
        }
        if let Err(e) = self.write_event(event) {
            warn!("Event log write failed, dropping further events: {e}");
            self.failed = true;
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.writer.flush() {
            warn!("Event log flush failed: {e}");
        }
    }
}

// ── In-memory ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<SimulationEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    /// Event kinds in arrival order, data updates included.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events.iter().map(SimulationEvent::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl TrajectoryObserver for EventLog {
    fn on_event(&mut self, event: &SimulationEvent) {
        self.events.push(event.clone());
    }
}
