// Session state shared by the sampling controller and calibration manager
use crate::domain::calibration::{CalibrationFactors, CalibrationStrategy};
use crate::domain::telemetry::DerivedRecord;
use crate::domain::window::RecordBuffers;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, broadcast};

/// Idle throttle pulse of the ESC, in microseconds.
pub const IDLE_THROTTLE_US: u16 = 1000;

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingState {
    Idle,
    Sampling,
}

/// Notifications for presentation sinks.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Record(Arc<DerivedRecord>),
    /// Sampling stopped; the log is final for export.
    LogFinalized { records: usize },
    Reset,
    Calibrated(CalibrationFactors),
}

/// Everything that mutates during a session. Only reachable through
/// [`TelemetrySession::lock`], so every mutation is serialized.
#[derive(Debug)]
pub struct Session {
    state: SamplingState,
    /// Bumped whenever a reading taken earlier must no longer be applied.
    epoch: u64,
    factors: CalibrationFactors,
    throttle: u16,
    buffers: RecordBuffers,
}

impl Session {
    pub fn new(strategy: CalibrationStrategy) -> Self {
        Self {
            state: SamplingState::Idle,
            epoch: 0,
            factors: CalibrationFactors::identity(strategy),
            throttle: IDLE_THROTTLE_US,
            buffers: RecordBuffers::default(),
        }
    }

    pub fn state(&self) -> SamplingState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn factors(&self) -> CalibrationFactors {
        self.factors
    }

    pub fn throttle(&self) -> u16 {
        self.throttle
    }

    pub fn buffers(&self) -> &RecordBuffers {
        &self.buffers
    }

    /// Returns false when already sampling.
    pub fn begin_sampling(&mut self) -> bool {
        if self.state == SamplingState::Sampling {
            return false;
        }
        self.state = SamplingState::Sampling;
        self.epoch += 1;
        true
    }

    /// Returns false when already idle.
    pub fn end_sampling(&mut self) -> bool {
        if self.state == SamplingState::Idle {
            return false;
        }
        self.state = SamplingState::Idle;
        self.epoch += 1;
        true
    }

    /// Whether a reading started under `epoch` may still be recorded.
    pub fn accepts(&self, epoch: u64) -> bool {
        self.state == SamplingState::Sampling && self.epoch == epoch
    }

    pub fn append(&mut self, record: Arc<DerivedRecord>) {
        self.buffers.append(record);
    }

    pub fn set_throttle(&mut self, throttle: u16) {
        self.throttle = throttle;
    }

    pub fn reset(&mut self) {
        self.buffers.reset();
        self.epoch += 1;
    }

    /// Install a new factor set; readings from before it are discarded.
    pub fn apply_calibration(&mut self, factors: CalibrationFactors) {
        self.factors = factors;
        self.reset();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SamplingState,
    pub throttle: u16,
    pub factors: CalibrationFactors,
    pub window_len: usize,
    pub log_len: usize,
}

#[derive(Clone)]
pub struct TelemetrySession {
    inner: Arc<Mutex<Session>>,
    commands: Arc<Mutex<()>>,
    events: broadcast::Sender<SessionEvent>,
}

impl TelemetrySession {
    pub fn new(strategy: CalibrationStrategy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Session::new(strategy))),
            commands: Arc::new(Mutex::new(())),
            events,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().await
    }

    /// Serializes operator commands that write to the device and then commit
    /// the same value here. Held across the device round trip; take it before
    /// [`lock`](Self::lock), never while holding it.
    pub async fn command_lock(&self) -> MutexGuard<'_, ()> {
        self.commands.lock().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Send to every subscriber. Callers publish while still holding the
    /// session guard so events arrive in mutation order.
    pub fn publish(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub async fn status(&self) -> SessionStatus {
        let session = self.lock().await;
        SessionStatus {
            state: session.state(),
            throttle: session.throttle(),
            factors: session.factors(),
            window_len: session.buffers().window().len(),
            log_len: session.buffers().log().len(),
        }
    }

    pub async fn window_snapshot(&self) -> Vec<Arc<DerivedRecord>> {
        self.lock().await.buffers().window_snapshot()
    }

    pub async fn log_snapshot(&self) -> Vec<Arc<DerivedRecord>> {
        self.lock().await.buffers().log_snapshot()
    }
}
