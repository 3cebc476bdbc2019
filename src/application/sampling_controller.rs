// Sampling controller - Drives the acquisition cycle while sampling is on
use crate::application::sensor_client::{SensorClient, SensorError};
use crate::application::session::{SamplingState, SessionEvent, TelemetrySession};
use crate::domain::calibration::InvalidInput;
use crate::domain::metrics::derive;
use chrono::Utc;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::MissedTickBehavior;

/// Pulse widths the ESC accepts, in microseconds.
pub const THROTTLE_RANGE_US: RangeInclusive<u16> = 1000..=2000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThrottleError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("throttle not acknowledged: {0}")]
    Sensor(#[from] SensorError),
}

/// What a single acquisition cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Not sampling; the sensor was not touched.
    Idle,
    Appended,
    /// The read failed; retried on the next tick.
    Skipped(SensorError),
    /// The read finished after the run it belonged to had ended.
    Discarded,
}

#[derive(Clone)]
pub struct SamplingController {
    session: TelemetrySession,
    sensor: Arc<dyn SensorClient>,
    period: Duration,
    read_timeout: Duration,
}

impl SamplingController {
    pub fn new(
        session: TelemetrySession,
        sensor: Arc<dyn SensorClient>,
        period: Duration,
        read_timeout: Duration,
    ) -> Self {
        Self {
            session,
            sensor,
            period,
            read_timeout,
        }
    }

    /// Returns whether sampling was off before.
    pub async fn start(&self) -> bool {
        if !self.session.lock().await.begin_sampling() {
            return false;
        }
        tracing::info!("Sampling started");

        if let Err(e) = self.sensor.start_sampling().await {
            tracing::warn!("Sensor did not acknowledge sampling start: {}", e);
        }
        true
    }

    /// Returns whether sampling was on before. The log is kept and announced
    /// as final.
    pub async fn stop(&self) -> bool {
        let records = {
            let mut session = self.session.lock().await;
            if !session.end_sampling() {
                return false;
            }
            let records = session.buffers().log().len();
            self.session.publish(SessionEvent::LogFinalized { records });
            records
        };
        tracing::info!(records, "Sampling stopped");

        if let Err(e) = self.sensor.stop_sampling().await {
            tracing::warn!("Sensor did not acknowledge sampling stop: {}", e);
        }
        true
    }

    pub async fn reset(&self) {
        let mut session = self.session.lock().await;
        session.reset();
        self.session.publish(SessionEvent::Reset);
        drop(session);
        tracing::info!("Session buffers cleared");
    }

    pub async fn set_throttle(&self, value: u16) -> Result<(), ThrottleError> {
        if !THROTTLE_RANGE_US.contains(&value) {
            return Err(InvalidInput::new("throttle", "outside 1000..=2000 us").into());
        }

        let _command = self.session.command_lock().await;
        self.sensor.write_throttle(value).await?;
        self.session.lock().await.set_throttle(value);
        tracing::info!(value, "Throttle set");
        Ok(())
    }

    /// Run one acquisition cycle: read, derive, append, notify.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let epoch = {
            let session = self.session.lock().await;
            if session.state() != SamplingState::Sampling {
                return CycleOutcome::Idle;
            }
            session.epoch()
        };

        let raw = match tokio::time::timeout(self.read_timeout, self.sensor.read_once()).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::debug!("Skipping sample: {}", e);
                return CycleOutcome::Skipped(e);
            }
            Err(_) => {
                tracing::debug!("Skipping sample: read exceeded {:?}", self.read_timeout);
                return CycleOutcome::Skipped(SensorError::Timeout);
            }
        };

        let mut session = self.session.lock().await;
        if !session.accepts(epoch) {
            tracing::debug!("Discarding reading from an ended sampling run");
            return CycleOutcome::Discarded;
        }
        let record = Arc::new(derive(&raw, &session.factors(), session.throttle(), Utc::now()));
        session.append(Arc::clone(&record));
        self.session.publish(SessionEvent::Record(record));
        CycleOutcome::Appended
    }

    /// Tick forever. Each cycle completes before the next tick is taken;
    /// ticks that fall due meanwhile are dropped.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let started = Instant::now();
            self.run_cycle().await;

            let elapsed = started.elapsed();
            if elapsed > self.period {
                tracing::debug!(?elapsed, "Acquisition cycle overran its tick; dropping missed ticks");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sensor_client::fake::FakeSensor;
    use crate::domain::calibration::CalibrationStrategy;
    use crate::domain::telemetry::RawReading;

    fn controller(sensor: Arc<FakeSensor>) -> (SamplingController, TelemetrySession) {
        let session = TelemetrySession::new(CalibrationStrategy::ThrustOnly);
        let controller = SamplingController::new(
            session.clone(),
            sensor,
            Duration::from_secs(1),
            Duration::from_millis(500),
        );
        (controller, session)
    }

    fn reading() -> RawReading {
        RawReading::new(50.0, 11.1, 2.0, 6000.0)
    }

    #[tokio::test]
    async fn test_idle_never_reads() {
        let sensor = Arc::new(FakeSensor::default());
        sensor.queue(Ok(reading()));
        let (controller, session) = controller(sensor.clone());

        assert_eq!(controller.run_cycle().await, CycleOutcome::Idle);
        assert_eq!(sensor.queued.lock().unwrap().len(), 1);
        assert_eq!(session.status().await.log_len, 0);
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        let (controller, session) = controller(sensor.clone());

        assert!(controller.start().await);
        assert!(!controller.start().await);
        assert_eq!(session.status().await.state, SamplingState::Sampling);

        assert!(controller.stop().await);
        assert!(!controller.stop().await);
        assert_eq!(session.status().await.state, SamplingState::Idle);

        assert_eq!(*sensor.notifications.lock().unwrap(), vec!["start", "stop"]);
    }

    #[tokio::test]
    async fn test_unacknowledged_start_still_samples() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        *sensor.fail_writes.lock().unwrap() = true;
        let (controller, _session) = controller(sensor);

        assert!(controller.start().await);
        assert_eq!(controller.run_cycle().await, CycleOutcome::Appended);
    }

    #[tokio::test]
    async fn test_log_grows_by_one_per_cycle() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        let (controller, session) = controller(sensor);
        controller.start().await;

        for expected in 1..=30 {
            assert_eq!(controller.run_cycle().await, CycleOutcome::Appended);
            let status = session.status().await;
            assert_eq!(status.log_len, expected);
            assert_eq!(status.window_len, expected.min(20));
        }
    }

    #[tokio::test]
    async fn test_failed_read_is_skipped() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        sensor.queue(Err(SensorError::Unreachable("host down".to_string())));
        sensor.queue(Err(SensorError::Timeout));
        let (controller, session) = controller(sensor);
        controller.start().await;

        assert!(matches!(controller.run_cycle().await, CycleOutcome::Skipped(_)));
        assert_eq!(
            controller.run_cycle().await,
            CycleOutcome::Skipped(SensorError::Timeout)
        );
        assert_eq!(session.status().await.log_len, 0);

        assert_eq!(controller.run_cycle().await, CycleOutcome::Appended);
        assert_eq!(session.status().await.log_len, 1);
    }

    #[tokio::test]
    async fn test_stop_during_read_discards_result() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        *sensor.hold_reads.lock().unwrap() = true;
        let (controller, session) = controller(sensor.clone());
        controller.start().await;

        let cycle = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_cycle().await }
        });
        sensor.in_flight.notified().await;
        controller.stop().await;
        sensor.release.notify_one();

        assert_eq!(cycle.await.unwrap(), CycleOutcome::Discarded);
        let status = session.status().await;
        assert_eq!(status.window_len, 0);
        assert_eq!(status.log_len, 0);
    }

    #[tokio::test]
    async fn test_restart_during_read_discards_result() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        *sensor.hold_reads.lock().unwrap() = true;
        let (controller, session) = controller(sensor.clone());
        controller.start().await;

        let cycle = tokio::spawn({
            let controller = controller.clone();
            async move { controller.run_cycle().await }
        });
        sensor.in_flight.notified().await;
        controller.stop().await;
        controller.start().await;
        sensor.release.notify_one();

        assert_eq!(cycle.await.unwrap(), CycleOutcome::Discarded);
        assert_eq!(session.status().await.log_len, 0);
    }

    #[tokio::test]
    async fn test_stop_keeps_log_and_announces_it() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        let (controller, session) = controller(sensor);
        controller.start().await;
        controller.run_cycle().await;
        controller.run_cycle().await;

        let mut events = session.subscribe();
        controller.stop().await;

        assert!(matches!(
            events.recv().await.unwrap(),
            SessionEvent::LogFinalized { records: 2 }
        ));
        assert_eq!(session.status().await.log_len, 2);
    }

    #[tokio::test]
    async fn test_records_carry_throttle_and_derived_metrics() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        let (controller, session) = controller(sensor.clone());
        controller.set_throttle(1450).await.unwrap();
        controller.start().await;

        let mut events = session.subscribe();
        controller.run_cycle().await;

        let SessionEvent::Record(record) = events.recv().await.unwrap() else {
            panic!("expected a record event");
        };
        assert_eq!(record.commanded_throttle, 1450);
        assert_eq!(record.display().power, 22.2);
        assert_eq!(record.display().efficiency, 225.23);
        assert_eq!(*sensor.throttle_writes.lock().unwrap(), vec![1450]);
    }

    #[tokio::test]
    async fn test_throttle_validation() {
        let sensor = Arc::new(FakeSensor::default());
        let (controller, session) = controller(sensor.clone());

        let err = controller.set_throttle(2500).await.unwrap_err();
        assert!(matches!(err, ThrottleError::InvalidInput(_)));

        *sensor.fail_writes.lock().unwrap() = true;
        let err = controller.set_throttle(1500).await.unwrap_err();
        assert!(matches!(err, ThrottleError::Sensor(_)));

        assert_eq!(session.status().await.throttle, 1000);
        assert!(sensor.throttle_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_empties_buffers_but_keeps_sampling() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        let (controller, session) = controller(sensor);
        controller.start().await;
        for _ in 0..5 {
            controller.run_cycle().await;
        }

        controller.reset().await;

        let status = session.status().await;
        assert_eq!(status.window_len, 0);
        assert_eq!(status.log_len, 0);
        assert_eq!(status.state, SamplingState::Sampling);
        assert_eq!(controller.run_cycle().await, CycleOutcome::Appended);
    }

    #[tokio::test]
    async fn test_overlapping_throttle_commands_keep_device_and_session_in_step() {
        let sensor = Arc::new(FakeSensor::default());
        *sensor.hold_next_write.lock().unwrap() = true;
        let (controller, session) = controller(sensor.clone());

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.set_throttle(1200).await }
        });
        sensor.in_flight.notified().await;

        let second = tokio::spawn({
            let controller = controller.clone();
            async move { controller.set_throttle(1800).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*sensor.throttle_writes.lock().unwrap(), vec![1200]);

        sensor.release.notify_one();
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(*sensor.throttle_writes.lock().unwrap(), vec![1200, 1800]);
        assert_eq!(session.status().await.throttle, 1800);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_events_follow_buffer_order_under_concurrent_reset() {
        for _ in 0..50 {
            let sensor = Arc::new(FakeSensor::steady(reading()));
            let (controller, session) = controller(sensor);
            controller.start().await;
            let mut events = session.subscribe();

            let cycle = tokio::spawn({
                let controller = controller.clone();
                async move { controller.run_cycle().await }
            });
            let reset = tokio::spawn({
                let controller = controller.clone();
                async move { controller.reset().await }
            });
            let outcome = cycle.await.unwrap();
            reset.await.unwrap();

            let mut seen = Vec::new();
            while let Ok(event) = events.try_recv() {
                seen.push(event);
            }
            let window_len = session.status().await.window_len;

            match (outcome, seen.as_slice()) {
                (CycleOutcome::Appended, [SessionEvent::Record(_), SessionEvent::Reset]) => {
                    assert_eq!(window_len, 0)
                }
                (CycleOutcome::Appended, [SessionEvent::Reset, SessionEvent::Record(_)]) => {
                    assert_eq!(window_len, 1)
                }
                (CycleOutcome::Discarded, [SessionEvent::Reset]) => assert_eq!(window_len, 0),
                (outcome, seen) => panic!("{:?} with events {:?}", outcome, seen),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_samples_once_per_period() {
        let sensor = Arc::new(FakeSensor::steady(reading()));
        let (controller, session) = controller(sensor);
        controller.start().await;

        let task = tokio::spawn(controller.clone().run());
        // First tick fires immediately, then one per second.
        tokio::time::sleep(Duration::from_millis(3500)).await;
        task.abort();

        assert_eq!(session.status().await.log_len, 4);
    }
}
