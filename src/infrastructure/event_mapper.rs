// Mapper from session events to the live feed wire format
use crate::application::session::SessionEvent;
use crate::domain::calibration::CalibrationFactors;
use crate::domain::telemetry::DisplayRecord;
use futures::stream::Stream;
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEvent {
    Record { record: DisplayRecord },
    LogFinalized { records: usize },
    Reset,
    Calibrated { factors: CalibrationFactors },
}

pub fn event_to_feed(event: SessionEvent) -> FeedEvent {
    match event {
        SessionEvent::Record(record) => FeedEvent::Record {
            record: record.display(),
        },
        SessionEvent::LogFinalized { records } => FeedEvent::LogFinalized { records },
        SessionEvent::Reset => FeedEvent::Reset,
        SessionEvent::Calibrated(factors) => FeedEvent::Calibrated { factors },
    }
}

/// Turn a session subscription into a feed stream. A subscriber that falls
/// behind skips what it missed; the stream ends when the session is dropped.
pub fn feed_from_receiver(
    mut rx: broadcast::Receiver<SessionEvent>,
) -> impl Stream<Item = FeedEvent> + Send + 'static {
    async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield event_to_feed(event),
                Err(RecvError::Lagged(missed)) => {
                    tracing::debug!(missed, "Live feed subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
