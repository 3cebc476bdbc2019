// Application state for HTTP handlers
use crate::application::calibration_manager::CalibrationManager;
use crate::application::sampling_controller::SamplingController;
use crate::application::session::TelemetrySession;

#[derive(Clone)]
pub struct AppState {
    pub session: TelemetrySession,
    pub sampling: SamplingController,
    pub calibration: CalibrationManager,
}
