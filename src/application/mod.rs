// Application layer - Use cases over the telemetry session
pub mod calibration_manager;
pub mod sampling_controller;
pub mod sensor_client;
pub mod session;
