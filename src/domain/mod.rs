// Domain layer - Pure telemetry models and computations
pub mod calibration;
pub mod metrics;
pub mod numeric;
pub mod telemetry;
pub mod window;
