// Metrics engine - applies calibration and derives power and efficiency
use super::calibration::CalibrationFactors;
use super::telemetry::{DerivedRecord, RawReading};
use chrono::{DateTime, Utc};

/// Derive a full record from one raw reading.
///
/// Power is voltage times current on the calibrated values. Efficiency is
/// raw thrust over that calibrated power, times 100, and 0 whenever the
/// calibrated voltage or current is zero. Non-numeric raw values arrive as NaN
/// and propagate; nothing here fails.
pub fn derive(
    raw: &RawReading,
    factors: &CalibrationFactors,
    throttle: u16,
    timestamp: DateTime<Utc>,
) -> DerivedRecord {
    let (thrust, voltage, current) = match *factors {
        CalibrationFactors::ThrustOnly { thrust } => (raw.thrust * thrust, raw.voltage, raw.current),
        // Thrust was already corrected on the device.
        CalibrationFactors::ThreeAxis {
            voltage, current, ..
        } => (raw.thrust, raw.voltage * voltage, raw.current * current),
    };

    let power = voltage * current;
    let efficiency = if current != 0.0 && voltage != 0.0 {
        raw.thrust / power * 100.0
    } else {
        0.0
    };

    DerivedRecord {
        timestamp,
        commanded_throttle: throttle,
        thrust,
        voltage,
        current,
        power,
        rpm: raw.rpm,
        efficiency,
    }
}
