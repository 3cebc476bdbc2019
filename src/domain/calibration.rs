// Calibration domain model: strategies, factor sets and factor computation
use super::numeric::loose_opt_f64;
use super::telemetry::RawReading;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which calibration workflow is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalibrationStrategy {
    /// Scale thrust in software; voltage and current pass through.
    ThrustOnly,
    /// Thrust is corrected on the device; voltage and current in software.
    ThreeAxis,
}

/// The active set of multiplicative factors. Replaced wholesale, never
/// patched field by field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum CalibrationFactors {
    ThrustOnly {
        thrust: f64,
    },
    ThreeAxis {
        thrust: f64,
        voltage: f64,
        current: f64,
    },
}

impl CalibrationFactors {
    pub fn identity(strategy: CalibrationStrategy) -> Self {
        match strategy {
            CalibrationStrategy::ThrustOnly => CalibrationFactors::ThrustOnly { thrust: 1.0 },
            CalibrationStrategy::ThreeAxis => CalibrationFactors::ThreeAxis {
                thrust: 1.0,
                voltage: 1.0,
                current: 1.0,
            },
        }
    }

    #[cfg(test)]
    pub fn strategy(&self) -> CalibrationStrategy {
        match self {
            CalibrationFactors::ThrustOnly { .. } => CalibrationStrategy::ThrustOnly,
            CalibrationFactors::ThreeAxis { .. } => CalibrationStrategy::ThreeAxis,
        }
    }

    /// The factor pushed to the device after a calibration.
    pub fn thrust(&self) -> f64 {
        match *self {
            CalibrationFactors::ThrustOnly { thrust } => thrust,
            CalibrationFactors::ThreeAxis { thrust, .. } => thrust,
        }
    }
}

/// Reference values the operator measured independently. Absent values are
/// rejected by [`CalibrationStrategy::check_known`], not by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct KnownValues {
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub voltage: Option<f64>,
    #[serde(default, deserialize_with = "loose_opt_f64")]
    pub current: Option<f64>,
}

#[cfg(test)]
impl KnownValues {
    pub fn weight(weight: f64) -> Self {
        Self {
            weight: Some(weight),
            voltage: None,
            current: None,
        }
    }

    pub fn three_axis(weight: f64, voltage: f64, current: f64) -> Self {
        Self {
            weight: Some(weight),
            voltage: Some(voltage),
            current: Some(current),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {quantity}: {reason}")]
pub struct InvalidInput {
    pub quantity: &'static str,
    pub reason: &'static str,
}

impl InvalidInput {
    pub fn new(quantity: &'static str, reason: &'static str) -> Self {
        Self { quantity, reason }
    }
}

/// Known values after validation; voltage and current are only present for
/// the three-axis workflow.
struct CheckedKnown {
    weight: f64,
    voltage: f64,
    current: f64,
}

impl CalibrationStrategy {
    /// Validate the operator's values before any reference reading is taken.
    pub fn check_known(self, known: &KnownValues) -> Result<(), InvalidInput> {
        self.checked(known).map(|_| ())
    }

    fn checked(self, known: &KnownValues) -> Result<CheckedKnown, InvalidInput> {
        let weight = positive("known weight", known.weight)?;
        match self {
            CalibrationStrategy::ThrustOnly => Ok(CheckedKnown {
                weight,
                voltage: f64::NAN,
                current: f64::NAN,
            }),
            CalibrationStrategy::ThreeAxis => Ok(CheckedKnown {
                weight,
                voltage: positive("known voltage", known.voltage)?,
                current: positive("known current", known.current)?,
            }),
        }
    }

    /// Turn a raw reference reading and the operator's known values into a
    /// complete factor set. Any invalid input aborts the whole computation.
    pub fn compute(
        self,
        known: &KnownValues,
        raw: &RawReading,
    ) -> Result<CalibrationFactors, InvalidInput> {
        let known = self.checked(known)?;

        match self {
            CalibrationStrategy::ThrustOnly => Ok(CalibrationFactors::ThrustOnly {
                thrust: factor("thrust factor", known.weight, raw.thrust)?,
            }),
            // Thrust uses the inverse convention: the device divides its raw
            // reading by this factor.
            CalibrationStrategy::ThreeAxis => Ok(CalibrationFactors::ThreeAxis {
                thrust: factor("thrust factor", raw.thrust, known.weight)?,
                voltage: factor("voltage factor", known.voltage, raw.voltage)?,
                current: factor("current factor", known.current, raw.current)?,
            }),
        }
    }
}

fn positive(quantity: &'static str, value: Option<f64>) -> Result<f64, InvalidInput> {
    match value {
        None => Err(InvalidInput::new(quantity, "missing")),
        Some(v) if !v.is_finite() => Err(InvalidInput::new(quantity, "not a finite number")),
        Some(v) if v <= 0.0 => Err(InvalidInput::new(quantity, "must be positive")),
        Some(v) => Ok(v),
    }
}

fn factor(quantity: &'static str, numerator: f64, denominator: f64) -> Result<f64, InvalidInput> {
    if denominator == 0.0 {
        return Err(InvalidInput::new(quantity, "reference reading is zero"));
    }
    let value = numerator / denominator;
    if !value.is_finite() || value <= 0.0 {
        return Err(InvalidInput::new(quantity, "not a finite positive factor"));
    }
    Ok(value)
}
