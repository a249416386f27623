//! The sensor collaborator boundary.
//!
//! Real bus drivers live outside this crate; the loop only needs
//! something that can produce a raw temperature/humidity pair.

use thiserror::Error;

/// Errors that can occur reading the sensor.
#[derive(Error, Debug)]
pub enum SensorError {
    /// The hardware could not produce a reading.
    #[error("sensor read failed: {0}")]
    ReadFailure(String),
}

/// A raw reading from the hardware, before any clamping or derivation.
#[derive(Clone, Copy, Debug)]
pub struct RawSample {
    /// Degrees Celsius.
    pub temperature_celsius: f64,
    /// Percent relative humidity, possibly slightly out of [0, 100].
    pub relative_humidity: f64,
}

/// Source of raw temperature/humidity samples.
pub trait SensorPort {
    /// Read the current raw values from the sensor.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError`] when the hardware could not produce a
    /// reading. The loop skips the cycle and tries again next interval.
    fn read_raw(&mut self) -> Result<RawSample, SensorError>;
}

/// A stand-in sensor producing a slowly drifting indoor climate.
///
/// Used on machines without the real hardware attached, so the daemon
/// and its readers can be exercised end to end.
pub struct SimulatedSensor {
    step: u64,
}

impl SimulatedSensor {
    /// A simulated sensor starting at a mild indoor climate.
    #[must_use]
    pub const fn new() -> Self {
        Self { step: 0 }
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for SimulatedSensor {
    #[allow(clippy::cast_precision_loss)]
    fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        self.step = self.step.wrapping_add(1);
        let phase = self.step as f64 / 20.0;
        Ok(RawSample {
            temperature_celsius: 21.5 + 2.0 * phase.sin(),
            relative_humidity: 55.0 + 10.0 * phase.cos(),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn simulated_sensor_stays_in_a_plausible_range() {
        let mut sensor = SimulatedSensor::new();
        for _ in 0..200 {
            let raw = sensor.read_raw().unwrap();
            assert!((15.0..30.0).contains(&raw.temperature_celsius));
            assert!((40.0..70.0).contains(&raw.relative_humidity));
        }
    }
}
