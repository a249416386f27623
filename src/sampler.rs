//! Turns raw sensor values into a complete [`Reading`].
//!
//! This is a pure transformation: the caller captures the clock once and
//! passes it in, so the ISO-8601 and epoch timestamps of a reading always
//! describe the same instant.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Magnus-form approximation constants for dew point over water.
const MAGNUS_A: f64 = 8.1332;
const MAGNUS_B: f64 = 1762.39;
const MAGNUS_C: f64 = 235.66;

/// Errors that can occur when building a reading.
#[derive(Error, Debug)]
pub enum Error {
    /// The sensor produced a non-finite value.
    #[error("invalid reading: temperature {0}, relative humidity {1}")]
    InvalidReading(f64, f64),
}

/// A measurement in one scale, tagged with its display symbol.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScaledValue {
    /// The measurement, rounded to two decimal places.
    pub value: f64,
    /// Display symbol, e.g. `°C` or `%RH`.
    pub symbol: String,
}

impl ScaledValue {
    fn new(value: f64, symbol: &str) -> Self {
        Self {
            value: round2(value),
            symbol: symbol.to_string(),
        }
    }
}

/// One temperature expressed in the four major scales.
///
/// The scales are always computed together from a Celsius value, never
/// set independently.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Temperatures {
    /// Degrees Celsius.
    pub celsius: ScaledValue,
    /// Degrees Fahrenheit.
    pub fahrenheit: ScaledValue,
    /// Degrees Rankine.
    pub rankine: ScaledValue,
    /// Kelvin.
    pub kelvin: ScaledValue,
}

impl Temperatures {
    /// Convert a Celsius temperature to all four scales.
    #[must_use]
    pub fn from_celsius(celsius: f64) -> Self {
        let fahrenheit = (9.0 / 5.0) * celsius + 32.0;
        let rankine = fahrenheit + 459.67;
        let kelvin = celsius + 273.15;
        Self {
            celsius: ScaledValue::new(celsius, "°C"),
            fahrenheit: ScaledValue::new(fahrenheit, "°F"),
            rankine: ScaledValue::new(rankine, "°R"),
            kelvin: ScaledValue::new(kelvin, "K"),
        }
    }
}

/// Relative humidity plus the dew point derived from it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Humidity {
    /// Relative humidity in percent, clamped to [0, 100].
    pub relative: ScaledValue,
    /// The dew point for this humidity at the ambient temperature.
    #[serde(rename = "dewPoint")]
    pub dew_point: Temperatures,
}

/// One sample, immutable once created.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Reading {
    /// ISO-8601 local timestamp of capture.
    pub timestamp: String,
    /// Seconds since the Unix epoch, same instant as `timestamp`.
    pub timestamp_epoch: i64,
    /// Temperature in all four scales.
    pub temperature: Temperatures,
    /// Relative humidity and dew point.
    pub humidity: Humidity,
}

/// Build a [`Reading`] from raw sensor values captured at `now`.
///
/// Relative humidity is clamped to [0, 100] before use; sensors report
/// slightly above 100% as a calibration artifact, not a physical state.
///
/// # Errors
///
/// Returns [`Error::InvalidReading`] if either input is non-finite. NaN
/// is never propagated into a reading.
pub fn sample(
    celsius: f64,
    relative_humidity: f64,
    now: DateTime<Local>,
) -> Result<Reading, Error> {
    if !celsius.is_finite() || !relative_humidity.is_finite() {
        return Err(Error::InvalidReading(celsius, relative_humidity));
    }

    let rh = relative_humidity.clamp(0.0, 100.0);
    let dew_point = if rh >= 100.0 {
        // Saturated air: the dew point is the ambient temperature.
        Temperatures::from_celsius(celsius)
    } else {
        Temperatures::from_celsius(dew_point_celsius(celsius, rh))
    };

    Ok(Reading {
        timestamp: now.to_rfc3339(),
        timestamp_epoch: now.timestamp(),
        temperature: Temperatures::from_celsius(celsius),
        humidity: Humidity {
            relative: ScaledValue::new(rh, "%RH"),
            dew_point,
        },
    })
}

/// Magnus-form dew point, in Celsius, for `rh` strictly below 100%.
fn dew_point_celsius(celsius: f64, rh: f64) -> f64 {
    let pp_t = 10_f64.powf(MAGNUS_A - MAGNUS_B / (celsius + MAGNUS_C));
    -(MAGNUS_B / ((rh * pp_t / 100.0).log10() - MAGNUS_A) + MAGNUS_C)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
