//! Unified error types for the KozaTakip firmware.
//!
//! A single `Error` enum that every subsystem can convert into.  All variants
//! are `Copy` so they pass through drivers and adapters without allocation.
//!
//! The control core itself is infallible: these errors stop at the port
//! boundary, where adapters log them and report `bool` / `Option`.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible driver or adapter operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned implausible data.
    Sensor(SensorError),
    /// A relay output could not be driven.
    Actuator(ActuatorError),
    /// Wi-Fi or HTTP failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The device did not answer in time.
    Timeout,
    /// Frame checksum did not match.
    ChecksumMismatch,
    /// UART / I²C transaction failed.
    BusError,
    /// Reading is outside the physically plausible range.
    OutOfRange,
    /// `begin()` has not succeeded yet.
    NotInitialised,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::BusError => write!(f, "bus error"),
            Self::OutOfRange => write!(f, "reading out of range"),
            Self::NotInitialised => write!(f, "not initialised"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// GPIO set failed.
    GpioWriteFailed,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioWriteFailed => write!(f, "GPIO write failed"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    WifiConnectFailed,
    WifiDisconnected,
    /// The HTTP request could not be sent or the response not read.
    HttpRequestFailed,
    /// The server answered outside 2xx.
    HttpStatus(u16),
    /// The response body was not the JSON we expected.
    BadPayload,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnectFailed => write!(f, "WiFi connect failed"),
            Self::WifiDisconnected => write!(f, "WiFi disconnected"),
            Self::HttpRequestFailed => write!(f, "HTTP request failed"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::BadPayload => write!(f, "bad payload"),
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_wrap() {
        let e: Error = SensorError::ChecksumMismatch.into();
        assert_eq!(e, Error::Sensor(SensorError::ChecksumMismatch));
        let e: Error = CommsError::HttpStatus(503).into();
        assert_eq!(e.to_string(), "comms: HTTP status 503");
    }
}
