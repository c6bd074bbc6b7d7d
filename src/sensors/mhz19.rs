//! MH-Z19 NDIR CO₂ sensor over UART (9600 8N1).
//!
//! Command 0x86 ("read concentration") returns a 9-byte frame
//! `FF 86 HI LO .. .. .. .. CS` where `CS = 0xFF - sum(bytes 1..8) + 1`.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: UART2, installed by hw_init.
//! On host/test: reads from a static AtomicU16 (0 = no answer).

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::model::Reading;

use super::EnvironmentSensor;

#[cfg(not(target_os = "espidf"))]
static SIM_CO2_PPM: AtomicU16 = AtomicU16::new(800);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_ppm(ppm: u16) {
    SIM_CO2_PPM.store(ppm, Ordering::Relaxed);
}

pub const FRAME_LEN: usize = 9;
const CMD_READ_CO2: u8 = 0x86;
/// Readings at or above this are treated as garbage.
pub const MAX_PPM: u16 = 10_000;
/// How long to wait for the reply.
#[cfg(target_os = "espidf")]
const RESPONSE_TIMEOUT_MS: u32 = 100;

/// Checksum over bytes 1..8 of a frame.
pub fn checksum(frame: &[u8; FRAME_LEN]) -> u8 {
    let sum = frame[1..8].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    (!sum).wrapping_add(1)
}

/// The "read CO₂" request: `FF 01 86 00 00 00 00 00 79`.
pub fn request_frame() -> [u8; FRAME_LEN] {
    let mut frame = [0xFF, 0x01, CMD_READ_CO2, 0, 0, 0, 0, 0, 0];
    frame[8] = checksum(&frame);
    frame
}

/// Validate a response and extract the concentration.
pub fn parse_response(bytes: &[u8]) -> Result<u16, SensorError> {
    if bytes.is_empty() {
        return Err(SensorError::Timeout);
    }
    let frame: &[u8; FRAME_LEN] = bytes.try_into().map_err(|_| SensorError::BusError)?;
    if frame[0] != 0xFF || frame[1] != CMD_READ_CO2 {
        return Err(SensorError::BusError);
    }
    if checksum(frame) != frame[8] {
        return Err(SensorError::ChecksumMismatch);
    }
    let ppm = u16::from_be_bytes([frame[2], frame[3]]);
    if ppm == 0 || ppm >= MAX_PPM {
        return Err(SensorError::OutOfRange);
    }
    Ok(ppm)
}

#[derive(Default)]
pub struct Mhz19 {
    last_ppm: Option<u16>,
}

impl Mhz19 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_ppm(&self) -> Option<u16> {
        self.last_ppm
    }

    #[cfg(target_os = "espidf")]
    fn exchange(&self) -> Result<u16, SensorError> {
        if !hw_init::uart_send(&request_frame()) {
            return Err(SensorError::BusError);
        }
        let mut buf = [0u8; FRAME_LEN];
        let n = hw_init::uart_receive(&mut buf, RESPONSE_TIMEOUT_MS);
        parse_response(&buf[..n])
    }

    #[cfg(not(target_os = "espidf"))]
    fn exchange(&self) -> Result<u16, SensorError> {
        match SIM_CO2_PPM.load(Ordering::Relaxed) {
            0 => Err(SensorError::Timeout),
            ppm => {
                let [hi, lo] = ppm.to_be_bytes();
                let mut frame = [0xFF, CMD_READ_CO2, hi, lo, 0, 0, 0, 0, 0];
                frame[8] = checksum(&frame);
                parse_response(&frame)
            }
        }
    }
}

impl EnvironmentSensor for Mhz19 {
    fn name(&self) -> &'static str {
        "mhz19"
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        self.last_ppm = None;
        Ok(())
    }

    fn read_into(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        let ppm = self.exchange()?;
        self.last_ppm = Some(ppm);
        reading.co2_ppm = Some(ppm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(hi: u8, lo: u8) -> [u8; FRAME_LEN] {
        let mut f = [0xFF, 0x86, hi, lo, 0x47, 0x00, 0x00, 0x00, 0x00];
        f[8] = checksum(&f);
        f
    }

    #[test]
    fn request_matches_datasheet() {
        assert_eq!(request_frame(), [0xFF, 0x01, 0x86, 0, 0, 0, 0, 0, 0x79]);
    }

    #[test]
    fn parses_valid_response() {
        assert_eq!(parse_response(&response(0x03, 0x20)), Ok(800));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut f = response(0x03, 0x20);
        f[8] = f[8].wrapping_add(1);
        assert_eq!(parse_response(&f), Err(SensorError::ChecksumMismatch));
    }

    #[test]
    fn rejects_wrong_header() {
        let mut f = response(0x03, 0x20);
        f[1] = 0x99;
        assert_eq!(parse_response(&f), Err(SensorError::BusError));
    }

    #[test]
    fn rejects_short_and_empty_frames() {
        assert_eq!(parse_response(&[]), Err(SensorError::Timeout));
        assert_eq!(parse_response(&[0xFF, 0x86, 0x03]), Err(SensorError::BusError));
    }

    #[test]
    fn rejects_out_of_range_ppm() {
        assert_eq!(parse_response(&response(0, 0)), Err(SensorError::OutOfRange));
        // 10000 ppm
        assert_eq!(parse_response(&response(0x27, 0x10)), Err(SensorError::OutOfRange));
        // 9999 ppm
        assert_eq!(parse_response(&response(0x27, 0x0F)), Ok(9999));
    }
}
