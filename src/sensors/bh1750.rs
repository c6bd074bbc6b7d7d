//! BH1750 ambient light sensor (I²C).
//!
//! Runs in continuous high-resolution mode (1 lx resolution, ~120 ms
//! conversion).  Each read fetches the last 16-bit count; lux = count / 1.2.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: I²C master on port 0, installed by hw_init.
//! On host/test: reads from a static AtomicU32 of f32 bits (NaN = no answer).

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::model::Reading;

use super::EnvironmentSensor;

#[cfg(not(target_os = "espidf"))]
static SIM_LUX_BITS: AtomicU32 = AtomicU32::new(120.0f32.to_bits());

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_lux(lux: f32) {
    SIM_LUX_BITS.store(lux.to_bits(), Ordering::Relaxed);
}

/// ADDR pin low.
pub const DEFAULT_ADDR: u8 = 0x23;

const CMD_POWER_ON: u8 = 0x01;
const CMD_CONTINUOUS_HIGH_RES: u8 = 0x10;

/// Counts per lux at the default measurement time.
const COUNTS_PER_LUX: f32 = 1.2;

/// Convert a raw big-endian count to lux.
pub fn raw_to_lux(raw: [u8; 2]) -> f32 {
    u16::from_be_bytes(raw) as f32 / COUNTS_PER_LUX
}

pub struct Bh1750 {
    addr: u8,
    configured: bool,
}

impl Bh1750 {
    pub fn new(addr: u8) -> Self {
        Self { addr, configured: false }
    }

    pub fn addr(&self) -> u8 {
        self.addr
    }

    #[cfg(target_os = "espidf")]
    fn read_lux(&self) -> Result<f32, SensorError> {
        let mut raw = [0u8; 2];
        if !hw_init::i2c_read(self.addr, &mut raw) {
            return Err(SensorError::BusError);
        }
        Ok(raw_to_lux(raw))
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_lux(&self) -> Result<f32, SensorError> {
        let lux = f32::from_bits(SIM_LUX_BITS.load(Ordering::Relaxed));
        if lux.is_nan() {
            return Err(SensorError::Timeout);
        }
        Ok(lux)
    }
}

impl EnvironmentSensor for Bh1750 {
    fn name(&self) -> &'static str {
        "bh1750"
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        self.configured = hw_init::i2c_write(self.addr, &[CMD_POWER_ON])
            && hw_init::i2c_write(self.addr, &[CMD_CONTINUOUS_HIGH_RES]);
        if self.configured { Ok(()) } else { Err(SensorError::NotInitialised) }
    }

    fn read_into(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        if !self.configured {
            // Late-plugged sensor: retry setup before giving up.
            self.begin()?;
        }
        let lux = self.read_lux()?;
        if lux < 0.0 {
            return Err(SensorError::OutOfRange);
        }
        reading.illuminance_lux = Some(lux);
        Ok(())
    }
}
