//! DHT22 / AM2302 temperature + humidity sensor (single-wire protocol).
//!
//! A read is a 40-bit frame: humidity ×10 (16 bit), temperature ×10
//! (15-bit magnitude, bit 15 = sign), then a checksum byte equal to the low
//! byte of the sum of the first four.  The part needs 2 s between
//! conversions, so reads inside that window return the cached values.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: bit-bangs the data line (open drain, configured by hw_init)
//! with interrupts masked for the ~5 ms transfer.
//! On host/test: reads from static AtomicU32 cells holding f32 bits, where
//! NaN means "sensor not answering".

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;
use crate::model::Reading;

use super::EnvironmentSensor;

#[cfg(not(target_os = "espidf"))]
static SIM_TEMP_BITS: AtomicU32 = AtomicU32::new(25.0f32.to_bits());
#[cfg(not(target_os = "espidf"))]
static SIM_HUM_BITS: AtomicU32 = AtomicU32::new(80.0f32.to_bits());

/// Inject simulated values.  Pass `f32::NAN` to simulate a dead sensor.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set(temperature_c: f32, humidity_pct: f32) {
    SIM_TEMP_BITS.store(temperature_c.to_bits(), Ordering::Relaxed);
    SIM_HUM_BITS.store(humidity_pct.to_bits(), Ordering::Relaxed);
}

/// Minimum spacing between conversions (ms).
pub const MIN_INTERVAL_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dht22Sample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Decode and verify one 5-byte frame.
pub fn decode_frame(frame: [u8; 5]) -> Result<Dht22Sample, SensorError> {
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    if sum != frame[4] {
        return Err(SensorError::ChecksumMismatch);
    }

    let raw_h = u16::from_be_bytes([frame[0], frame[1]]);
    let raw_t = u16::from_be_bytes([frame[2], frame[3]]);

    let humidity_pct = raw_h as f32 / 10.0;
    let magnitude = (raw_t & 0x7FFF) as f32 / 10.0;
    let temperature_c = if raw_t & 0x8000 != 0 { -magnitude } else { magnitude };

    if humidity_pct > 100.0 || !(-40.0..=80.0).contains(&temperature_c) {
        return Err(SensorError::OutOfRange);
    }
    Ok(Dht22Sample { temperature_c, humidity_pct })
}

pub struct Dht22 {
    gpio: i32,
    cached: Option<(u64, Dht22Sample)>,
}

impl Dht22 {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, cached: None }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    fn sample(&mut self, now_ms: u64) -> Result<Dht22Sample, SensorError> {
        if let Some((at, s)) = self.cached {
            if now_ms >= at && now_ms - at < MIN_INTERVAL_MS {
                return Ok(s);
            }
        }
        let s = self.read_frame().and_then(decode_frame)?;
        self.cached = Some((now_ms, s));
        Ok(s)
    }

    #[cfg(target_os = "espidf")]
    fn read_frame(&self) -> Result<[u8; 5], SensorError> {
        let pin = self.gpio;
        esp_idf_svc::hal::interrupt::free(|| {
            // Start signal: hold low ≥1 ms, then release.
            hw_init::gpio_write(pin, false);
            hw_init::delay_us(1100);
            hw_init::gpio_write(pin, true);
            hw_init::delay_us(30);

            // Sensor response: ~80 µs low, ~80 µs high.
            wait_while(pin, true, 100)?;
            wait_while(pin, false, 100)?;
            wait_while(pin, true, 100)?;

            let mut frame = [0u8; 5];
            for bit in 0..40 {
                wait_while(pin, false, 80)?;
                let high_us = wait_while(pin, true, 100)?;
                // 26-28 µs high = 0, 70 µs high = 1.
                if high_us > 40 {
                    frame[bit / 8] |= 0x80 >> (bit % 8);
                }
            }
            Ok(frame)
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_frame(&self) -> Result<[u8; 5], SensorError> {
        let t = f32::from_bits(SIM_TEMP_BITS.load(Ordering::Relaxed));
        let h = f32::from_bits(SIM_HUM_BITS.load(Ordering::Relaxed));
        if t.is_nan() || h.is_nan() {
            return Err(SensorError::Timeout);
        }
        Ok(encode_frame(t, h))
    }
}

/// Busy-wait while the line sits at `level`; returns the time spent (µs).
#[cfg(target_os = "espidf")]
fn wait_while(pin: i32, level: bool, timeout_us: u64) -> Result<u64, SensorError> {
    let start = hw_init::micros();
    while hw_init::gpio_read(pin) == level {
        if hw_init::micros() - start > timeout_us {
            return Err(SensorError::Timeout);
        }
    }
    Ok(hw_init::micros() - start)
}

/// Build the frame the sensor would send for these values.
#[cfg(any(test, not(target_os = "espidf")))]
fn encode_frame(temperature_c: f32, humidity_pct: f32) -> [u8; 5] {
    let h = (humidity_pct * 10.0).round() as u16;
    let mut t = (temperature_c.abs() * 10.0).round() as u16 & 0x7FFF;
    if temperature_c < 0.0 {
        t |= 0x8000;
    }
    let [h0, h1] = h.to_be_bytes();
    let [t0, t1] = t.to_be_bytes();
    let sum = h0.wrapping_add(h1).wrapping_add(t0).wrapping_add(t1);
    [h0, h1, t0, t1, sum]
}

impl EnvironmentSensor for Dht22 {
    fn name(&self) -> &'static str {
        "dht22"
    }

    fn begin(&mut self) -> Result<(), SensorError> {
        // The line idles high after hw_init; the first conversion is
        // only valid ~1 s after power-up, which boot already covers.
        self.cached = None;
        Ok(())
    }

    fn read_into(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
        let s = self.sample(reading.timestamp_ms)?;
        reading.temperature_c = Some(s.temperature_c);
        reading.humidity_pct = Some(s.humidity_pct);
        Ok(())
    }
}
