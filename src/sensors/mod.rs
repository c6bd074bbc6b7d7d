//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! Each driver fills the fields of a [`Reading`] it is responsible for.  The
//! hub starts every tick from an all-unknown reading, so a failed or absent
//! sensor simply leaves its fields unknown and the rules skip them.

pub mod bh1750;
pub mod dht22;
pub mod mhz19;

use log::{debug, info, warn};

use crate::error::SensorError;
use crate::model::Reading;

/// Capability of one physical sensor.
pub trait EnvironmentSensor {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// One-time bus/device setup.  A failure is logged by the hub; the
    /// sensor stays registered and later reads may still succeed.
    fn begin(&mut self) -> Result<(), SensorError>;

    /// Write this sensor's fields into `reading`.  On error the fields
    /// must be left untouched.
    fn read_into(&mut self, reading: &mut Reading) -> Result<(), SensorError>;
}

/// Owns every sensor driver.
#[derive(Default)]
pub struct SensorHub {
    sensors: Vec<Box<dyn EnvironmentSensor + Send>>,
    /// Consecutive failures per sensor, to keep log noise down.
    failures: Vec<u32>,
}

impl SensorHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three sensors fitted to the chamber board.
    pub fn chamber() -> Self {
        let mut hub = Self::new();
        hub.add(Box::new(dht22::Dht22::new(crate::pins::DHT_GPIO)));
        hub.add(Box::new(mhz19::Mhz19::new()));
        hub.add(Box::new(bh1750::Bh1750::new(bh1750::DEFAULT_ADDR)));
        hub
    }

    pub fn add(&mut self, sensor: Box<dyn EnvironmentSensor + Send>) {
        self.sensors.push(sensor);
        self.failures.push(0);
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Run `begin` on every sensor.  Returns how many came up.
    pub fn begin_all(&mut self) -> usize {
        let mut ok = 0;
        for sensor in &mut self.sensors {
            match sensor.begin() {
                Ok(()) => {
                    info!("sensor {}: ready", sensor.name());
                    ok += 1;
                }
                Err(e) => warn!("sensor {}: begin failed: {}", sensor.name(), e),
            }
        }
        ok
    }

    /// Read every sensor into a fresh reading stamped `now_ms`.
    pub fn read_all(&mut self, now_ms: u64) -> Reading {
        let mut reading = Reading::unknown(now_ms);
        for (sensor, failures) in self.sensors.iter_mut().zip(self.failures.iter_mut()) {
            match sensor.read_into(&mut reading) {
                Ok(()) => {
                    if *failures > 0 {
                        info!("sensor {}: recovered after {} failed reads", sensor.name(), failures);
                    }
                    *failures = 0;
                }
                Err(e) => {
                    *failures = failures.saturating_add(1);
                    if *failures == 1 {
                        warn!("sensor {}: read failed: {}", sensor.name(), e);
                    } else {
                        debug!("sensor {}: read failed ({}x): {}", sensor.name(), failures, e);
                    }
                }
            }
        }
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTemp(f32);

    impl EnvironmentSensor for FixedTemp {
        fn name(&self) -> &'static str {
            "fixed"
        }
        fn begin(&mut self) -> Result<(), SensorError> {
            Ok(())
        }
        fn read_into(&mut self, reading: &mut Reading) -> Result<(), SensorError> {
            reading.temperature_c = Some(self.0);
            Ok(())
        }
    }

    struct Dead;

    impl EnvironmentSensor for Dead {
        fn name(&self) -> &'static str {
            "dead"
        }
        fn begin(&mut self) -> Result<(), SensorError> {
            Err(SensorError::NotInitialised)
        }
        fn read_into(&mut self, _reading: &mut Reading) -> Result<(), SensorError> {
            Err(SensorError::Timeout)
        }
    }

    #[test]
    fn empty_hub_yields_unknown_reading() {
        let mut hub = SensorHub::new();
        let r = hub.read_all(42);
        assert!(r.is_empty());
        assert_eq!(r.timestamp_ms, 42);
    }

    #[test]
    fn failed_sensor_leaves_fields_unknown() {
        let mut hub = SensorHub::new();
        hub.add(Box::new(Dead));
        hub.add(Box::new(FixedTemp(25.5)));
        assert_eq!(hub.begin_all(), 1);

        let r = hub.read_all(1000);
        assert_eq!(r.temperature_c, Some(25.5));
        assert_eq!(r.humidity_pct, None);
        assert_eq!(r.co2_ppm, None);
        assert_eq!(hub.failures, vec![1, 0]);

        hub.read_all(2000);
        assert_eq!(hub.failures[0], 2);
    }

    #[test]
    fn chamber_hub_registers_three_sensors() {
        assert_eq!(SensorHub::chamber().len(), 3);
    }
}
