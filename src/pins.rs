//! GPIO / peripheral pin assignments for the Wemos D1 R32 chamber board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Relay board (4 channels, active LOW by default)
// ---------------------------------------------------------------------------

/// Exhaust fan.
pub const RELAY_VENTILATION_GPIO: i32 = 25;
/// Heater element.
pub const RELAY_HEATER_GPIO: i32 = 26;
/// Ultrasonic humidifier.
pub const RELAY_HUMIDIFIER_GPIO: i32 = 27;
/// Grow light.
pub const RELAY_LIGHTING_GPIO: i32 = 14;

/// All relay outputs, in `ActuatorId::ALL` order.
pub const RELAY_GPIOS: [i32; 4] = [
    RELAY_VENTILATION_GPIO,
    RELAY_HEATER_GPIO,
    RELAY_HUMIDIFIER_GPIO,
    RELAY_LIGHTING_GPIO,
];

// ---------------------------------------------------------------------------
// DHT22 temperature / humidity (single-wire, open drain)
// ---------------------------------------------------------------------------

pub const DHT_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// MH-Z19 CO₂ sensor (UART2, 9600 8N1)
// ---------------------------------------------------------------------------

/// ESP32 RX, wired to the sensor's TX.
pub const MHZ19_RX_GPIO: i32 = 16;
/// ESP32 TX, wired to the sensor's RX.
pub const MHZ19_TX_GPIO: i32 = 17;
pub const MHZ19_UART_PORT: i32 = 2;
pub const MHZ19_BAUD: i32 = 9600;

// ---------------------------------------------------------------------------
// I²C bus (BH1750 light sensor)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const I2C_PORT: i32 = 0;
/// Standard-mode bus clock.
pub const I2C_FREQ_HZ: u32 = 100_000;
