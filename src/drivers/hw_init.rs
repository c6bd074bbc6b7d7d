//! One-shot hardware peripheral initialization and raw bus helpers.
//!
//! Configures the relay outputs, the DHT22 data line, UART2 for the MH-Z19
//! and the I²C master for the BH1750 using raw ESP-IDF sys calls.  Called
//! once from `main()` before the control loop starts.  Host builds get
//! simulation stubs so drivers and tests run without hardware.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    UartInitFailed(i32),
    I2cInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::UartInitFailed(rc)   => write!(f, "UART2 init failed (rc={})", rc),
            Self::I2cInitFailed(rc)    => write!(f, "I2C master init failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed(_) => Self::Init("gpio"),
            HwInitError::UartInitFailed(_) => Self::Init("uart"),
            HwInitError::I2cInitFailed(_) => Self::Init("i2c"),
        }
    }
}

/// Configure every peripheral.  Relays are driven to their OFF level
/// before the pins become outputs, so nothing clicks on at boot.
#[cfg(target_os = "espidf")]
pub fn init_peripherals(relay_active_low: bool) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_relay_outputs(relay_active_low)?;
        init_dht_line()?;
        init_uart()?;
        init_i2c()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(relay_active_low: bool) -> Result<(), HwInitError> {
    for pin in pins::RELAY_GPIOS {
        gpio_write(pin, relay_active_low);
    }
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_relay_outputs(active_low: bool) -> Result<(), HwInitError> {
    for pin in pins::RELAY_GPIOS {
        // SAFETY: pin numbers come from the board map.
        unsafe { gpio_set_level(pin, u32::from(active_low)) };
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
        // Re-assert after the direction change.
        unsafe { gpio_set_level(pin, u32::from(active_low)) };
    }
    info!("hw_init: relay outputs configured (active_low={})", active_low);
    Ok(())
}

/// Open-drain in/out with pull-up: the DHT22 driver both pulls the line
/// low for the start pulse and samples the reply on the same pin.
#[cfg(target_os = "espidf")]
unsafe fn init_dht_line() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::DHT_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT_OD,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pins::DHT_GPIO, 1) };
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level is a register write on a configured output.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access.
    unsafe { gpio_get_level(pin) != 0 }
}

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: [core::sync::atomic::AtomicBool; 40] =
    [const { core::sync::atomic::AtomicBool::new(false) }; 40];

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    if let Some(level) = SIM_LEVELS.get(pin as usize) {
        level.store(high, core::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    SIM_LEVELS
        .get(pin as usize)
        .is_some_and(|l| l.load(core::sync::atomic::Ordering::Relaxed))
}

/// A single push-pull output pin behind the embedded-hal trait, so the
/// relay driver stays independent of ESP-IDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioOutput {
    pin: i32,
}

impl GpioOutput {
    pub const fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub const fn pin(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for GpioOutput {
    type Error = Infallible;
}

impl OutputPin for GpioOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, true);
        Ok(())
    }
}

// ── Timing ────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn delay_us(us: u32) {
    // SAFETY: busy-wait ROM routine, no shared state.
    unsafe { esp_rom_delay_us(us) };
}

#[cfg(not(target_os = "espidf"))]
pub fn delay_us(_us: u32) {}

/// Microseconds since boot.
#[cfg(target_os = "espidf")]
pub fn micros() -> u64 {
    // SAFETY: esp_timer_get_time is thread-safe.
    unsafe { esp_timer_get_time() as u64 }
}

#[cfg(not(target_os = "espidf"))]
pub fn micros() -> u64 {
    0
}

#[cfg(target_os = "espidf")]
fn ms_to_ticks(ms: u32) -> TickType_t {
    ((ms as u64 * configTICK_RATE_HZ as u64) / 1000).max(1) as TickType_t
}

// ── UART2 (MH-Z19) ────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_uart() -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: pins::MHZ19_BAUD,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    let ret = unsafe { uart_param_config(pins::MHZ19_UART_PORT, &cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }

    let ret = unsafe {
        uart_set_pin(
            pins::MHZ19_UART_PORT,
            pins::MHZ19_TX_GPIO,
            pins::MHZ19_RX_GPIO,
            UART_PIN_NO_CHANGE,
            UART_PIN_NO_CHANGE,
        )
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }

    let ret = unsafe {
        uart_driver_install(pins::MHZ19_UART_PORT, 256, 0, 0, core::ptr::null_mut(), 0)
    };
    if ret != ESP_OK as i32 { return Err(HwInitError::UartInitFailed(ret)); }

    info!("hw_init: UART2 configured (9600 8N1, TX={} RX={})", pins::MHZ19_TX_GPIO, pins::MHZ19_RX_GPIO);
    Ok(())
}

/// Discard anything buffered, then send `frame`.
#[cfg(target_os = "espidf")]
pub fn uart_send(frame: &[u8]) -> bool {
    // SAFETY: the driver was installed in init_uart(); the buffer outlives the call.
    unsafe {
        uart_flush_input(pins::MHZ19_UART_PORT);
        let n = uart_write_bytes(pins::MHZ19_UART_PORT, frame.as_ptr().cast(), frame.len());
        n == frame.len() as i32
    }
}

/// Read up to `buf.len()` bytes, waiting at most `timeout_ms`.
#[cfg(target_os = "espidf")]
pub fn uart_receive(buf: &mut [u8], timeout_ms: u32) -> usize {
    // SAFETY: the driver was installed in init_uart(); buf is exclusively borrowed.
    let n = unsafe {
        uart_read_bytes(
            pins::MHZ19_UART_PORT,
            buf.as_mut_ptr().cast(),
            buf.len() as u32,
            ms_to_ticks(timeout_ms),
        )
    };
    n.max(0) as usize
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_send(_frame: &[u8]) -> bool {
    false
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_receive(_buf: &mut [u8], _timeout_ms: u32) -> usize {
    0
}

// ── I²C master (BH1750) ───────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_i2c() -> Result<(), HwInitError> {
    let mut cfg = i2c_config_t {
        mode: i2c_mode_t_I2C_MODE_MASTER,
        sda_io_num: pins::I2C_SDA_GPIO,
        scl_io_num: pins::I2C_SCL_GPIO,
        sda_pullup_en: true,
        scl_pullup_en: true,
        ..Default::default()
    };
    cfg.__bindgen_anon_1.master.clk_speed = pins::I2C_FREQ_HZ;

    let ret = unsafe { i2c_param_config(pins::I2C_PORT, &cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::I2cInitFailed(ret)); }

    let ret = unsafe { i2c_driver_install(pins::I2C_PORT, i2c_mode_t_I2C_MODE_MASTER, 0, 0, 0) };
    if ret != ESP_OK as i32 { return Err(HwInitError::I2cInitFailed(ret)); }

    info!("hw_init: I2C master configured (SDA={} SCL={})", pins::I2C_SDA_GPIO, pins::I2C_SCL_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn i2c_write(addr: u8, bytes: &[u8]) -> bool {
    // SAFETY: driver installed in init_i2c(); buffer outlives the call.
    let ret = unsafe {
        i2c_master_write_to_device(pins::I2C_PORT, addr, bytes.as_ptr(), bytes.len(), ms_to_ticks(50))
    };
    ret == ESP_OK as i32
}

#[cfg(target_os = "espidf")]
pub fn i2c_read(addr: u8, buf: &mut [u8]) -> bool {
    // SAFETY: driver installed in init_i2c(); buf is exclusively borrowed.
    let ret = unsafe {
        i2c_master_read_from_device(pins::I2C_PORT, addr, buf.as_mut_ptr(), buf.len(), ms_to_ticks(50))
    };
    ret == ESP_OK as i32
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_write(_addr: u8, _bytes: &[u8]) -> bool {
    true
}

#[cfg(not(target_os = "espidf"))]
pub fn i2c_read(_addr: u8, _buf: &mut [u8]) -> bool {
    false
}
