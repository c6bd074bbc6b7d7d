//! WiFi station-mode link.
//!
//! Connects to the configured access point, reconnects with exponential
//! backoff (2 s → 4 s → 8 s … capped at 60 s) and publishes the link
//! status (connected, RSSI, IP) into lock-free statics.  Those are read by
//! the API client for heartbeats and audit payloads and by the local web
//! server's `/status` handler, which runs on another task.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from esp-idf-svc.
//! - **all other targets**: simulation stubs for host-side tests.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::net::Ipv4Addr;

use log::{info, warn};

#[cfg(target_os = "espidf")]
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

// ───────────────────────────────────────────────────────────────
// Published link status
// ───────────────────────────────────────────────────────────────

static LINK_UP: AtomicBool = AtomicBool::new(false);
static LINK_RSSI: AtomicI32 = AtomicI32::new(0);
static LINK_IP: AtomicU32 = AtomicU32::new(0);

/// Snapshot of the station link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkInfo {
    pub connected: bool,
    /// dBm; 0 while disconnected.
    pub rssi: i32,
    /// `0.0.0.0` while disconnected.
    pub ip: Ipv4Addr,
}

impl LinkInfo {
    pub const DOWN: Self = Self {
        connected: false,
        rssi: 0,
        ip: Ipv4Addr::UNSPECIFIED,
    };
}

/// Current link status, readable from any task.
pub fn link() -> LinkInfo {
    LinkInfo {
        connected: LINK_UP.load(Ordering::Acquire),
        rssi: LINK_RSSI.load(Ordering::Relaxed),
        ip: Ipv4Addr::from(LINK_IP.load(Ordering::Relaxed)),
    }
}

fn publish(info: LinkInfo) {
    LINK_RSSI.store(info.rssi, Ordering::Relaxed);
    LINK_IP.store(u32::from(info.ip), Ordering::Relaxed);
    LINK_UP.store(info.connected, Ordering::Release);
}

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "WiFi connection failed"),
        }
    }
}

impl From<ConnectivityError> for crate::error::Error {
    fn from(_: ConnectivityError) -> Self {
        Self::Comms(crate::error::CommsError::WifiConnectFailed)
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// Link state machine
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    Connected,
    Reconnecting { attempt: u32, next_try_ms: u64 },
}

const INITIAL_BACKOFF_MS: u64 = 2_000;
const MAX_BACKOFF_MS: u64 = 60_000;

pub struct WifiLink {
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    ssid: heapless::String<32>,
    password: heapless::String<64>,
    state: WifiState,
    backoff_ms: u64,
}

impl WifiLink {
    #[cfg(target_os = "espidf")]
    pub fn new(
        wifi: BlockingWifi<EspWifi<'static>>,
        ssid: &str,
        password: &str,
    ) -> Result<Self, ConnectivityError> {
        let (ssid, password) = Self::credentials(ssid, password)?;
        Ok(Self {
            wifi,
            ssid,
            password,
            state: WifiState::Disconnected,
            backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConnectivityError> {
        let (ssid, password) = Self::credentials(ssid, password)?;
        Ok(Self {
            ssid,
            password,
            state: WifiState::Disconnected,
            backoff_ms: INITIAL_BACKOFF_MS,
        })
    }

    fn credentials(
        ssid: &str,
        password: &str,
    ) -> Result<(heapless::String<32>, heapless::String<64>), ConnectivityError> {
        if ssid.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }
        validate_ssid(ssid)?;
        validate_password(password)?;
        let mut s = heapless::String::new();
        s.push_str(ssid).map_err(|_| ConnectivityError::InvalidSsid)?;
        let mut p = heapless::String::new();
        p.push_str(password).map_err(|_| ConnectivityError::InvalidPassword)?;
        Ok((s, p))
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == WifiState::Connected
    }

    /// First connection attempt.  On failure the link enters the
    /// reconnect cycle driven by [`poll`](Self::poll).
    pub fn connect(&mut self, now_ms: u64) -> Result<(), ConnectivityError> {
        info!("WiFi: connecting to '{}'", self.ssid);
        match self.platform_connect() {
            Ok(info) => {
                self.on_connected(info);
                Ok(())
            }
            Err(e) => {
                warn!("WiFi: connection failed: {}", e);
                self.schedule_retry(0, now_ms);
                Err(e)
            }
        }
    }

    /// Track link loss and retry when the backoff has elapsed.
    pub fn poll(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connected => match self.platform_status() {
                Some(info) => publish(info),
                None => {
                    warn!("WiFi: connection lost, entering reconnect");
                    publish(LinkInfo::DOWN);
                    self.backoff_ms = INITIAL_BACKOFF_MS;
                    self.schedule_retry(0, now_ms);
                }
            },
            WifiState::Reconnecting { attempt, next_try_ms } if now_ms >= next_try_ms => {
                info!("WiFi: reconnect attempt {} (backoff {} ms)", attempt + 1, self.backoff_ms);
                match self.platform_connect() {
                    Ok(info) => self.on_connected(info),
                    Err(_) => {
                        self.backoff_ms = (self.backoff_ms * 2).min(MAX_BACKOFF_MS);
                        self.schedule_retry(attempt + 1, now_ms);
                    }
                }
            }
            _ => {}
        }
    }

    fn on_connected(&mut self, info: LinkInfo) {
        self.state = WifiState::Connected;
        self.backoff_ms = INITIAL_BACKOFF_MS;
        publish(info);
        info!("WiFi: connected, ip={} rssi={}dBm", info.ip, info.rssi);
    }

    fn schedule_retry(&mut self, attempt: u32, now_ms: u64) {
        self.state = WifiState::Reconnecting {
            attempt,
            next_try_ms: now_ms + self.backoff_ms,
        };
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self) -> Result<LinkInfo, ConnectivityError> {
        use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};

        let auth_method = if self.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPAWPA2Personal
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: self.ssid.as_str().try_into().map_err(|_| ConnectivityError::InvalidSsid)?,
            password: self
                .password
                .as_str()
                .try_into()
                .map_err(|_| ConnectivityError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        let _ = self.wifi.disconnect();
        self.wifi
            .set_configuration(&conf)
            .map_err(|_| ConnectivityError::ConnectionFailed)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(|_| ConnectivityError::ConnectionFailed)?;
        }
        self.wifi.connect().map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.wifi.wait_netif_up().map_err(|_| ConnectivityError::ConnectionFailed)?;
        self.platform_status().ok_or(ConnectivityError::ConnectionFailed)
    }

    #[cfg(target_os = "espidf")]
    fn platform_status(&self) -> Option<LinkInfo> {
        if !self.wifi.is_connected().unwrap_or(false) {
            return None;
        }
        let ip = self
            .wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .map(|i| i.ip)
            .unwrap_or(Ipv4Addr::UNSPECIFIED);

        let mut ap: esp_idf_svc::sys::wifi_ap_record_t = Default::default();
        // SAFETY: out-pointer to a local record; the driver is started.
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap) };
        let rssi = if ret == esp_idf_svc::sys::ESP_OK { i32::from(ap.rssi) } else { 0 };

        Some(LinkInfo { connected: true, rssi, ip })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self) -> Result<LinkInfo, ConnectivityError> {
        if self.ssid.as_str() == SIM_UNREACHABLE_SSID {
            return Err(ConnectivityError::ConnectionFailed);
        }
        info!("WiFi(sim): associated with '{}' (pw {} bytes)", self.ssid, self.password.len());
        self.platform_status().ok_or(ConnectivityError::ConnectionFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_status(&self) -> Option<LinkInfo> {
        Some(LinkInfo {
            connected: true,
            rssi: -60,
            ip: Ipv4Addr::new(192, 168, 4, 2),
        })
    }
}

/// Simulation: connecting to this SSID always fails.
#[cfg(not(target_os = "espidf"))]
pub const SIM_UNREACHABLE_SSID: &str = "unreachable";

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
