//! KozaTakip Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single synchronous control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Clock           │
//! │  (Sensor+Actuator) (EventSink)    (Config)     (uptime, SNTP)  │
//! │  ApiClient         WifiLink       local_web                    │
//! │  (Audit+Telemetry  (STA+backoff)  (/set, /status)              │
//! │   +Commands+Config)                                            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  RuleEngine · Controller · ModeRegistry                │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · inbox (HTTP task → loop)        │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{error, info, warn};

use kozatakip::adapters::api::ApiClient;
use kozatakip::adapters::hardware::{ActuatorSet, HardwareAdapter};
use kozatakip::adapters::http::EspHttpTransport;
use kozatakip::adapters::local_web;
use kozatakip::adapters::log_sink::LogEventSink;
use kozatakip::adapters::nvs::NvsAdapter;
use kozatakip::adapters::time::Clock;
use kozatakip::adapters::wifi::WifiLink;
use kozatakip::app::events::AppEvent;
use kozatakip::app::inbox;
use kozatakip::app::ports::{
    Actuator, CommandSource, ConfigPort, EventSink, SchedulerDelegate, TaskKind, TelemetrySink,
};
use kozatakip::app::service::AppService;
use kozatakip::config::SystemConfig;
use kozatakip::drivers::hw_init;
use kozatakip::drivers::watchdog::Watchdog;
use kozatakip::scheduler::Scheduler;
use kozatakip::sensors::SensorHub;

type Api = ApiClient<EspHttpTransport>;

// ── Scheduler delegate ────────────────────────────────────────
//
// Bridges the scheduler (which only knows task kinds) to the service and
// the API client.  Built fresh each iteration from borrows of the loop
// state.

struct NetworkJobs<'a, A: Actuator> {
    app: &'a mut AppService,
    hw: &'a mut HardwareAdapter<A>,
    api: &'a mut Api,
    sink: &'a mut LogEventSink,
    clock: &'a Clock,
}

impl<A: Actuator> SchedulerDelegate for NetworkJobs<'_, A> {
    fn on_task_due(&mut self, task: TaskKind, _now_ms: u64) {
        match task {
            TaskKind::Telemetry => {
                let report = self.app.build_report(self.clock.iso_timestamp());
                if !self.api.post_environment(&report) {
                    warn!("Environment report not delivered");
                }
                self.sink.emit(&AppEvent::Telemetry(report));
            }
            TaskKind::CommandPoll => {
                if let Some(cmd) = self.api.poll_command() {
                    info!("Remote command {}: {} mode={:?} state={}", cmd.id, cmd.actuator, cmd.mode, cmd.state);
                    let ok = self.app.handle_remote_command(&cmd, self.hw, self.api, self.sink);
                    if !self.api.ack_command(cmd.id, ok) {
                        warn!("Ack for command {} not delivered", cmd.id);
                    }
                    inbox::publish_modes(self.app.modes());
                }
            }
            TaskKind::Heartbeat => {
                if !self.api.post_heartbeat() {
                    warn!("Heartbeat not delivered");
                }
            }
            TaskKind::ConfigPoll => {
                self.app.refresh_config(self.api, self.sink);
            }
        }
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  KozaTakip v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals(config.relay_active_low) {
        // Without relays and buses there is nothing to control. The task
        // watchdog is not subscribed yet, so restart explicitly.
        error!("HAL init failed: {}, restarting", e);
        std::thread::sleep(Duration::from_millis(500));
        esp_idf_svc::hal::reset::restart();
    }

    let mut sensor_hub = SensorHub::chamber();
    let ready = sensor_hub.begin_all();
    info!("Sensors: {}/{} ready", ready, sensor_hub.len());
    let mut hw = HardwareAdapter::new(sensor_hub, ActuatorSet::chamber_relays(config.relay_active_low));

    let clock = Clock::new();
    let mut log_sink = LogEventSink::new();

    // ── 4. WiFi station + SNTP ────────────────────────────────
    let esp_wifi = EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs_partition))?;
    let wifi = BlockingWifi::wrap(esp_wifi, sys_loop)?;
    let mut link = match WifiLink::new(wifi, &config.wifi_ssid, &config.wifi_password) {
        Ok(link) => Some(link),
        Err(e) => {
            warn!("WiFi disabled: {}", e);
            None
        }
    };
    if let Some(link) = link.as_mut() {
        // A failed first attempt is retried by `poll`.
        let _ = link.connect(clock.uptime_ms());
    }
    let _sntp = EspSntp::new_default()?;

    // ── 5. Remote API + app service ───────────────────────────
    let mut api = ApiClient::new(EspHttpTransport::new(config.http_timeout_ms), &config);
    let mut app = AppService::new(&config);
    app.start(&mut log_sink);
    if !app.refresh_config(&mut api, &mut log_sink) {
        warn!("Initial config refresh incomplete, evaluating with fallbacks");
    }
    inbox::publish_modes(app.modes());

    // ── 6. Local control endpoint ─────────────────────────────
    let _server = match local_web::start_server(config.local_web_port) {
        Ok(server) => Some(server),
        Err(e) => {
            warn!("Local web server failed to start: {}", e);
            None
        }
    };

    let watchdog = Watchdog::new(config.watchdog_timeout_secs);
    let mut sched = Scheduler::from_config(&config);
    let loop_interval = Duration::from_millis(u64::from(config.control_loop_interval_ms));

    info!("System ready. Entering control loop.");

    // ── 7. Control loop ───────────────────────────────────────
    loop {
        let now_ms = clock.uptime_ms();

        app.tick(now_ms, &mut hw, &mut api, &mut log_sink);

        // Commands queued by the local web server.
        inbox::drain(|cmd| app.handle_command(cmd, &mut hw, &mut api, &mut log_sink));
        inbox::publish_modes(app.modes());

        let mut jobs = NetworkJobs {
            app: &mut app,
            hw: &mut hw,
            api: &mut api,
            sink: &mut log_sink,
            clock: &clock,
        };
        sched.tick(now_ms, &mut jobs);

        if let Some(link) = link.as_mut() {
            link.poll(now_ms);
        }

        watchdog.feed();
        std::thread::sleep(loop_interval);
    }
}
