//! Remote API client.
//!
//! Implements the outbound ports ([`AuditSink`], [`TelemetrySink`]) and the
//! inbound ones ([`RemoteConfigPort`], [`CommandSource`]) over JSON/HTTP:
//!
//! | Port                | Method | Path                              |
//! |---------------------|--------|-----------------------------------|
//! | `post_audit`        | POST   | `/api/actuators/audit`            |
//! | `post_environment`  | POST   | `/api/messages`                   |
//! | `post_heartbeat`    | POST   | `/api/devices/heartbeat`          |
//! | `poll_command`      | GET    | `/api/actuators/command/poll`     |
//! | `ack_command`       | POST   | `/api/actuators/command/ack`      |
//! | `fetch_*`           | GET    | `/api/devices/config`             |
//!
//! Every call is best effort: failures are logged and reported as `false`
//! or `None`, never as errors the control loop has to handle.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::events::EnvironmentReport;
use crate::app::ports::{
    AuditRecord, AuditSink, CommandSource, RemoteCommand, RemoteConfigPort, TelemetrySink,
};
use crate::config::SystemConfig;
use crate::error::CommsError;
use crate::model::{ActuatorId, Band, StageId, ThresholdSet, stage_id};
use crate::rules::{Action, Flag, RiskFlag};

use super::http::{HttpResponse, HttpTransport};
use super::wifi::{self, LinkInfo};

// ───────────────────────────────────────────────────────────────
// Wire DTOs
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AuditBody<'a> {
    actuator: &'static str,
    mode: &'static str,
    state: bool,
    payload: AuditPayload<'a>,
}

#[derive(Debug, Serialize)]
struct AuditPayload<'a> {
    device_id: &'a str,
    wifi_rssi: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    co2_ppm: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lux: Option<f32>,
}

#[derive(Debug, Serialize)]
struct EnvironmentBody<'a> {
    agent: &'static str,
    timestamp: &'a str,
    stage: &'a str,
    stress_level: &'static str,
    risk_flags: RiskFlagsBody,
    temperature: f32,
    humidity: f32,
    co2_ppm: i32,
    recommended_action: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct RiskFlagsBody {
    flacherie: bool,
    muscardine: bool,
    cocoon_quality: bool,
    rapid_temp_change: bool,
}

#[derive(Debug, Serialize)]
struct HeartbeatBody<'a> {
    device_id: &'a str,
    rssi: i32,
    ip: String,
}

#[derive(Debug, Serialize)]
struct AckBody {
    id: u64,
    ok: bool,
}

#[derive(Debug, Deserialize)]
struct PollResponse {
    #[serde(default)]
    command: Option<CommandDto>,
}

#[derive(Debug, Deserialize)]
struct CommandDto {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    actuator: String,
    #[serde(default)]
    mode: String,
    #[serde(default)]
    state: bool,
}

/// One stage entry.  Each bound is read on its own: a field that is not a
/// number is unknown and leaves the rest of the entry intact.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StageThresholdsDto {
    #[serde(deserialize_with = "lenient_number")]
    t_min: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    t_opt: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    t_max: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    h_min: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    h_opt: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    h_max: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    co2_min: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    co2_opt: Option<f64>,
    #[serde(deserialize_with = "lenient_number")]
    co2_max: Option<f64>,
}

fn lenient_number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Value::deserialize(de)?.as_f64().filter(|v| v.is_finite()))
}

fn real(v: Option<f64>) -> Option<f32> {
    v.map(|v| v as f32)
}

fn ppm(v: Option<f64>) -> Option<u16> {
    v.filter(|v| v.is_finite() && (0.0..=f64::from(u16::MAX)).contains(v))
        .map(|v| v.round() as u16)
}

impl From<StageThresholdsDto> for ThresholdSet {
    fn from(d: StageThresholdsDto) -> Self {
        ThresholdSet {
            temperature: Band::new(real(d.t_min), real(d.t_opt), real(d.t_max)),
            humidity: Band::new(real(d.h_min), real(d.h_opt), real(d.h_max)),
            co2: Band::new(ppm(d.co2_min), ppm(d.co2_opt), ppm(d.co2_max)),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Body builders
// ───────────────────────────────────────────────────────────────

/// Audit body.  The payload only carries the variables relevant to the
/// actuator, and only those that are known.
pub fn audit_body(record: &AuditRecord, device_id: &str, rssi: i32) -> Result<Vec<u8>, CommsError> {
    let r = &record.reading;
    let (temperature, humidity, co2_ppm, lux) = match record.actuator {
        ActuatorId::Ventilation => (r.temperature_c, r.humidity_pct, r.co2_ppm, None),
        ActuatorId::Heater => (r.temperature_c, None, None, None),
        ActuatorId::Humidifier => (None, r.humidity_pct, None, None),
        ActuatorId::Lighting => (None, None, None, r.illuminance_lux),
    };
    let body = AuditBody {
        actuator: record.actuator.as_str(),
        mode: record.origin.as_str(),
        state: record.state,
        payload: AuditPayload {
            device_id,
            wifi_rssi: rssi,
            temperature,
            humidity,
            co2_ppm,
            lux,
        },
    };
    serde_json::to_vec(&body).map_err(|_| CommsError::BadPayload)
}

/// Environment message.  Unknown readings are sent as `-1`.
pub fn environment_body(report: &EnvironmentReport) -> Result<Vec<u8>, CommsError> {
    let d = &report.decision;
    let r = &report.reading;
    let body = EnvironmentBody {
        agent: "environment",
        timestamp: &report.timestamp,
        stage: &report.stage,
        stress_level: d.stress_level().as_str(),
        risk_flags: RiskFlagsBody {
            flacherie: d.has_risk(RiskFlag::Flacherie),
            muscardine: d.has_risk(RiskFlag::Muscardine),
            cocoon_quality: d.has_risk(RiskFlag::CocoonQuality),
            rapid_temp_change: d.has_risk(RiskFlag::RapidTemperatureChange),
        },
        temperature: r.temperature_c.unwrap_or(-1.0),
        humidity: r.humidity_pct.unwrap_or(-1.0),
        co2_ppm: r.co2_ppm.map_or(-1, i32::from),
        recommended_action: Action::ALL
            .iter()
            .copied()
            .filter(|a| d.recommends(*a))
            .map(Action::as_str)
            .collect(),
    };
    serde_json::to_vec(&body).map_err(|_| CommsError::BadPayload)
}

/// Parse a command poll response.  `Ok(None)` is an empty queue.
pub fn parse_poll_response(body: &[u8]) -> Result<Option<RemoteCommand>, CommsError> {
    let resp: PollResponse = serde_json::from_slice(body).map_err(|_| CommsError::BadPayload)?;
    Ok(resp.command.map(|c| RemoteCommand {
        id: c.id,
        actuator: c.actuator,
        mode: c.mode,
        state: c.state,
    }))
}

/// The `config` object of a device config response.
pub fn parse_device_config(body: &[u8]) -> Result<Value, CommsError> {
    let mut doc: Value = serde_json::from_slice(body).map_err(|_| CommsError::BadPayload)?;
    match doc.get_mut("config").map(Value::take) {
        Some(cfg @ Value::Object(_)) => Ok(cfg),
        _ => Err(CommsError::BadPayload),
    }
}

/// `config.active_stage`, if present and usable.
pub fn active_stage_of(config: &Value) -> Option<StageId> {
    config.get("active_stage").and_then(Value::as_str).and_then(stage_id)
}

/// `config.stages[stage]` as a raw threshold set.  Missing numbers are
/// unknown; ordering is checked by the caller.
pub fn thresholds_of(config: &Value, stage: &str) -> Option<ThresholdSet> {
    let entry = config.get("stages")?.as_object()?.get(stage)?;
    if !entry.is_object() {
        return None;
    }
    serde_json::from_value::<StageThresholdsDto>(entry.clone())
        .ok()
        .map(ThresholdSet::from)
}

// ───────────────────────────────────────────────────────────────
// Client
// ───────────────────────────────────────────────────────────────

pub struct ApiClient<T: HttpTransport> {
    transport: T,
    base_url: String,
    device_id: String,
    api_key: String,
    link: fn() -> LinkInfo,
    /// Config document from the last stage fetch, consumed by the
    /// threshold fetch that follows it.
    config_doc: Option<Value>,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T, config: &SystemConfig) -> Self {
        Self {
            transport,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            device_id: config.device_id.to_string(),
            api_key: config.api_key.to_string(),
            link: wifi::link,
            config_doc: None,
        }
    }

    /// Replace the link status source (tests).
    #[must_use]
    pub fn with_link_source(mut self, link: fn() -> LinkInfo) -> Self {
        self.link = link;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn device_url(&self, path: &str) -> String {
        format!("{}{}?device_id={}", self.base_url, path, self.device_id)
    }

    fn post(&mut self, path: &str, body: Result<Vec<u8>, CommsError>) -> Result<(), CommsError> {
        let body = body?;
        let url = self.url(path);
        let headers = headers(&self.api_key, true);
        let resp = self.transport.post_json(&url, &headers, &body)?;
        check(resp).map(|_| ())
    }

    fn get(&mut self, url: &str) -> Result<Vec<u8>, CommsError> {
        let headers = headers(&self.api_key, false);
        let resp = self.transport.get(url, &headers)?;
        check(resp)
    }

    fn fetch_config_doc(&mut self) -> Result<Value, CommsError> {
        let url = self.device_url("/api/devices/config");
        let body = self.get(&url)?;
        parse_device_config(&body)
    }
}

/// Request headers.  An empty key sends no `x-api-key`.
fn headers(api_key: &str, json: bool) -> Vec<(&'static str, &str)> {
    let mut h = Vec::with_capacity(2);
    if json {
        h.push(("Content-Type", "application/json"));
    }
    if !api_key.is_empty() {
        h.push(("x-api-key", api_key));
    }
    h
}

fn check(resp: HttpResponse) -> Result<Vec<u8>, CommsError> {
    if resp.is_success() {
        Ok(resp.body)
    } else {
        Err(CommsError::HttpStatus(resp.status))
    }
}

fn outcome(what: &str, res: Result<(), CommsError>) -> bool {
    match res {
        Ok(()) => {
            debug!("api: {} ok", what);
            true
        }
        Err(e) => {
            warn!("api: {} failed: {}", what, e);
            false
        }
    }
}

impl<T: HttpTransport> AuditSink for ApiClient<T> {
    fn post_audit(&mut self, record: &AuditRecord) -> bool {
        let rssi = (self.link)().rssi;
        let body = audit_body(record, &self.device_id, rssi);
        let res = self.post("/api/actuators/audit", body);
        outcome("audit", res)
    }
}

impl<T: HttpTransport> TelemetrySink for ApiClient<T> {
    fn post_environment(&mut self, report: &EnvironmentReport) -> bool {
        let res = self.post("/api/messages", environment_body(report));
        outcome("environment", res)
    }

    fn post_heartbeat(&mut self) -> bool {
        let link = (self.link)();
        let body = serde_json::to_vec(&HeartbeatBody {
            device_id: &self.device_id,
            rssi: link.rssi,
            ip: link.ip.to_string(),
        })
        .map_err(|_| CommsError::BadPayload);
        let res = self.post("/api/devices/heartbeat", body);
        outcome("heartbeat", res)
    }
}

impl<T: HttpTransport> CommandSource for ApiClient<T> {
    fn poll_command(&mut self) -> Option<RemoteCommand> {
        let url = self.device_url("/api/actuators/command/poll");
        match self.get(&url).and_then(|b| parse_poll_response(&b)) {
            Ok(cmd) => cmd,
            Err(e) => {
                debug!("api: command poll failed: {}", e);
                None
            }
        }
    }

    fn ack_command(&mut self, id: u64, ok: bool) -> bool {
        let body = serde_json::to_vec(&AckBody { id, ok }).map_err(|_| CommsError::BadPayload);
        let res = self.post("/api/actuators/command/ack", body);
        outcome("command ack", res)
    }
}

impl<T: HttpTransport> RemoteConfigPort for ApiClient<T> {
    fn fetch_active_stage(&mut self) -> Option<StageId> {
        match self.fetch_config_doc() {
            Ok(doc) => {
                let stage = active_stage_of(&doc);
                self.config_doc = Some(doc);
                stage
            }
            Err(e) => {
                warn!("api: config fetch failed: {}", e);
                self.config_doc = None;
                None
            }
        }
    }

    fn fetch_thresholds(&mut self, stage: &str) -> Option<ThresholdSet> {
        if stage.is_empty() {
            return None;
        }
        let doc = match self.config_doc.take() {
            Some(doc) => doc,
            None => match self.fetch_config_doc() {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("api: config fetch failed: {}", e);
                    return None;
                }
            },
        };
        let set = thresholds_of(&doc, stage);
        if set.is_none() {
            warn!("api: no thresholds for stage {}", stage);
        }
        set
    }
}
