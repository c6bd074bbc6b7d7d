//! Mock adapters for integration tests.
//!
//! Records every actuator call, audit record and event so tests can assert
//! on the full history without touching real GPIO or the network.

use std::collections::VecDeque;

use kozatakip::adapters::http::{HttpResponse, HttpTransport};
use kozatakip::app::events::AppEvent;
use kozatakip::app::ports::{
    ActuatorPort, AuditRecord, AuditSink, EventSink, RemoteConfigPort, SensorPort,
};
use kozatakip::error::CommsError;
use kozatakip::model::{ActuatorId, Reading, StageId, ThresholdSet, stage_id};

// ── MockChamber ───────────────────────────────────────────────

/// Sensors and relays of a simulated chamber.  The next reading is set by
/// the test; relay writes are recorded in order.
pub struct MockChamber {
    pub reading: Reading,
    pub relays: [bool; 4],
    pub calls: Vec<(ActuatorId, bool)>,
}

#[allow(dead_code)]
impl MockChamber {
    pub fn new() -> Self {
        Self {
            reading: Reading::unknown(0),
            relays: [false; 4],
            calls: Vec::new(),
        }
    }

    pub fn with_reading(t: f32, h: f32, co2: i32, lux: f32) -> Self {
        let mut c = Self::new();
        c.set_reading(t, h, co2, lux);
        c
    }

    /// NaN / non-positive values mean "sensor failed".
    pub fn set_reading(&mut self, t: f32, h: f32, co2: i32, lux: f32) {
        self.reading = Reading::from_raw(t, h, co2, lux, 0);
    }

    pub fn on(&self, id: ActuatorId) -> bool {
        self.relays[id.index()]
    }
}

impl Default for MockChamber {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockChamber {
    fn read_all(&mut self, now_ms: u64) -> Reading {
        Reading {
            timestamp_ms: now_ms,
            ..self.reading
        }
    }
}

impl ActuatorPort for MockChamber {
    fn is_on(&self, id: ActuatorId) -> bool {
        self.relays[id.index()]
    }

    fn set(&mut self, id: ActuatorId, on: bool) {
        self.relays[id.index()] = on;
        self.calls.push((id, on));
    }
}

// ── RecordingAudit ────────────────────────────────────────────

pub struct RecordingAudit {
    pub records: Vec<AuditRecord>,
    /// What `post_audit` reports back.
    pub accept: bool,
}

#[allow(dead_code)]
impl RecordingAudit {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            accept: true,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            accept: false,
        }
    }
}

impl AuditSink for RecordingAudit {
    fn post_audit(&mut self, record: &AuditRecord) -> bool {
        self.records.push(*record);
        self.accept
    }
}

// ── CollectSink ───────────────────────────────────────────────

#[derive(Default)]
pub struct CollectSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for CollectSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedRemote ────────────────────────────────────────────

/// Remote config source answering with fixed values.  `None` simulates a
/// failed fetch.
#[derive(Default)]
pub struct ScriptedRemote {
    pub stage: Option<StageId>,
    pub thresholds: Option<ThresholdSet>,
    pub stage_fetches: usize,
    pub threshold_fetches: Vec<String>,
}

#[allow(dead_code)]
impl ScriptedRemote {
    pub fn new(stage: Option<&str>, thresholds: Option<ThresholdSet>) -> Self {
        Self {
            stage: stage.and_then(stage_id),
            thresholds,
            ..Self::default()
        }
    }
}

impl RemoteConfigPort for ScriptedRemote {
    fn fetch_active_stage(&mut self) -> Option<StageId> {
        self.stage_fetches += 1;
        self.stage.clone()
    }

    fn fetch_thresholds(&mut self, stage: &str) -> Option<ThresholdSet> {
        self.threshold_fetches.push(stage.to_string());
        self.thresholds
    }
}

// ── ScriptedTransport ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

#[allow(dead_code)]
impl SentRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

/// HTTP transport that replays queued responses and records requests.
/// With nothing queued every request answers `200 {}`.
#[derive(Default)]
pub struct ScriptedTransport {
    pub responses: VecDeque<Result<HttpResponse, CommsError>>,
    pub sent: Vec<SentRequest>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&mut self, status: u16, body: &str) {
        self.responses.push_back(Ok(HttpResponse {
            status,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub fn fail(&mut self, err: CommsError) {
        self.responses.push_back(Err(err));
    }

    fn next(&mut self) -> Result<HttpResponse, CommsError> {
        self.responses.pop_front().unwrap_or_else(|| {
            Ok(HttpResponse {
                status: 200,
                body: b"{}".to_vec(),
            })
        })
    }

    fn record(&mut self, method: &'static str, url: &str, headers: &[(&str, &str)], body: &[u8]) {
        self.sent.push(SentRequest {
            method,
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.to_vec(),
        });
    }
}

impl HttpTransport for ScriptedTransport {
    fn get(&mut self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, CommsError> {
        self.record("GET", url, headers, &[]);
        self.next()
    }

    fn post_json(
        &mut self,
        url: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<HttpResponse, CommsError> {
        self.record("POST", url, headers, body);
        self.next()
    }
}
