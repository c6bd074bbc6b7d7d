//! Integration tests for the remote API client over a scripted transport.

use std::net::Ipv4Addr;

use kozatakip::adapters::api::ApiClient;
use kozatakip::adapters::wifi::LinkInfo;
use kozatakip::app::events::EnvironmentReport;
use kozatakip::app::ports::{
    AuditRecord, AuditSink, CommandSource, RemoteConfigPort, TelemetrySink,
};
use kozatakip::config::SystemConfig;
use kozatakip::error::CommsError;
use kozatakip::model::{ActuatorId, Band, ControlOrigin, Reading, stage_id};
use kozatakip::rules::Decision;

use crate::mock_hw::ScriptedTransport;

const CONFIG_DOC: &str = r#"{"config":{"active_stage":"larva_3","stages":{
    "larva_3":{"t_min":24.5,"t_opt":25.0,"t_max":25.5,"h_min":76,"h_max":79,"co2_max":1100},
    "larva_4":{"t_min":23.0,"t_max":25.0}
}}}"#;

fn fake_link() -> LinkInfo {
    LinkInfo {
        connected: true,
        rssi: -58,
        ip: Ipv4Addr::new(192, 168, 1, 50),
    }
}

fn client(api_key: &str) -> ApiClient<ScriptedTransport> {
    let mut cfg = SystemConfig::default();
    cfg.api_base_url = heapless::String::try_from("http://api.test/").unwrap();
    cfg.device_id = heapless::String::try_from("chamber-7").unwrap();
    cfg.api_key = heapless::String::try_from(api_key).unwrap();
    ApiClient::new(ScriptedTransport::new(), &cfg).with_link_source(fake_link)
}

fn heater_on() -> AuditRecord {
    AuditRecord {
        actuator: ActuatorId::Heater,
        origin: ControlOrigin::Auto,
        state: true,
        reading: Reading::from_raw(23.1, 80.0, 700, 120.0, 0),
    }
}

#[test]
fn audit_is_posted_with_key_and_relevant_payload() {
    let mut api = client("secret");
    assert!(api.post_audit(&heater_on()));

    let sent = &api.transport().sent;
    assert_eq!(sent.len(), 1);
    let req = &sent[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.url, "http://api.test/api/actuators/audit");
    assert_eq!(req.header("x-api-key"), Some("secret"));
    assert_eq!(req.header("Content-Type"), Some("application/json"));

    let v = req.json();
    assert_eq!(v["actuator"], "heater");
    assert_eq!(v["mode"], "auto");
    assert_eq!(v["payload"]["device_id"], "chamber-7");
    assert_eq!(v["payload"]["wifi_rssi"], -58);
    assert!(v["payload"].get("co2_ppm").is_none());
}

#[test]
fn empty_api_key_sends_no_key_header() {
    let mut api = client("");
    assert!(api.post_heartbeat());
    let req = &api.transport().sent[0];
    assert_eq!(req.header("x-api-key"), None);
    assert_eq!(req.url, "http://api.test/api/devices/heartbeat");

    let v = req.json();
    assert_eq!(v["device_id"], "chamber-7");
    assert_eq!(v["rssi"], -58);
    assert_eq!(v["ip"], "192.168.1.50");
}

#[test]
fn failed_posts_report_false() {
    let mut api = client("k");
    api.transport_mut().respond(500, "oops");
    api.transport_mut().fail(CommsError::WifiDisconnected);
    assert!(!api.post_audit(&heater_on()));
    assert!(!api.post_heartbeat());
    // Default 200 once the script is exhausted.
    assert!(api.post_heartbeat());
}

#[test]
fn environment_report_goes_to_messages() {
    let mut api = client("k");
    let report = EnvironmentReport {
        timestamp: "2025-05-14T08:30:05Z".to_string(),
        stage: stage_id("larva_4").unwrap(),
        decision: Decision::default(),
        reading: Reading::from_raw(25.0, f32::NAN, 0, 10.0, 0),
    };
    assert!(api.post_environment(&report));

    let req = &api.transport().sent[0];
    assert_eq!(req.url, "http://api.test/api/messages");
    let v = req.json();
    assert_eq!(v["timestamp"], "2025-05-14T08:30:05Z");
    assert_eq!(v["stress_level"], "low");
    assert_eq!(v["temperature"], 25.0);
    assert_eq!(v["humidity"], -1.0);
    assert_eq!(v["co2_ppm"], -1);
    assert_eq!(v["recommended_action"], serde_json::json!([]));
}

#[test]
fn command_poll_and_ack() {
    let mut api = client("k");
    api.transport_mut().respond(
        200,
        r#"{"command":{"id":42,"actuator":"humidifier","mode":"manual","state":true}}"#,
    );

    let cmd = api.poll_command().unwrap();
    assert_eq!(cmd.id, 42);
    assert_eq!(cmd.actuator, "humidifier");
    assert_eq!(cmd.mode, "manual");
    assert!(cmd.state);

    assert!(api.ack_command(42, true));

    let sent = &api.transport().sent;
    assert_eq!(sent[0].method, "GET");
    assert_eq!(sent[0].url, "http://api.test/api/actuators/command/poll?device_id=chamber-7");
    assert_eq!(sent[1].url, "http://api.test/api/actuators/command/ack");
    assert_eq!(sent[1].json(), serde_json::json!({"id": 42, "ok": true}));
}

#[test]
fn empty_or_broken_poll_yields_no_command() {
    let mut api = client("k");
    api.transport_mut().respond(200, r#"{"command":null}"#);
    api.transport_mut().respond(200, "<html>");
    api.transport_mut().respond(404, "");
    assert!(api.poll_command().is_none());
    assert!(api.poll_command().is_none());
    assert!(api.poll_command().is_none());
}

#[test]
fn stage_then_thresholds_share_one_fetch() {
    let mut api = client("k");
    api.transport_mut().respond(200, CONFIG_DOC);

    let stage = api.fetch_active_stage().unwrap();
    assert_eq!(stage.as_str(), "larva_3");
    let set = api.fetch_thresholds(&stage).unwrap();
    assert_eq!(set.temperature, Band::new(Some(24.5), Some(25.0), Some(25.5)));
    assert_eq!(set.humidity, Band::new(Some(76.0), None, Some(79.0)));
    assert_eq!(set.co2, Band::new(None, None, Some(1100)));

    let sent = &api.transport().sent;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, "http://api.test/api/devices/config?device_id=chamber-7");
}

#[test]
fn thresholds_fetch_on_its_own_when_nothing_cached() {
    let mut api = client("k");
    api.transport_mut().respond(200, CONFIG_DOC);
    let set = api.fetch_thresholds("larva_4").unwrap();
    assert_eq!(set.temperature, Band::new(Some(23.0), None, Some(25.0)));
    assert!(set.co2.is_unset());
    assert_eq!(api.transport().sent.len(), 1);
}

#[test]
fn failed_config_fetch_answers_nothing() {
    let mut api = client("k");
    api.transport_mut().fail(CommsError::HttpRequestFailed);
    api.transport_mut().respond(200, r#"{"config":{"active_stage":"cocoon"}}"#);

    assert!(api.fetch_active_stage().is_none());
    // Second fetch: no stage table for cocoon.
    assert!(api.fetch_thresholds("cocoon").is_none());
    assert!(api.fetch_thresholds("").is_none());
    assert_eq!(api.transport().sent.len(), 2);
}
