//! Integration tests for remote commands and config refresh through the
//! AppService, including the real API client over a scripted transport.

use kozatakip::adapters::api::ApiClient;
use kozatakip::app::events::AppEvent;
use kozatakip::app::ports::RemoteCommand;
use kozatakip::app::service::AppService;
use kozatakip::config::SystemConfig;
use kozatakip::model::{ActuatorId, Band, ControlMode, Stage, ThresholdSet};

use crate::mock_hw::{CollectSink, MockChamber, RecordingAudit, ScriptedRemote, ScriptedTransport};

fn make_app() -> (AppService, MockChamber, RecordingAudit, CollectSink) {
    let mut app = AppService::new(&SystemConfig::default());
    let mut sink = CollectSink::new();
    app.start(&mut sink);
    (app, MockChamber::new(), RecordingAudit::new(), sink)
}

fn remote(id: u64, actuator: &str, mode: &str, state: bool) -> RemoteCommand {
    RemoteCommand {
        id,
        actuator: actuator.to_string(),
        mode: mode.to_string(),
        state,
    }
}

// ── Remote commands ───────────────────────────────────────────

#[test]
fn remote_manual_command_switches_mode_then_relay() {
    let (mut app, mut bank, mut audit, mut sink) = make_app();

    let ok = app.handle_remote_command(&remote(1, "ventilation", "manual", true), &mut bank, &mut audit, &mut sink);

    assert!(ok);
    assert_eq!(app.modes().get(ActuatorId::Ventilation), ControlMode::Manual);
    assert_eq!(bank.calls, [(ActuatorId::Ventilation, true)]);
    assert_eq!(audit.records.len(), 1);
}

#[test]
fn remote_state_without_mode_is_ignored_in_auto() {
    let (mut app, mut bank, mut audit, mut sink) = make_app();

    let ok = app.handle_remote_command(&remote(2, "heater", "", true), &mut bank, &mut audit, &mut sink);

    // Recognised actuator: acknowledged, but nothing moves.
    assert!(ok);
    assert!(bank.calls.is_empty());
    assert!(audit.records.is_empty());
}

#[test]
fn remote_auto_mode_hands_actuator_back() {
    let (mut app, mut bank, mut audit, mut sink) = make_app();
    app.handle_remote_command(&remote(3, "lighting", "manual", true), &mut bank, &mut audit, &mut sink);
    app.handle_remote_command(&remote(4, "lighting", "auto", false), &mut bank, &mut audit, &mut sink);

    assert_eq!(app.modes().get(ActuatorId::Lighting), ControlMode::Automatic);
    // Back in auto the manual "off" was dropped; the next pass decides.
    assert!(bank.on(ActuatorId::Lighting));
}

#[test]
fn unknown_remote_actuator_is_nacked() {
    let (mut app, mut bank, mut audit, mut sink) = make_app();
    let ok = app.handle_remote_command(&remote(5, "sprinkler", "manual", true), &mut bank, &mut audit, &mut sink);
    assert!(!ok);
    assert!(bank.calls.is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ModeChanged { .. })), 0);
}

// ── Config refresh ────────────────────────────────────────────

#[test]
fn refresh_installs_stage_and_thresholds() {
    let (mut app, _, _, mut sink) = make_app();
    let set = ThresholdSet {
        temperature: Band::new(Some(25.5), None, Some(26.5)),
        ..ThresholdSet::default()
    };
    let mut remote = ScriptedRemote::new(Some("larva_2"), Some(set));

    assert!(app.refresh_config(&mut remote, &mut sink));

    assert_eq!(app.evaluated_stage(), Some(Stage::Larva2));
    assert_eq!(remote.threshold_fetches, ["larva_2"]);
    // Stored with the derived optimum.
    assert_eq!(app.thresholds().temperature.optimal, Some(26.0));
    assert_eq!(sink.count(|e| matches!(e, AppEvent::StageChanged { .. })), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ThresholdsReplaced { .. })), 1);
}

#[test]
fn failed_fetches_keep_previous_state() {
    let (mut app, _, _, mut sink) = make_app();
    let set = ThresholdSet {
        humidity: Band::new(Some(76.0), None, Some(79.0)),
        ..ThresholdSet::default()
    };
    app.refresh_config(&mut ScriptedRemote::new(Some("larva_3"), Some(set)), &mut sink);
    let before = *app.thresholds();

    let mut silent = ScriptedRemote::new(None, None);
    assert!(!app.refresh_config(&mut silent, &mut sink));

    assert_eq!(app.active_stage_id().as_str(), "larva_3");
    assert_eq!(*app.thresholds(), before);
    // Thresholds are still fetched for the stage already held.
    assert_eq!(silent.threshold_fetches, ["larva_3"]);
}

#[test]
fn out_of_order_thresholds_are_rejected() {
    let (mut app, _, _, mut sink) = make_app();
    let bad = ThresholdSet {
        temperature: Band::new(Some(28.0), None, Some(24.0)),
        ..ThresholdSet::default()
    };

    assert!(!app.refresh_config(&mut ScriptedRemote::new(Some("larva_1"), Some(bad)), &mut sink));

    assert_eq!(*app.thresholds(), ThresholdSet::default());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::ThresholdsRejected { .. })), 1);
}

#[test]
fn refresh_over_the_api_client() {
    let (mut app, _, _, mut sink) = make_app();
    let mut transport = ScriptedTransport::new();
    transport.respond(
        200,
        r#"{"config":{"active_stage":"cocoon","stages":{"cocoon":{"h_min":63,"h_max":68}}}}"#,
    );
    let mut api = ApiClient::new(transport, &SystemConfig::default());

    assert!(app.refresh_config(&mut api, &mut sink));

    assert_eq!(app.evaluated_stage(), Some(Stage::Cocoon));
    assert_eq!(app.thresholds().humidity, Band::new(Some(63.0), Some(65.5), Some(68.0)));
    assert_eq!(api.transport().sent.len(), 1);
}
