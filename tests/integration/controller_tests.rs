//! Integration tests for the controller driving a mock relay bank.

use kozatakip::control::{Controller, ControllerConfig};
use kozatakip::model::{ActuatorId, Band, ControlMode, ControlOrigin, Reading, ThresholdSet};

use crate::mock_hw::{MockChamber, RecordingAudit};

fn controller() -> Controller {
    Controller::new(ControllerConfig::default())
}

#[test]
fn auto_pass_runs_in_fixed_order_and_audits_each_change() {
    let mut ctl = controller();
    let mut bank = MockChamber::with_reading(22.0, 70.0, 1500, 10.0);
    let mut audit = RecordingAudit::new();
    let reading = bank.reading;

    let applied = ctl.apply_auto(&reading, &ThresholdSet::default(), &mut bank, &mut audit);

    let order: Vec<_> = applied.iter().map(|t| t.actuator).collect();
    assert_eq!(order, ActuatorId::ALL);
    assert!(applied.iter().all(|t| t.state && t.origin == ControlOrigin::Auto && t.audited));
    assert_eq!(audit.records.len(), 4);
    assert_eq!(audit.records[1].actuator, ActuatorId::Heater);
    assert_eq!(audit.records[1].reading, reading);
}

#[test]
fn repeated_pass_is_silent() {
    let mut ctl = controller();
    let mut bank = MockChamber::with_reading(22.0, 70.0, 1500, 10.0);
    let mut audit = RecordingAudit::new();
    let reading = bank.reading;

    ctl.apply_auto(&reading, &ThresholdSet::default(), &mut bank, &mut audit);
    let writes = bank.calls.len();
    let again = ctl.apply_auto(&reading, &ThresholdSet::default(), &mut bank, &mut audit);

    assert!(again.is_empty());
    assert_eq!(bank.calls.len(), writes);
    assert_eq!(audit.records.len(), 4);
}

#[test]
fn unknown_reading_switches_everything_off() {
    let mut ctl = controller();
    let mut bank = MockChamber::new();
    bank.relays = [true; 4];
    let mut audit = RecordingAudit::new();

    let applied = ctl.apply_auto(&Reading::unknown(0), &ThresholdSet::default(), &mut bank, &mut audit);

    assert_eq!(applied.len(), 4);
    assert!(applied.iter().all(|t| !t.state));
    assert_eq!(bank.relays, [false; 4]);
}

#[test]
fn manual_actuators_are_left_to_the_operator() {
    let mut ctl = controller();
    assert!(ctl.set_mode(ActuatorId::Heater, ControlMode::Manual));
    let mut bank = MockChamber::with_reading(20.0, 80.0, 400, 200.0);
    let mut audit = RecordingAudit::new();
    let reading = bank.reading;

    let applied = ctl.apply_auto(&reading, &ThresholdSet::default(), &mut bank, &mut audit);

    assert!(applied.iter().all(|t| t.actuator != ActuatorId::Heater));
    assert!(!bank.on(ActuatorId::Heater));
}

#[test]
fn manual_requests_need_manual_mode() {
    let mut ctl = controller();
    let mut bank = MockChamber::new();
    let mut audit = RecordingAudit::new();
    let reading = Reading::from_raw(25.0, 80.0, 600, 100.0, 0);

    assert!(
        ctl.apply_manual(ActuatorId::Lighting, true, &reading, &mut bank, &mut audit)
            .is_none()
    );
    assert!(!bank.on(ActuatorId::Lighting));
    assert_eq!(ctl.mode(ActuatorId::Lighting), ControlMode::Automatic);

    ctl.set_mode(ActuatorId::Lighting, ControlMode::Manual);
    let t = ctl
        .apply_manual(ActuatorId::Lighting, true, &reading, &mut bank, &mut audit)
        .unwrap();
    assert_eq!(t.origin, ControlOrigin::Manual);
    assert!(bank.on(ActuatorId::Lighting));

    // Same request again: nothing to do, nothing audited.
    assert!(
        ctl.apply_manual(ActuatorId::Lighting, true, &reading, &mut bank, &mut audit)
            .is_none()
    );
    assert_eq!(audit.records.len(), 1);
    assert_eq!(audit.records[0].origin, ControlOrigin::Manual);
}

#[test]
fn mode_switch_leaves_relay_alone() {
    let mut ctl = controller();
    let mut bank = MockChamber::new();
    bank.relays[ActuatorId::Humidifier.index()] = true;

    ctl.set_mode(ActuatorId::Humidifier, ControlMode::Manual);
    ctl.set_mode(ActuatorId::Humidifier, ControlMode::Automatic);

    assert!(bank.calls.is_empty());
    assert!(bank.on(ActuatorId::Humidifier));
    assert!(!ctl.set_mode(ActuatorId::Humidifier, ControlMode::Automatic));
}

#[test]
fn lost_audit_does_not_undo_the_switch() {
    let mut ctl = controller();
    let mut bank = MockChamber::with_reading(20.0, 80.0, 400, 200.0);
    let mut audit = RecordingAudit::failing();
    let reading = bank.reading;

    let applied = ctl.apply_auto(&reading, &ThresholdSet::default(), &mut bank, &mut audit);

    let heater = applied
        .iter()
        .find(|t| t.actuator == ActuatorId::Heater)
        .unwrap();
    assert!(heater.state);
    assert!(!heater.audited);
    assert!(bank.on(ActuatorId::Heater));
}

#[test]
fn stage_thresholds_override_fallbacks() {
    let mut ctl = controller();
    let reading = Reading::from_raw(26.5, 80.0, 400, 200.0, 0);

    // Fallback optimum 26 °C: 26.5 is above optimum + margin (26.3), heater stays off.
    let mut bank = MockChamber::new();
    let mut audit = RecordingAudit::new();
    ctl.apply_auto(&reading, &ThresholdSet::default(), &mut bank, &mut audit);
    assert!(!bank.on(ActuatorId::Heater));

    // Stage band 26-28 derives an optimum of 27 °C: 26.5 calls for heat.
    let stage = ThresholdSet {
        temperature: Band::new(Some(26.0), None, Some(28.0)),
        ..ThresholdSet::default()
    };
    ctl.apply_auto(&reading, &stage, &mut bank, &mut audit);
    assert!(bank.on(ActuatorId::Heater));
}
