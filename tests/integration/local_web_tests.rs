//! Local web endpoint → inbox → AppService, as the control loop runs it.
//!
//! The inbox is a process-wide channel, so everything that touches it
//! lives in a single test.

use kozatakip::adapters::local_web::{parse_set_query, status_json};
use kozatakip::app::events::AppEvent;
use kozatakip::app::inbox;
use kozatakip::app::service::AppService;
use kozatakip::config::SystemConfig;
use kozatakip::model::{ActuatorId, ControlMode, ControlOrigin};

use crate::mock_hw::{CollectSink, MockChamber, RecordingAudit};

#[test]
fn set_requests_reach_the_bank_through_the_inbox() {
    let mut app = AppService::new(&SystemConfig::default());
    let mut bank = MockChamber::with_reading(25.0, 80.0, 600, 100.0);
    let mut audit = RecordingAudit::new();
    let mut sink = CollectSink::new();
    app.start(&mut sink);
    app.tick(1_000, &mut bank, &mut audit, &mut sink);
    let baseline = audit.records.len();

    // Handler side.
    for uri in [
        "/set?act=humidifier&mode=manual&state=1",
        "/set?act=lighting&state=1",
        "/set?act=sprinkler&mode=manual&state=1",
    ] {
        for cmd in parse_set_query(uri) {
            assert!(inbox::submit(cmd));
        }
    }

    // Control-loop side.
    let drained = inbox::drain(|cmd| app.handle_command(cmd, &mut bank, &mut audit, &mut sink));
    inbox::publish_modes(app.modes());

    assert_eq!(drained, 3);
    assert!(bank.on(ActuatorId::Humidifier));
    // Lighting is still automatic, so its manual request was dropped.
    assert!(!bank.on(ActuatorId::Lighting));

    let manual: Vec<_> = audit.records[baseline..].iter().collect();
    assert_eq!(manual.len(), 1);
    assert_eq!(manual[0].actuator, ActuatorId::Humidifier);
    assert_eq!(manual[0].origin, ControlOrigin::Manual);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ModeChanged { actuator: ActuatorId::Humidifier, mode: ControlMode::Manual })),
        1
    );

    let body = status_json("192.168.4.2", -60, &inbox::current_modes()).unwrap();
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(v["modes"]["humidifier"], "manual");
    assert_eq!(v["modes"]["lighting"], "auto");

    // The automatic pass no longer touches the humidifier.
    app.tick(2_000, &mut bank, &mut audit, &mut sink);
    assert!(bank.on(ActuatorId::Humidifier));
    assert_eq!(inbox::drain(|_| panic!("inbox should be empty")), 0);
}
