//! Integration tests: AppService → RuleEngine + Controller → actuators.

use kozatakip::app::commands::AppCommand;
use kozatakip::app::events::AppEvent;
use kozatakip::app::ports::{ActuatorPort, AuditRecord, AuditSink, EventSink, SensorPort};
use kozatakip::app::service::AppService;
use kozatakip::config::SystemConfig;
use kozatakip::model::{ActuatorId, ControlMode, Reading, Stage, stage_id};
use kozatakip::rules::{Action, AlarmLevel, RiskFlag};

// ── Mock implementations ──────────────────────────────────────

struct MockChamber {
    reading: Reading,
    relays: [bool; 4],
}

impl MockChamber {
    fn new(t: f32, h: f32, co2: i32, lux: f32) -> Self {
        Self {
            reading: Reading::from_raw(t, h, co2, lux, 0),
            relays: [false; 4],
        }
    }

    fn on(&self, id: ActuatorId) -> bool {
        self.relays[id.index()]
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
    }
}

#[derive(Default)]
struct Audit(Vec<AuditRecord>);

impl AuditSink for Audit {
    fn post_audit(&mut self, record: &AuditRecord) -> bool {
        self.0.push(*record);
        true
    }
}

#[derive(Default)]
struct Sink(Vec<AppEvent>);

impl EventSink for Sink {
    fn emit(&mut self, event: &AppEvent) {
        self.0.push(event.clone());
    }
}

impl Sink {
    fn alarms(&self) -> Vec<(AlarmLevel, AlarmLevel)> {
        self.0
            .iter()
            .filter_map(|e| match e {
                AppEvent::AlarmChanged { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

fn started() -> (AppService, Audit, Sink) {
    let mut app = AppService::new(&SystemConfig::default());
    let mut sink = Sink::default();
    app.start(&mut sink);
    (app, Audit::default(), sink)
}

// ── Full control cycle ────────────────────────────────────────

#[test]
fn start_announces_default_stage() {
    let (app, _, sink) = started();
    assert_eq!(app.evaluated_stage(), Some(Stage::Larva4));
    assert!(matches!(&sink.0[0], AppEvent::Started { stage } if stage.as_str() == "larva_4"));
}

#[test]
fn humid_stale_air_in_larva_4_is_critical_and_vented() {
    let (mut app, mut audit, mut sink) = started();
    let mut hw = MockChamber::new(25.0, 82.0, 1300, 100.0);

    let d = app.tick(1_000, &mut hw, &mut audit, &mut sink);

    assert_eq!(d.level, AlarmLevel::Critical);
    assert!(d.has_risk(RiskFlag::Flacherie));
    assert!(d.has_risk(RiskFlag::Muscardine));
    assert!(d.recommends(Action::IncreaseVentilation));
    assert!(d.recommends(Action::DecreaseHumidity));
    assert!(hw.on(ActuatorId::Ventilation));
    assert!(!hw.on(ActuatorId::Humidifier));
    assert_eq!(sink.alarms(), [(AlarmLevel::Normal, AlarmLevel::Critical)]);

    // Same conditions: no new alarm event, no new audit.
    let audited = audit.0.len();
    app.tick(2_000, &mut hw, &mut audit, &mut sink);
    assert_eq!(sink.alarms().len(), 1);
    assert_eq!(audit.0.len(), audited);
    assert_eq!(app.tick_count(), 2);
}

#[test]
fn dead_sensors_mean_quiet_and_everything_off() {
    let (mut app, mut audit, mut sink) = started();
    let mut hw = MockChamber::new(f32::NAN, f32::NAN, 0, f32::NAN);
    hw.relays = [true; 4];

    let d = app.tick(1_000, &mut hw, &mut audit, &mut sink);

    assert!(d.is_quiet());
    assert_eq!(hw.relays, [false; 4]);
    assert_eq!(audit.0.len(), 4);
}

#[test]
fn report_reflects_latest_cycle() {
    let (mut app, mut audit, mut sink) = started();
    let mut hw = MockChamber::new(25.0, 78.0, 700, 30.0);
    let d = app.tick(5_000, &mut hw, &mut audit, &mut sink);

    let report = app.build_report("2025-05-14T08:30:05Z".to_string());
    assert_eq!(report.timestamp, "2025-05-14T08:30:05Z");
    assert_eq!(report.stage.as_str(), "larva_4");
    assert_eq!(report.decision, d);
    assert_eq!(report.reading.timestamp_ms, 5_000);
    assert_eq!(report.reading.co2_ppm, Some(700));
}

#[test]
fn unknown_stage_is_held_but_never_alarms() {
    let (mut app, mut audit, mut sink) = started();
    app.handle_command(
        AppCommand::SetStage(stage_id("larva_9").unwrap()),
        &mut MockChamber::new(0.0, 0.0, 0, 0.0),
        &mut audit,
        &mut sink,
    );
    assert_eq!(app.active_stage_id().as_str(), "larva_9");
    assert_eq!(app.evaluated_stage(), None);

    let mut hw = MockChamber::new(35.0, 95.0, 3000, 0.0);
    let d = app.tick(1_000, &mut hw, &mut audit, &mut sink);

    assert!(d.is_quiet());
    // Actuators still follow the fallback thresholds.
    assert!(hw.on(ActuatorId::Ventilation));
    assert!(hw.on(ActuatorId::Lighting));
    assert!(!hw.on(ActuatorId::Heater));
    assert_eq!(app.build_report(String::new()).stage.as_str(), "larva_9");
}

#[test]
fn rapid_swing_in_larva_5_is_critical() {
    let (mut app, mut audit, mut sink) = started();
    let mut hw = MockChamber::new(24.0, 65.0, 600, 100.0);
    app.handle_command(AppCommand::SetStage(stage_id("larva_5").unwrap()), &mut hw, &mut audit, &mut sink);

    let calm = app.tick(1_000, &mut hw, &mut audit, &mut sink);
    assert!(!calm.has_risk(RiskFlag::RapidTemperatureChange));

    hw.reading.temperature_c = Some(26.5);
    let swing = app.tick(61_000, &mut hw, &mut audit, &mut sink);
    assert_eq!(swing.level, AlarmLevel::Critical);
    assert!(swing.has_risk(RiskFlag::RapidTemperatureChange));
}

#[test]
fn mode_commands_emit_only_on_change() {
    let (mut app, mut audit, mut sink) = started();
    let mut hw = MockChamber::new(25.0, 80.0, 600, 100.0);
    let cmd = AppCommand::SetMode {
        actuator: ActuatorId::Heater,
        mode: ControlMode::Manual,
    };

    app.handle_command(cmd.clone(), &mut hw, &mut audit, &mut sink);
    app.handle_command(cmd, &mut hw, &mut audit, &mut sink);

    let changes = sink
        .0
        .iter()
        .filter(|e| matches!(e, AppEvent::ModeChanged { .. }))
        .count();
    assert_eq!(changes, 1);
    assert_eq!(app.modes().get(ActuatorId::Heater), ControlMode::Manual);
}

#[test]
fn manual_apply_is_audited_with_last_reading() {
    let (mut app, mut audit, mut sink) = started();
    let mut hw = MockChamber::new(25.0, 80.0, 600, 100.0);
    app.tick(1_000, &mut hw, &mut audit, &mut sink);
    let before = audit.0.len();

    app.handle_command(
        AppCommand::SetMode { actuator: ActuatorId::Lighting, mode: ControlMode::Manual },
        &mut hw,
        &mut audit,
        &mut sink,
    );
    app.handle_command(
        AppCommand::ApplyManual { actuator: ActuatorId::Lighting, on: true },
        &mut hw,
        &mut audit,
        &mut sink,
    );

    assert!(hw.on(ActuatorId::Lighting));
    assert_eq!(audit.0.len(), before + 1);
    let rec = audit.0.last().unwrap();
    assert_eq!(rec.reading, *app.last_reading());
    assert_eq!(rec.reading.timestamp_ms, 1_000);
}
