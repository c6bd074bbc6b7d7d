//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART in production), one line per event with a
//! fixed tag so the serial console can be grepped.

use core::fmt;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::rules::{Action, Flag, RiskFlag};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// An optional reading, `--` when unknown.
struct Opt<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Opt<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            None => write!(f, "--"),
        }
    }
}

/// Space-separated flag names, `-` when empty.
fn names<F: Flag>(flags: impl Iterator<Item = F>, name: fn(F) -> &'static str) -> String {
    let s = flags.map(name).collect::<Vec<_>>().join(" ");
    if s.is_empty() { "-".to_string() } else { s }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                let r = &t.reading;
                info!(
                    "TELEM | stage={} | T={:.1}\u{00b0}C H={:.1}% CO2={}ppm L={:.0}lx | \
                     level={} stress={} | actions={} | risks={}",
                    t.stage,
                    Opt(r.temperature_c),
                    Opt(r.humidity_pct),
                    Opt(r.co2_ppm),
                    Opt(r.illuminance_lux),
                    t.decision.level,
                    t.decision.stress_level().as_str(),
                    names(t.decision.actions.iter(), Action::as_str),
                    names(t.decision.risks.iter(), RiskFlag::as_str),
                );
            }
            AppEvent::ActuatorChanged(tr) => {
                let line = format!(
                    "ACT | {} -> {} ({})",
                    tr.actuator,
                    if tr.state { "ON" } else { "OFF" },
                    tr.origin.as_str(),
                );
                if tr.audited {
                    info!("{}", line);
                } else {
                    warn!("{} | audit not delivered", line);
                }
            }
            AppEvent::ModeChanged { actuator, mode } => {
                info!("MODE | {} -> {}", actuator, mode.as_str());
            }
            AppEvent::AlarmChanged { from, to, decision } => {
                let line = format!(
                    "ALARM | {} -> {} | actions={} | risks={}",
                    from,
                    to,
                    names(decision.actions.iter(), Action::as_str),
                    names(decision.risks.iter(), RiskFlag::as_str),
                );
                if to > from { warn!("{}", line) } else { info!("{}", line) }
            }
            AppEvent::StageChanged { from, to } => {
                info!("STAGE | {} -> {}", from, to);
            }
            AppEvent::ThresholdsReplaced { stage } => {
                info!("THRESH | new set for {}", stage);
            }
            AppEvent::ThresholdsRejected { reason } => {
                warn!("THRESH | rejected: {}", reason);
            }
            AppEvent::Started { stage } => {
                info!("START | stage={}", stage);
            }
        }
    }
}
