//! Local HTTP control endpoint.
//!
//! Two routes on the chamber's own web server:
//!
//! - `GET /set?act=<id>&mode=auto|manual&state=1|true|0|false`
//! - `GET /status` → `{ip, rssi, modes:{ventilation, heater, humidifier, lighting}}`
//!
//! Handlers run on the HTTP server task.  They never touch the controller:
//! `/set` queues commands on the [`inbox`](crate::app::inbox) drained by
//! the control loop, and `/status` reads the mode snapshot the loop
//! republishes after every drain.

use serde::Serialize;

use crate::app::commands::{AppCommand, CommandBatch};
use crate::control::ModeSnapshot;
use crate::model::{ActuatorId, ControlMode};

/// Body returned by `/set`, whatever was requested.
pub const SET_REPLY: &str = r#"{"ok":true}"#;

/// Value of `key` in a query string (`a=1&b=2`, with or without the
/// leading path and `?`).
pub fn query_param<'a>(uri: &'a str, key: &str) -> Option<&'a str> {
    let query = uri.split_once('?').map_or(uri, |(_, q)| q);
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        (name == key).then_some(value)
    })
}

/// Translate a `/set` query into commands.
///
/// A mode change is queued only when both `act` and `mode` are given; any
/// mode other than `manual` means automatic.  A manual apply is queued
/// whenever `state` is given.  Unknown actuators yield nothing.
pub fn parse_set_query(uri: &str) -> CommandBatch {
    let mut batch = CommandBatch::new();
    let Some(actuator) = query_param(uri, "act").and_then(ActuatorId::parse) else {
        return batch;
    };

    if let Some(mode) = query_param(uri, "mode").filter(|m| !m.is_empty()) {
        let mode = if mode == "manual" { ControlMode::Manual } else { ControlMode::Automatic };
        let _ = batch.push(AppCommand::SetMode { actuator, mode });
    }
    if let Some(state) = query_param(uri, "state").filter(|s| !s.is_empty()) {
        let on = state == "1" || state == "true";
        let _ = batch.push(AppCommand::ApplyManual { actuator, on });
    }
    batch
}

#[derive(Debug, Serialize)]
struct StatusBody {
    ip: String,
    rssi: i32,
    modes: ModesBody,
}

#[derive(Debug, Serialize)]
struct ModesBody {
    ventilation: &'static str,
    heater: &'static str,
    humidifier: &'static str,
    lighting: &'static str,
}

/// `/status` body.
pub fn status_json(ip: &str, rssi: i32, modes: &ModeSnapshot) -> Result<String, serde_json::Error> {
    let body = StatusBody {
        ip: ip.to_string(),
        rssi,
        modes: ModesBody {
            ventilation: modes.get(ActuatorId::Ventilation).as_str(),
            heater: modes.get(ActuatorId::Heater).as_str(),
            humidifier: modes.get(ActuatorId::Humidifier).as_str(),
            lighting: modes.get(ActuatorId::Lighting).as_str(),
        },
    };
    serde_json::to_string(&body)
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF server
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn start_server(port: u16) -> anyhow::Result<esp_idf_svc::http::server::EspHttpServer<'static>> {
    use embedded_svc::io::Write;
    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use log::info;

    use crate::adapters::wifi;
    use crate::app::inbox;

    let conf = Configuration {
        http_port: port,
        stack_size: 8 * 1024,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf)?;

    server.fn_handler::<anyhow::Error, _>("/set", Method::Get, move |req| {
        for cmd in parse_set_query(req.uri()) {
            inbox::submit(cmd);
        }
        req.into_response(200, Some("OK"), &[("Content-Type", "application/json")])?
            .write_all(SET_REPLY.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler::<anyhow::Error, _>("/status", Method::Get, move |req| {
        let link = wifi::link();
        let body = status_json(&link.ip.to_string(), link.rssi, &inbox::current_modes())?;
        req.into_response(200, Some("OK"), &[("Content-Type", "application/json")])?
            .write_all(body.as_bytes())?;
        Ok(())
    })?;

    info!("local web: listening on :{}", port);
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ModeRegistry;

    #[test]
    fn query_param_lookup() {
        let uri = "/set?act=heater&mode=manual&state=1";
        assert_eq!(query_param(uri, "act"), Some("heater"));
        assert_eq!(query_param(uri, "state"), Some("1"));
        assert_eq!(query_param(uri, "missing"), None);
        assert_eq!(query_param("act=fan", "act"), Some("fan"));
        assert_eq!(query_param("/set?flag", "flag"), Some(""));
    }

    #[test]
    fn set_with_mode_and_state() {
        let batch = parse_set_query("/set?act=heater&mode=manual&state=true");
        assert_eq!(
            batch.as_slice(),
            [
                AppCommand::SetMode { actuator: ActuatorId::Heater, mode: ControlMode::Manual },
                AppCommand::ApplyManual { actuator: ActuatorId::Heater, on: true },
            ]
        );
    }

    #[test]
    fn unrecognised_mode_means_auto() {
        let batch = parse_set_query("/set?act=lighting&mode=bogus");
        assert_eq!(
            batch.as_slice(),
            [AppCommand::SetMode { actuator: ActuatorId::Lighting, mode: ControlMode::Automatic }]
        );
    }

    #[test]
    fn state_values() {
        let on = |s: &str| match parse_set_query(&format!("/set?act=humidifier&state={s}")).as_slice() {
            [AppCommand::ApplyManual { on, .. }] => *on,
            other => panic!("unexpected batch {other:?}"),
        };
        assert!(on("1"));
        assert!(on("true"));
        assert!(!on("0"));
        assert!(!on("false"));
        assert!(!on("yes"));
    }

    #[test]
    fn unknown_or_missing_actuator_yields_nothing() {
        assert!(parse_set_query("/set?act=fan&mode=manual&state=1").is_empty());
        assert!(parse_set_query("/set?mode=manual&state=1").is_empty());
        assert!(parse_set_query("/set?act=heater&mode=&state=").is_empty());
    }

    #[test]
    fn status_lists_every_mode() {
        let mut modes = ModeRegistry::new();
        modes.set(ActuatorId::Heater, ControlMode::Manual);
        let body = status_json("192.168.4.2", -61, &modes).unwrap();
        let v: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(v["ip"], "192.168.4.2");
        assert_eq!(v["rssi"], -61);
        assert_eq!(v["modes"]["heater"], "manual");
        assert_eq!(v["modes"]["ventilation"], "auto");
        assert_eq!(v["modes"]["humidifier"], "auto");
        assert_eq!(v["modes"]["lighting"], "auto");
    }
}
