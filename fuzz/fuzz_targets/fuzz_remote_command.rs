//! Fuzz target: command poll response → `AppCommand` batch
//!
//! Arbitrary bytes as a poll response body must either be rejected or
//! yield a command whose translation is bounded: unknown actuators give
//! no batch, known ones at most a mode change plus one apply.
//!
//! cargo fuzz run fuzz_remote_command

#![no_main]

use libfuzzer_sys::fuzz_target;
use kozatakip::adapters::api::parse_poll_response;
use kozatakip::app::commands::{AppCommand, CommandBatch};
use kozatakip::model::ActuatorId;

fuzz_target!(|data: &[u8]| {
    let Ok(Some(cmd)) = parse_poll_response(data) else {
        return;
    };
    let batch: Option<CommandBatch> = AppCommand::from_remote(&cmd);
    match ActuatorId::parse(&cmd.actuator) {
        None => assert!(batch.is_none()),
        Some(_) => {
            let batch = batch.expect("known actuator must translate");
            assert!(!batch.is_empty() && batch.len() <= 2);
            assert!(matches!(batch.last(), Some(AppCommand::ApplyManual { .. })));
        }
    }
});
