//! Fuzz target: local `/set` query parsing
//!
//! Any URI must parse without panicking; every queued command must name
//! the actuator given in `act`.
//!
//! cargo fuzz run fuzz_set_query

#![no_main]

use libfuzzer_sys::fuzz_target;
use kozatakip::adapters::local_web::{parse_set_query, query_param};
use kozatakip::app::commands::AppCommand;
use kozatakip::model::ActuatorId;

fuzz_target!(|data: &[u8]| {
    let Ok(uri) = core::str::from_utf8(data) else {
        return;
    };
    let batch = parse_set_query(uri);
    assert!(batch.len() <= 2);
    let act = query_param(uri, "act").and_then(ActuatorId::parse);
    for cmd in &batch {
        match cmd {
            AppCommand::SetMode { actuator, .. } | AppCommand::ApplyManual { actuator, .. } => {
                assert_eq!(Some(*actuator), act);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
});
