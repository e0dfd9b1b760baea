//! MQTT bridge for the Actiontec C3000A DSL modem.
//!
//! This bridge polls the modem's status page, tracks which modem is
//! answering, and publishes line and link metrics to MQTT. Optionally it
//! announces every metric to Home Assistant through MQTT discovery.
//!
//! # Topics
//!
//! ```text
//! modems/<serial>/communicating
//! modems/<serial>/lines/<1|2>/<rx-rate|tx-rate|online>
//! modems/<serial>/dsl/<rx-rate|tx-rate|online>
//! homeassistant/<sensor|binary_sensor>/modem_<serial>_<channel>/<config|state>
//! ```
//!
//! Where:
//! - `<serial>` - Modem serial number, or the sanitized modem address if it reports none
//! - `<channel>` - `l1rxrate`, `l2txrate`, `dslstatus`, `communicating`, ...

pub mod adapter;
pub mod config;
pub mod discovery;
pub mod poller;
pub mod presence;
pub mod source;
pub mod telemetry;
