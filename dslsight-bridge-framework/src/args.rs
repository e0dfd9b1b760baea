//! CLI argument parsing for bridges.

use std::path::PathBuf;

use clap::Args;

use crate::{LoggingConfig, MqttConfig};

/// Common CLI arguments for all bridges.
///
/// Flatten into a bridge's own `clap::Parser` struct. Every option can also
/// be supplied through the environment variable shown in `--help`.
#[derive(Args, Debug, Clone, Default)]
pub struct BridgeArgs {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long, env = "DSLSIGHT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// MQTT broker host.
    #[arg(long, env = "MQTT_HOST")]
    pub mqtt_host: Option<String>,

    /// MQTT broker port.
    #[arg(long, env = "MQTT_PORT")]
    pub mqtt_port: Option<u16>,

    /// MQTT username (anonymous when empty).
    #[arg(long, env = "MQTT_USER")]
    pub mqtt_user: Option<String>,

    /// MQTT password.
    #[arg(long, env = "MQTT_PASS", hide_env_values = true)]
    pub mqtt_pass: Option<String>,
}

impl BridgeArgs {
    /// Apply broker overrides on top of file configuration.
    pub fn apply_mqtt(&self, mqtt: &mut MqttConfig) {
        if let Some(host) = &self.mqtt_host {
            mqtt.host = host.clone();
        }
        if let Some(port) = self.mqtt_port {
            mqtt.port = port;
        }
        if let Some(user) = &self.mqtt_user {
            mqtt.username = Some(user.clone());
        }
        if let Some(pass) = &self.mqtt_pass {
            mqtt.password = Some(pass.clone());
        }
    }

    /// Resolve the logging configuration, honoring `--log-level`.
    pub fn logging(&self, configured: &LoggingConfig) -> LoggingConfig {
        match &self.log_level {
            Some(level) => LoggingConfig {
                level: level.clone(),
                ..configured.clone()
            },
            None => configured.clone(),
        }
    }
}
