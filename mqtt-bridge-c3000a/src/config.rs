//! Configuration for the C3000A bridge.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser};
use serde::{Deserialize, Serialize};

use dslsight_bridge_framework::{BridgeArgs, BridgeConfig, BridgeError, QoS};
use dslsight_common::{DISCOVERY_PREFIX, LoggingConfig, MqttConfig, PLAIN_PREFIX};

/// Complete bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct C3000aBridgeConfig {
    /// Modem access settings
    #[serde(default)]
    pub modem: ModemConfig,

    /// MQTT broker settings
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// What gets published and how
    #[serde(default)]
    pub publish: PublishConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Modem access settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemConfig {
    /// IP address or host name of the modem's web UI
    #[serde(default)]
    pub address: String,

    /// Admin user name
    #[serde(default = "default_username")]
    pub username: String,

    /// Admin password (no login step when empty)
    #[serde(default)]
    pub password: String,

    /// HTTP timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_username() -> String {
    "admin".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    60
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            username: default_username(),
            password: String::new(),
            timeout_secs: default_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl ModemConfig {
    /// HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Time between polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Publishing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Prefix of the plain namespace (default: "modems")
    #[serde(default = "default_plain_prefix")]
    pub plain_prefix: String,

    /// Prefix of the Home Assistant namespace (default: "homeassistant")
    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,

    /// Publish Home Assistant discovery configs and states
    #[serde(default = "default_true")]
    pub discovery: bool,

    /// QoS of presence messages and last wills
    #[serde(default = "default_presence_qos")]
    pub presence_qos: QoS,

    /// QoS of metric messages
    #[serde(default)]
    pub metrics_qos: QoS,
}

fn default_plain_prefix() -> String {
    PLAIN_PREFIX.to_string()
}

fn default_discovery_prefix() -> String {
    DISCOVERY_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_presence_qos() -> QoS {
    QoS::AtLeastOnce
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            plain_prefix: default_plain_prefix(),
            discovery_prefix: default_discovery_prefix(),
            discovery: true,
            presence_qos: default_presence_qos(),
            metrics_qos: QoS::default(),
        }
    }
}

impl BridgeConfig for C3000aBridgeConfig {
    fn mqtt(&self) -> &MqttConfig {
        &self.mqtt
    }

    fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    fn validate(&self) -> dslsight_bridge_framework::Result<()> {
        self.validate_mqtt()?;

        if self.modem.address.trim().is_empty() {
            return Err(BridgeError::validation(
                "Modem IP address must be provided",
            ));
        }

        if self.modem.timeout_secs == 0 {
            return Err(BridgeError::validation(
                "Modem timeout must be at least 1 second",
            ));
        }

        if self.modem.poll_interval_secs == 0 {
            return Err(BridgeError::validation(
                "Poll interval must be at least 1 second",
            ));
        }

        if self.publish.plain_prefix.is_empty() {
            return Err(BridgeError::validation("plain_prefix cannot be empty"));
        }

        if self.publish.discovery && self.publish.discovery_prefix.is_empty() {
            return Err(BridgeError::validation(
                "discovery_prefix cannot be empty when discovery is enabled",
            ));
        }

        Ok(())
    }
}

/// MQTT bridge for the Actiontec C3000A DSL modem.
#[derive(Parser, Debug)]
#[command(name = "mqtt-bridge-c3000a")]
#[command(about = "Polls an Actiontec C3000A modem and publishes its status to MQTT")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub bridge: BridgeArgs,

    #[command(flatten)]
    pub modem: ModemArgs,
}

/// Modem-specific CLI arguments.
#[derive(Args, Debug, Clone, Default)]
pub struct ModemArgs {
    /// Modem IP address.
    #[arg(long, env = "MODEM_IP")]
    pub modem_ip: Option<String>,

    /// Modem admin user.
    #[arg(long, env = "MODEM_USER")]
    pub modem_user: Option<String>,

    /// Modem admin password.
    #[arg(long, env = "MODEM_PASS", hide_env_values = true)]
    pub modem_pass: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, env = "TIMEOUT")]
    pub timeout: Option<u64>,

    /// Seconds between polls.
    #[arg(long, env = "FETCH_INTERVAL")]
    pub fetch_interval: Option<u64>,

    /// Home Assistant discovery ("enabled" turns it on, anything else off).
    #[arg(long, env = "HA_MODE")]
    pub ha_mode: Option<String>,
}

impl ModemArgs {
    /// Apply overrides on top of file configuration.
    pub fn apply(&self, config: &mut C3000aBridgeConfig) {
        if let Some(ip) = &self.modem_ip {
            config.modem.address = ip.clone();
        }
        if let Some(user) = &self.modem_user {
            config.modem.username = user.clone();
        }
        if let Some(pass) = &self.modem_pass {
            config.modem.password = pass.clone();
        }
        if let Some(timeout) = self.timeout {
            config.modem.timeout_secs = timeout;
        }
        if let Some(interval) = self.fetch_interval {
            config.modem.poll_interval_secs = interval;
        }
        if let Some(mode) = &self.ha_mode {
            config.publish.discovery = mode == "enabled";
        }
    }
}

impl Cli {
    /// Path of the configuration file, if any.
    pub fn config_path(&self) -> Option<&PathBuf> {
        self.bridge.config.as_ref()
    }

    /// Load the configuration file (if any), apply CLI/environment
    /// overrides, then validate.
    pub fn resolve(&self) -> dslsight_bridge_framework::Result<C3000aBridgeConfig> {
        let mut config = match self.config_path() {
            Some(path) => C3000aBridgeConfig::load_unvalidated(path)?,
            None => C3000aBridgeConfig::default(),
        };

        self.bridge.apply_mqtt(&mut config.mqtt);
        self.modem.apply(&mut config);

        config.validate()?;
        Ok(config)
    }
}
