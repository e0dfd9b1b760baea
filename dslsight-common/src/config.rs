use serde::{Deserialize, Serialize};

/// Common MQTT broker connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Broker host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Broker TCP port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for broker authentication (anonymous when unset or empty).
    #[serde(default)]
    pub username: Option<String>,

    /// Password for broker authentication.
    #[serde(default)]
    pub password: Option<String>,

    /// Client identifier presented to the broker.
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// Keep-alive interval in seconds.
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    1883
}

fn default_client_id() -> String {
    "dslsight".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: None,
            password: None,
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

impl MqttConfig {
    /// Username/password pair, if authentication is configured.
    ///
    /// An empty username means anonymous access; a missing password is sent as empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match self.username.as_deref() {
            Some(user) if !user.is_empty() => {
                Some((user, self.password.as_deref().unwrap_or_default()))
            }
            _ => None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Common logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mqtt_config() {
        let json5 = r#"
        {
            host: "broker.lan",
            port: 8883,
            username: "bridge",
            password: "secret",
        }
        "#;

        let config: MqttConfig = json5::from_str(json5).unwrap();

        assert_eq!(config.host, "broker.lan");
        assert_eq!(config.port, 8883);
        assert_eq!(config.credentials(), Some(("bridge", "secret")));
    }

    #[test]
    fn test_default_config() {
        let mqtt: MqttConfig = json5::from_str("{}").unwrap();
        let logging: LoggingConfig = json5::from_str("{}").unwrap();

        assert_eq!(mqtt, MqttConfig::default());
        assert_eq!(mqtt.host, "localhost");
        assert_eq!(mqtt.port, 1883);
        assert_eq!(mqtt.keep_alive_secs, 60);
        assert!(mqtt.credentials().is_none());
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Text);
    }

    #[test]
    fn test_empty_username_is_anonymous() {
        let config = MqttConfig {
            username: Some(String::new()),
            password: Some("ignored".to_string()),
            ..MqttConfig::default()
        };
        assert!(config.credentials().is_none());

        let config = MqttConfig {
            username: Some("bridge".to_string()),
            password: None,
            ..MqttConfig::default()
        };
        assert_eq!(config.credentials(), Some(("bridge", "")));
    }

    #[test]
    fn test_json_logging_format() {
        let config: LoggingConfig =
            json5::from_str(r#"{ level: "debug", format: "json" }"#).unwrap();

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
    }
}
