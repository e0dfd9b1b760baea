//! Bus message model and payload encoding.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum QoS {
    /// QoS 0: fire and forget.
    #[default]
    AtMostOnce,
    /// QoS 1: acknowledged delivery.
    AtLeastOnce,
    /// QoS 2: assured single delivery.
    ExactlyOnce,
}

impl TryFrom<u8> for QoS {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(Error::QoS(other)),
        }
    }
}

impl From<QoS> for u8 {
    fn from(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => 0,
            QoS::AtLeastOnce => 1,
            QoS::ExactlyOnce => 2,
        }
    }
}

/// Typed message payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Boolean rendered as `True`/`False`.
    Flag(bool),

    /// Boolean rendered as `ON`/`OFF`.
    Switch(bool),

    /// Rate in Mbps, always rendered with a fractional part.
    Rate(f64),

    /// Structured document rendered as compact JSON.
    Json(serde_json::Value),
}

impl Payload {
    /// Encode the payload to the bytes put on the wire.
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Json(value) => serde_json::to_vec(value).map_err(Error::from),
            other => Ok(other.to_string().into_bytes()),
        }
    }
}

impl std::fmt::Display for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Flag(true) => write!(f, "True"),
            Payload::Flag(false) => write!(f, "False"),
            Payload::Switch(true) => write!(f, "ON"),
            Payload::Switch(false) => write!(f, "OFF"),
            // Debug keeps the trailing ".0" on whole numbers.
            Payload::Rate(rate) => write!(f, "{:?}", rate),
            Payload::Json(value) => write!(f, "{}", value),
        }
    }
}

/// A message destined for the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    /// Full topic name.
    pub topic: String,

    /// Message body.
    pub payload: Payload,

    /// Delivery guarantee.
    pub qos: QoS,

    /// Whether the broker keeps the message for late subscribers.
    pub retain: bool,
}

impl BusMessage {
    /// Create a retained QoS 0 message.
    pub fn retained(topic: impl Into<String>, payload: Payload) -> Self {
        Self {
            topic: topic.into(),
            payload,
            qos: QoS::AtMostOnce,
            retain: true,
        }
    }

    /// Set the delivery guarantee.
    pub fn with_qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    /// Encode the payload for the wire.
    pub fn encode_payload(&self) -> Result<Vec<u8>> {
        self.payload.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_payloads() {
        assert_eq!(Payload::Flag(true).to_string(), "True");
        assert_eq!(Payload::Flag(false).to_string(), "False");
        assert_eq!(Payload::Switch(true).to_string(), "ON");
        assert_eq!(Payload::Switch(false).to_string(), "OFF");
    }

    #[test]
    fn test_rate_payload_keeps_fraction() {
        assert_eq!(Payload::Rate(12.345).to_string(), "12.345");
        assert_eq!(Payload::Rate(12.0).to_string(), "12.0");
        assert_eq!(Payload::Rate(0.0).to_string(), "0.0");
        assert_eq!(Payload::Rate(12345.0 / 1000.0).encode().unwrap(), b"12.345");
    }

    #[test]
    fn test_json_payload_is_compact() {
        let payload = Payload::Json(serde_json::json!({ "name": "Modem", "unit": "Mbps" }));
        let bytes = payload.encode().unwrap();
        assert_eq!(bytes, br#"{"name":"Modem","unit":"Mbps"}"#);
    }

    #[test]
    fn test_qos_from_level() {
        assert_eq!(QoS::try_from(0).unwrap(), QoS::AtMostOnce);
        assert_eq!(QoS::try_from(1).unwrap(), QoS::AtLeastOnce);
        assert_eq!(QoS::try_from(2).unwrap(), QoS::ExactlyOnce);
        assert!(matches!(QoS::try_from(3), Err(Error::QoS(3))));
        assert_eq!(u8::from(QoS::AtLeastOnce), 1);
    }

    #[test]
    fn test_qos_deserializes_from_integer() {
        let qos: QoS = serde_json::from_str("1").unwrap();
        assert_eq!(qos, QoS::AtLeastOnce);
        assert!(serde_json::from_str::<QoS>("7").is_err());
    }

    #[test]
    fn test_retained_message() {
        let msg = BusMessage::retained("modems/ABC123/communicating", Payload::Flag(true))
            .with_qos(QoS::AtLeastOnce);

        assert!(msg.retain);
        assert_eq!(msg.qos, QoS::AtLeastOnce);
        assert_eq!(msg.encode_payload().unwrap(), b"True");
    }
}
