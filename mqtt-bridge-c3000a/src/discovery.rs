//! Home Assistant auto-discovery configs.
//!
//! Published once per newly seen identity. Every gated entity reports
//! unavailable while the modem's presence state is `OFF`.

use serde::Serialize;

use dslsight_common::{BusMessage, Component, DiscoveryTopics, PRESENCE_CHANNEL, Payload, Result};

use crate::adapter::ModemSnapshot;

const MANUFACTURER: &str = "Actiontec";
const MODEL: &str = "C3000A";
const RATE_UNIT: &str = "Mbps";
const RATE_ICON: &str = "mdi:speedometer";
const STATUS_ICON: &str = "mdi:lan";

/// One discoverable entity of the modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryChannel {
    pub id: &'static str,
    pub component: Component,
    pub display_name: &'static str,
    pub icon: &'static str,
    /// Only available while the modem is communicating.
    pub gated: bool,
}

const fn rate(id: &'static str, display_name: &'static str) -> DiscoveryChannel {
    DiscoveryChannel {
        id,
        component: Component::Sensor,
        display_name,
        icon: RATE_ICON,
        gated: true,
    }
}

const fn status(id: &'static str, display_name: &'static str, gated: bool) -> DiscoveryChannel {
    DiscoveryChannel {
        id,
        component: Component::BinarySensor,
        display_name,
        icon: STATUS_ICON,
        gated,
    }
}

/// Every entity, in publish order.
pub const CHANNELS: [DiscoveryChannel; 10] = [
    rate("l1rxrate", "Line 1 RX Rate"),
    rate("l2rxrate", "Line 2 RX Rate"),
    rate("l1txrate", "Line 1 TX Rate"),
    rate("l2txrate", "Line 2 TX Rate"),
    rate("dslrxrate", "DSL RX Rate"),
    rate("dsltxrate", "DSL TX Rate"),
    status(PRESENCE_CHANNEL, "Communicating", false),
    status("dslstatus", "DSL Online", true),
    status("l1status", "Line 1 Online", true),
    status("l2status", "Line 2 Online", true),
];

#[derive(Debug, Serialize)]
struct EntityConfig<'a> {
    name: String,
    unique_id: String,
    state_topic: String,
    icon: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability: Option<Availability>,
    device: DeviceInfo<'a>,
}

#[derive(Debug, Serialize)]
struct Availability {
    topic: String,
    payload_available: &'static str,
    payload_not_available: &'static str,
}

#[derive(Debug, Serialize)]
struct DeviceInfo<'a> {
    connections: [[&'a str; 2]; 1],
    identifiers: [&'a str; 1],
    manufacturer: &'static str,
    model: &'static str,
    name: String,
    sw_version: &'a str,
}

/// Builds discovery config messages.
#[derive(Debug, Clone)]
pub struct DiscoveryPublisher {
    topics: DiscoveryTopics,
}

impl DiscoveryPublisher {
    pub fn new(topics: DiscoveryTopics) -> Self {
        Self { topics }
    }

    /// Config messages for every channel of a device.
    pub fn config_messages(&self, snapshot: &ModemSnapshot) -> Result<Vec<BusMessage>> {
        CHANNELS
            .iter()
            .map(|channel| self.config_message(channel, snapshot))
            .collect()
    }

    fn config_message(
        &self,
        channel: &DiscoveryChannel,
        snapshot: &ModemSnapshot,
    ) -> Result<BusMessage> {
        let serial = snapshot.serial_number.as_str();

        let config = EntityConfig {
            name: format!("Modem {} {}", serial, channel.display_name),
            unique_id: self.topics.object_id(serial, channel.id),
            state_topic: self.topics.state(channel.component, serial, channel.id),
            icon: channel.icon,
            unit_of_measurement: (channel.component == Component::Sensor).then_some(RATE_UNIT),
            availability: channel.gated.then(|| Availability {
                topic: self.topics.presence_state(serial),
                payload_available: "ON",
                payload_not_available: "OFF",
            }),
            device: DeviceInfo {
                connections: [["mac", snapshot.mac_address.as_str()]],
                identifiers: [serial],
                manufacturer: MANUFACTURER,
                model: MODEL,
                name: format!("DSL Modem {}", serial),
                sw_version: snapshot.firmware_version.as_str(),
            },
        };

        Ok(BusMessage::retained(
            self.topics.config(channel.component, serial, channel.id),
            Payload::Json(serde_json::to_value(&config)?),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::LineMetrics;
    use dslsight_common::QoS;
    use serde_json::json;

    fn snapshot() -> ModemSnapshot {
        let line = LineMetrics::from_raw("Up", 12345, 1000);
        ModemSnapshot {
            serial_number: "ABC123".to_string(),
            mac_address: "00:24:7B:11:22:33".to_string(),
            firmware_version: "31.30L.57".to_string(),
            dsl: line.clone(),
            line1: line.clone(),
            line2: line,
        }
    }

    fn json_of(message: &BusMessage) -> &serde_json::Value {
        match &message.payload {
            Payload::Json(value) => value,
            other => panic!("expected JSON payload, got {:?}", other),
        }
    }

    #[test]
    fn test_one_config_per_channel() {
        let messages = DiscoveryPublisher::new(DiscoveryTopics::default())
            .config_messages(&snapshot())
            .unwrap();

        let topics: Vec<_> = messages.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "homeassistant/sensor/modem_ABC123_l1rxrate/config",
                "homeassistant/sensor/modem_ABC123_l2rxrate/config",
                "homeassistant/sensor/modem_ABC123_l1txrate/config",
                "homeassistant/sensor/modem_ABC123_l2txrate/config",
                "homeassistant/sensor/modem_ABC123_dslrxrate/config",
                "homeassistant/sensor/modem_ABC123_dsltxrate/config",
                "homeassistant/binary_sensor/modem_ABC123_communicating/config",
                "homeassistant/binary_sensor/modem_ABC123_dslstatus/config",
                "homeassistant/binary_sensor/modem_ABC123_l1status/config",
                "homeassistant/binary_sensor/modem_ABC123_l2status/config",
            ]
        );
        assert!(messages.iter().all(|m| m.retain && m.qos == QoS::AtMostOnce));
    }

    #[test]
    fn test_sensor_config_payload() {
        let messages = DiscoveryPublisher::new(DiscoveryTopics::default())
            .config_messages(&snapshot())
            .unwrap();

        assert_eq!(
            json_of(&messages[0]),
            &json!({
                "name": "Modem ABC123 Line 1 RX Rate",
                "unique_id": "modem_ABC123_l1rxrate",
                "state_topic": "homeassistant/sensor/modem_ABC123_l1rxrate/state",
                "icon": "mdi:speedometer",
                "unit_of_measurement": "Mbps",
                "availability": {
                    "topic": "homeassistant/binary_sensor/modem_ABC123_communicating/state",
                    "payload_available": "ON",
                    "payload_not_available": "OFF",
                },
                "device": {
                    "connections": [["mac", "00:24:7B:11:22:33"]],
                    "identifiers": ["ABC123"],
                    "manufacturer": "Actiontec",
                    "model": "C3000A",
                    "name": "DSL Modem ABC123",
                    "sw_version": "31.30L.57",
                },
            })
        );
    }

    #[test]
    fn test_presence_entity_is_not_gated() {
        let messages = DiscoveryPublisher::new(DiscoveryTopics::default())
            .config_messages(&snapshot())
            .unwrap();

        let presence = json_of(&messages[6]);
        assert_eq!(presence["name"], "Modem ABC123 Communicating");
        assert_eq!(presence["icon"], "mdi:lan");
        assert!(presence.get("availability").is_none());
        assert!(presence.get("unit_of_measurement").is_none());

        let l2status = json_of(&messages[9]);
        assert!(l2status.get("availability").is_some());
        assert!(l2status.get("unit_of_measurement").is_none());
    }

    #[test]
    fn test_custom_prefix() {
        let messages = DiscoveryPublisher::new(DiscoveryTopics::new("ha"))
            .config_messages(&snapshot())
            .unwrap();

        assert_eq!(messages[0].topic, "ha/sensor/modem_ABC123_l1rxrate/config");
        assert_eq!(
            json_of(&messages[0])["availability"]["topic"],
            "ha/binary_sensor/modem_ABC123_communicating/state"
        );
    }
}
