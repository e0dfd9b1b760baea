//! Presence and metric messages for a known device.

use dslsight_common::{BusMessage, Component, DiscoveryTopics, Payload, QoS, TopicBuilder};

use crate::adapter::{LineMetrics, ModemSnapshot};
use crate::config::PublishConfig;

/// A physical line or the bonded aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    One,
    Two,
    Dsl,
}

impl Line {
    fn metrics(self, snapshot: &ModemSnapshot) -> &LineMetrics {
        match self {
            Line::One => &snapshot.line1,
            Line::Two => &snapshot.line2,
            Line::Dsl => &snapshot.dsl,
        }
    }

    fn path(self) -> &'static str {
        match self {
            Line::One => "lines/1",
            Line::Two => "lines/2",
            Line::Dsl => "dsl",
        }
    }

    fn channel_prefix(self) -> &'static str {
        match self {
            Line::One => "l1",
            Line::Two => "l2",
            Line::Dsl => "dsl",
        }
    }
}

/// One measured quantity of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    RxRate,
    TxRate,
    Online,
}

impl Measure {
    fn path(self) -> &'static str {
        match self {
            Measure::RxRate => "rx-rate",
            Measure::TxRate => "tx-rate",
            Measure::Online => "online",
        }
    }

    fn channel_suffix(self) -> &'static str {
        match self {
            Measure::RxRate => "rxrate",
            Measure::TxRate => "txrate",
            Measure::Online => "status",
        }
    }

    fn component(self) -> Component {
        match self {
            Measure::RxRate | Measure::TxRate => Component::Sensor,
            Measure::Online => Component::BinarySensor,
        }
    }
}

/// Metric channels in publish order.
pub const METRICS: [(Line, Measure); 9] = [
    (Line::One, Measure::RxRate),
    (Line::One, Measure::TxRate),
    (Line::One, Measure::Online),
    (Line::Two, Measure::RxRate),
    (Line::Two, Measure::TxRate),
    (Line::Two, Measure::Online),
    (Line::Dsl, Measure::RxRate),
    (Line::Dsl, Measure::TxRate),
    (Line::Dsl, Measure::Online),
];

/// Discovery channel id of a metric (`l1rxrate`, `dslstatus`, ...).
pub fn channel_id(line: Line, measure: Measure) -> String {
    format!("{}{}", line.channel_prefix(), measure.channel_suffix())
}

/// Builds the per-cycle messages for a device.
#[derive(Debug, Clone)]
pub struct TelemetryPublisher {
    plain: TopicBuilder,
    discovery: Option<DiscoveryTopics>,
    presence_qos: QoS,
    metrics_qos: QoS,
}

impl TelemetryPublisher {
    pub fn new(config: &PublishConfig) -> Self {
        Self {
            plain: TopicBuilder::new(config.plain_prefix.clone()),
            discovery: config
                .discovery
                .then(|| DiscoveryTopics::new(config.discovery_prefix.clone())),
            presence_qos: config.presence_qos,
            metrics_qos: config.metrics_qos,
        }
    }

    /// Presence messages for a serial in every enabled namespace.
    fn presence(&self, serial: &str, up: bool) -> Vec<BusMessage> {
        let mut messages = vec![
            BusMessage::retained(self.plain.presence(serial), Payload::Flag(up))
                .with_qos(self.presence_qos),
        ];

        if let Some(discovery) = &self.discovery {
            messages.push(
                BusMessage::retained(discovery.presence_state(serial), Payload::Switch(up))
                    .with_qos(self.presence_qos),
            );
        }

        messages
    }

    /// Messages retracting a device's presence.
    pub fn down_messages(&self, serial: &str) -> Vec<BusMessage> {
        self.presence(serial, false)
    }

    /// Last will for a device: the broker publishes its down messages for us.
    pub fn will_messages(&self, serial: &str) -> Vec<BusMessage> {
        self.down_messages(serial)
    }

    /// Presence followed by every metric of a snapshot.
    pub fn snapshot_messages(&self, snapshot: &ModemSnapshot) -> Vec<BusMessage> {
        let serial = snapshot.serial_number.as_str();
        let mut messages = self.presence(serial, true);

        for (line, measure) in METRICS {
            let metrics = line.metrics(snapshot);
            let topic = self
                .plain
                .build(serial, &format!("{}/{}", line.path(), measure.path()));

            let (plain, state) = match measure {
                Measure::RxRate => (
                    Payload::Rate(metrics.rx_rate_mbps),
                    Payload::Rate(metrics.rx_rate_mbps),
                ),
                Measure::TxRate => (
                    Payload::Rate(metrics.tx_rate_mbps),
                    Payload::Rate(metrics.tx_rate_mbps),
                ),
                Measure::Online => (Payload::Flag(metrics.online), Payload::Switch(metrics.online)),
            };

            messages.push(BusMessage::retained(topic, plain).with_qos(self.metrics_qos));

            if let Some(discovery) = &self.discovery {
                let topic =
                    discovery.state(measure.component(), serial, &channel_id(line, measure));
                messages.push(BusMessage::retained(topic, state).with_qos(self.metrics_qos));
            }
        }

        messages
    }
}
