//! MQTT bus with last-will management.
//!
//! MQTT carries exactly one will per connection, registered at CONNECT time.
//! [`MqttBus`] therefore keeps one connection per will message: the first
//! connection carries every publish, each further will gets an idle sentinel
//! connection. Changing the will set closes the old connections cleanly
//! (which makes the broker discard their wills) and opens new ones.
//!
//! Dropping the bus tears the sockets down without a DISCONNECT packet, so
//! the broker delivers the registered wills.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnAck, ConnectReturnCode, Event, EventLoop, LastWill, MqttOptions, Outgoing,
    Packet,
};
use tokio::task::JoinHandle;

use dslsight_common::{BusMessage, MqttConfig, QoS};

use crate::error::{BridgeError, Result};
use crate::publisher::MessageBus;

/// Capacity of the request channel between a client and its event loop.
///
/// Requests are queued without waiting; once the channel is full (broker
/// unreachable) further publishes fail immediately.
const REQUEST_CAPACITY: usize = 64;

/// Delay before the event loop retries after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long a clean disconnect may take before the connection is dropped.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

fn to_mqtt_qos(qos: QoS) -> rumqttc::QoS {
    match qos {
        QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
        QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
        QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
    }
}

/// Build connection options for one client.
fn build_options(
    config: &MqttConfig,
    client_id: &str,
    will: Option<&BusMessage>,
) -> Result<MqttOptions> {
    if client_id.is_empty() || client_id.starts_with(' ') {
        return Err(BridgeError::MqttConnection(
            "client id cannot be empty".to_string(),
        ));
    }

    let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
    options.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

    if let Some((user, pass)) = config.credentials() {
        options.set_credentials(user, pass);
    }

    if let Some(will) = will {
        let payload = will
            .encode_payload()
            .map_err(|e| BridgeError::last_will(e.to_string()))?;
        options.set_last_will(LastWill::new(
            will.topic.clone(),
            payload,
            to_mqtt_qos(will.qos),
            will.retain,
        ));
    }

    Ok(options)
}

/// One broker connection and the task driving its event loop.
#[derive(Debug)]
struct Connection {
    client_id: String,
    client: AsyncClient,
    closing: Arc<AtomicBool>,
    driver: JoinHandle<()>,
}

impl Connection {
    fn open(config: &MqttConfig, client_id: String, will: Option<&BusMessage>) -> Result<Self> {
        let options = build_options(config, &client_id, will)?;
        let (client, eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        let closing = Arc::new(AtomicBool::new(false));

        let driver = tokio::spawn(drive(client_id.clone(), eventloop, closing.clone()));

        tracing::debug!(
            client = %client_id,
            will = will.map(|w| w.topic.as_str()).unwrap_or("none"),
            "MQTT connection opened"
        );

        Ok(Self {
            client_id,
            client,
            closing,
            driver,
        })
    }

    /// Disconnect cleanly, flushing requests queued before the call.
    ///
    /// A connection whose request channel is full is dropped instead.
    async fn close(mut self) {
        self.closing.store(true, Ordering::SeqCst);

        if let Err(e) = self.client.try_disconnect() {
            tracing::warn!(client = %self.client_id, error = %e, "Failed to request disconnect");
            return;
        }

        if tokio::time::timeout(CLOSE_TIMEOUT, &mut self.driver)
            .await
            .is_err()
        {
            tracing::warn!(client = %self.client_id, "Timed out waiting for clean disconnect");
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

fn accepted(ack: &ConnAck) -> bool {
    ack.code == ConnectReturnCode::Success
}

/// Drive a client's event loop until it has sent DISCONNECT.
async fn drive(client_id: String, mut eventloop: EventLoop, closing: Arc<AtomicBool>) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if accepted(&ack) {
                    tracing::info!(client = %client_id, "Connected to MQTT broker");
                } else {
                    tracing::warn!(client = %client_id, code = ?ack.code, "MQTT broker refused connection");
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!(client = %client_id, "MQTT connection closed");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                if closing.load(Ordering::SeqCst) {
                    break;
                }
                tracing::warn!(client = %client_id, error = %e, "MQTT connection error, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// MQTT implementation of [`MessageBus`].
#[derive(Debug)]
pub struct MqttBus {
    config: MqttConfig,
    primary: Connection,
    sentinels: Vec<Connection>,
    wills: Vec<BusMessage>,
    generation: u32,
}

impl MqttBus {
    /// Create a bus connected to the configured broker, with no last will.
    ///
    /// The connection is established in the background; publishes issued
    /// before the broker answers are queued.
    pub fn connect(config: &MqttConfig) -> Result<Self> {
        let primary = Connection::open(config, Self::client_id(config, 0, 0), None)?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            client = %primary.client_id,
            authenticated = config.credentials().is_some(),
            "Connecting to MQTT broker"
        );

        Ok(Self {
            config: config.clone(),
            primary,
            sentinels: Vec::new(),
            wills: Vec::new(),
            generation: 0,
        })
    }

    /// Client id for a connection, unique per will generation so a new
    /// connection never takes over a session that is still closing.
    fn client_id(config: &MqttConfig, generation: u32, index: usize) -> String {
        match (generation, index) {
            (0, 0) => config.client_id.clone(),
            (g, 0) => format!("{}-{}", config.client_id, g),
            (g, i) => format!("{}-{}-will{}", config.client_id, g, i),
        }
    }
}

impl MessageBus for MqttBus {
    async fn publish(&mut self, message: &BusMessage) -> Result<()> {
        let payload = message
            .encode_payload()
            .map_err(|e| BridgeError::Serialization(e.to_string()))?;

        self.primary
            .client
            .try_publish(
                message.topic.clone(),
                to_mqtt_qos(message.qos),
                message.retain,
                payload,
            )
            .map_err(|e| BridgeError::Publish {
                topic: message.topic.clone(),
                message: e.to_string(),
            })
    }

    async fn set_last_will(&mut self, wills: &[BusMessage]) -> Result<()> {
        if self.wills == wills {
            return Ok(());
        }

        let generation = self.generation + 1;

        let old_primary = std::mem::replace(
            &mut self.primary,
            Connection::open(
                &self.config,
                Self::client_id(&self.config, generation, 0),
                wills.first(),
            )?,
        );
        let old_sentinels = std::mem::take(&mut self.sentinels);

        // Publishes queued on the old primary must reach the broker before
        // anything is published on the new one.
        old_primary.close().await;
        for sentinel in old_sentinels {
            sentinel.close().await;
        }

        let mut sentinels = Vec::with_capacity(wills.len().saturating_sub(1));
        for (index, will) in wills.iter().enumerate().skip(1) {
            sentinels.push(Connection::open(
                &self.config,
                Self::client_id(&self.config, generation, index),
                Some(will),
            )?);
        }

        self.sentinels = sentinels;
        self.wills = wills.to_vec();
        self.generation = generation;

        tracing::info!(
            wills = ?self.wills.iter().map(|w| w.topic.as_str()).collect::<Vec<_>>(),
            generation,
            "Last will registered"
        );

        Ok(())
    }
}
