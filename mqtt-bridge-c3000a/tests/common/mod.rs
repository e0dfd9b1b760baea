//! In-memory fakes for driving the poll loop end-to-end.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;

use dslsight_bridge_framework::{BridgeError, BusMessage, MessageBus, Result};
use mqtt_bridge_c3000a::adapter::C3000aAdapter;
use mqtt_bridge_c3000a::config::PublishConfig;
use mqtt_bridge_c3000a::poller::{PollLoop, PollSchedule, Sleeper};
use mqtt_bridge_c3000a::source::{StatusSource, TransportError};

/// Address the fake modem is configured at.
pub const MODEM_ADDRESS: &str = "10.0.0.5";

/// Everything the loop did to the bus, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    Publish(BusMessage),
    LastWill(Vec<BusMessage>),
}

/// Bus recording every call. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingBus {
    events: Arc<Mutex<Vec<BusEvent>>>,
    reject: Arc<Mutex<Option<String>>>,
}

impl RecordingBus {
    pub fn events(&self) -> Vec<BusEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Published messages only.
    pub fn published(&self) -> Vec<BusMessage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BusEvent::Publish(message) => Some(message),
                BusEvent::LastWill(_) => None,
            })
            .collect()
    }

    /// Registered will sets only.
    pub fn wills(&self) -> Vec<Vec<BusMessage>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BusEvent::LastWill(wills) => Some(wills),
                BusEvent::Publish(_) => None,
            })
            .collect()
    }

    /// Reject publishes to topics containing `fragment`.
    pub fn reject_topics_containing(&self, fragment: &str) {
        *self.reject.lock().unwrap() = Some(fragment.to_string());
    }
}

impl MessageBus for RecordingBus {
    async fn publish(&mut self, message: &BusMessage) -> Result<()> {
        if let Some(fragment) = self.reject.lock().unwrap().as_deref() {
            if message.topic.contains(fragment) {
                return Err(BridgeError::Publish {
                    topic: message.topic.clone(),
                    message: "rejected by test".to_string(),
                });
            }
        }

        self.events
            .lock()
            .unwrap()
            .push(BusEvent::Publish(message.clone()));
        Ok(())
    }

    async fn set_last_will(&mut self, wills: &[BusMessage]) -> Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(BusEvent::LastWill(wills.to_vec()));
        Ok(())
    }
}

/// Source replaying a fixed script, then failing forever.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    responses: VecDeque<std::result::Result<Vec<u8>, TransportError>>,
}

impl ScriptedSource {
    pub fn new(responses: Vec<std::result::Result<Vec<u8>, TransportError>>) -> Self {
        Self {
            responses: responses.into(),
        }
    }
}

impl StatusSource for ScriptedSource {
    async fn fetch(&mut self) -> std::result::Result<Vec<u8>, TransportError> {
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("script exhausted".to_string())))
    }
}

/// Sleeper that records delays and parks the loop after `limit` sleeps.
#[derive(Debug)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
    limit: usize,
    done: Option<oneshot::Sender<()>>,
}

impl RecordingSleeper {
    pub fn new(limit: usize) -> (Self, Arc<Mutex<Vec<Duration>>>, oneshot::Receiver<()>) {
        let delays = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = oneshot::channel();
        (
            Self {
                delays: delays.clone(),
                limit,
                done: Some(tx),
            },
            delays,
            rx,
        )
    }
}

impl Sleeper for RecordingSleeper {
    async fn sleep(&mut self, duration: Duration) {
        let recorded = {
            let mut delays = self.delays.lock().unwrap();
            delays.push(duration);
            delays.len()
        };

        if recorded >= self.limit {
            if let Some(done) = self.done.take() {
                let _ = done.send(());
            }
            std::future::pending::<()>().await;
        }
    }
}

/// Sleeper for loops driven through `run_cycle` only.
#[derive(Debug, Default)]
pub struct NoSleep;

impl Sleeper for NoSleep {
    async fn sleep(&mut self, _duration: Duration) {}
}

/// Synthetic C3000A status page.
#[derive(Debug, Clone)]
pub struct StatusPage {
    pub serial: String,
    pub mac: String,
    pub firmware: String,
    pub dsl_status: String,
    pub dsl_tx: String,
    pub dsl_rx: String,
    pub line1_status: String,
    pub line1_tx: String,
    pub line1_rx: String,
    pub line2_status: String,
    pub line2_tx: String,
    pub line2_rx: String,
}

impl Default for StatusPage {
    fn default() -> Self {
        Self {
            serial: "ABC123".to_string(),
            mac: "00-24-7B-11-22-33".to_string(),
            firmware: "31.30L.57".to_string(),
            dsl_status: "Up".to_string(),
            dsl_tx: "2000".to_string(),
            dsl_rx: "24690".to_string(),
            line1_status: "Up".to_string(),
            line1_tx: "1000".to_string(),
            line1_rx: "12345".to_string(),
            line2_status: "Up".to_string(),
            line2_tx: "1000".to_string(),
            line2_rx: "12345".to_string(),
        }
    }
}

impl StatusPage {
    pub fn with_serial(serial: &str) -> Self {
        Self {
            serial: serial.to_string(),
            ..Self::default()
        }
    }

    pub fn body(&self) -> Vec<u8> {
        let mut fields: Vec<String> = (0..30).map(|i| format!("x{}", i)).collect();

        fields[0] = format!("1:2:3:4:5:6:7:8:{}", self.mac);
        fields[1] = format!("0+{}+{}", self.dsl_tx, self.dsl_rx);
        fields[2] = self.serial.clone();
        fields[3] = self.firmware.clone();
        fields[5] = format!("VDSL2+Bonded+{}", self.dsl_status);
        fields[24] = format!("a+b+c+d+e+f+{}", self.line1_status);
        fields[25] = self.line1_tx.clone();
        fields[26] = format!("{}+{}", self.line1_rx, self.line2_status);
        fields[27] = self.line2_tx.clone();
        fields[28] = format!("{}+0", self.line2_rx);

        fields.join("|").into_bytes()
    }
}

/// A successful fetch of `page`.
pub fn ok(page: StatusPage) -> std::result::Result<Vec<u8>, TransportError> {
    Ok(page.body())
}

/// A failed fetch.
pub fn fetch_failed() -> std::result::Result<Vec<u8>, TransportError> {
    Err(TransportError::Timeout)
}

pub fn publish_config(discovery: bool) -> PublishConfig {
    PublishConfig {
        discovery,
        ..PublishConfig::default()
    }
}

/// Loop over a scripted source, returning it with a handle on its bus.
pub fn scripted_loop(
    responses: Vec<std::result::Result<Vec<u8>, TransportError>>,
    discovery: bool,
) -> (
    PollLoop<ScriptedSource, C3000aAdapter, RecordingBus, NoSleep>,
    RecordingBus,
) {
    let bus = RecordingBus::default();
    let poller = PollLoop::new(
        ScriptedSource::new(responses),
        C3000aAdapter::new(MODEM_ADDRESS),
        bus.clone(),
        NoSleep,
        PollSchedule::new(Duration::from_secs(60)),
        &publish_config(discovery),
    );
    (poller, bus)
}

/// Topic and rendered payload of each message.
pub fn rendered(messages: &[BusMessage]) -> Vec<(String, String)> {
    messages
        .iter()
        .map(|m| (m.topic.clone(), m.payload.to_string()))
        .collect()
}
