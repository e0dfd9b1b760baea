//! Modem polling loop.
//!
//! One cycle fetches the status page, parses it, folds the outcome into the
//! [`PresenceTracker`] and publishes whatever the resulting transition
//! requires. Cycles never overlap.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use dslsight_bridge_framework::{MessageBus, PublishStats};
use dslsight_common::DiscoveryTopics;

use crate::adapter::{ModemSnapshot, StatusAdapter};
use crate::config::PublishConfig;
use crate::discovery::DiscoveryPublisher;
use crate::presence::{CycleError, PresenceTracker, Transition, TransitionKind};
use crate::source::StatusSource;
use crate::telemetry::TelemetryPublisher;

/// Suspends the loop between cycles.
pub trait Sleeper: Send {
    fn sleep(&mut self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// When each cycle starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    interval: Duration,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Delay before cycle number `cycle` (0-based). The first cycle starts
    /// immediately.
    pub fn delay_before(&self, cycle: u64) -> Option<Duration> {
        (cycle > 0).then_some(self.interval)
    }
}

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    #[default]
    Idle,
    Fetching,
    ParseSuccess,
    ParseFailure,
    FetchFailure,
}

/// Summary of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 0-based cycle number.
    pub cycle: u64,
    pub transition: TransitionKind,
    /// Messages accepted by the bus.
    pub published: usize,
    /// Messages the bus rejected.
    pub failed: usize,
}

/// Polls one modem and publishes its status.
pub struct PollLoop<S, A, B, Z> {
    source: S,
    adapter: A,
    bus: B,
    sleeper: Z,
    schedule: PollSchedule,
    tracker: PresenceTracker,
    telemetry: TelemetryPublisher,
    discovery: Option<DiscoveryPublisher>,
    state: PollState,
    cycle: u64,
}

impl<S, A, B, Z> PollLoop<S, A, B, Z>
where
    S: StatusSource,
    A: StatusAdapter,
    B: MessageBus,
    Z: Sleeper,
{
    pub fn new(
        source: S,
        adapter: A,
        bus: B,
        sleeper: Z,
        schedule: PollSchedule,
        publish: &PublishConfig,
    ) -> Self {
        let discovery = publish.discovery.then(|| {
            DiscoveryPublisher::new(DiscoveryTopics::new(publish.discovery_prefix.clone()))
        });

        Self {
            source,
            adapter,
            bus,
            sleeper,
            schedule,
            tracker: PresenceTracker::new(),
            telemetry: TelemetryPublisher::new(publish),
            discovery,
            state: PollState::Idle,
            cycle: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn tracker(&self) -> &PresenceTracker {
        &self.tracker
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Poll forever.
    pub async fn run(mut self) {
        info!(
            interval_secs = self.schedule.interval().as_secs(),
            discovery = self.discovery.is_some(),
            "Starting modem poller"
        );

        loop {
            if let Some(delay) = self.schedule.delay_before(self.cycle) {
                debug!(seconds = delay.as_secs(), "Sleeping");
                self.sleeper.sleep(delay).await;
            }

            self.run_cycle().await;
        }
    }

    /// Run a single cycle without sleeping.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let cycle = self.cycle;
        self.cycle += 1;

        let result = self.fetch().await;
        let was_communicating = self.tracker.is_communicating();
        let transition = self.tracker.observe(result);
        let kind = transition.kind();

        let stats = self.publish(transition, was_communicating).await;
        self.set_state(PollState::Idle);

        if stats.failed > 0 {
            warn!(
                cycle,
                published = stats.success,
                failed = stats.failed,
                "Some messages were not published"
            );
        }

        CycleReport {
            cycle,
            transition: kind,
            published: stats.success,
            failed: stats.failed,
        }
    }

    fn set_state(&mut self, state: PollState) {
        debug!(from = ?self.state, to = ?state, "Poll state");
        self.state = state;
    }

    async fn fetch(&mut self) -> Result<ModemSnapshot, CycleError> {
        self.set_state(PollState::Fetching);

        let body = match self.source.fetch().await {
            Ok(body) => body,
            Err(e) => {
                self.set_state(PollState::FetchFailure);
                warn!(error = %e, "Device is not available");
                return Err(e.into());
            }
        };

        match self.adapter.parse(&body) {
            Ok(snapshot) => {
                self.set_state(PollState::ParseSuccess);
                Ok(snapshot)
            }
            Err(e) => {
                self.set_state(PollState::ParseFailure);
                warn!(error = %e, bytes = body.len(), "Failed to parse modem status");
                Err(e.into())
            }
        }
    }

    async fn publish(&mut self, transition: Transition, was_communicating: bool) -> PublishStats {
        match transition {
            Transition::NoOp => {
                debug!("No modem seen yet, nothing to report");
                PublishStats::default()
            }
            Transition::WentDown(serial) => {
                let failures = self
                    .tracker
                    .current()
                    .map_or(0, |identity| identity.consecutive_failures);
                info!(serial = %serial, failures, "Modem not communicating");
                self.publish_down(&serial).await
            }
            Transition::FirstSeen(snapshot) => {
                info!(
                    serial = %snapshot.serial_number,
                    mac = %snapshot.mac_address,
                    firmware = %snapshot.firmware_version,
                    "Found modem"
                );
                self.announce(&snapshot).await
            }
            Transition::IdentityChanged {
                old_serial,
                snapshot,
            } => {
                info!(
                    old = %old_serial,
                    new = %snapshot.serial_number,
                    "Modem serial number changed"
                );
                let mut stats = self.publish_down(&old_serial).await;
                stats += self.announce(&snapshot).await;
                stats
            }
            Transition::Updated(snapshot) => {
                if !was_communicating {
                    info!(serial = %snapshot.serial_number, "Modem communicating again");
                }
                self.publish_snapshot(&snapshot).await
            }
        }
    }

    async fn publish_down(&mut self, serial: &str) -> PublishStats {
        let messages = self.telemetry.down_messages(serial);
        self.bus.publish_batch(&messages).await
    }

    /// Will, discovery and telemetry for a newly learned identity.
    async fn announce(&mut self, snapshot: &ModemSnapshot) -> PublishStats {
        let serial = snapshot.serial_number.as_str();

        let wills = self.telemetry.will_messages(serial);
        if let Err(e) = self.bus.set_last_will(&wills).await {
            warn!(serial = %serial, error = %e, "Failed to register last will");
        }

        let mut stats = PublishStats::default();

        if let Some(discovery) = &self.discovery {
            match discovery.config_messages(snapshot) {
                Ok(messages) => {
                    info!(serial = %serial, entities = messages.len(), "Publishing discovery configs");
                    stats += self.bus.publish_batch(&messages).await;
                }
                Err(e) => warn!(serial = %serial, error = %e, "Failed to build discovery configs"),
            }
        }

        stats += self.publish_snapshot(snapshot).await;
        stats
    }

    async fn publish_snapshot(&mut self, snapshot: &ModemSnapshot) -> PublishStats {
        let messages = self.telemetry.snapshot_messages(snapshot);
        let stats = self.bus.publish_batch(&messages).await;

        info!(
            serial = %snapshot.serial_number,
            dsl = %snapshot.dsl.status,
            line1 = %snapshot.line1.status,
            line2 = %snapshot.line2.status,
            "Polled modem"
        );
        for (name, line) in [
            ("Line 1", &snapshot.line1),
            ("Line 2", &snapshot.line2),
            ("DSL", &snapshot.dsl),
        ] {
            debug!(
                "{} is {} (Speed {:?}/{:?})",
                name, line.status, line.rx_rate_mbps, line.tx_rate_mbps
            );
        }

        stats
    }
}
