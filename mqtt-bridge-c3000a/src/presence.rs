//! Device identity and presence tracking.
//!
//! The tracker turns each cycle's outcome into a [`Transition`]. It never
//! publishes anything itself; the poll loop maps transitions to messages.

use thiserror::Error;

use crate::adapter::{ModemSnapshot, ParseError};
use crate::source::TransportError;

/// Why a cycle produced no snapshot.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("modem unreachable: {0}")]
    Transport(#[from] TransportError),

    #[error("unreadable status page: {0}")]
    Parse(#[from] ParseError),
}

/// Outcome of one fetch-and-parse attempt.
pub type FetchResult = Result<ModemSnapshot, CycleError>;

/// The modem currently being reported on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub serial_number: String,
    pub mac_address: String,
    pub firmware_version: String,
    /// Whether the last cycle reached the modem.
    pub last_communicating: bool,
    /// Failed cycles since the last success.
    pub consecutive_failures: u32,
}

impl DeviceIdentity {
    fn from_snapshot(snapshot: &ModemSnapshot) -> Self {
        Self {
            serial_number: snapshot.serial_number.clone(),
            mac_address: snapshot.mac_address.clone(),
            firmware_version: snapshot.firmware_version.clone(),
            last_communicating: true,
            consecutive_failures: 0,
        }
    }
}

/// What happened to the tracked device this cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Failure before any device was ever seen.
    NoOp,
    /// The known device could not be read.
    WentDown(String),
    /// First successful read since start.
    FirstSeen(ModemSnapshot),
    /// A different device answered at the configured address.
    IdentityChanged {
        old_serial: String,
        snapshot: ModemSnapshot,
    },
    /// The known device answered again.
    Updated(ModemSnapshot),
}

impl Transition {
    /// Kind of this transition, without its data.
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::NoOp => TransitionKind::NoOp,
            Transition::WentDown(_) => TransitionKind::WentDown,
            Transition::FirstSeen(_) => TransitionKind::FirstSeen,
            Transition::IdentityChanged { .. } => TransitionKind::IdentityChanged,
            Transition::Updated(_) => TransitionKind::Updated,
        }
    }
}

/// Data-free view of a [`Transition`], for reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    NoOp,
    WentDown,
    FirstSeen,
    IdentityChanged,
    Updated,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionKind::NoOp => "noop",
            TransitionKind::WentDown => "went_down",
            TransitionKind::FirstSeen => "first_seen",
            TransitionKind::IdentityChanged => "identity_changed",
            TransitionKind::Updated => "updated",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks a single device identity across cycles.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    current: Option<DeviceIdentity>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracked identity, if any device has been seen.
    pub fn current(&self) -> Option<&DeviceIdentity> {
        self.current.as_ref()
    }

    /// Whether the tracked device answered on the last cycle.
    pub fn is_communicating(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|identity| identity.last_communicating)
    }

    /// Fold one cycle's outcome into the tracked state.
    pub fn observe(&mut self, result: FetchResult) -> Transition {
        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(_) => {
                return match self.current.as_mut() {
                    Some(identity) => {
                        identity.last_communicating = false;
                        identity.consecutive_failures += 1;
                        Transition::WentDown(identity.serial_number.clone())
                    }
                    None => Transition::NoOp,
                };
            }
        };

        match self.current.as_mut() {
            None => {
                self.current = Some(DeviceIdentity::from_snapshot(&snapshot));
                Transition::FirstSeen(snapshot)
            }
            Some(identity) if identity.serial_number != snapshot.serial_number => {
                let old_serial = std::mem::take(&mut identity.serial_number);
                *identity = DeviceIdentity::from_snapshot(&snapshot);
                Transition::IdentityChanged {
                    old_serial,
                    snapshot,
                }
            }
            Some(identity) => {
                identity.mac_address.clone_from(&snapshot.mac_address);
                identity.firmware_version.clone_from(&snapshot.firmware_version);
                identity.last_communicating = true;
                identity.consecutive_failures = 0;
                Transition::Updated(snapshot)
            }
        }
    }
}
