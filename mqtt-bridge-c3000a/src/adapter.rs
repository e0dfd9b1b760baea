//! Field extraction for the C3000A status page.
//!
//! The status endpoint returns a single text blob. Fields are separated by
//! `|`, and several fields are further split into `+`-separated tokens.
//! Rates are reported in kbps and published in Mbps.

use thiserror::Error;

/// Status string the modem reports for a line that is up.
pub const ONLINE_STATUS: &str = "Up";

/// Serial number the modem reports before a user has logged in.
const PLACEHOLDER_SERIAL: &str = "N/A";

/// Errors raised while extracting fields from a status page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("status page has no field {index} ({name})")]
    MissingField { index: usize, name: &'static str },

    #[error("field {index} has no token {token} ({name})")]
    MissingToken {
        index: usize,
        token: usize,
        name: &'static str,
    },

    #[error("invalid number {value:?} for {name}: {reason}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Metrics for one line (or the bonded DSL aggregate).
#[derive(Debug, Clone, PartialEq)]
pub struct LineMetrics {
    /// Download rate in Mbps.
    pub rx_rate_mbps: f64,
    /// Upload rate in Mbps.
    pub tx_rate_mbps: f64,
    /// Whether the reported status is exactly [`ONLINE_STATUS`].
    pub online: bool,
    /// Status string as reported by the modem.
    pub status: String,
}

impl LineMetrics {
    /// Build metrics from raw kbps counters and a status string.
    pub fn from_raw(status: &str, rx_kbps: u64, tx_kbps: u64) -> Self {
        Self {
            rx_rate_mbps: to_mbps(rx_kbps),
            tx_rate_mbps: to_mbps(tx_kbps),
            online: is_online(status),
            status: status.to_string(),
        }
    }
}

/// One successful read of the modem status.
#[derive(Debug, Clone, PartialEq)]
pub struct ModemSnapshot {
    pub serial_number: String,
    pub mac_address: String,
    pub firmware_version: String,
    pub dsl: LineMetrics,
    pub line1: LineMetrics,
    pub line2: LineMetrics,
}

/// Turns a raw status response into a [`ModemSnapshot`].
pub trait StatusAdapter: Send {
    /// Parse a response body.
    fn parse(&self, body: &[u8]) -> Result<ModemSnapshot, ParseError>;
}

/// Adapter for the Actiontec C3000A `modemstatus_home_refresh.html` page.
#[derive(Debug, Clone)]
pub struct C3000aAdapter {
    fallback_serial: String,
}

impl C3000aAdapter {
    /// Create an adapter for a modem reachable at `address`.
    ///
    /// The address stands in for the serial number when the modem does not
    /// report one.
    pub fn new(address: &str) -> Self {
        Self {
            fallback_serial: fallback_serial(address),
        }
    }

    /// Serial used when the modem reports none.
    pub fn fallback_serial(&self) -> &str {
        &self.fallback_serial
    }
}

impl StatusAdapter for C3000aAdapter {
    fn parse(&self, body: &[u8]) -> Result<ModemSnapshot, ParseError> {
        let text = String::from_utf8_lossy(body);
        let page = StatusFields::new(&text);

        let mac_address = page
            .field(0, "mac address")?
            .split(':')
            .nth(8)
            .ok_or(ParseError::MissingToken {
                index: 0,
                token: 8,
                name: "mac address",
            })?
            .replace('-', ":");

        let serial_number = match page.field(2, "serial number")?.trim() {
            "" | PLACEHOLDER_SERIAL => self.fallback_serial.clone(),
            serial => serial.to_string(),
        };

        let firmware_version = page.field(3, "firmware version")?.trim().to_string();

        let dsl_tx = page.number_token(1, 1, "dsl upload")?;
        let dsl_rx = page.number_token(1, 2, "dsl download")?;
        let dsl_status = page.token(5, 2, "dsl status")?;

        let line1_status = page.token(24, 6, "line 1 status")?;
        let line1_tx = page.number(25, "line 1 upload")?;
        let line1_rx = page.number_token(26, 0, "line 1 download")?;

        let line2_status = page.token(26, 1, "line 2 status")?;
        let line2_tx = page.number(27, "line 2 upload")?;
        let line2_rx = page.number_token(28, 0, "line 2 download")?;

        Ok(ModemSnapshot {
            serial_number,
            mac_address,
            firmware_version,
            dsl: LineMetrics::from_raw(dsl_status, dsl_rx, dsl_tx),
            line1: LineMetrics::from_raw(line1_status, line1_rx, line1_tx),
            line2: LineMetrics::from_raw(line2_status, line2_rx, line2_tx),
        })
    }
}

/// Derive a topic-safe serial from a modem address.
///
/// ```
/// use mqtt_bridge_c3000a::adapter::fallback_serial;
///
/// assert_eq!(fallback_serial("10.0.0.5"), "10_0_0_5");
/// assert_eq!(fallback_serial("fe80::1"), "fe80__1");
/// ```
pub fn fallback_serial(address: &str) -> String {
    address.replace(['.', ':'], "_")
}

/// Whether a status string denotes a live line.
pub fn is_online(status: &str) -> bool {
    status == ONLINE_STATUS
}

fn to_mbps(kbps: u64) -> f64 {
    kbps as f64 / 1000.0
}

/// Positional view over the `|`-separated fields of a status page.
struct StatusFields<'a> {
    fields: Vec<&'a str>,
}

impl<'a> StatusFields<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            fields: text.split('|').collect(),
        }
    }

    fn field(&self, index: usize, name: &'static str) -> Result<&'a str, ParseError> {
        self.fields
            .get(index)
            .copied()
            .ok_or(ParseError::MissingField { index, name })
    }

    fn token(&self, index: usize, token: usize, name: &'static str) -> Result<&'a str, ParseError> {
        self.field(index, name)?
            .split('+')
            .nth(token)
            .ok_or(ParseError::MissingToken { index, token, name })
    }

    fn number(&self, index: usize, name: &'static str) -> Result<u64, ParseError> {
        parse_counter(self.field(index, name)?, name)
    }

    fn number_token(
        &self,
        index: usize,
        token: usize,
        name: &'static str,
    ) -> Result<u64, ParseError> {
        parse_counter(self.token(index, token, name)?, name)
    }
}

fn parse_counter(value: &str, name: &'static str) -> Result<u64, ParseError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ParseError::InvalidNumber {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        })
}


#[cfg(test)]
mod tests {
    use super::fixture::StatusPage;
    use super::*;

    fn adapter() -> C3000aAdapter {
        C3000aAdapter::new("10.0.0.5")
    }

    #[test]
    fn test_parse_full_page() {
        let page = StatusPage {
            line2_tx: "1500".to_string(),
            line2_rx: "20000".to_string(),
            ..StatusPage::default()
        };

        let snapshot = adapter().parse(&page.body()).unwrap();

        assert_eq!(snapshot.serial_number, "ABC123");
        assert_eq!(snapshot.mac_address, "00:24:7B:11:22:33");
        assert_eq!(snapshot.firmware_version, "31.30L.57");

        assert_eq!(snapshot.dsl.tx_rate_mbps, 2.0);
        assert_eq!(snapshot.dsl.rx_rate_mbps, 24.69);
        assert!(snapshot.dsl.online);

        assert_eq!(snapshot.line1.rx_rate_mbps, 12.345);
        assert_eq!(snapshot.line1.tx_rate_mbps, 1.0);
        assert!(snapshot.line1.online);

        assert_eq!(snapshot.line2.rx_rate_mbps, 20.0);
        assert_eq!(snapshot.line2.tx_rate_mbps, 1.5);
        assert!(snapshot.line2.online);
    }

    #[test]
    fn test_only_exact_up_is_online() {
        for status in ["Down", "", "UP", "up", "Initializing", " Up"] {
            let page = StatusPage {
                line1_status: status.to_string(),
                ..StatusPage::default()
            };
            let snapshot = adapter().parse(&page.body()).unwrap();
            assert!(!snapshot.line1.online, "status {:?} must be offline", status);
            assert_eq!(snapshot.line1.status, status);
        }
    }

    #[test]
    fn test_placeholder_serial_uses_address() {
        for serial in ["N/A", ""] {
            let snapshot = adapter()
                .parse(&StatusPage::with_serial(serial).body())
                .unwrap();
            assert_eq!(snapshot.serial_number, "10_0_0_5");
        }
    }

    #[test]
    fn test_numbers_are_trimmed() {
        let page = StatusPage {
            line2_tx: " 750\n".to_string(),
            ..StatusPage::default()
        };
        let snapshot = adapter().parse(&page.body()).unwrap();
        assert_eq!(snapshot.line2.tx_rate_mbps, 0.75);
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let page = StatusPage {
            dsl_rx: "-5".to_string(),
            ..StatusPage::default()
        };
        let err = adapter().parse(&page.body()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidNumber {
                name: "dsl download",
                ..
            }
        ));
    }

    #[test]
    fn test_truncated_page() {
        let err = adapter().parse(b"a:b:c|0+1+2|ABC123").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingToken {
                index: 0,
                token: 8,
                name: "mac address"
            }
        );

        let err = adapter().parse(b"a:b:c:d:e:f:g:h:00-11|0+1+2|ABC123").unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                index: 3,
                name: "firmware version"
            }
        );
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut body = StatusPage::default().body();
        body.extend_from_slice(&[0xff, 0xfe]);
        assert!(adapter().parse(&body).is_ok());
    }

    #[test]
    fn test_fallback_serial() {
        assert_eq!(fallback_serial("192.168.0.1"), "192_168_0_1");
        assert_eq!(adapter().fallback_serial(), "10_0_0_5");
    }
}
