//! HTTP access to the modem status page.

use std::future::Future;

use thiserror::Error;

use crate::config::ModemConfig;

/// User agent the modem's web UI accepts.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 6.0; WOW64; rv:24.0) Gecko/20100101 Firefox/24.0";

/// Path of the login form handler.
pub const LOGIN_PATH: &str = "/login.cgi";

/// Path of the status blob.
pub const STATUS_PATH: &str = "/modemstatus_home_refresh.html";

/// Errors raised while fetching the status page.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out")]
    Timeout,

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Something that yields raw status responses.
pub trait StatusSource: Send {
    /// Fetch one status response body.
    fn fetch(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Fetches the status page over HTTP, logging in first when a password is set.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    login_url: String,
    status_url: String,
    username: String,
    password: String,
}

impl HttpStatusSource {
    /// Build the source and its HTTP client.
    pub fn new(config: &ModemConfig) -> Result<Self, TransportError> {
        // The modem serves self-signed certificates.
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            login_url: format!("http://{}{}", config.address, LOGIN_PATH),
            status_url: format!("http://{}{}", config.address, STATUS_PATH),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    /// URL of the status page.
    pub fn status_url(&self) -> &str {
        &self.status_url
    }

    async fn login(&self) -> Result<(), TransportError> {
        tracing::debug!(user = %self.username, "Authenticating to the modem");

        let form = [
            ("nothankyou", "1"),
            ("adminUserName", self.username.as_str()),
            ("adminPassword", self.password.as_str()),
        ];

        // The login response carries nothing useful; a failed login shows
        // up as a placeholder serial on the status page.
        self.client
            .post(&self.login_url)
            .form(&form)
            .send()
            .await?;

        Ok(())
    }
}

impl StatusSource for HttpStatusSource {
    async fn fetch(&mut self) -> Result<Vec<u8>, TransportError> {
        if !self.password.is_empty() {
            self.login().await?;
        }

        let response = self.client.get(&self.status_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: self.status_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }
}
