//! Mail server configuration

use std::time::Duration;

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default per-response read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// How the connection is secured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TlsMode {
    /// Plaintext for the whole session
    None,
    /// TLS handshake before the greeting is read (ports 995/465)
    Implicit,
    /// Plaintext greeting, then in-band upgrade (`STLS` / `STARTTLS`)
    StartTls,
}

/// Mail server configuration
///
/// Holds everything needed to open a retrieval or submission session.
///
/// # Example
///
/// ```
/// use mailwire::{ServerConfig, TlsMode};
///
/// let config = ServerConfig::pop3s("pop.example.com", "user", "pass");
/// assert_eq!(config.port, 995);
/// assert_eq!(config.tls_mode, TlsMode::Implicit);
///
/// let config = ServerConfig::submission("smtp.example.com", "user", "pass");
/// assert_eq!(config.port, 587);
/// assert_eq!(config.tls_mode, TlsMode::StartTls);
/// ```
#[must_use]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServerConfig {
    /// Server hostname (e.g., "pop.example.com")
    pub host: String,

    /// Server port
    pub port: u16,

    /// Connection security
    pub tls_mode: TlsMode,

    /// Allow insecure TLS connections (self-signed certificates, expired certificates)
    ///
    /// **Security Warning:** Setting this to `true` disables certificate validation,
    /// making your connection vulnerable to man-in-the-middle attacks. Only use this
    /// for testing or with servers you trust on a secure network.
    ///
    /// Default: `false`
    #[cfg_attr(feature = "serde", serde(default))]
    pub allow_insecure_tls: bool,

    /// Username for authentication
    pub username: String,

    /// Password for authentication
    pub password: String,

    /// TCP connect timeout
    #[cfg_attr(feature = "serde", serde(default = "default_connect_timeout"))]
    pub connect_timeout: Duration,

    /// Deadline for each complete response; `None` waits forever
    #[cfg_attr(feature = "serde", serde(default = "default_read_timeout"))]
    pub read_timeout: Option<Duration>,

    /// Domain announced in `EHLO`
    #[cfg_attr(feature = "serde", serde(default = "default_client_domain"))]
    pub client_domain: String,
}

#[cfg(feature = "serde")]
fn default_connect_timeout() -> Duration {
    DEFAULT_CONNECT_TIMEOUT
}

#[cfg(feature = "serde")]
fn default_read_timeout() -> Option<Duration> {
    Some(DEFAULT_READ_TIMEOUT)
}

#[cfg(feature = "serde")]
fn default_client_domain() -> String {
    "localhost".to_string()
}

impl ServerConfig {
    /// Create a new server configuration
    ///
    /// # Arguments
    ///
    /// * `host` - Server hostname
    /// * `port` - Server port
    /// * `tls_mode` - Connection security
    /// * `username` - Authentication username
    /// * `password` - Authentication password
    pub fn new(
        host: impl Into<String>,
        port: u16,
        tls_mode: TlsMode,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            tls_mode,
            allow_insecure_tls: false,
            username: username.into(),
            password: password.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            client_domain: "localhost".to_string(),
        }
    }

    /// POP3 over implicit TLS on port 995
    pub fn pop3s(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 995, TlsMode::Implicit, username, password)
    }

    /// Plain POP3 on port 110
    ///
    /// **Warning:** Plain connections transmit credentials in clear text.
    pub fn pop3(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 110, TlsMode::None, username, password)
    }

    /// POP3 on port 110 upgraded with `STLS`
    pub fn pop3_starttls(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 110, TlsMode::StartTls, username, password)
    }

    /// Message submission on port 587 upgraded with `STARTTLS`
    pub fn submission(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 587, TlsMode::StartTls, username, password)
    }

    /// SMTP over implicit TLS on port 465
    pub fn smtps(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 465, TlsMode::Implicit, username, password)
    }

    /// Plain SMTP on port 25
    pub fn smtp_plain(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self::new(host, 25, TlsMode::None, username, password)
    }

    /// Accept self-signed or otherwise unverifiable certificates
    ///
    /// **Security Warning:** see [`allow_insecure_tls`](Self::allow_insecure_tls).
    pub fn insecure(mut self) -> Self {
        self.allow_insecure_tls = true;
        self
    }

    /// Override the per-response read timeout (`None` disables it)
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Override the TCP connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the domain sent with `EHLO`
    pub fn with_client_domain(mut self, domain: impl Into<String>) -> Self {
        self.client_domain = domain.into();
        self
    }
}
