//! Transport session and command channel shared by both dialects
//!
//! A [`Session`] owns one connection and one receive buffer. Every operation
//! takes `&mut self`, so at most one command is ever in flight.

mod connection;
mod io;
mod state;
mod stream;

pub use state::{AuthState, LifecycleState, TransportState};

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::MailError;
use crate::response::Dialect;
use crate::transcript::{Transcript, TranscriptEvent};
use stream::MailStream;

/// A connection speaking one line dialect
///
/// # Example
///
/// ```no_run
/// use mailwire::{Dialect, ServerConfig, Session};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::pop3s("pop.example.com", "user", "pass");
/// let mut session = Session::connect(&config, Dialect::Pop3).await?;
/// println!("greeting: {}", session.greeting());
///
/// let reply = session.command("NOOP").await?;
/// assert!(reply.is_success());
/// session.close().await?;
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct Session {
    host: String,
    port: u16,
    dialect: Dialect,
    stream: MailStream,
    /// Bytes received but not yet consumed by a reply
    pending: Vec<u8>,
    lifecycle: LifecycleState,
    transport: TransportState,
    auth: AuthState,
    read_timeout: Option<Duration>,
    connect_timeout: Duration,
    allow_insecure_tls: bool,
    greeting: String,
    transcript: Arc<dyn Transcript>,
}

impl Session {
    /// Server hostname
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Line grammar of this session
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Greeting line sent by the server on connect
    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Current lifecycle state
    pub fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Current transport security
    pub fn transport(&self) -> TransportState {
        self.transport
    }

    /// Current authentication state
    pub fn auth(&self) -> AuthState {
        self.auth
    }

    /// True once the stream is encrypted
    pub fn is_tls(&self) -> bool {
        self.transport == TransportState::Tls
    }

    /// True after `close()` or a connection failure
    pub fn is_closed(&self) -> bool {
        self.lifecycle == LifecycleState::Closed
    }

    /// True after the server accepted the credentials
    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }

    pub(crate) fn mark_authenticated(&mut self) {
        self.auth = AuthState::Authenticated;
    }

    pub(crate) fn record(&self, event: TranscriptEvent) {
        self.transcript.record(&event);
    }

    /// Drop the connection after a failure that left the stream unusable
    pub(crate) fn abort(&mut self, error: &MailError) {
        if self.lifecycle == LifecycleState::Closed {
            return;
        }
        debug!("Closing {}:{} after error: {}", self.host, self.port, error);
        self.record(TranscriptEvent::Error(error.to_string()));
        self.stream = MailStream::Detached;
        self.pending.clear();
        self.lifecycle = LifecycleState::Closed;
        self.record(TranscriptEvent::Closed);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dialect", &self.dialect)
            .field("lifecycle", &self.lifecycle)
            .field("transport", &self.transport)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("Session to {}:{} dropped", self.host, self.port);
    }
}
