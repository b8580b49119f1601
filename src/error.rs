//! Mail client error types

use thiserror::Error;

/// POP3/SMTP protocol, transport and decoding errors
#[derive(Error, Debug)]
pub enum MailError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// DNS resolution or TCP connect failure
    #[error("Connection failed: {0}")]
    Connect(String),

    /// TLS error during handshake
    #[error("TLS error: {0}")]
    Tls(String),

    /// Peer did not advertise or refused the in-band TLS upgrade
    #[error("TLS upgrade refused: {0}")]
    TlsUpgrade(String),

    /// Connect or response timeout
    #[error("Connection timeout")]
    Timeout,

    /// Status line matches neither the `+OK`/`-ERR` nor the 3-digit reply grammar
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Command answered with an unexpected status
    #[error("{command} failed: {reply}")]
    Protocol {
        /// Command that failed (credentials redacted)
        command: String,
        /// Status line returned by the server
        reply: String,
    },

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Mailbox operation attempted outside the authenticated state
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Operation not valid in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Address rejected before submission
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Caller-supplied text that cannot be sent, such as a line break inside a command
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Charset or transfer-encoding resolution failure (recovered internally)
    #[error("Decode error: {0}")]
    Decode(String),

    /// Connection closed by peer or by `close()`
    #[error("Connection closed")]
    ConnectionClosed,
}

impl MailError {
    /// True for failures that left the connection unusable
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            MailError::Io(_)
                | MailError::Connect(_)
                | MailError::Timeout
                | MailError::ConnectionClosed
        )
    }

    /// True for TLS handshake failures and refused upgrades
    pub fn is_tls_error(&self) -> bool {
        matches!(self, MailError::Tls(_) | MailError::TlsUpgrade(_))
    }

    /// True when the server rejected the credentials
    pub fn is_auth_error(&self) -> bool {
        matches!(self, MailError::AuthFailed(_))
    }

    /// True for an unexpected status or an unparsable status line
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            MailError::Protocol { .. } | MailError::InvalidResponse(_)
        )
    }

    pub(crate) fn protocol(command: &str, reply: impl Into<String>) -> Self {
        MailError::Protocol {
            command: crate::commands::redact(command),
            reply: reply.into(),
        }
    }
}

/// Result type alias using MailError
pub type Result<T> = std::result::Result<T, MailError>;
