//! Session state types
//!
//! Each dimension only moves forward: `New -> Connected -> Closed`,
//! `Plain -> Tls`, `Unauthenticated -> Authenticated`.

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Socket opened, greeting not yet read
    New,
    /// Greeting accepted; commands may be sent
    Connected,
    /// Connection released; every further send fails
    Closed,
}

/// Transport security of the byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Cleartext TCP
    Plain,
    /// TLS, either implicit or upgraded in-band
    Tls,
}

/// Authentication progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No credentials accepted yet
    Unauthenticated,
    /// Credentials accepted by the server
    Authenticated,
}
