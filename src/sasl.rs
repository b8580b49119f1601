//! SASL (Simple Authentication and Security Layer) support for SMTP AUTH
//!
//! This module implements the client side of RFC 4954 authentication.
//!
//! # SASL Mechanisms
//!
//! - PLAIN: username/password in one initial response (RFC 4616)
//! - LOGIN: username and password sent as answers to two `334` challenges
//! - Others can be implemented by providing a `SaslMechanism` implementation
//!
//! # Example
//!
//! ```no_run
//! # use mailwire::{SmtpClient, SaslPlain, ServerConfig};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::submission("smtp.example.com", "user", "pass");
//! let mut client = SmtpClient::connect(config).await?;
//!
//! let mechanism = SaslPlain::new("username", "password");
//! client.authenticate_sasl(mechanism).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{MailError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

/// Trait for SASL authentication mechanisms
///
/// Implement this trait to add support for additional SASL mechanisms.
pub trait SaslMechanism: Send + Sync {
    /// Returns the name of the SASL mechanism (e.g., "PLAIN", "LOGIN")
    fn mechanism_name(&self) -> &str;

    /// Generate the initial client response
    ///
    /// Returns `None` if the mechanism doesn't send one with the AUTH command.
    /// Returns `Some(data)` where data will be base64-encoded by the client.
    fn initial_response(&self) -> Result<Option<Vec<u8>>>;

    /// Process a server challenge and generate a client response
    ///
    /// # Arguments
    ///
    /// * `challenge` - Base64-decoded challenge data from a `334` reply
    fn process_challenge(&mut self, challenge: &[u8]) -> Result<Vec<u8>>;

    /// Check if the mechanism requires TLS/encryption
    fn requires_tls(&self) -> bool {
        false
    }
}

/// Base64-encode data for SASL exchange
///
/// Empty data is encoded as "=" per RFC 4954.
pub fn encode_sasl_data(data: &[u8]) -> String {
    if data.is_empty() {
        "=".to_string()
    } else {
        STANDARD.encode(data)
    }
}

/// Base64-decode a challenge from a `334` reply
///
/// "=" and an empty challenge both decode to empty data.
pub fn decode_sasl_data(encoded: &str) -> Result<Vec<u8>> {
    let encoded = encoded.trim();
    if encoded.is_empty() || encoded == "=" {
        return Ok(Vec::new());
    }

    STANDARD
        .decode(encoded)
        .map_err(|e| MailError::InvalidResponse(format!("Invalid base64 in SASL challenge: {}", e)))
}

/// SASL PLAIN mechanism implementation
///
/// Sends credentials in the format `\0username\0password`.
///
/// # Security Warning
///
/// PLAIN sends credentials in cleartext (albeit base64-encoded). It **must**
/// only be used over TLS-encrypted connections.
#[derive(Clone)]
pub struct SaslPlain {
    username: String,
    password: String,
}

impl SaslPlain {
    /// Create a new SASL PLAIN mechanism with the given credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for SaslPlain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslPlain")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

impl SaslMechanism for SaslPlain {
    fn mechanism_name(&self) -> &str {
        "PLAIN"
    }

    fn initial_response(&self) -> Result<Option<Vec<u8>>> {
        // authorization identity (empty), authentication identity, password
        let mut response = Vec::with_capacity(self.username.len() + self.password.len() + 2);
        response.push(0);
        response.extend_from_slice(self.username.as_bytes());
        response.push(0);
        response.extend_from_slice(self.password.as_bytes());
        Ok(Some(response))
    }

    fn process_challenge(&mut self, _challenge: &[u8]) -> Result<Vec<u8>> {
        Err(MailError::InvalidResponse(
            "PLAIN mechanism does not support challenge-response".to_string(),
        ))
    }

    fn requires_tls(&self) -> bool {
        true
    }
}

/// SASL LOGIN mechanism
///
/// The server prompts for the username, then the password; the prompt text
/// itself is ignored.
#[derive(Clone)]
pub struct SaslLogin {
    username: String,
    password: String,
    step: u8,
}

impl SaslLogin {
    /// Create a new SASL LOGIN mechanism with the given credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            step: 0,
        }
    }
}

impl std::fmt::Debug for SaslLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaslLogin")
            .field("username", &self.username)
            .field("password", &"****")
            .field("step", &self.step)
            .finish()
    }
}

impl SaslMechanism for SaslLogin {
    fn mechanism_name(&self) -> &str {
        "LOGIN"
    }

    fn initial_response(&self) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    fn process_challenge(&mut self, _challenge: &[u8]) -> Result<Vec<u8>> {
        self.step += 1;
        match self.step {
            1 => Ok(self.username.as_bytes().to_vec()),
            2 => Ok(self.password.as_bytes().to_vec()),
            _ => Err(MailError::InvalidResponse(
                "LOGIN mechanism received an unexpected third challenge".to_string(),
            )),
        }
    }

    fn requires_tls(&self) -> bool {
        true
    }
}
