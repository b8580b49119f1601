//! SMTP submission client (RFC 5321) with STARTTLS (RFC 3207) and AUTH (RFC 4954)

mod auth;
mod capabilities;
mod submission;

pub use capabilities::EhloCapabilities;

use std::sync::Arc;

use tracing::debug;

use crate::commands;
use crate::config::{ServerConfig, TlsMode};
use crate::error::{MailError, Result};
use crate::response::Dialect;
use crate::session::Session;
use crate::transcript::{Transcript, TranscriptEvent, default_transcript};

/// Async SMTP submission client
///
/// # Example
///
/// ```no_run
/// use mailwire::{ServerConfig, SmtpClient};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::submission("smtp.example.com", "alice@example.com", "secret");
/// let mut client = SmtpClient::connect_and_login(config).await?;
///
/// client
///     .send_email("alice@example.com", "bob@example.com", "Hello", "Hi Bob!")
///     .await?;
/// client.quit().await?;
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug)]
pub struct SmtpClient {
    session: Session,
    config: ServerConfig,
    capabilities: EhloCapabilities,
    /// A transaction may have been left open by a failed send
    needs_reset: bool,
}

impl SmtpClient {
    /// Connect, read the greeting, introduce ourselves and secure the connection
    ///
    /// With [`TlsMode::StartTls`] the server must advertise `STARTTLS`; the
    /// upgrade is followed by a second `EHLO` as RFC 3207 requires.
    ///
    /// # Errors
    ///
    /// - [`MailError::TlsUpgrade`] - `STARTTLS` not advertised or refused
    /// - [`MailError::Protocol`] - negative greeting, or both `EHLO` and
    ///   `HELO` rejected
    /// - connection and TLS errors from [`Session::connect`]
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        Self::connect_with_transcript(config, default_transcript()).await
    }

    /// Like [`connect`](Self::connect), recording traffic into `transcript`
    pub async fn connect_with_transcript(
        config: ServerConfig,
        transcript: Arc<dyn Transcript>,
    ) -> Result<Self> {
        let session = Session::connect_with_transcript(&config, Dialect::Smtp, transcript).await?;
        let mut client = Self {
            session,
            config,
            capabilities: EhloCapabilities::default(),
            needs_reset: false,
        };
        client.hello().await?;

        if client.config.tls_mode == TlsMode::StartTls {
            if !client.capabilities.supports_starttls() {
                let error = MailError::TlsUpgrade("STARTTLS not advertised".to_string());
                client.session.record(TranscriptEvent::Error(error.to_string()));
                client.session.close().await?;
                return Err(error);
            }
            client.session.start_tls(commands::starttls()).await?;
            // Knowledge from before the upgrade must be discarded
            client.hello().await?;
        }

        debug!(
            "SMTP session ready on {}:{}",
            client.config.host, client.config.port
        );
        Ok(client)
    }

    /// Connect and authenticate with the configured credentials
    pub async fn connect_and_login(config: ServerConfig) -> Result<Self> {
        let mut client = Self::connect(config).await?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Send `EHLO`, falling back to `HELO`, and store the advertised extensions
    pub async fn hello(&mut self) -> Result<&EhloCapabilities> {
        let ehlo = commands::ehlo(&self.config.client_domain);
        let response = self.session.command(&ehlo).await?;

        if response.is_success() {
            self.capabilities = EhloCapabilities::from_response(&response);
            debug!(
                "Server {} advertises {:?}",
                self.capabilities.domain(),
                response.continuation
            );
        } else {
            debug!("EHLO rejected ({}), trying HELO", response.line);
            let helo = commands::helo(&self.config.client_domain);
            self.session.expect_success(&helo).await?;
            self.capabilities = EhloCapabilities::default();
        }
        Ok(&self.capabilities)
    }

    /// Extensions from the most recent `EHLO`
    pub fn capabilities(&self) -> &EhloCapabilities {
        &self.capabilities
    }

    /// Check if the server accepted the credentials
    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Check if the connection is encrypted
    pub fn is_tls(&self) -> bool {
        self.session.is_tls()
    }

    /// Underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Underlying session, for commands this client does not wrap
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// End the session: `QUIT`, then close
    ///
    /// Idempotent. The connection is released even if `QUIT` fails.
    pub async fn quit(&mut self) -> Result<()> {
        if self.session.is_closed() {
            return Ok(());
        }
        debug!("Closing SMTP session");

        let result = self.session.command(commands::quit()).await;
        self.session.close().await?;
        match result {
            Ok(response) if !response.is_success() => {
                Err(MailError::protocol(commands::quit(), response.line))
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
