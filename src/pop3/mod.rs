//! POP3 mailbox client (RFC 1939) with STLS (RFC 2595)

mod mailbox;

use std::sync::Arc;

use tracing::debug;

use crate::commands;
use crate::config::{ServerConfig, TlsMode};
use crate::error::{MailError, Result};
use crate::response::Dialect;
use crate::session::Session;
use crate::transcript::{Transcript, TranscriptEvent, default_transcript};

/// Async POP3 client
///
/// Mailbox operations are only valid after [`login`](Self::login) succeeded
/// and fail with [`MailError::NotAuthenticated`] before that. Each of them
/// first checks that the server still answers `NOOP`; if it does not, the
/// session is closed and the liveness error is returned.
///
/// # Example
///
/// ```no_run
/// use mailwire::{Pop3Client, ServerConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ServerConfig::pop3s("pop.example.com", "user", "pass");
/// let mut client = Pop3Client::connect_and_login(config).await?;
///
/// for summary in client.list_summaries().await? {
///     println!("{} {:?}", summary.index, summary.headers.subject());
/// }
///
/// let message = client.retrieve_message(1).await?;
/// println!("{}", message.body_text);
/// client.quit().await?;
/// # Ok(())
/// # }
/// ```
#[must_use]
#[derive(Debug)]
pub struct Pop3Client {
    session: Session,
    config: ServerConfig,
}

impl Pop3Client {
    /// Connect, read the greeting and secure the connection per `tls_mode`
    ///
    /// With [`TlsMode::StartTls`] the client issues `STLS` right after the
    /// greeting and fails with [`MailError::TlsUpgrade`] if it is refused.
    pub async fn connect(config: ServerConfig) -> Result<Self> {
        Self::connect_with_transcript(config, default_transcript()).await
    }

    /// Like [`connect`](Self::connect), recording traffic into `transcript`
    pub async fn connect_with_transcript(
        config: ServerConfig,
        transcript: Arc<dyn Transcript>,
    ) -> Result<Self> {
        let mut session = Session::connect_with_transcript(&config, Dialect::Pop3, transcript).await?;

        if config.tls_mode == TlsMode::StartTls {
            session.start_tls(commands::stls()).await?;
        }

        debug!("POP3 session ready on {}:{}", config.host, config.port);
        Ok(Self { session, config })
    }

    /// Connect and log in with the configured credentials
    pub async fn connect_and_login(config: ServerConfig) -> Result<Self> {
        let mut client = Self::connect(config).await?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Log in with the credentials from the configuration
    pub async fn authenticate(&mut self) -> Result<()> {
        let username = self.config.username.clone();
        let password = self.config.password.clone();
        self.login(&username, &password).await
    }

    /// Authenticate with `USER` / `PASS`
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidState`] - already authenticated
    /// - [`MailError::InvalidInput`] - a credential contains CR or LF (nothing is sent)
    /// - [`MailError::AuthFailed`] - either command was rejected; the session
    ///   stays connected and unauthenticated
    /// - [`MailError::ConnectionClosed`] - the session is closed
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        if self.session.is_authenticated() {
            return Err(MailError::InvalidState("already authenticated".to_string()));
        }
        if username.contains(['\r', '\n']) || password.contains(['\r', '\n']) {
            return Err(MailError::InvalidInput(
                "line break in credentials".to_string(),
            ));
        }
        debug!("Logging in as {}", username);

        let response = self.session.command(&commands::user(username)).await?;
        if !response.is_success() {
            return Err(self.auth_failed(response.line));
        }

        let response = self.session.command(&commands::pass(password)).await?;
        if !response.is_success() {
            return Err(self.auth_failed(response.line));
        }

        self.session.mark_authenticated();
        debug!("POP3 login accepted for {}", username);
        Ok(())
    }

    fn auth_failed(&self, reply: String) -> MailError {
        let error = MailError::AuthFailed(reply);
        self.session.record(TranscriptEvent::Error(error.to_string()));
        error
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

    /// End the session: `QUIT` (committing deletions), then close
    ///
    /// Idempotent. The connection is released even if `QUIT` fails.
    pub async fn quit(&mut self) -> Result<()> {
        if self.session.is_closed() {
            return Ok(());
        }
        debug!("Closing POP3 session");

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
