//! SMTP authentication (RFC 4954)

use tracing::{debug, warn};

use super::SmtpClient;
use crate::commands;
use crate::error::{MailError, Result};
use crate::response::codes;
use crate::sasl::{SaslMechanism, SaslPlain, decode_sasl_data, encode_sasl_data};
use crate::transcript::TranscriptEvent;

impl SmtpClient {
    /// Authenticate with `AUTH PLAIN` using the configured credentials
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidState`] - already authenticated
    /// - [`MailError::AuthFailed`] - the server did not answer `235`
    pub async fn authenticate(&mut self) -> Result<()> {
        let mechanism = SaslPlain::new(&self.config.username, &self.config.password);
        self.authenticate_sasl(mechanism).await
    }

    /// Authenticate using a SASL mechanism
    ///
    /// Sends `AUTH <mechanism> [initial-response]` and answers every `334`
    /// challenge until the server returns a final reply. A mechanism that
    /// cannot answer a challenge cancels the exchange with `*`.
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidState`] - already authenticated
    /// - [`MailError::AuthFailed`] - the exchange ended with anything but `235`;
    ///   the session stays connected and unauthenticated
    /// - [`MailError::ConnectionClosed`] - the server closed the connection
    /// - [`MailError::Timeout`] - the server did not respond in time
    pub async fn authenticate_sasl(&mut self, mut mechanism: impl SaslMechanism) -> Result<()> {
        if self.session.is_authenticated() {
            return Err(MailError::InvalidState("already authenticated".to_string()));
        }
        debug!(
            "Authenticating with SASL mechanism: {}",
            mechanism.mechanism_name()
        );
        if mechanism.requires_tls() && !self.session.is_tls() {
            warn!(
                "Sending {} credentials over an unencrypted connection",
                mechanism.mechanism_name()
            );
        }

        let initial = mechanism.initial_response()?.map(|data| encode_sasl_data(&data));
        let command = commands::auth(mechanism.mechanism_name(), initial.as_deref());
        let mut response = self.session.command(&command).await?;

        while response.code == Some(codes::AUTH_CONTINUE) {
            let answer = decode_sasl_data(&response.message)
                .and_then(|challenge| mechanism.process_challenge(&challenge));
            match answer {
                Ok(data) => {
                    self.session.send_secret_line(&encode_sasl_data(&data)).await?;
                }
                Err(e) => {
                    debug!("Cancelling SASL exchange: {}", e);
                    self.session.send_line("*").await?;
                    self.session.read_single_line().await?;
                    return Err(self.auth_failed(e.to_string()));
                }
            }
            response = self.session.read_single_line().await?;
        }

        if response.code == Some(codes::AUTH_SUCCESS) {
            self.session.mark_authenticated();
            debug!("SASL authentication successful");
            Ok(())
        } else {
            Err(self.auth_failed(response.line))
        }
    }

    fn auth_failed(&self, reply: String) -> MailError {
        let error = MailError::AuthFailed(reply);
        self.session.record(TranscriptEvent::Error(error.to_string()));
        error
    }
}
