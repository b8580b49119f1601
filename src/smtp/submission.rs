//! Mail transaction: MAIL FROM, RCPT TO, DATA (RFC 5321 Section 3.3)

use tracing::debug;

use super::SmtpClient;
use crate::commands;
use crate::compose::{OutgoingMessage, dot_stuff};
use crate::error::{MailError, Result};
use crate::response::Status;

impl SmtpClient {
    /// Submit a prepared payload to one or more recipients
    ///
    /// Every step must succeed before the next is sent: `MAIL FROM` (2xx),
    /// each `RCPT TO` (2xx), `DATA` (354), then the dot-stuffed payload and
    /// the end-of-data line (2xx). The payload is sent as-is apart from
    /// transparency dots and CRLF line endings.
    ///
    /// On the first failing step nothing further is written and the error
    /// names that command and the server's reply. The next call starts with
    /// `RSET` so no half-finished transaction carries over.
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidAddress`] - `recipients` is empty, or an address
    ///   contains CR or LF (nothing is sent)
    /// - [`MailError::Protocol`] - a step was rejected
    /// - [`MailError::ConnectionClosed`] - the session is closed
    pub async fn send_mail(&mut self, from: &str, recipients: &[&str], payload: &[u8]) -> Result<()> {
        if recipients.is_empty() {
            return Err(MailError::InvalidAddress(String::new()));
        }
        if let Some(address) = std::iter::once(&from)
            .chain(recipients)
            .find(|address| address.contains(['\r', '\n']))
        {
            return Err(MailError::InvalidAddress(address.to_string()));
        }

        if self.needs_reset {
            debug!("Resetting previous mail transaction");
            self.session.expect_success(commands::rset()).await?;
            self.needs_reset = false;
        }

        self.needs_reset = true;
        self.session.expect_success(&commands::mail_from(from)).await?;
        for to in recipients {
            self.session.expect_success(&commands::rcpt_to(to)).await?;
        }

        let response = self.session.command(commands::data()).await?;
        self.session
            .require(commands::data(), response, Status::Intermediate)?;

        self.session.send_raw(&dot_stuff(payload)).await?;
        let response = self.session.read_single_line().await?;
        self.session.require("end of data", response, Status::Positive)?;

        self.needs_reset = false;
        debug!(
            "Submitted {} bytes from {} to {} recipients",
            payload.len(),
            from,
            recipients.len()
        );
        Ok(())
    }

    /// Validate, compose and submit a plain-text message
    ///
    /// Addresses are checked before any command is issued.
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidAddress`] - `from` or `to` is not `local@domain.tld`
    /// - any error of [`send_mail`](Self::send_mail)
    pub async fn send_email(&mut self, from: &str, to: &str, subject: &str, text: &str) -> Result<()> {
        let message = OutgoingMessage::new(from, to, subject, text);
        self.send_message(&message).await
    }

    /// Validate and submit a composed message to all of its recipients
    pub async fn send_message(&mut self, message: &OutgoingMessage) -> Result<()> {
        message.validate()?;
        let recipients: Vec<&str> = message.recipients().iter().map(String::as_str).collect();
        let payload = message.render();
        self.send_mail(message.sender(), &recipients, payload.as_bytes())
            .await
    }
}
