//! Mailbox operations of the TRANSACTION state (RFC 1939 Section 5)

use tracing::{debug, warn};

use super::Pop3Client;
use crate::commands::{self, parse_listing, parse_stat};
use crate::error::{MailError, Result};
use crate::message::{DecodedMessage, ListEntry, MailboxStat, MessageHeaders, MessageSummary};
use crate::mime::{decode_header_block, decode_message};
use crate::response::{Response, Status};

impl Pop3Client {
    /// Fail unless authenticated, then confirm the server still answers
    ///
    /// Any failed check, including a negative reply, closes the session.
    async fn ensure_live(&mut self) -> Result<()> {
        self.ensure_authenticated()?;

        let failure = match self.session.command(commands::noop()).await {
            Ok(response) if response.is_success() => return Ok(()),
            Ok(response) => MailError::protocol(commands::noop(), response.line),
            Err(e) => e,
        };
        warn!("Liveness check failed: {}", failure);
        self.session.abort(&failure);
        Err(failure)
    }

    fn ensure_authenticated(&self) -> Result<()> {
        if self.session.is_closed() {
            return Err(MailError::ConnectionClosed);
        }
        if !self.session.is_authenticated() {
            return Err(MailError::NotAuthenticated);
        }
        Ok(())
    }

    /// Send a command whose reply carries a body and require `+OK`
    async fn fetch(&mut self, command: &str) -> Result<Response> {
        let response = self.session.command_multiline(command).await?;
        self.session.require(command, response, Status::Positive)
    }

    /// Message count and mailbox size (`STAT`)
    ///
    /// # Errors
    ///
    /// - [`MailError::NotAuthenticated`] - called before login
    /// - [`MailError::Protocol`] - the server answered `-ERR`
    /// - [`MailError::InvalidResponse`] - the reply is not `+OK count size`
    pub async fn stat(&mut self) -> Result<MailboxStat> {
        self.ensure_live().await?;
        let response = self.session.expect_success(commands::stat()).await?;
        parse_stat(&response.message)
    }

    /// Message numbers and sizes (`LIST`), in server order
    ///
    /// Lines that are not two integers are skipped.
    pub async fn list(&mut self) -> Result<Vec<ListEntry>> {
        self.ensure_live().await?;
        self.list_entries().await
    }

    async fn list_entries(&mut self) -> Result<Vec<ListEntry>> {
        let response = self.fetch(commands::list()).await?;
        let entries = parse_listing(&String::from_utf8_lossy(&response.payload()));
        debug!("Mailbox lists {} messages", entries.len());
        Ok(entries)
    }

    /// Listing enriched with each message's decoded headers
    ///
    /// Issues `LIST` followed by one `TOP n 0` per message.
    pub async fn list_summaries(&mut self) -> Result<Vec<MessageSummary>> {
        self.ensure_live().await?;
        let entries = self.list_entries().await?;

        let mut summaries = Vec::with_capacity(entries.len());
        for entry in entries {
            let headers = self.header_block(entry.index).await?;
            summaries.push(MessageSummary {
                index: entry.index,
                size: entry.size,
                headers,
            });
        }
        Ok(summaries)
    }

    /// Decoded headers of one message (`TOP n 0`)
    pub async fn retrieve_headers(&mut self, index: u32) -> Result<MessageHeaders> {
        self.ensure_live().await?;
        self.header_block(index).await
    }

    async fn header_block(&mut self, index: u32) -> Result<MessageHeaders> {
        let response = self.fetch(&commands::top(index, 0)).await?;
        Ok(decode_header_block(&response.payload()))
    }

    /// Message octets as stored on the server (`RETR n`), dot-unstuffed
    pub async fn retrieve_raw(&mut self, index: u32) -> Result<Vec<u8>> {
        self.ensure_live().await?;
        let response = self.fetch(&commands::retr(index)).await?;
        Ok(response.payload())
    }

    /// Retrieve and decode a message: headers plus displayable body text
    ///
    /// Decoding never fails; undecodable text degrades to replacement
    /// characters.
    pub async fn retrieve_message(&mut self, index: u32) -> Result<DecodedMessage> {
        let raw = self.retrieve_raw(index).await?;
        debug!("Retrieved message {} ({} bytes)", index, raw.len());
        Ok(decode_message(&raw))
    }

    /// Mark a message for deletion (`DELE n`); applied at `QUIT`
    pub async fn delete_message(&mut self, index: u32) -> Result<()> {
        self.ensure_live().await?;
        self.session.expect_success(&commands::dele(index)).await?;
        debug!("Marked message {} for deletion", index);
        Ok(())
    }

    /// Unmark all messages marked for deletion (`RSET`)
    pub async fn reset(&mut self) -> Result<()> {
        self.ensure_authenticated()?;
        self.session.expect_success(commands::rset()).await?;
        Ok(())
    }

    /// Keep the session alive (`NOOP`)
    pub async fn noop(&mut self) -> Result<()> {
        self.ensure_authenticated()?;
        self.session.expect_success(commands::noop()).await?;
        Ok(())
    }
}
