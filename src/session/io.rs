//! Command channel: line output, single-line and multi-line reply framing
//!
//! Replies are framed against one cumulative receive buffer owned by the
//! session. A terminator split across physical reads is still found because
//! every search rescans the tail of the whole buffer, and bytes that arrive
//! after a terminator stay buffered for the next reply.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;
use tracing::trace;

use super::Session;
use super::state::LifecycleState;
use crate::commands::{self, parse_status_line};
use crate::error::{MailError, Result};
use crate::response::{Dialect, Response, Status};
use crate::transcript::TranscriptEvent;

const CRLF: &[u8] = b"\r\n";

/// End of a multi-line reply: the CRLF closing the last line, a dot, CRLF
const TERMINATOR: &[u8] = b"\r\n.\r\n";

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Maximum size of one reply to prevent OOM from malicious/broken servers (64 MB)
const MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024;

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Read until `needle` occurs in `buf` at or after `search_from`
///
/// Returns the offset of the match. Bytes already in `buf` are searched
/// before anything is read.
async fn fill_until<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    needle: &[u8],
    mut search_from: usize,
) -> Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        if let Some(pos) = find(&buf[search_from.min(buf.len())..], needle) {
            return Ok(search_from + pos);
        }

        // A match may start in the last needle.len() - 1 bytes we already have
        search_from = search_from.max(buf.len().saturating_sub(needle.len() - 1));

        if buf.len() > MAX_RESPONSE_SIZE {
            return Err(MailError::InvalidResponse(format!(
                "Response exceeds maximum size of {} bytes",
                MAX_RESPONSE_SIZE
            )));
        }

        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Err(MailError::ConnectionClosed);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Take one CRLF-terminated line off the front of `buf`, reading as needed
async fn take_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let eol = fill_until(reader, buf, CRLF, 0).await?;
    let line: Vec<u8> = buf.drain(..eol + CRLF.len()).collect();
    Ok(String::from_utf8_lossy(&line[..eol]).into_owned())
}

/// Read one reply made of status lines only
///
/// For the submission dialect `250-...` lines are collected into
/// [`Response::continuation`] until the final `250 ...` line arrives.
async fn read_reply<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    dialect: Dialect,
) -> Result<Response>
where
    R: AsyncRead + Unpin,
{
    let mut raw = Vec::new();
    let mut continuation = Vec::new();

    loop {
        let line = take_line(reader, buf).await?;
        raw.extend_from_slice(line.as_bytes());
        raw.extend_from_slice(CRLF);

        let parsed = parse_status_line(dialect, &line)?;
        if parsed.more {
            if raw.len() > MAX_RESPONSE_SIZE {
                return Err(MailError::InvalidResponse(
                    "Too many continuation lines".to_string(),
                ));
            }
            continuation.push(parsed.message);
            continue;
        }

        return Ok(Response {
            status: parsed.status,
            code: parsed.code,
            line,
            message: parsed.message,
            continuation,
            body: None,
            raw,
        });
    }
}

/// Read one multi-line reply: status line, body, `CRLF . CRLF`
///
/// A negative status line carries no body and is returned on its own. The
/// first terminator after the status line ends the frame; any bytes after it
/// remain in `buf`.
async fn read_multiline_frame<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    dialect: Dialect,
) -> Result<Response>
where
    R: AsyncRead + Unpin,
{
    let eol = fill_until(reader, buf, CRLF, 0).await?;
    let line = String::from_utf8_lossy(&buf[..eol]).into_owned();
    let parsed = parse_status_line(dialect, &line)?;

    if parsed.status == Status::Negative {
        let raw: Vec<u8> = buf.drain(..eol + CRLF.len()).collect();
        return Ok(Response {
            status: parsed.status,
            code: parsed.code,
            line,
            message: parsed.message,
            continuation: vec![],
            body: None,
            raw,
        });
    }

    // The status line's own CRLF may open the terminator (empty body)
    let end = fill_until(reader, buf, TERMINATOR, eol).await?;
    let raw: Vec<u8> = buf.drain(..end + TERMINATOR.len()).collect();

    let body_start = eol + CRLF.len();
    let body = raw[body_start..end.max(body_start)].to_vec();

    Ok(Response {
        status: parsed.status,
        code: parsed.code,
        line,
        message: parsed.message,
        continuation: vec![],
        body: Some(body),
        raw,
    })
}

async fn within<T, F>(limit: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match limit {
        Some(limit) => timeout(limit, fut).await.map_err(|_| MailError::Timeout)?,
        None => fut.await,
    }
}

impl Session {
    /// Fail unless commands may be written
    fn ensure_connected(&self) -> Result<()> {
        match self.lifecycle {
            LifecycleState::Connected => Ok(()),
            LifecycleState::Closed => Err(MailError::ConnectionClosed),
            LifecycleState::New => Err(MailError::InvalidState(
                "greeting not received yet".to_string(),
            )),
        }
    }

    /// Close the session if the error left the stream unusable
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_connection_error() || matches!(e, MailError::InvalidResponse(_)) {
                self.abort(e);
            }
        }
        result
    }

    /// Write a command followed by CRLF
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidInput`] - the command contains CR or LF (nothing is sent)
    /// - [`MailError::ConnectionClosed`] - the session is closed
    /// - [`MailError::Io`] - the write failed (the session is closed)
    pub async fn send_line(&mut self, command: &str) -> Result<()> {
        self.write_line(command, commands::redact(command)).await
    }

    /// Write a line whose content must never reach the transcript
    pub(crate) async fn send_secret_line(&mut self, secret: &str) -> Result<()> {
        self.write_line(secret, "****".to_string()).await
    }

    async fn write_line(&mut self, command: &str, redacted: String) -> Result<()> {
        // One command per line
        if command.contains(['\r', '\n']) {
            return Err(MailError::InvalidInput(format!(
                "line break in command {:?}",
                redacted.lines().next().unwrap_or_default()
            )));
        }
        self.ensure_connected()?;
        trace!("Sending command: {}", redacted);

        let mut line = Vec::with_capacity(command.len() + CRLF.len());
        line.extend_from_slice(command.as_bytes());
        line.extend_from_slice(CRLF);

        let result = async {
            self.stream.write_all(&line).await?;
            self.stream.flush().await?;
            Ok::<(), MailError>(())
        }
        .await;
        let result = self.settle(result);
        if result.is_ok() {
            self.record(TranscriptEvent::Sent(redacted));
        }
        result
    }

    /// Write pre-framed octets as-is (message payloads)
    pub(crate) async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_connected()?;
        trace!("Sending {} payload bytes", data.len());
        let result = async {
            self.stream.write_all(data).await?;
            self.stream.flush().await?;
            Ok::<(), MailError>(())
        }
        .await;
        let result = self.settle(result);
        if result.is_ok() {
            self.record(TranscriptEvent::Sent(format!("<{} bytes>", data.len())));
        }
        result
    }

    /// Read a reply consisting of status lines only
    ///
    /// # Errors
    ///
    /// - [`MailError::Timeout`] - no complete reply within the read timeout
    /// - [`MailError::ConnectionClosed`] - EOF before the line ended
    /// - [`MailError::InvalidResponse`] - the line fits neither status grammar
    ///
    /// All of these close the session.
    pub async fn read_single_line(&mut self) -> Result<Response> {
        if self.lifecycle == LifecycleState::Closed {
            return Err(MailError::ConnectionClosed);
        }
        let result = within(
            self.read_timeout,
            read_reply(&mut self.stream, &mut self.pending, self.dialect),
        )
        .await;
        let response = self.settle(result)?;

        for line in String::from_utf8_lossy(&response.raw).lines() {
            self.record(TranscriptEvent::Received(line.to_string()));
        }
        Ok(response)
    }

    /// Read a multi-line reply terminated by `CRLF . CRLF`
    ///
    /// Same failure behavior as [`read_single_line`](Self::read_single_line).
    pub async fn read_multiline(&mut self) -> Result<Response> {
        if self.lifecycle == LifecycleState::Closed {
            return Err(MailError::ConnectionClosed);
        }
        let result = within(
            self.read_timeout,
            read_multiline_frame(&mut self.stream, &mut self.pending, self.dialect),
        )
        .await;
        let response = self.settle(result)?;

        if response.body.is_some() {
            self.record(TranscriptEvent::ReceivedMultiline {
                status: response.line.clone(),
                bytes: response.raw.len(),
            });
        } else {
            self.record(TranscriptEvent::Received(response.line.clone()));
        }
        Ok(response)
    }

    /// Send a command and read its single-line reply
    pub async fn command(&mut self, command: &str) -> Result<Response> {
        self.send_line(command).await?;
        self.read_single_line().await
    }

    /// Send a command and read its multi-line reply
    pub async fn command_multiline(&mut self, command: &str) -> Result<Response> {
        self.send_line(command).await?;
        self.read_multiline().await
    }

    /// Send a command and require a positive completion
    pub(crate) async fn expect_success(&mut self, command: &str) -> Result<Response> {
        let response = self.command(command).await?;
        self.require(command, response, Status::Positive)
    }

    /// Turn an unexpected status into [`MailError::Protocol`]
    pub(crate) fn require(
        &self,
        command: &str,
        response: Response,
        expected: Status,
    ) -> Result<Response> {
        if response.status == expected {
            Ok(response)
        } else {
            let error = MailError::protocol(command, response.line);
            self.record(TranscriptEvent::Error(error.to_string()));
            Err(error)
        }
    }
}
