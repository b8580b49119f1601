//! Status-line grammar for both dialects
//!
//! Status is derived from the leading token of the line only, never from a
//! substring search, so `+OK` or `250` echoed inside reply text cannot be
//! mistaken for a status.

use crate::error::{MailError, Result};
use crate::response::{Dialect, Response, Status};

/// Parsed status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// Classified status
    pub status: Status,
    /// Reply code (submission dialect only)
    pub code: Option<u16>,
    /// Text after the status token
    pub message: String,
    /// SMTP `code-text` continuation marker
    pub more: bool,
}

/// Parse a status line (without CRLF) according to the dialect's grammar
pub fn parse_status_line(dialect: Dialect, line: &str) -> Result<StatusLine> {
    // Strip UTF-8 BOM if present (some broken servers/proxies add it)
    let line = line.trim_start_matches('\u{FEFF}');
    match dialect {
        Dialect::Pop3 => parse_pop3_status(line),
        Dialect::Smtp => parse_smtp_status(line),
    }
}

fn invalid(line: &str) -> MailError {
    MailError::InvalidResponse(line.chars().take(100).collect())
}

/// Split `token rest` where the token must be followed by a space or the end of line
fn after_token<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(token)?;
    if rest.is_empty() {
        Some("")
    } else {
        rest.strip_prefix(' ')
    }
}

fn parse_pop3_status(line: &str) -> Result<StatusLine> {
    let (status, message) = if let Some(rest) = after_token(line, "+OK") {
        (Status::Positive, rest)
    } else if let Some(rest) = after_token(line, "-ERR") {
        (Status::Negative, rest)
    } else if let Some(rest) = after_token(line, "+") {
        // SASL continuation (RFC 5034)
        (Status::Intermediate, rest)
    } else {
        return Err(invalid(line));
    };

    Ok(StatusLine {
        status,
        code: None,
        message: message.to_string(),
        more: false,
    })
}

fn parse_smtp_status(line: &str) -> Result<StatusLine> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || !bytes[..3].iter().all(u8::is_ascii_digit) {
        return Err(invalid(line));
    }

    // Position 3 must be a separator: "250 ok", "250-more", or bare "250"
    let (more, message) = match bytes.get(3) {
        None => (false, ""),
        Some(b' ') => (false, &line[4..]),
        Some(b'-') => (true, &line[4..]),
        Some(_) => return Err(invalid(line)),
    };

    let code = line[..3].parse::<u16>().map_err(|_| invalid(line))?;
    let status = match bytes[0] {
        b'2' => Status::Positive,
        b'3' => Status::Intermediate,
        b'4' | b'5' => Status::Negative,
        _ => return Err(invalid(line)),
    };

    Ok(StatusLine {
        status,
        code: Some(code),
        message: message.to_string(),
        more,
    })
}

/// Parse a complete single-line response
pub fn parse_single_response(dialect: Dialect, line: &str) -> Result<Response> {
    let parsed = parse_status_line(dialect, line)?;
    Ok(Response {
        status: parsed.status,
        code: parsed.code,
        line: line.to_string(),
        message: parsed.message,
        continuation: vec![],
        body: None,
        raw: format!("{}\r\n", line).into_bytes(),
    })
}
