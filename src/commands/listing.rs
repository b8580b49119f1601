//! `LIST` and `STAT` reply parsing (RFC 1939 Section 5)

use crate::error::{MailError, Result};
use crate::message::{ListEntry, MailboxStat};

/// Parse the body of a `LIST` reply
///
/// Each non-blank line is `index size`. Lines that do not carry two integers
/// are skipped. Server order is preserved.
pub fn parse_listing(raw: &str) -> Vec<ListEntry> {
    raw.lines().filter_map(parse_list_line).collect()
}

fn parse_list_line(line: &str) -> Option<ListEntry> {
    let mut parts = line.split_whitespace();
    let index = parts.next()?.parse().ok()?;
    let size = parts.next()?.parse().ok()?;
    Some(ListEntry { index, size })
}

/// Parse the message of a `+OK count size` reply to `STAT`
pub fn parse_stat(message: &str) -> Result<MailboxStat> {
    let mut parts = message.split_whitespace();
    let count = parts.next().and_then(|s| s.parse().ok());
    let size = parts.next().and_then(|s| s.parse().ok());
    match (count, size) {
        (Some(count), Some(size)) => Ok(MailboxStat { count, size }),
        _ => Err(MailError::InvalidResponse(format!(
            "malformed STAT reply: {}",
            message
        ))),
    }
}
