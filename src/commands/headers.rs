//! Header block parsing
//!
//! Values are returned undecoded; encoded words are resolved by
//! [`crate::mime::decode_headers`].

use crate::message::MessageHeaders;

/// Split a message at the first blank line into (header block, body)
///
/// Accepts CRLF or bare LF line endings. A message that starts with a blank
/// line has no headers; without any blank line the whole text is headers.
pub fn split_message(raw: &[u8]) -> (&[u8], &[u8]) {
    if let Some(body) = raw.strip_prefix(b"\r\n") {
        return (&raw[..0], body);
    }
    if let Some(body) = raw.strip_prefix(b"\n") {
        return (&raw[..0], body);
    }
    if let Some(pos) = find(raw, b"\r\n\r\n") {
        return (&raw[..pos], &raw[pos + 4..]);
    }
    if let Some(pos) = find(raw, b"\n\n") {
        return (&raw[..pos], &raw[pos + 2..]);
    }
    (raw, &raw[raw.len()..])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Parse a header block into name/value pairs
///
/// - A line starting with space or tab continues the previous value, joined
///   with a single space
/// - A line containing `:` starts a new field; the value is trimmed
/// - Anything else is ignored
/// - Parsing stops at the first empty line
pub fn parse_header_block(raw: &str) -> MessageHeaders {
    let mut headers = MessageHeaders::new();
    let mut current: Option<&str> = None;

    for line in raw.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            break;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            let folded = line.trim();
            if let Some(name) = current {
                if !folded.is_empty() {
                    headers.append_folded(name, folded);
                }
            }
            continue;
        }

        current = match line.split_once(':') {
            Some((name, value)) => {
                headers.set(name, value.trim());
                Some(name)
            }
            None => None,
        };
    }

    headers
}
