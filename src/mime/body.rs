//! Body decoding and multipart part selection (RFC 2045/2046)

use base64::Engine;
use quoted_printable::ParseMode;
use tracing::warn;

use super::charset::decode_text;
use super::content_type::{ContentType, TransferEncoding};
use super::encoded_words::LENIENT_BASE64;
use crate::commands::{parse_header_block, split_message};
use crate::message::MessageHeaders;

/// Nesting limit for multipart walks
const MAX_MULTIPART_DEPTH: usize = 16;

/// Remove a transfer encoding, falling back to the raw octets on error
pub fn decode_transfer(raw: &[u8], encoding: &TransferEncoding) -> Vec<u8> {
    match encoding {
        TransferEncoding::Base64 => {
            let compact: Vec<u8> = raw
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            match LENIENT_BASE64.decode(&compact) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Base64 body decode failed: {}; using raw octets", e);
                    raw.to_vec()
                }
            }
        }
        TransferEncoding::QuotedPrintable => {
            match quoted_printable::decode(raw, ParseMode::Robust) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Quoted-printable body decode failed: {}; using raw octets", e);
                    raw.to_vec()
                }
            }
        }
        TransferEncoding::Identity => raw.to_vec(),
        TransferEncoding::Other(name) => {
            warn!("Unsupported transfer encoding {:?}; using raw octets", name);
            raw.to_vec()
        }
    }
}

/// Decode a body: transfer encoding first, then charset resolution
///
/// # Example
///
/// ```
/// use mailwire::mime::decode_body;
///
/// assert_eq!(decode_body(b"aGVsbG8=", "base64", Some("utf-8")), "hello");
/// assert_eq!(decode_body(b"caf=C3=A9", "quoted-printable", None), "café");
/// ```
pub fn decode_body(raw: &[u8], transfer_encoding: &str, declared_charset: Option<&str>) -> String {
    let octets = decode_transfer(raw, &TransferEncoding::parse(transfer_encoding));
    decode_text(&octets, declared_charset)
}

/// A part that is not itself multipart
#[derive(Debug)]
struct Leaf<'a> {
    headers: MessageHeaders,
    body: &'a [u8],
}

impl Leaf<'_> {
    fn content_type(&self) -> ContentType {
        ContentType::from_headers(&self.headers)
    }

    fn decode(&self) -> String {
        let content_type = self.content_type();
        let octets = decode_transfer(self.body, &TransferEncoding::from_headers(&self.headers));
        decode_text(&octets, content_type.charset())
    }
}

/// Pick and decode the displayable text of a message
///
/// A single-part message decodes its own body. For multipart messages the
/// parts are walked depth-first and the first `text/plain` part wins; without
/// one the first leaf part of any type is decoded, and a multipart whose
/// parts cannot be found decodes its undivided body.
pub fn select_body_part(headers: &MessageHeaders, body: &[u8]) -> String {
    let mut leaves = Vec::new();
    collect_leaves(headers.clone(), body, 0, &mut leaves);

    let chosen = leaves
        .iter()
        .find(|leaf| leaf.content_type().is_text_plain())
        .or_else(|| leaves.first());

    match chosen {
        Some(leaf) => leaf.decode(),
        None => decode_text(body, None),
    }
}

fn collect_leaves<'a>(
    headers: MessageHeaders,
    body: &'a [u8],
    depth: usize,
    out: &mut Vec<Leaf<'a>>,
) {
    let content_type = ContentType::from_headers(&headers);
    if content_type.is_multipart() && depth < MAX_MULTIPART_DEPTH {
        if let Some(boundary) = content_type.boundary() {
            let parts = split_multipart(body, boundary);
            if !parts.is_empty() {
                for part in parts {
                    let (head, part_body) = split_message(part);
                    let part_headers = parse_header_block(&decode_text(head, None));
                    collect_leaves(part_headers, part_body, depth + 1, out);
                }
                return;
            }
        }
    }
    out.push(Leaf { headers, body });
}

/// Split a multipart body into its parts (preamble and epilogue dropped)
///
/// The line break before each delimiter line belongs to the delimiter. A
/// missing close delimiter ends the last part at the end of the body.
pub(crate) fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();
    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let line_end = body[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |i| pos + i);
        let next = (line_end + 1).min(body.len());
        let line = body[pos..line_end].trim_ascii_end();

        if let Some(rest) = line.strip_prefix(delimiter) {
            let is_close = rest == b"--";
            if rest.is_empty() || is_close {
                if let Some(start) = part_start {
                    let end = strip_line_break(body, start, pos);
                    parts.push(&body[start..end]);
                }
                if is_close {
                    return parts;
                }
                part_start = Some(next);
            }
        }
        pos = next;
        if line_end == body.len() {
            break;
        }
    }

    if let Some(start) = part_start {
        parts.push(&body[start.min(body.len())..]);
    }
    parts
}

/// Exclude the CRLF (or LF) that precedes a delimiter line at `end`
fn strip_line_break(body: &[u8], start: usize, mut end: usize) -> usize {
    if end > start && body[end - 1] == b'\n' {
        end -= 1;
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}
