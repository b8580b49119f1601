//! MIME decoding pipeline
//!
//! Turns retrieved message octets into readable header values and body text:
//!
//! - [`decode_header_value`] resolves RFC 2047 encoded words
//! - [`decode_body`] removes a transfer encoding and resolves the charset
//! - [`select_body_part`] picks the displayable part of a multipart message
//! - [`decode_message`] runs the whole pipeline
//!
//! Charset resolution always tries the declared charset first, then
//! detection, then UTF-8 with replacement characters. Nothing in this module
//! returns an error; degraded decoding is logged with `tracing::warn!`.

mod body;
mod charset;
mod content_type;
mod encoded_words;

pub use body::{decode_body, decode_transfer, select_body_part};
pub use charset::decode_text;
pub use content_type::{ContentType, TransferEncoding};
pub use encoded_words::{HeaderSegment, WordEncoding, decode_header_value, parse_segments};

use crate::commands::{parse_header_block, split_message};
use crate::message::{DecodedMessage, MessageHeaders};

/// Resolve encoded words in every header value
pub fn decode_headers(headers: MessageHeaders) -> MessageHeaders {
    headers.map_values(decode_header_value)
}

/// Parse and decode the header block at the top of `raw`
///
/// Accepts a whole message or just its headers (as returned by `TOP n 0`).
pub fn decode_header_block(raw: &[u8]) -> MessageHeaders {
    let (head, _) = split_message(raw);
    decode_headers(parse_header_block(&decode_text(head, None)))
}

/// Decode a complete message: headers plus the selected body part
///
/// # Example
///
/// ```
/// use mailwire::mime::decode_message;
///
/// let raw = b"Subject: =?UTF-8?B?0J/RgNC40LLQtdGC?=\r\n\
/// Content-Type: text/plain; charset=utf-8\r\n\
/// Content-Transfer-Encoding: base64\r\n\
/// \r\n\
/// aGVsbG8=\r\n";
///
/// let message = decode_message(raw);
/// assert_eq!(message.headers.subject(), Some("Привет"));
/// assert_eq!(message.body_text, "hello");
/// ```
pub fn decode_message(raw: &[u8]) -> DecodedMessage {
    let (head, body) = split_message(raw);
    let raw_headers = parse_header_block(&decode_text(head, None));
    let body_text = select_body_part(&raw_headers, body);

    DecodedMessage {
        headers: decode_headers(raw_headers),
        body_text,
    }
}
