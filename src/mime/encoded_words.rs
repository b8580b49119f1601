//! RFC 2047 Encoded Words Support
//!
//! Header values are split into [`HeaderSegment`]s: plain text, or an encoded
//! word whose transfer encoding (`B` or `Q`) has already been removed. A
//! single resolution step turns each segment into text using the charset
//! chain from [`decode_text`].
//!
//! ```
//! use mailwire::mime::decode_header_value;
//!
//! let subject = decode_header_value("=?UTF-8?B?SGVsbG8gV29ybGQ=?=");
//! assert_eq!(subject, "Hello World");
//!
//! let name = decode_header_value("=?ISO-8859-1?Q?Andr=E9?= <andre@example.com>");
//! assert_eq!(name, "André <andre@example.com>");
//!
//! // Whitespace between adjacent encoded words is dropped
//! let text = decode_header_value("=?UTF-8?B?SGVsbG8=?= =?UTF-8?B?V29ybGQ=?=");
//! assert_eq!(text, "HelloWorld");
//! ```

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use super::charset::decode_text;
use crate::error::{MailError, Result};

/// Base64 engine accepting both padded and unpadded input
pub(crate) const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Transfer encoding of an encoded word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordEncoding {
    /// `B`: base64
    Base64,
    /// `Q`: quoted-printable variant, `_` is a space
    Q,
}

/// One piece of a header value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderSegment {
    /// Text outside any encoded word
    PlainText(String),
    /// Decoded octets of one or more adjacent encoded words sharing a charset
    EncodedWord {
        /// Declared charset label
        charset: String,
        /// Encoding of the first word
        encoding: WordEncoding,
        /// Octets after removing the B/Q encoding
        raw: Vec<u8>,
    },
}

impl HeaderSegment {
    /// Resolve to text: declared charset, detection, then lossy UTF-8
    pub fn resolve(&self) -> String {
        match self {
            HeaderSegment::PlainText(text) => text.clone(),
            HeaderSegment::EncodedWord { charset, raw, .. } => decode_text(raw, Some(charset)),
        }
    }
}

/// Decode a header value that may contain encoded words
///
/// - Whitespace between consecutive encoded words is removed
/// - Malformed encoded words are kept verbatim
/// - Plain text is returned as-is
pub fn decode_header_value(value: &str) -> String {
    parse_segments(value)
        .iter()
        .map(HeaderSegment::resolve)
        .collect()
}

/// Split a header value into plain and encoded segments
///
/// Adjacent encoded words with the same charset are merged so a multi-byte
/// character split across two words decodes correctly.
pub fn parse_segments(value: &str) -> Vec<HeaderSegment> {
    let mut segments: Vec<HeaderSegment> = Vec::new();
    let mut plain = String::new();
    let mut rest = value;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            plain.push_str(rest);
            break;
        };
        plain.push_str(&rest[..start]);
        let candidate = &rest[start..];

        let word = find_encoded_word_end(candidate)
            .and_then(|end| decode_word(&candidate[..end]).ok().map(|word| (end, word)));
        let Some((end, word)) = word else {
            plain.push_str("=?");
            rest = &candidate[2..];
            continue;
        };

        // RFC 2047: whitespace separating two encoded words is not displayed
        let only_space = plain.chars().all(|c| c.is_ascii_whitespace());
        let follows_word = matches!(segments.last(), Some(HeaderSegment::EncodedWord { .. }));
        if !(only_space && follows_word) && !plain.is_empty() {
            segments.push(HeaderSegment::PlainText(std::mem::take(&mut plain)));
        }
        plain.clear();

        push_word(&mut segments, word);
        rest = &candidate[end..];
    }

    if !plain.is_empty() {
        segments.push(HeaderSegment::PlainText(plain));
    }
    segments
}

fn push_word(segments: &mut Vec<HeaderSegment>, word: HeaderSegment) {
    if let (
        Some(HeaderSegment::EncodedWord {
            charset: prev_charset,
            raw: prev_raw,
            ..
        }),
        HeaderSegment::EncodedWord { charset, raw, .. },
    ) = (segments.last_mut(), &word)
    {
        if prev_charset.eq_ignore_ascii_case(charset) {
            prev_raw.extend_from_slice(raw);
            return;
        }
    }
    segments.push(word);
}

/// Decode one `=?charset?encoding?text?=` word into a segment
fn decode_word(encoded: &str) -> Result<HeaderSegment> {
    let inner = encoded
        .strip_prefix("=?")
        .and_then(|s| s.strip_suffix("?="))
        .ok_or_else(|| MailError::Decode(format!("not an encoded word: {}", encoded)))?;

    let mut parts = inner.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(text)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(MailError::Decode(format!("malformed encoded word: {}", encoded)));
    };
    if charset.is_empty() {
        return Err(MailError::Decode(format!("missing charset: {}", encoded)));
    }

    let (encoding, raw) = match encoding {
        "B" | "b" => (WordEncoding::Base64, decode_base64(text)?),
        "Q" | "q" => (WordEncoding::Q, decode_q(text)),
        other => {
            return Err(MailError::Decode(format!("unknown word encoding {:?}", other)));
        }
    };

    Ok(HeaderSegment::EncodedWord {
        charset: charset.to_string(),
        encoding,
        raw,
    })
}

/// Byte index after the closing `?=`, or None if `input` does not start with a word
fn find_encoded_word_end(input: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    if !input.starts_with("=?") {
        return None;
    }

    // charset?encoding?text?= needs three question marks after "=?"
    let mut question_count = 0;
    for i in 2..bytes.len() {
        match bytes[i] {
            b'?' => {
                question_count += 1;
                if question_count >= 3 && bytes.get(i + 1) == Some(&b'=') {
                    return Some(i + 2);
                }
            }
            b' ' | b'\t' | b'\r' | b'\n' => return None,
            _ => {}
        }
    }
    None
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    LENIENT_BASE64
        .decode(encoded)
        .map_err(|e| MailError::Decode(format!("Base64 decode error: {}", e)))
}

/// Q encoding: `_` is a space, `=XX` is a hex octet; bad escapes pass through
fn decode_q(encoded: &str) -> Vec<u8> {
    let bytes = encoded.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'_' => result.push(b' '),
            b'=' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(byte) => {
                        result.push(byte);
                        i += 2;
                    }
                    None => result.push(b'='),
                }
            }
            other => result.push(other),
        }
        i += 1;
    }

    result
}
