//! Charset resolution: declared label, then detection, then lossy UTF-8
//!
//! Every path ends in a `String`; failures are logged and degrade to
//! replacement characters.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use tracing::warn;

use crate::error::{MailError, Result};

/// Labels WHATWG maps to windows-1252 that mean 7-bit ASCII in mail
const ASCII_LABELS: &[&str] = &[
    "us-ascii",
    "ascii",
    "us",
    "ansi_x3.4-1968",
    "iso646-us",
    "iso-ir-6",
    "cp367",
    "ibm367",
    "csascii",
];

/// Decode `bytes` strictly with the charset named by `label`
///
/// Accepts WHATWG labels (`utf-8`, `koi8-r`, `iso-8859-1`, `cp1251`, ...).
/// ASCII labels reject any octet above 0x7F. An RFC 2231 language suffix
/// (`utf-8*en`) is ignored.
pub(crate) fn decode_strict(bytes: &[u8], label: &str) -> Result<String> {
    let label = label.split('*').next().unwrap_or(label).trim();
    if ASCII_LABELS.iter().any(|ascii| ascii.eq_ignore_ascii_case(label)) {
        return match std::str::from_utf8(bytes) {
            Ok(text) if bytes.is_ascii() => Ok(text.to_string()),
            _ => Err(MailError::Decode(format!("8-bit data declared as {}", label))),
        };
    }

    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| MailError::Decode(format!("unknown charset {:?}", label)))?;
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| MailError::Decode(format!("malformed {} data", encoding.name())))
}

/// Guess the charset of `bytes` and decode strictly with the guess
pub(crate) fn decode_detected(bytes: &[u8]) -> Result<String> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
        .ok_or_else(|| {
            MailError::Decode(format!("detected {} does not fit the data", encoding.name()))
        })
}

/// Turn octets into text
///
/// Tries the declared charset, then detection, then UTF-8 with U+FFFD
/// substitution. Never fails.
pub fn decode_text(bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(label) = declared {
        match decode_strict(bytes, label) {
            Ok(text) => return text,
            Err(e) => warn!("{}; detecting charset", e),
        }
    }

    match decode_detected(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("{}; using UTF-8 with replacement", e);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
