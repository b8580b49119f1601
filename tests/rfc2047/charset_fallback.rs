//! Charset resolution: declared charset, detection, then UTF-8 with replacement

use mailwire::decode_header_value;
use mailwire::mime::decode_text;

#[test]
fn test_unknown_charset_detects_utf8() {
    // base64("Привет") labelled with a charset nobody knows
    assert_eq!(decode_header_value("=?x-no-such-charset?B?0J/RgNC40LLQtdGC?="), "Привет");
}

const PANGRAM: &str = "Съешь же ещё этих мягких французских булок, да выпей чаю";

#[test]
fn test_unknown_charset_detects_single_byte() {
    // windows-1251 bytes under a bogus label
    let decoded = decode_header_value(
        "=?bogus?B?0frl+Pwg5uUg5fm4IP3y6PUg7P/j6uj1IPTw4O328+fx6uj1IOHz6+7qLCDk4CDi++/l6SD34P4=?=",
    );
    assert!(!decoded.is_empty());
    assert!(!decoded.contains('\u{FFFD}'), "detection should avoid replacement: {}", decoded);
}

#[test]
fn test_wrong_declared_charset_recovers() {
    // Declared UTF-8 but the octets are windows-1251
    let (bytes, _, _) = encoding_rs::WINDOWS_1251.encode(PANGRAM);
    let decoded = decode_text(&bytes, Some("utf-8"));
    assert!(!decoded.is_empty());
    assert!(!decoded.contains('\u{FFFD}'), "detection should avoid replacement: {}", decoded);
}

#[test]
fn test_never_empty_never_panics() {
    let garbage = [0xFF, 0xFE, 0x00, 0x80, 0x81, 0xC0];
    let decoded = decode_text(&garbage, Some("no-such-charset"));
    assert!(!decoded.is_empty());

    let decoded = decode_header_value("=?bogus?B?//4AgIHA?=");
    assert!(!decoded.is_empty());
}

#[test]
fn test_declared_single_byte_charset() {
    assert_eq!(decode_header_value("=?windows-1252?B?gDEwMA==?="), "€100");
    assert_eq!(decode_text(&[0xf0, 0xd2, 0xc9, 0xd7, 0xc5, 0xd4], Some("koi8-r")), "Привет");
}

#[test]
fn test_missing_charset_detects() {
    assert_eq!(decode_text("Grüße".as_bytes(), None), "Grüße");
}

#[test]
fn test_ascii_label_on_8bit_word_detects() {
    // base64 of UTF-8 "Привет" under a us-ascii label
    assert_eq!(decode_header_value("=?us-ascii?B?0J/RgNC40LLQtdGC?="), "Привет");
    assert_eq!(decode_header_value("=?ASCII?Q?Gr=C3=BC=C3=9Fe?="), "Grüße");
    assert_eq!(decode_header_value("=?us-ascii?Q?plain_text?="), "plain text");
}
