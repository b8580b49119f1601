//! RFC 2047 Sections 4-6 - Encoded word syntax and decoding

use mailwire::mime::{HeaderSegment, WordEncoding, parse_segments};
use mailwire::decode_header_value;

#[test]
fn test_base64_utf8_cyrillic() {
    assert_eq!(decode_header_value("=?UTF-8?B?0J/RgNC40LLQtdGC?="), "Привет");
}

#[test]
fn test_lowercase_encoding_letter() {
    assert_eq!(decode_header_value("=?utf-8?b?0J/RgNC40LLQtdGC?="), "Привет");
    assert_eq!(decode_header_value("=?iso-8859-1?q?Gr=FC=DFe?="), "Grüße");
}

#[test]
fn test_q_underscore_is_space() {
    assert_eq!(
        decode_header_value("=?ISO-8859-1?Q?Keith_Moore?= <moore@cs.utk.edu>"),
        "Keith Moore <moore@cs.utk.edu>"
    );
}

#[test]
fn test_rfc2047_section8_examples() {
    // (a) => "a"
    assert_eq!(decode_header_value("(=?ISO-8859-1?Q?a?=)"), "(a)");
    // Whitespace between adjacent encoded words is ignored
    assert_eq!(decode_header_value("(=?ISO-8859-1?Q?a?= =?ISO-8859-1?Q?b?=)"), "(ab)");
    assert_eq!(
        decode_header_value("(=?ISO-8859-1?Q?a?=\r\n    =?ISO-8859-1?Q?b?=)"),
        "(ab)"
    );
    // Encoded underscore keeps the space
    assert_eq!(decode_header_value("(=?ISO-8859-1?Q?a_b?=)"), "(a b)");
    // Text between words is kept
    assert_eq!(decode_header_value("(=?ISO-8859-1?Q?a?= b)"), "(a b)");
}

#[test]
fn test_stateful_charset() {
    assert_eq!(decode_header_value("=?ISO-2022-JP?B?GyRCRnxLXDhsGyhC?="), "日本語");
}

#[test]
fn test_language_suffix_ignored() {
    // RFC 2231 Section 5: charset*language
    assert_eq!(decode_header_value("=?US-ASCII*EN?Q?Keith_Moore?="), "Keith Moore");
}

#[test]
fn test_mixed_charsets() {
    let value = "=?UTF-8?B?0J/RgNC40LLQtdGC?= =?ISO-8859-1?B?R3L832U=?=";
    assert_eq!(decode_header_value(value), "ПриветGrüße");
}

#[test]
fn test_segments_tag_plain_and_encoded() {
    let segments = parse_segments("Re: =?KOI8-R?B?8NLJ18XU?=");
    assert_eq!(
        segments,
        vec![
            HeaderSegment::PlainText("Re: ".to_string()),
            HeaderSegment::EncodedWord {
                charset: "KOI8-R".to_string(),
                encoding: WordEncoding::Base64,
                raw: vec![0xf0, 0xd2, 0xc9, 0xd7, 0xc5, 0xd4],
            },
        ]
    );
    assert_eq!(segments[1].resolve(), "Привет");
}

#[test]
fn test_not_an_encoded_word() {
    for value in ["", "plain", "100% =?", "=?=", "=?UTF-8?B?", "a ?= b =? c"] {
        assert_eq!(decode_header_value(value), value);
    }
}

#[test]
fn test_q_escape_needs_two_hex_digits() {
    assert_eq!(decode_header_value("=?ISO-8859-1?Q?a=+1b?="), "a=+1b");
    assert_eq!(decode_header_value("=?ISO-8859-1?Q?=-Ax?="), "=-Ax");
}
