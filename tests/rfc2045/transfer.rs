//! RFC 2045 Section 6 - Content-Transfer-Encoding on whole messages

use mailwire::decode_message;
use mailwire::mime::{TransferEncoding, decode_body, decode_transfer};

#[test]
fn test_base64_body_with_declared_charset() {
    let raw = b"Subject: greeting\r\n\
Content-Type: text/plain; charset=\"UTF-8\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
0JTQvtCx0YDRi9C5INC00LXQvdGM\r\n";
    assert_eq!(decode_message(raw).body_text, "Добрый день");
}

#[test]
fn test_quoted_printable_latin1_body() {
    let raw = b"Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Caf=E9 d=E9j=E0 vu";
    assert_eq!(decode_message(raw).body_text, "Café déjà vu");
}

#[test]
fn test_header_names_are_case_insensitive() {
    let raw = b"content-type: text/plain; CHARSET=iso-8859-1\r\n\
content-transfer-encoding: BASE64\r\n\
\r\n\
R3L832UgYXVzIEJlcmxpbg==\r\n";
    assert_eq!(decode_message(raw).body_text, "Grüße aus Berlin");
}

#[test]
fn test_missing_content_type_defaults_to_text_plain() {
    let raw = b"From: a@example.com\r\n\r\nplain ascii\r\n";
    assert_eq!(decode_message(raw).body_text, "plain ascii\r\n");
}

#[test]
fn test_unknown_transfer_encoding_passes_through() {
    let raw = b"Content-Transfer-Encoding: x-uuencode\r\n\r\nbegin 644 f\r\n";
    assert_eq!(decode_message(raw).body_text, "begin 644 f\r\n");
    assert_eq!(
        TransferEncoding::parse("x-uuencode"),
        TransferEncoding::Other("x-uuencode".to_string())
    );
}

#[test]
fn test_identity_encodings() {
    for name in ["7bit", "8bit", "binary", ""] {
        assert_eq!(TransferEncoding::parse(name), TransferEncoding::Identity, "{:?}", name);
    }
    assert_eq!(decode_transfer(b"a\r\nb", &TransferEncoding::Identity), b"a\r\nb");
}

#[test]
fn test_corrupt_base64_never_panics() {
    let decoded = decode_body(b"@@@@\x00\xff", "base64", Some("utf-8"));
    assert!(!decoded.is_empty());
}

#[test]
fn test_message_without_body() {
    let message = decode_message(b"Subject: only headers\r\n");
    assert_eq!(message.headers.subject(), Some("only headers"));
    assert_eq!(message.body_text, "");
}

#[test]
fn test_8bit_body_mislabelled_as_ascii() {
    assert_eq!(decode_body("Привет, мир".as_bytes(), "8bit", Some("us-ascii")), "Привет, мир");

    let mut raw = b"Content-Type: text/plain; charset=US-ASCII\r\n\
Content-Transfer-Encoding: 8bit\r\n\
\r\n"
        .to_vec();
    raw.extend_from_slice("Grüße aus Berlin".as_bytes());
    assert_eq!(decode_message(&raw).body_text, "Grüße aus Berlin");
}

#[test]
fn test_ascii_body_with_ascii_label() {
    assert_eq!(decode_body(b"plain text", "7bit", Some("us-ascii")), "plain text");
}
