//! RFC 2046 Section 5.1 - Multipart bodies

use mailwire::decode_message;

#[test]
fn test_alternative_prefers_text_plain() {
    let raw = b"From: =?UTF-8?B?0JDQu9C40YHQsA==?= <alisa@example.ru>\r\n\
Subject: report\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative;\r\n\
 boundary=\"==alt==\"\r\n\
\r\n\
This is a multi-part message in MIME format.\r\n\
--==alt==\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>HTML version</p>\r\n\
--==alt==\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
0JTQvtCx0YDRi9C5INC00LXQvdGM\r\n\
--==alt==--\r\n";
    let message = decode_message(raw);

    assert_eq!(message.headers.sender(), Some("Алиса <alisa@example.ru>"));
    assert_eq!(message.body_text, "Добрый день");
}

#[test]
fn test_mixed_with_attachment() {
    let raw = b"Content-Type: multipart/mixed; boundary=frontier\r\n\
\r\n\
--frontier\r\n\
Content-Type: text/plain\r\n\
\r\n\
See attached.\r\n\
--frontier\r\n\
Content-Type: application/octet-stream\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
AAECAwQ=\r\n\
--frontier--\r\n";
    assert_eq!(decode_message(raw).body_text, "See attached.");
}

#[test]
fn test_nested_parts_are_searched_depth_first() {
    let raw = b"Content-Type: multipart/mixed; boundary=outer\r\n\
\r\n\
--outer\r\n\
Content-Type: multipart/related; boundary=middle\r\n\
\r\n\
--middle\r\n\
Content-Type: multipart/alternative; boundary=inner\r\n\
\r\n\
--inner\r\n\
Content-Type: text/html\r\n\
\r\n\
<i>deep</i>\r\n\
--inner\r\n\
Content-Type: text/plain; charset=iso-8859-1\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
Caf=E9 d=E9j=E0 vu\r\n\
--inner--\r\n\
--middle\r\n\
Content-Type: image/png\r\n\
\r\n\
PNG\r\n\
--middle--\r\n\
--outer\r\n\
Content-Type: text/plain\r\n\
\r\n\
later plain part\r\n\
--outer--\r\n";
    assert_eq!(decode_message(raw).body_text, "Café déjà vu");
}

#[test]
fn test_first_leaf_when_no_text_plain() {
    let raw = b"Content-Type: multipart/alternative; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<b>first</b>\r\n\
--b\r\n\
Content-Type: text/enriched\r\n\
\r\n\
<bold>second</bold>\r\n\
--b--\r\n";
    assert_eq!(decode_message(raw).body_text, "<b>first</b>");
}

#[test]
fn test_part_without_headers_is_text_plain() {
    let raw = b"Content-Type: multipart/mixed; boundary=b\r\n\
\r\n\
--b\r\n\
Content-Type: text/html\r\n\
\r\n\
<p>html</p>\r\n\
--b\r\n\
\r\n\
implicit plain\r\n\
--b--\r\n";
    assert_eq!(decode_message(raw).body_text, "implicit plain");
}

#[test]
fn test_unix_line_endings() {
    let raw = b"Content-Type: multipart/alternative; boundary=b\n\
\n\
--b\n\
Content-Type: text/plain\n\
\n\
lf only\n\
--b--\n";
    assert_eq!(decode_message(raw).body_text, "lf only");
}

#[test]
fn test_missing_boundary_decodes_whole_body() {
    let raw = b"Content-Type: multipart/mixed\r\n\r\nno parts here\r\n";
    assert_eq!(decode_message(raw).body_text, "no parts here\r\n");
}
