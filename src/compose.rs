//! Outgoing message composition
//!
//! Builds a single-part `text/plain` UTF-8 message ready for `DATA`:
//! base64 body in 76-column lines, RFC 2047 encoded subject when it is not
//! plain ASCII, generated `Date` and `Message-ID`.

use std::fmt::Write as _;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{MailError, Result};

/// Line length of the base64 body (RFC 2045 Section 6.8)
const BODY_LINE_LEN: usize = 76;

/// Raw octets per encoded word; keeps each `=?utf-8?b?...?=` within 75 chars
const WORD_CHUNK_LEN: usize = 45;

/// Check that an address has the shape `local@domain.tld`
///
/// Both parts may contain letters, digits, `_`, `.` and `-`; the domain
/// needs at least one dot followed by a non-empty label.
///
/// ```
/// use mailwire::compose::is_valid_address;
///
/// assert!(is_valid_address("alice@example.com"));
/// assert!(is_valid_address("first.last-1@mail.example.co"));
/// assert!(!is_valid_address("alice@localhost"));
/// assert!(!is_valid_address("alice example.com"));
/// assert!(!is_valid_address("<alice@example.com>"));
/// ```
pub fn is_valid_address(address: &str) -> bool {
    fn word(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }
    fn atom(c: char) -> bool {
        word(c) || c == '.' || c == '-'
    }

    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.chars().all(atom) || !domain.chars().all(atom) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((head, tld)) => !head.is_empty() && !tld.is_empty() && tld.chars().all(word),
        None => false,
    }
}

/// Validate an address, naming it in the error
pub fn validate_address(address: &str) -> Result<()> {
    if is_valid_address(address) {
        Ok(())
    } else {
        Err(MailError::InvalidAddress(address.to_string()))
    }
}

/// Check a header field name: one or more printable ASCII characters, no `:`
fn validate_header_name(name: &str) -> Result<()> {
    let valid = !name.is_empty() && name.bytes().all(|b| b.is_ascii_graphic() && b != b':');
    if valid {
        Ok(())
    } else {
        Err(MailError::InvalidInput(format!("header name {:?}", name)))
    }
}

/// Encode a header value as RFC 2047 `B` words when it is not plain ASCII
///
/// Long values are split into several words on character boundaries and
/// folded onto continuation lines.
///
/// ```
/// use mailwire::compose::encode_header_value;
///
/// assert_eq!(encode_header_value("Hello"), "Hello");
/// assert_eq!(encode_header_value("Привет"), "=?utf-8?b?0J/RgNC40LLQtdGC?=");
/// ```
pub fn encode_header_value(value: &str) -> String {
    if value.is_ascii() && !value.contains(['\r', '\n']) {
        return value.to_string();
    }

    let mut words = Vec::new();
    let mut chunk_start = 0;
    let mut chunk_end = 0;
    for (idx, ch) in value.char_indices() {
        let next = idx + ch.len_utf8();
        if next - chunk_start > WORD_CHUNK_LEN && chunk_end > chunk_start {
            words.push(&value[chunk_start..chunk_end]);
            chunk_start = chunk_end;
        }
        chunk_end = next;
    }
    if chunk_end > chunk_start {
        words.push(&value[chunk_start..chunk_end]);
    }

    words
        .iter()
        .map(|word| format!("=?utf-8?b?{}?=", STANDARD.encode(word)))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

/// Apply SMTP transparency and append the end-of-data line
///
/// Line endings are normalized to CRLF, every line starting with `.` gets a
/// second dot (RFC 5321 Section 4.5.2) and `.` CRLF is appended.
pub fn dot_stuff(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + payload.len() / 64 + 5);
    if !payload.is_empty() {
        let body = payload.strip_suffix(b"\n").unwrap_or(payload);
        for line in body.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}

/// A plain-text message to submit
///
/// # Example
///
/// ```
/// use mailwire::OutgoingMessage;
///
/// let message = OutgoingMessage::new("alice@example.com", "bob@example.com", "Hi", "Hello Bob")
///     .date("Mon, 01 Jan 2024 00:00:00 +0000")
///     .message_id("<1@example.com>");
///
/// let rendered = message.render();
/// assert!(rendered.starts_with("From: alice@example.com\r\n"));
/// assert!(rendered.contains("Content-Transfer-Encoding: base64\r\n"));
/// assert!(rendered.ends_with("\r\n\r\nSGVsbG8gQm9i\r\n"));
/// ```
#[must_use]
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    from: String,
    to: Vec<String>,
    subject: String,
    body: String,
    date: Option<String>,
    message_id: Option<String>,
    extra: Vec<(String, String)>,
}

impl OutgoingMessage {
    /// Create a message with one recipient
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            subject: subject.into(),
            body: body.into(),
            date: None,
            message_id: None,
            extra: Vec::new(),
        }
    }

    /// Add another recipient
    pub fn add_recipient(mut self, to: impl Into<String>) -> Self {
        self.to.push(to.into());
        self
    }

    /// Set the Date header (generated from the local clock if not provided)
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Set the Message-ID header (generated if not provided)
    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Add a header; non-ASCII values are encoded
    ///
    /// The name is checked by [`validate`](Self::validate).
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((name.into(), value.into()));
        self
    }

    /// Envelope sender
    pub fn sender(&self) -> &str {
        &self.from
    }

    /// Envelope recipients
    pub fn recipients(&self) -> &[String] {
        &self.to
    }

    /// Check the sender, every recipient and the extra header names
    ///
    /// # Errors
    ///
    /// - [`MailError::InvalidAddress`] naming the first bad address, or an
    ///   empty string when there are no recipients
    /// - [`MailError::InvalidInput`] for a header name that is not printable
    ///   ASCII without `:` (RFC 5322 Section 2.2)
    pub fn validate(&self) -> Result<()> {
        validate_address(&self.from)?;
        if self.to.is_empty() {
            return Err(MailError::InvalidAddress(String::new()));
        }
        self.to.iter().try_for_each(|to| validate_address(to))?;
        self.extra
            .iter()
            .try_for_each(|(name, _)| validate_header_name(name))
    }

    /// Serialize headers and base64 body with CRLF line endings
    ///
    /// The result is not dot-stuffed; see [`dot_stuff`].
    pub fn render(&self) -> String {
        let date = self.date.clone().unwrap_or_else(|| {
            use chrono::Local;
            Local::now().format("%a, %d %b %Y %H:%M:%S %z").to_string()
        });
        let message_id = self.message_id.clone().unwrap_or_else(|| {
            use uuid::Uuid;
            let domain = self.from.rsplit_once('@').map_or("localhost", |(_, d)| d);
            format!("<{}@{}>", Uuid::new_v4(), domain)
        });

        let encoded = STANDARD.encode(self.body.as_bytes());
        let mut result = String::with_capacity(512 + encoded.len() + encoded.len() / BODY_LINE_LEN * 2);

        // SAFETY: write! to String is infallible (OOM aside)
        #[expect(clippy::unwrap_used)]
        {
            write!(result, "From: {}\r\n", self.from).unwrap();
            write!(result, "To: {}\r\n", self.to.join(", ")).unwrap();
            write!(result, "Subject: {}\r\n", encode_header_value(&self.subject)).unwrap();
            write!(result, "Date: {}\r\n", date).unwrap();
            write!(result, "Message-ID: {}\r\n", message_id).unwrap();
            for (name, value) in &self.extra {
                write!(result, "{}: {}\r\n", name, encode_header_value(value)).unwrap();
            }
        }
        result.push_str("MIME-Version: 1.0\r\n");
        result.push_str("Content-Type: text/plain; charset=\"utf-8\"\r\n");
        result.push_str("Content-Transfer-Encoding: base64\r\n");
        result.push_str("\r\n");

        // base64 output is ASCII, so byte chunks are valid str slices
        for line in encoded.as_bytes().chunks(BODY_LINE_LEN) {
            result.push_str(&String::from_utf8_lossy(line));
            result.push_str("\r\n");
        }
        result
    }
}
