//! Protocol response types and reply codes

/// Line grammar spoken by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Retrieval dialect: `+OK` / `-ERR` status lines (RFC 1939)
    Pop3,
    /// Submission dialect: 3-digit reply codes (RFC 5321)
    Smtp,
}

/// Classified status of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// `+OK` or 2xx
    Positive,
    /// 3xx, or a POP3 `+ ` SASL continuation
    Intermediate,
    /// `-ERR`, 4xx or 5xx
    Negative,
}

/// A server reply: classified status line plus optional multi-line body
#[derive(Debug, Clone)]
pub struct Response {
    /// Classified status
    pub status: Status,
    /// 3-digit reply code (submission dialect only)
    pub code: Option<u16>,
    /// Full status line without the trailing CRLF
    pub line: String,
    /// Status text following the `+OK`/`-ERR` token or the reply code
    pub message: String,
    /// Text of the `250-...` lines that preceded the final line of an SMTP reply
    pub continuation: Vec<String>,
    /// Octets between the status line and the `CRLF . CRLF` terminator
    pub body: Option<Vec<u8>>,
    /// Every octet consumed for this reply, line terminators included
    ///
    /// For a multi-line reply this is status line, body and terminator, so it
    /// always ends with `CRLF . CRLF`.
    pub raw: Vec<u8>,
}

impl Response {
    /// Check if the reply reports success (`+OK`, 2xx or 3xx)
    pub fn is_ok(&self) -> bool {
        self.status != Status::Negative
    }

    /// Check if the reply is a final positive completion (`+OK` or 2xx)
    pub fn is_success(&self) -> bool {
        self.status == Status::Positive
    }

    /// Check if the reply asks for more input (3xx)
    pub fn is_intermediate(&self) -> bool {
        self.status == Status::Intermediate
    }

    /// Check if the reply reports failure (`-ERR`, 4xx, 5xx)
    pub fn is_negative(&self) -> bool {
        self.status == Status::Negative
    }

    /// Body lines with transparency dots removed (`..x` becomes `.x`)
    pub fn lines(&self) -> Vec<String> {
        split_body_lines(self.body.as_deref().unwrap_or_default())
            .map(|line| String::from_utf8_lossy(unstuff(line)).into_owned())
            .collect()
    }

    /// Body octets with transparency dots removed, each line ending in CRLF
    pub fn payload(&self) -> Vec<u8> {
        let body = self.body.as_deref().unwrap_or_default();
        let mut payload = Vec::with_capacity(body.len() + 2);
        for line in split_body_lines(body) {
            payload.extend_from_slice(unstuff(line));
            payload.extend_from_slice(b"\r\n");
        }
        payload
    }
}

/// Split a multi-line body on LF, dropping the CR of each CRLF
fn split_body_lines(body: &[u8]) -> impl Iterator<Item = &[u8]> {
    let lines = if body.is_empty() {
        None
    } else {
        Some(body.split(|&b| b == b'\n'))
    };
    lines
        .into_iter()
        .flatten()
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Strip the transparency dot from a dot-stuffed line
fn unstuff(line: &[u8]) -> &[u8] {
    if line.starts_with(b"..") {
        &line[1..]
    } else {
        line
    }
}

/// SMTP reply codes (RFC 5321 Section 4.2.3)
#[allow(dead_code)]
pub mod codes {
    // 2xx - Positive completion
    /// Service ready (greeting, STARTTLS go-ahead)
    pub const SERVICE_READY: u16 = 220;
    /// Service closing transmission channel
    pub const CLOSING: u16 = 221;
    /// Authentication succeeded (RFC 4954)
    pub const AUTH_SUCCESS: u16 = 235;
    /// Requested mail action okay, completed
    pub const OK: u16 = 250;
    /// User not local; will forward
    pub const WILL_FORWARD: u16 = 251;

    // 3xx - Positive intermediate
    /// Server challenge (RFC 4954)
    pub const AUTH_CONTINUE: u16 = 334;
    /// Start mail input; end with <CRLF>.<CRLF>
    pub const START_MAIL_INPUT: u16 = 354;

    // 4xx - Transient negative completion
    /// Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: u16 = 421;
    /// Mailbox unavailable (busy)
    pub const MAILBOX_BUSY: u16 = 450;
    /// TLS not available due to temporary reason (RFC 3207)
    pub const TLS_NOT_AVAILABLE: u16 = 454;

    // 5xx - Permanent negative completion
    /// Syntax error, command unrecognized
    pub const COMMAND_UNRECOGNIZED: u16 = 500;
    /// Bad sequence of commands
    pub const BAD_SEQUENCE: u16 = 503;
    /// Authentication credentials invalid (RFC 4954)
    pub const AUTH_INVALID: u16 = 535;
    /// Mailbox unavailable (not found, no access)
    pub const MAILBOX_UNAVAILABLE: u16 = 550;
    /// Transaction failed
    pub const TRANSACTION_FAILED: u16 = 554;
}
