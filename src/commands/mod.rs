//! POP3 and SMTP command builders and response parsers
//!
//! Builders return the command text without the line terminator; the session
//! appends CRLF when the line is written.

pub mod headers;
pub mod listing;
pub mod response;

pub use headers::*;
pub use listing::*;
pub use response::*;

// Retrieval dialect (RFC 1939)

/// Build USER command
pub fn user(name: &str) -> String {
    format!("USER {}", name)
}

/// Build PASS command
pub fn pass(secret: &str) -> String {
    format!("PASS {}", secret)
}

/// Build STAT command
pub fn stat() -> &'static str {
    "STAT"
}

/// Build LIST command
pub fn list() -> &'static str {
    "LIST"
}

/// Build RETR command
pub fn retr(index: u32) -> String {
    format!("RETR {}", index)
}

/// Build DELE command
pub fn dele(index: u32) -> String {
    format!("DELE {}", index)
}

/// Build RSET command (undo deletion marks, or abort an SMTP transaction)
pub fn rset() -> &'static str {
    "RSET"
}

/// Build NOOP command
pub fn noop() -> &'static str {
    "NOOP"
}

/// Build TOP command
pub fn top(index: u32, lines: u32) -> String {
    format!("TOP {} {}", index, lines)
}

/// Build STLS command (RFC 2595)
pub fn stls() -> &'static str {
    "STLS"
}

/// Build QUIT command
pub fn quit() -> &'static str {
    "QUIT"
}

// Submission dialect (RFC 5321)

/// Build EHLO command
pub fn ehlo(domain: &str) -> String {
    format!("EHLO {}", domain)
}

/// Build HELO command (for servers that reject EHLO)
pub fn helo(domain: &str) -> String {
    format!("HELO {}", domain)
}

/// Build STARTTLS command (RFC 3207)
pub fn starttls() -> &'static str {
    "STARTTLS"
}

/// Build AUTH command, with an initial response when the mechanism has one (RFC 4954)
pub fn auth(mechanism: &str, initial_response: Option<&str>) -> String {
    match initial_response {
        Some(data) => format!("AUTH {} {}", mechanism, data),
        None => format!("AUTH {}", mechanism),
    }
}

/// Build AUTH PLAIN command with initial response
pub fn auth_plain(initial_response: &str) -> String {
    auth("PLAIN", Some(initial_response))
}

/// Build MAIL FROM command
pub fn mail_from(address: &str) -> String {
    format!("MAIL FROM:<{}>", address)
}

/// Build RCPT TO command
pub fn rcpt_to(address: &str) -> String {
    format!("RCPT TO:<{}>", address)
}

/// Build DATA command
pub fn data() -> &'static str {
    "DATA"
}

/// Replace credentials in a command line before it is logged or reported
pub fn redact(command: &str) -> String {
    let upper = command.to_ascii_uppercase();
    if upper.starts_with("PASS ") {
        return "PASS ****".to_string();
    }
    if upper.starts_with("AUTH ") {
        let mut words = command.split_whitespace();
        if let (Some(_), Some(mechanism), Some(_)) = (words.next(), words.next(), words.next()) {
            return format!("AUTH {} ****", mechanism.to_ascii_uppercase());
        }
    }
    command.to_string()
}
