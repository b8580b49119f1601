#![doc = include_str!("../README.md")]

/// POP3 and SMTP command builders and response parsers
pub mod commands;
/// Outgoing message composition and address checks
pub mod compose;
mod config;
mod error;
mod message;
/// MIME decoding: encoded words, transfer encodings, charsets, multipart
pub mod mime;
mod pop3;
mod response;
/// SASL authentication framework (RFC 4954)
pub mod sasl;
mod session;
mod smtp;
/// Session transcripts (wire log sinks)
pub mod transcript;

pub use compose::{OutgoingMessage, is_valid_address};
pub use config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, ServerConfig, TlsMode};
pub use error::{MailError, Result};
pub use message::{DecodedMessage, ListEntry, MailboxStat, MessageHeaders, MessageSummary};
pub use mime::{decode_body, decode_header_value, decode_message};
pub use pop3::Pop3Client;
pub use response::{Dialect, Response, Status, codes};
pub use sasl::{SaslLogin, SaslMechanism, SaslPlain};
pub use session::{AuthState, LifecycleState, Session, TransportState};
pub use smtp::{EhloCapabilities, SmtpClient};
pub use transcript::{FileTranscript, MemoryTranscript, Transcript, TracingTranscript, TranscriptEvent};
