//! Session transcript capability
//!
//! Every session is constructed with an `Arc<dyn Transcript>` and reports its
//! wire traffic and lifecycle through it. Credentials are redacted before an
//! event is built, so implementations never see secrets.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, trace, warn};

/// One observable step of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// TCP (and, for implicit TLS, TLS) connection established
    Connected {
        /// Peer host
        host: String,
        /// Peer port
        port: u16,
    },
    /// Command line written (without CRLF, credentials redacted)
    Sent(String),
    /// Status line received (without CRLF)
    Received(String),
    /// Multi-line reply received
    ReceivedMultiline {
        /// Status line of the reply
        status: String,
        /// Total octets in the frame, terminator included
        bytes: usize,
    },
    /// In-band TLS upgrade completed
    TlsUpgraded,
    /// An operation failed
    Error(String),
    /// Connection released
    Closed,
}

impl TranscriptEvent {
    /// Direction tag and text, as written to transcript files
    fn render(&self) -> (&'static str, String) {
        match self {
            TranscriptEvent::Connected { host, port } => {
                ("INFO:", format!("connected to {}:{}", host, port))
            }
            TranscriptEvent::Sent(line) => ("CLIENT:", line.clone()),
            TranscriptEvent::Received(line) => ("SERVER:", line.clone()),
            TranscriptEvent::ReceivedMultiline { status, bytes } => {
                ("SERVER:", format!("{} [multi-line, {} bytes]", status, bytes))
            }
            TranscriptEvent::TlsUpgraded => ("INFO:", "TLS established".to_string()),
            TranscriptEvent::Error(text) => ("ERROR:", text.clone()),
            TranscriptEvent::Closed => ("INFO:", "connection closed".to_string()),
        }
    }
}

/// Sink for session events
pub trait Transcript: Send + Sync {
    /// Record one event
    fn record(&self, event: &TranscriptEvent);
}

/// Forwards events to `tracing` (the default)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTranscript;

impl Transcript for TracingTranscript {
    fn record(&self, event: &TranscriptEvent) {
        match event {
            TranscriptEvent::Sent(line) => trace!("C: {}", line),
            TranscriptEvent::Received(line) => trace!("S: {}", line),
            TranscriptEvent::ReceivedMultiline { status, bytes } => {
                trace!("S: {} ({} bytes)", status, bytes)
            }
            TranscriptEvent::Error(text) => warn!("{}", text),
            other => {
                let (_, text) = other.render();
                debug!("{}", text);
            }
        }
    }
}

/// Appends timestamped lines to a log file
///
/// Lines look like `[2024-05-01 12:00:00] CLIENT: RETR 1`.
#[derive(Debug)]
pub struct FileTranscript {
    file: Mutex<File>,
}

impl FileTranscript {
    /// Open (or create) `path` in append mode
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Open a fresh file named after the current local time in `dir`
    ///
    /// The name has the form `mail_session_YYYYmmdd_HHMMSS.log`.
    pub fn create_in(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let name = format!(
            "mail_session_{}.log",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        Self::open(dir.as_ref().join(name))
    }
}

impl Transcript for FileTranscript {
    fn record(&self, event: &TranscriptEvent) {
        let (direction, text) = event.render();
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        // A panic elsewhere while holding the lock leaves the file usable
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "[{}] {} {}", timestamp, direction, text) {
            warn!("Failed to write transcript: {}", e);
        }
    }
}

/// Keeps events in memory for later inspection
#[derive(Debug, Default)]
pub struct MemoryTranscript {
    events: Mutex<Vec<TranscriptEvent>>,
}

impl MemoryTranscript {
    /// Create an empty transcript
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<TranscriptEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Command lines sent, in order
    pub fn sent(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TranscriptEvent::Sent(line) => Some(line),
                _ => None,
            })
            .collect()
    }
}

impl Transcript for MemoryTranscript {
    fn record(&self, event: &TranscriptEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Default transcript used when none is supplied
pub(crate) fn default_transcript() -> Arc<dyn Transcript> {
    Arc::new(TracingTranscript)
}
