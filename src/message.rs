//! Mailbox data returned to callers

/// One entry of a `LIST` reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListEntry {
    /// Message number (not necessarily contiguous)
    pub index: u32,
    /// Size in octets as reported by the server
    pub size: u64,
}

/// Parsed `STAT` reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MailboxStat {
    /// Number of messages in the maildrop
    pub count: u32,
    /// Total size in octets
    pub size: u64,
}

/// Ordered header fields
///
/// Names are stored as received. Setting a name that is already present
/// replaces its value in place, so the last occurrence wins while the
/// original position is kept.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageHeaders {
    fields: Vec<(String, String)>,
}

impl MessageHeaders {
    /// Create an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header value (name compared case-sensitively)
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Look up a header by its exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a header ignoring ASCII case; the last matching field wins
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Append folded continuation text to an existing value
    pub(crate) fn append_folded(&mut self, name: &str, text: &str) {
        if let Some((_, value)) = self.fields.iter_mut().find(|(n, _)| n == name) {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(text);
        }
    }

    /// Iterate over `(name, value)` pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of distinct header names
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no header was parsed
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Apply a function to every value, keeping names and order
    pub(crate) fn map_values(self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            fields: self
                .fields
                .into_iter()
                .map(|(n, v)| {
                    let decoded = f(&v);
                    (n, decoded)
                })
                .collect(),
        }
    }

    /// Convenience accessor for `Subject`
    pub fn subject(&self) -> Option<&str> {
        self.get_ignore_case("Subject")
    }

    /// Convenience accessor for `From`
    pub fn sender(&self) -> Option<&str> {
        self.get_ignore_case("From")
    }

    /// Convenience accessor for `Date`
    pub fn date(&self) -> Option<&str> {
        self.get_ignore_case("Date")
    }
}

/// A retrieved message with decoded headers and display text
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedMessage {
    /// Header values with encoded words resolved
    pub headers: MessageHeaders,
    /// Text of the selected body part
    pub body_text: String,
}

/// Listing entry enriched with the message's decoded headers (via `TOP n 0`)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageSummary {
    /// Message number
    pub index: u32,
    /// Size in octets
    pub size: u64,
    /// Decoded header fields
    pub headers: MessageHeaders,
}
