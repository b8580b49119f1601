//! `Content-Type` and `Content-Transfer-Encoding` header values (RFC 2045)

use crate::message::MessageHeaders;

/// Parsed `Content-Type` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lowercased `type/subtype`
    pub mime_type: String,
    /// Parameters with lowercased names and unquoted values
    pub params: Vec<(String, String)>,
}

impl Default for ContentType {
    /// RFC 2045 default: `text/plain` with no declared charset
    fn default() -> Self {
        Self {
            mime_type: "text/plain".to_string(),
            params: vec![],
        }
    }
}

impl ContentType {
    /// Parse a header value such as `text/plain; charset="utf-8"`
    ///
    /// A value without a `/` yields the default type.
    pub fn parse(value: &str) -> Self {
        let mut pieces = split_params(value).into_iter();
        let mime_type = pieces
            .next()
            .map(|t| t.trim().to_ascii_lowercase())
            .filter(|t| t.contains('/'))
            .unwrap_or_else(|| "text/plain".to_string());

        let params = pieces
            .filter_map(|piece| {
                let (name, value) = piece.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                if name.is_empty() {
                    return None;
                }
                Some((name, unquote(value.trim())))
            })
            .collect();

        Self { mime_type, params }
    }

    /// Content type of a part, or the default when absent
    pub fn from_headers(headers: &MessageHeaders) -> Self {
        headers
            .get_ignore_case("Content-Type")
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// Look up a parameter by (case-insensitive) name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Declared charset, if any
    pub fn charset(&self) -> Option<&str> {
        self.param("charset").filter(|c| !c.is_empty())
    }

    /// Multipart boundary, if any
    pub fn boundary(&self) -> Option<&str> {
        self.param("boundary").filter(|b| !b.is_empty())
    }

    /// True for `multipart/*`
    pub fn is_multipart(&self) -> bool {
        self.mime_type.starts_with("multipart/")
    }

    /// True for exactly `text/plain`
    pub fn is_text_plain(&self) -> bool {
        self.mime_type == "text/plain"
    }
}

/// Split on `;` outside double quotes
fn split_params(value: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, ch) in value.char_indices() {
        match ch {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                pieces.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&value[start..]);
    pieces
}

fn unquote(value: &str) -> String {
    match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}

/// Body transfer encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEncoding {
    /// `7bit`, `8bit`, `binary` or absent: octets are used as-is
    Identity,
    /// `base64`
    Base64,
    /// `quoted-printable`
    QuotedPrintable,
    /// Anything else (treated as identity)
    Other(String),
}

impl TransferEncoding {
    /// Parse a `Content-Transfer-Encoding` value (case-insensitive)
    pub fn parse(value: &str) -> Self {
        let value = value.trim().to_ascii_lowercase();
        match value.as_str() {
            "" | "7bit" | "8bit" | "binary" => TransferEncoding::Identity,
            "base64" => TransferEncoding::Base64,
            "quoted-printable" => TransferEncoding::QuotedPrintable,
            _ => TransferEncoding::Other(value),
        }
    }

    /// Transfer encoding of a part, identity when absent
    pub fn from_headers(headers: &MessageHeaders) -> Self {
        headers
            .get_ignore_case("Content-Transfer-Encoding")
            .map(Self::parse)
            .unwrap_or(TransferEncoding::Identity)
    }
}
