//! EHLO extension keywords (RFC 5321 Section 4.1.1.1)
//!
//! The first line of a positive `EHLO` reply names the server; every
//! following line is an extension keyword with optional parameters.

use std::collections::HashMap;

use crate::response::Response;

/// Extensions advertised by a submission server
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct EhloCapabilities {
    /// Server's self-reported domain from the first reply line
    domain: String,
    /// Keyword (uppercase) to parameters
    /// Example: "AUTH" -> ["PLAIN", "LOGIN"]
    extensions: HashMap<String, Vec<String>>,
}

impl EhloCapabilities {
    /// Parse extensions from the lines of an EHLO reply (status codes removed)
    ///
    /// # Example
    /// ```text
    /// mail.example.com Hello client
    /// SIZE 35882577
    /// STARTTLS
    /// AUTH PLAIN LOGIN
    /// ```
    pub fn parse(lines: &[String]) -> Self {
        let mut lines = lines.iter();
        let domain = lines
            .next()
            .and_then(|greeting| greeting.split_whitespace().next())
            .unwrap_or_default()
            .to_string();

        let mut extensions = HashMap::new();
        for line in lines {
            let mut parts = line.split_whitespace();
            let Some(keyword) = parts.next() else {
                continue;
            };
            // Some servers still send the pre-standard "AUTH=PLAIN LOGIN" form
            let (keyword, first_arg) = match keyword.split_once('=') {
                Some((keyword, arg)) => (keyword, Some(arg)),
                None => (keyword, None),
            };
            let args: Vec<String> = first_arg
                .into_iter()
                .chain(parts)
                .filter(|arg| !arg.is_empty())
                .map(str::to_string)
                .collect();

            extensions
                .entry(keyword.to_ascii_uppercase())
                .or_insert_with(Vec::new)
                .extend(args);
        }

        Self { domain, extensions }
    }

    /// Parse the continuation and final lines of an `EHLO` reply
    pub fn from_response(response: &Response) -> Self {
        let mut lines = response.continuation.clone();
        lines.push(response.message.clone());
        Self::parse(&lines)
    }

    /// Domain the server announced
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Check if an extension is advertised
    #[must_use]
    pub fn has(&self, keyword: &str) -> bool {
        self.extensions.contains_key(&keyword.to_ascii_uppercase())
    }

    /// Parameters of an extension, or None if it is not advertised
    #[must_use]
    pub fn get_args(&self, keyword: &str) -> Option<&Vec<String>> {
        self.extensions.get(&keyword.to_ascii_uppercase())
    }

    /// Check for an extension parameter, e.g. `("AUTH", "PLAIN")`
    pub fn has_arg(&self, keyword: &str, arg: &str) -> bool {
        self.get_args(keyword)
            .map(|args| args.iter().any(|a| a.eq_ignore_ascii_case(arg)))
            .unwrap_or(false)
    }

    /// True when `STARTTLS` is advertised
    pub fn supports_starttls(&self) -> bool {
        self.has("STARTTLS")
    }

    /// SASL mechanisms listed under `AUTH`
    pub fn auth_mechanisms(&self) -> &[String] {
        self.get_args("AUTH").map(Vec::as_slice).unwrap_or(&[])
    }

    /// Maximum message size from `SIZE`, if declared and non-zero
    pub fn max_size(&self) -> Option<u64> {
        self.get_args("SIZE")
            .and_then(|args| args.first())
            .and_then(|size| size.parse().ok())
            .filter(|&size| size > 0)
    }
}
