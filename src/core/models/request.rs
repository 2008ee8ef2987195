use std::collections::BTreeMap;

use crate::core::errors::{ClairError, Result};

/// Header lookup on an inbound request.
///
/// Implementations must treat header names case-insensitively.
pub trait RequestHeaders {
    fn header(&self, name: &str) -> Option<&str>;
}

/// A plain bag of request headers, keyed by lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    headers: BTreeMap<String, String>,
}

impl RequestInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_lowercase(), value.into());
        self
    }

    /// Parse `name: value` lines, as given on the command line.
    pub fn from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        let mut info = Self::new();
        for raw in pairs {
            let raw = raw.as_ref();
            let (name, value) = raw.split_once(':').ok_or_else(|| ClairError::InvalidInput {
                detail: format!("Invalid header '{raw}'. Expected 'name: value'"),
            })?;
            let name = name.trim();
            if name.is_empty() {
                return Err(ClairError::InvalidInput {
                    detail: format!("Invalid header '{raw}': empty name"),
                });
            }
            info = info.with_header(name, value.trim());
        }
        Ok(info)
    }
}

impl RequestHeaders for RequestInfo {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}
