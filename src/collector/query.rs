//! Subset request parameters
//!
//! A `Query` is the ordered parameter set of one listing call
//! (`action=monitor&mirrored=true`). Order is kept so logs and request
//! URLs are stable.

use std::fmt;

/// Ordered query parameters for one listing call
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// The identity listing: no parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Arbitrary parameter
    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    /// `key=true`
    pub fn flag(self, key: &str) -> Self {
        self.param(key, "true")
    }

    /// `action=monitor`, the basic performance counters
    pub fn monitor() -> Self {
        Self::new().param("action", "monitor")
    }

    pub fn mirrored(self) -> Self {
        self.flag("mirrored")
    }

    pub fn latency(self) -> Self {
        self.flag("latency")
    }

    pub fn size(self) -> Self {
        self.flag("size")
    }

    /// `space=true`, the capacity counters
    pub fn space() -> Self {
        Self::new().flag("space")
    }

    pub fn protocol(self, protocol: &str) -> Self {
        self.param("protocol", protocol)
    }

    /// Restrict a listing to the named entities
    pub fn names(self, names: &str) -> Self {
        self.param("names", names)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            return write!(f, "-");
        }
        for (i, (k, v)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, "&")?;
            }
            write!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}
