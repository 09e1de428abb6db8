//! Router configuration.
use serde::{Deserialize, Serialize};

use crate::pattern::PatternOptions;

/// The methods a router supports when none are configured: those of
/// RFC 7231 plus `PATCH` from RFC 5789.
pub const DEFAULT_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Construction options for a [`Router`](crate::Router).
///
/// Every field has a default, so a partial document deserializes:
/// ```rust
/// use megarouter::RouterConfig;
///
/// let config: RouterConfig = toml::from_str(r#"methods = ["GET", "purge"]"#).unwrap();
/// assert_eq!(config.methods, ["GET", "purge"]);
/// assert!(!config.strict);
/// assert!(!config.sensitive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Methods to create route lists for. Names are upper-cased.
    pub methods: Vec<String>,
    /// Disables matching a path that has one extra trailing slash.
    pub strict: bool,
    /// Matches the literal parts of patterns case sensitively.
    pub sensitive: bool,
}

impl RouterConfig {
    /// Replaces the configured methods.
    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = methods.into_iter().map(Into::into).collect();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    pub(crate) fn pattern_options(&self) -> PatternOptions {
        PatternOptions {
            strict: self.strict,
            sensitive: self.sensitive,
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            methods: DEFAULT_METHODS.iter().map(|m| (*m).to_owned()).collect(),
            strict: false,
            sensitive: false,
        }
    }
}
