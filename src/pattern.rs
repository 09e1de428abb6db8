//! Route patterns, compiled with [`matchit`].
//!
//! A pattern can contain two types of parameters:
//! ```ignore
//!  Syntax    Type
//!  :name     named parameter
//!  *name     catch-all parameter
//!  *         unnamed catch-all, named by position (`0`, `1`, ...)
//! ```
//!
//! Named parameters match anything until the next '/' or the path end:
//! ```ignore
//!  Pattern: /blog/:category/:post
//!
//!   /blog/rust/request-routers            match: category="rust", post="request-routers"
//!   /blog/rust/request-routers/           match unless strict
//!   /blog/rust/                           no match
//!   /blog/rust/request-routers/comments   no match
//! ```
//!
//! Catch-all parameters match anything until the path end, including
//! nothing, and therefore must be the final path element:
//! ```ignore
//!  Pattern: /files/*filepath
//!
//!   /files/                             match: filepath=""
//!   /files/LICENSE                      match: filepath="LICENSE"
//!   /files/templates/article.html       match: filepath="templates/article.html"
//!   /files                              no match
//! ```
//!
//! Unless the pattern is case sensitive, the literal parts of a pattern
//! match regardless of ASCII case. Parameter values keep the case of the
//! request path.
use std::fmt;

use crate::error::{Error, Result};

/// How a [`Pattern`] matches paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternOptions {
    /// Disables matching a path that has one extra trailing slash.
    pub strict: bool,
    /// Compares literal parts of the pattern case sensitively.
    pub sensitive: bool,
}

/// A compiled route pattern.
///
/// Two patterns are equal when they were compiled from the same normalized
/// source, which is what full-pattern removal compares against.
pub struct Pattern {
    source: String,
    options: PatternOptions,
    tree: matchit::Router<()>,
    // literal prefix of a trailing catch-all, and the catch-all's name
    catch_all: Option<(String, String)>,
}

impl Pattern {
    /// Compiles `pattern`.
    ///
    /// With the default options a path with one extra trailing slash still
    /// matches, and literals ignore ASCII case.
    /// ```rust
    /// use megarouter::{Pattern, PatternOptions};
    ///
    /// let pattern = Pattern::new("/user/:id", PatternOptions::default()).unwrap();
    /// assert!(pattern.test("/user/7"));
    /// assert!(pattern.test("/user/7/"));
    /// assert!(pattern.test("/USER/7"));
    /// assert!(!pattern.test("/user/7/posts"));
    /// ```
    pub fn new(pattern: &str, options: PatternOptions) -> Result<Self> {
        if !pattern.starts_with('/') {
            return Err(Error::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: "expected pattern beginning with '/'".to_owned(),
            });
        }

        let source = name_wildcards(pattern);
        let route = if options.sensitive {
            source.clone()
        } else {
            fold_literals(&source)
        };

        let catch_all = route.rfind('*').and_then(|star| {
            let name = &route[star + 1..];
            (!name.contains('/')).then(|| (route[..star].to_owned(), name.to_owned()))
        });

        let mut tree = matchit::Router::new();
        tree.insert(route, ()).map_err(|err| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            source,
            options,
            tree,
            catch_all,
        })
    }

    /// Whether `path` matches this pattern.
    pub fn test(&self, path: &str) -> bool {
        self.matches(path).is_some()
    }

    /// Matches `path`, returning the extracted parameters.
    /// ```rust
    /// use megarouter::{Pattern, PatternOptions};
    ///
    /// let pattern = Pattern::new("/src/*", PatternOptions::default()).unwrap();
    /// let params = pattern.matches("/SRC/lib/Mod.rs").unwrap();
    /// assert_eq!(params.get("0"), Some("lib/Mod.rs"));
    /// ```
    pub fn matches(&self, path: &str) -> Option<Params> {
        let folded;
        let subject = if self.options.sensitive {
            path
        } else {
            folded = path.to_ascii_lowercase();
            folded.as_str()
        };

        if let Some(params) = self.capture(subject, path) {
            return Some(params);
        }

        if self.options.strict || subject.len() <= 1 || !subject.ends_with('/') {
            return None;
        }

        let end = subject.len() - 1;
        self.capture(&subject[..end], &path[..end])
    }

    /// The normalized source this pattern was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    // `subject` is `original` with its ASCII case folded, so byte offsets
    // into one are valid in the other.
    fn capture(&self, subject: &str, original: &str) -> Option<Params> {
        if let Ok(found) = self.tree.at(subject) {
            let base = subject.as_ptr() as usize;
            return Some(
                found
                    .params
                    .iter()
                    .map(|(key, value)| {
                        let start = (value.as_ptr() as usize).wrapping_sub(base);
                        let value = original
                            .get(start..start + value.len())
                            .unwrap_or(value);
                        (key.to_owned(), value.to_owned())
                    })
                    .collect(),
            );
        }

        match &self.catch_all {
            Some((prefix, name)) if subject == prefix => {
                Some(std::iter::once((name.clone(), String::new())).collect())
            }
            _ => None,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// `*` with no name becomes `*0`, `*1`, ... in order of appearance.
fn name_wildcards(pattern: &str) -> String {
    let mut normalized = String::with_capacity(pattern.len() + 2);
    let mut unnamed = 0usize;
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        normalized.push(c);
        if c == '*' && chars.peek().map_or(true, |&next| next == '/') {
            normalized.push_str(&unnamed.to_string());
            unnamed += 1;
        }
    }

    normalized
}

// Lower-cases everything but parameter names.
fn fold_literals(pattern: &str) -> String {
    let mut folded = String::with_capacity(pattern.len());
    let mut in_param = false;

    for c in pattern.chars() {
        match c {
            ':' | '*' => in_param = true,
            '/' => in_param = false,
            _ => {}
        }
        folded.push(if in_param { c } else { c.to_ascii_lowercase() });
    }

    folded
}

/// Parameters extracted from the request path by the matching pattern.
///
/// Inside a handler they are available through the request extensions:
/// ```rust,ignore
/// let params = req.extensions().get::<Params>().unwrap();
/// let user = params.get("user");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    /// Returns the value of the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}
