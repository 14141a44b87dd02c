//! # Utility Module
//!
//! Small helpers shared across the crate: URL validation, a serializable
//! regex wrapper for listing patterns, and user-agent rotation.

use crate::definitions::{
    defaults,
    errors::{UtilError, UtilResult},
};
use fancy_regex::Regex;
use rand::prelude::*;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A regex that remembers its pattern.
///
/// Listing sources carry their extraction pattern through configuration and
/// logs; storing the pattern string next to the compiled regex keeps both
/// serialization and comparison cheap.
///
/// # Examples
///
/// ```
/// use proxyforge::utils::SerializableRegex;
///
/// let regex = SerializableRegex::new(r"\d{3}").unwrap();
/// assert!(regex.is_match("123").unwrap());
/// ```
#[derive(Clone, Debug, serde::Serialize)]
pub struct SerializableRegex {
    /// The pattern string the regex was compiled from
    pattern: String,

    /// The compiled regex
    #[serde(skip_serializing)]
    regex: Regex,
}

impl SerializableRegex {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`UtilError::InvalidRegex`] when the pattern does not
    /// compile.
    pub fn new(pattern: &str) -> UtilResult<Self> {
        let regex = validate_regex(pattern)?;
        Ok(SerializableRegex {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The pattern string this regex was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the text matches anywhere.
    ///
    /// # Errors
    ///
    /// Propagates engine errors from backtracking-heavy patterns.
    pub fn is_match(&self, text: &str) -> Result<bool, Box<fancy_regex::Error>> {
        self.regex.is_match(text).map_err(Box::new)
    }

    /// Iterator over all matches in the text.
    #[must_use]
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> fancy_regex::Matches<'r, 't> {
        self.regex.find_iter(text)
    }
}

impl PartialEq for SerializableRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for SerializableRegex {}

impl fmt::Display for SerializableRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl FromStr for SerializableRegex {
    type Err = UtilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SerializableRegex::new(s)
    }
}

/// Whether a string is a well-formed http(s) URL.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.scheme() == "http" || parsed.scheme() == "https",
        Err(_) => false,
    }
}

/// Validates and compiles a regex pattern.
///
/// # Errors
///
/// Returns [`UtilError::InvalidRegex`] when the pattern does not compile.
pub fn validate_regex(pattern: &str) -> UtilResult<Regex> {
    Regex::new(pattern).map_err(|e| UtilError::InvalidRegex(e.to_string()))
}

/// A random User-Agent from the default rotation list.
#[must_use]
pub fn get_random_user_agent() -> &'static str {
    let mut rng = rand::rng();
    defaults::DEFAULT_USER_AGENTS
        .choose(&mut rng)
        .copied()
        .unwrap_or("Mozilla/5.0 (compatible; proxyforge/0.1)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(is_valid_url("https://example.com/list"));
        assert!(is_valid_url("http://127.0.0.1:8080"));
        assert!(!is_valid_url("ftp://example.com"));
        assert!(!is_valid_url("definitely not"));
    }

    #[test]
    fn regex_wrapper_round_trip() {
        let regex = SerializableRegex::new(r"(\d+):(\d+)").unwrap();
        assert_eq!(regex.pattern(), r"(\d+):(\d+)");
        assert!(regex.is_match("12:34").unwrap());
        assert!(SerializableRegex::new(r"(unclosed").is_err());
    }

    #[test]
    fn user_agent_comes_from_rotation() {
        let agent = get_random_user_agent();
        assert!(defaults::DEFAULT_USER_AGENTS.contains(&agent));
    }
}
