//! Query keys
//!
//! A query key is an ordered sequence of identifying tokens that names one
//! cached association, e.g. `["courses", 42, "lessons"]`. Keys are compared
//! part by part, and a key matches every key it is a prefix of.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while building a query key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The key has no parts
    #[error("query key cannot be empty")]
    Empty,
}

/// One token of a query key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyPart {
    Number(i64),
    Text(String),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

/// Ordered sequence of key parts naming one cached association
///
/// Never empty: construction and deserialization both reject an empty
/// sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<KeyPart>", into = "Vec<KeyPart>")]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    /// Creates a key from its parts
    ///
    /// # Errors
    /// Returns [`KeyError::Empty`] when `parts` is empty.
    pub fn new(parts: Vec<KeyPart>) -> Result<Self, KeyError> {
        if parts.is_empty() {
            return Err(KeyError::Empty);
        }
        Ok(Self(parts))
    }

    /// Parses a slash separated key such as `courses/42/lessons`
    ///
    /// Empty segments are skipped. Segments that parse as integers become
    /// [`KeyPart::Number`], everything else is kept as text.
    pub fn parse(input: &str) -> Result<Self, KeyError> {
        let parts = input
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.parse::<i64>() {
                Ok(n) => KeyPart::Number(n),
                Err(_) => KeyPart::Text(segment.to_string()),
            })
            .collect();

        Self::new(parts)
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, see the type-level invariant
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `prefix` matches the leading parts of this key
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<KeyPart>> for QueryKey {
    type Error = KeyError;

    fn try_from(parts: Vec<KeyPart>) -> Result<Self, Self::Error> {
        Self::new(parts)
    }
}

impl From<QueryKey> for Vec<KeyPart> {
    fn from(key: QueryKey) -> Self {
        key.0
    }
}

impl From<KeyPart> for QueryKey {
    fn from(part: KeyPart) -> Self {
        Self(vec![part])
    }
}

impl FromStr for QueryKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
