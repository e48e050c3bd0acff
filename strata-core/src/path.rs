//! Dotted module paths
//!
//! A [`ModulePath`] is the identity of a module (`pennylane.ops.op_math`).
//! All prefix tests respect segment boundaries, so `pennylane.ftqc` owns
//! `pennylane.ftqc.x` but not `pennylane.ftqcx`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A validated dotted module path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModulePath(String);

/// Reason a string was rejected as a module path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPath(pub String);

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid module path '{}'", self.0)
    }
}

impl std::error::Error for InvalidPath {}

impl ModulePath {
    /// Parse and validate a dotted path.
    ///
    /// Every segment must be non-empty and made of ASCII alphanumerics or `_`.
    pub fn new(path: impl Into<String>) -> Result<Self, InvalidPath> {
        let path = path.into();
        let valid = !path.is_empty()
            && path.split('.').all(|segment| {
                !segment.is_empty()
                    && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            });

        if valid {
            Ok(Self(path))
        } else {
            Err(InvalidPath(path))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, outermost first
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// Number of segments
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Enclosing package, `None` for a top-level path
    pub fn parent(&self) -> Option<ModulePath> {
        self.0
            .rfind('.')
            .map(|idx| ModulePath(self.0[..idx].to_string()))
    }

    /// Append a segment (or a dotted tail)
    pub fn join(&self, tail: &str) -> Result<ModulePath, InvalidPath> {
        ModulePath::new(format!("{}.{}", self.0, tail))
    }

    /// True when `self` equals `other` or is an enclosing package of it.
    pub fn is_prefix_of(&self, other: &ModulePath) -> bool {
        other.0 == self.0
            || (other.0.len() > self.0.len()
                && other.0.starts_with(&self.0)
                && other.0.as_bytes()[self.0.len()] == b'.')
    }

    /// `self`, then each enclosing package, longest first
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors {
            path: &self.0,
            done: false,
        }
    }
}

/// Iterator over a path and its enclosing packages, longest first
pub struct Ancestors<'a> {
    path: &'a str,
    done: bool,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.path;
        match current.rfind('.') {
            Some(idx) => self.path = &current[..idx],
            None => self.done = true,
        }
        Some(current)
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ModulePath {
    type Err = InvalidPath;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModulePath::new(s.trim())
    }
}

impl AsRef<str> for ModulePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ModulePath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for ModulePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ModulePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ModulePath::new(raw).map_err(serde::de::Error::custom)
    }
}
