//! Dependency edges and pre-computed edge lists
//!
//! Edges come from outside the checker: either from [`crate::extract`] or from
//! a file written by another analysis tool. Two file formats are accepted:
//!
//! - JSON (`.json`): `[{"importer": "a", "imported": "b"}, ...]` or `[["a", "b"], ...]`
//! - text (anything else): one `importer -> imported` (or `importer imported`)
//!   per line, `#` starts a comment

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::ModulePath;

/// A directed import: `importer` imports `imported`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub importer: ModulePath,
    pub imported: ModulePath,
}

impl Edge {
    pub fn new(importer: ModulePath, imported: ModulePath) -> Self {
        Self { importer, imported }
    }

    /// Build from raw strings, for tests and small tools
    pub fn parse(
        importer: &str,
        imported: &str,
    ) -> std::result::Result<Self, crate::path::InvalidPath> {
        Ok(Self::new(ModulePath::new(importer)?, ModulePath::new(imported)?))
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.importer, self.imported)
    }
}

/// The edge set of one run
pub type EdgeSet = BTreeSet<Edge>;

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonEdge {
    Object { importer: String, imported: String },
    Pair(String, String),
}

/// Load an edge list, picking the format from the file extension
pub fn load_edges(path: &Path) -> Result<EdgeSet> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let name = path.display().to_string();
    let edges = if path.extension().is_some_and(|ext| ext == "json") {
        parse_json_edges(&content, &name)?
    } else {
        parse_text_edges(&content, &name)?
    };

    tracing::debug!(file = %name, edges = edges.len(), "loaded edge list");
    Ok(edges)
}

/// Parse the JSON edge format
pub fn parse_json_edges(content: &str, source: &str) -> Result<EdgeSet> {
    let raw: Vec<JsonEdge> = serde_json::from_str(content).map_err(|e| Error::EdgeList {
        path: source.to_string(),
        line: Some(e.line()),
        message: e.to_string(),
    })?;

    raw.into_iter()
        .enumerate()
        .map(|(index, edge)| {
            let (importer, imported) = match edge {
                JsonEdge::Object { importer, imported } => (importer, imported),
                JsonEdge::Pair(importer, imported) => (importer, imported),
            };
            Edge::parse(&importer, &imported).map_err(|e| Error::EdgeList {
                path: source.to_string(),
                line: None,
                message: format!("entry #{}: {}", index, e),
            })
        })
        .collect()
}

/// Parse the line-oriented text edge format
pub fn parse_text_edges(content: &str, source: &str) -> Result<EdgeSet> {
    let mut edges = EdgeSet::new();

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let error = |message: String| Error::EdgeList {
            path: source.to_string(),
            line: Some(idx + 1),
            message,
        };

        let parts: Vec<&str> = match line.split_once("->") {
            Some((lhs, rhs)) => vec![lhs.trim(), rhs.trim()],
            None => line.split_whitespace().collect(),
        };

        let [importer, imported] = parts.as_slice() else {
            return Err(error(format!("expected 'importer -> imported', found '{}'", line)));
        };

        let edge = Edge::parse(importer, imported).map_err(|e| error(e.to_string()))?;
        edges.insert(edge);
    }

    Ok(edges)
}
