//! Architectural layers
//!
//! Layers form a total order, lowest first:
//!
//! ```text
//! core < auxiliary < tertiary < ui
//! ```
//!
//! A module may depend on modules in its own layer or any lower one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    /// Foundational code, depends on nothing above it
    Core,
    /// Support code built on core
    Auxiliary,
    /// Higher-level features
    Tertiary,
    /// User-facing entry points
    Ui,
}

impl Layer {
    /// All layers, lowest first
    pub const ALL: [Layer; 4] = [Layer::Core, Layer::Auxiliary, Layer::Tertiary, Layer::Ui];

    /// Ordinal rank, `0` for core
    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Layer::Core => "core",
            Layer::Auxiliary => "auxiliary",
            Layer::Tertiary => "tertiary",
            Layer::Ui => "ui",
        }
    }

    /// True if a module in `self` may depend on a module in `target`
    pub fn may_depend_on(self, target: Layer) -> bool {
        self >= target
    }

    /// Comma-separated list of known layer names, highest first
    pub fn known_names() -> String {
        Layer::ALL
            .iter()
            .rev()
            .map(|l| l.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Unrecognised layer name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLayer(pub String);

impl fmt::Display for UnknownLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown layer '{}'", self.0)
    }
}

impl std::error::Error for UnknownLayer {}

impl FromStr for Layer {
    type Err = UnknownLayer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "core" => Ok(Layer::Core),
            "auxiliary" => Ok(Layer::Auxiliary),
            "tertiary" => Ok(Layer::Tertiary),
            "ui" => Ok(Layer::Ui),
            other => Err(UnknownLayer(other.to_string())),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Layer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Layer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
