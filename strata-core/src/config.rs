//! Rule file (strata.toml / tach.toml) parser
//!
//! Handles parsing and validation of the declarative layering configuration.
//! The schema is the `tach.toml` one, so an existing file can be used as is.
//! Keys this tool does not know about are ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigErrors, Error, Result};
use crate::layer::Layer;
use crate::path::ModulePath;
use crate::rules::{Dependency, ModuleRule, RuleSet, Visibility};

/// File names searched by [`Config::find_and_load`], in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["strata.toml", "tach.toml"];

/// Parsed rule file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Declared layers, highest first. Absent means all built-in layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,

    /// Fail on cycles in the module graph
    #[serde(default)]
    pub forbid_circular_dependencies: bool,

    /// Directories (relative to the config file) that hold importable packages
    #[serde(default = "default_source_roots")]
    pub source_roots: Vec<String>,

    /// Glob patterns of files skipped by the import scanner
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Paths no module may depend on (except modules inside them)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cannot_depend_on: Vec<String>,

    /// Module declarations
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

/// One `[[modules]]` entry, as written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Required; optional here so a missing path is reported with its index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<Vec<DependencyConfig>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cannot_depend_on: Vec<String>,

    /// Absent: open. `[]`: closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub utility: bool,
}

/// `depends_on` entry: `"a.b"` or `{ path = "a.b", deprecated = true }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyConfig {
    /// Simple path string
    Path(String),

    /// Detailed entry
    Detailed {
        path: String,
        #[serde(default)]
        deprecated: bool,
    },
}

impl DependencyConfig {
    pub fn path(&self) -> &str {
        match self {
            DependencyConfig::Path(path) => path,
            DependencyConfig::Detailed { path, .. } => path,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, DependencyConfig::Detailed { deprecated: true, .. })
    }
}

fn default_source_roots() -> Vec<String> {
    vec![".".to_string()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layers: None,
            forbid_circular_dependencies: false,
            source_roots: default_source_roots(),
            exclude: Vec::new(),
            cannot_depend_on: Vec::new(),
            modules: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a config from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        Self::parse(content, "configuration")
    }

    fn parse(content: &str, file: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            Error::from(ConfigError::Parse {
                file: file.to_string(),
                message: e.message().to_string(),
            })
        })
    }

    /// Load config from a file path
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Io {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Find and load a config by searching up from `start_dir`.
    ///
    /// Returns the config and the directory that contains it.
    pub fn find_and_load(start_dir: &Path) -> Result<(Self, PathBuf)> {
        let mut current = start_dir.to_path_buf();

        loop {
            for name in CONFIG_FILE_NAMES {
                let candidate = current.join(name);
                if candidate.exists() {
                    tracing::debug!(path = %candidate.display(), "loading configuration");
                    let config = Self::from_file(&candidate)?;
                    return Ok((config, current));
                }
            }

            if !current.pop() {
                return Err(Error::Io {
                    message: format!(
                        "No {} found in {} or any parent directory",
                        CONFIG_FILE_NAMES.join(" or "),
                        start_dir.display()
                    ),
                });
            }
        }
    }

    /// Serialize config to TOML string
    pub fn to_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Io {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Source root directories resolved against the project root
    pub fn source_root_paths(&self, project_root: &Path) -> Vec<PathBuf> {
        self.source_roots
            .iter()
            .map(|root| project_root.join(root))
            .collect()
    }

    /// Validate the whole file and build the rule registry.
    ///
    /// Every problem is collected; nothing is validated against edges until
    /// the configuration is clean.
    pub fn to_rules(&self) -> std::result::Result<RuleSet, ConfigErrors> {
        let mut errors = ConfigErrors::new();

        let declared_layers = self.declared_layers(&mut errors);

        let global_deny = parse_paths(
            &self.cannot_depend_on,
            "top-level cannot_depend_on",
            &mut errors,
        );

        let mut rules = RuleSet::new();
        for (index, module) in self.modules.iter().enumerate() {
            let Some(raw_path) = module.path.as_deref() else {
                errors.push(ConfigError::MissingField { index, field: "path" });
                continue;
            };

            let path = match ModulePath::new(raw_path) {
                Ok(path) => path,
                Err(_) => {
                    errors.push(ConfigError::InvalidPath {
                        path: raw_path.to_string(),
                        context: format!("module entry #{}", index),
                    });
                    continue;
                }
            };

            let context = format!("module '{}'", path);
            let rule = build_rule(path, module, declared_layers.as_deref(), &context, &mut errors);

            if let Err(e) = rules.insert(rule) {
                errors.push(e);
            }
        }

        errors.into_result(
            rules
                .with_global_deny(global_deny)
                .with_forbid_circular_dependencies(self.forbid_circular_dependencies),
        )
    }

    /// Parse the `layers` array; it must be strictly descending by rank
    fn declared_layers(&self, errors: &mut ConfigErrors) -> Option<Vec<Layer>> {
        let names = self.layers.as_ref()?;
        let mut layers = Vec::with_capacity(names.len());

        for name in names {
            match name.parse::<Layer>() {
                Ok(layer) => layers.push(layer),
                Err(_) => errors.push(ConfigError::UnknownLayer {
                    name: name.clone(),
                    context: "layers".to_string(),
                    known: Layer::known_names(),
                }),
            }
        }

        for pair in layers.windows(2) {
            if pair[0] <= pair[1] {
                errors.push(ConfigError::LayerOrder {
                    higher: pair[0].to_string(),
                    lower: pair[1].to_string(),
                });
            }
        }

        Some(layers)
    }
}

fn build_rule(
    path: ModulePath,
    module: &ModuleConfig,
    declared_layers: Option<&[Layer]>,
    context: &str,
    errors: &mut ConfigErrors,
) -> ModuleRule {
    let mut rule = ModuleRule::new(path);

    if let Some(name) = &module.layer {
        match name.parse::<Layer>() {
            Ok(layer) if declared_layers.is_none_or(|declared| declared.contains(&layer)) => {
                rule.layer = Some(layer);
            }
            Ok(_) => errors.push(ConfigError::UnknownLayer {
                name: name.clone(),
                context: context.to_string(),
                known: declared_layers
                    .unwrap_or_default()
                    .iter()
                    .map(|l| l.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
            Err(_) => errors.push(ConfigError::UnknownLayer {
                name: name.clone(),
                context: context.to_string(),
                known: Layer::known_names(),
            }),
        }
    }

    if let Some(deps) = &module.depends_on {
        let mut resolved = Vec::with_capacity(deps.len());
        for dep in deps {
            match ModulePath::new(dep.path()) {
                Ok(path) => resolved.push(Dependency {
                    path,
                    deprecated: dep.is_deprecated(),
                }),
                Err(_) => errors.push(ConfigError::InvalidPath {
                    path: dep.path().to_string(),
                    context: format!("depends_on of {}", context),
                }),
            }
        }
        rule.depends_on = Some(resolved);
    }

    rule.cannot_depend_on = parse_paths(
        &module.cannot_depend_on,
        &format!("cannot_depend_on of {}", context),
        errors,
    );

    rule.visibility = Visibility::from_list(
        module
            .visibility
            .as_ref()
            .map(|list| parse_paths(list, &format!("visibility of {}", context), errors)),
    );

    rule.utility = module.utility;
    rule
}

fn parse_paths(raw: &[String], context: &str, errors: &mut ConfigErrors) -> Vec<ModulePath> {
    raw.iter()
        .filter_map(|entry| match ModulePath::new(entry.as_str()) {
            Ok(path) => Some(path),
            Err(_) => {
                errors.push(ConfigError::InvalidPath {
                    path: entry.clone(),
                    context: context.to_string(),
                });
                None
            }
        })
        .collect()
}

/// Create a starter configuration declaring the given top-level packages
pub fn create_config(packages: &[ModulePath]) -> Config {
    Config {
        layers: Some(Layer::ALL.iter().rev().map(|l| l.name().to_string()).collect()),
        forbid_circular_dependencies: true,
        exclude: vec!["**/tests/**".to_string(), "**/docs/**".to_string()],
        modules: packages
            .iter()
            .map(|path| ModuleConfig {
                path: Some(path.to_string()),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}
