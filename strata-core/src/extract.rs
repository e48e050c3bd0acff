//! Python import scanner
//!
//! Walks the configured source roots and turns every `import` / `from ... import`
//! statement into an [`Edge`]. This is a line-level scanner, not a Python
//! parser: it understands continuation lines, parenthesised name lists,
//! relative imports and docstrings, which covers what real code bases write.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use walkdir::WalkDir;

use crate::config::Config;
use crate::edges::{Edge, EdgeSet};
use crate::error::{ConfigError, ConfigErrors, Error, Result};
use crate::path::ModulePath;

static IMPORT_STMT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*import\s+(.+)$").unwrap_or_else(|e| panic!("regex: {e}"))
});

static FROM_STMT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*from\s+(\.*)([\w.]*)\s+import\s+(.+)$")
        .unwrap_or_else(|e| panic!("regex: {e}"))
});

/// Scans Python sources for import edges
#[derive(Debug)]
pub struct ImportExtractor {
    project_root: PathBuf,
    source_roots: Vec<PathBuf>,
    exclude: GlobSet,
}

impl ImportExtractor {
    /// `source_roots` are relative to `project_root`; `exclude` globs are
    /// matched against paths relative to `project_root`.
    pub fn new(project_root: &Path, source_roots: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            project_root: project_root.to_path_buf(),
            source_roots: source_roots.iter().map(|r| project_root.join(r)).collect(),
            exclude: compile_globset(exclude)?,
        })
    }

    pub fn from_config(config: &Config, project_root: &Path) -> Result<Self> {
        Self::new(project_root, &config.source_roots, &config.exclude)
    }

    /// Every non-excluded `.py` file with its module path
    pub fn python_files(&self) -> Result<Vec<(PathBuf, ModulePath)>> {
        let mut files = Vec::new();

        for root in &self.source_roots {
            let walker = WalkDir::new(root)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|entry| !is_ignored_dir(entry.path(), root));

            for entry in walker {
                let entry = entry.map_err(|e| Error::Scan {
                    path: root.display().to_string(),
                    message: e.to_string(),
                })?;

                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "py") {
                    continue;
                }
                if self.is_excluded(path) {
                    tracing::trace!(file = %path.display(), "excluded");
                    continue;
                }

                match module_path_for(root, path) {
                    Some(module) => files.push((path.to_path_buf(), module)),
                    None => {
                        tracing::debug!(file = %path.display(), "not an importable module path")
                    }
                }
            }
        }

        Ok(files)
    }

    /// Scan all source files and collect their import edges
    pub fn extract(&self) -> Result<EdgeSet> {
        let mut edges = EdgeSet::new();
        let files = self.python_files()?;

        for (file, module) in &files {
            let source = match std::fs::read_to_string(file) {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(file = %file.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };

            let is_package = file.file_stem().is_some_and(|stem| stem == "__init__");
            for imported in parse_imports(&source, module, is_package) {
                edges.insert(Edge::new(module.clone(), imported));
            }
        }

        tracing::debug!(files = files.len(), edges = edges.len(), "import scan finished");
        Ok(edges)
    }

    /// Top-level packages (directories holding `__init__.py`) under the source roots
    pub fn discover_packages(&self) -> Result<Vec<ModulePath>> {
        let mut packages = Vec::new();

        for root in &self.source_roots {
            let entries = std::fs::read_dir(root).map_err(|e| Error::Scan {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;

            for entry in entries.flatten() {
                let path = entry.path();
                if !path.is_dir()
                    || !path.join("__init__.py").is_file()
                    || self.is_excluded(&path)
                {
                    continue;
                }
                if let Some(module) = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| ModulePath::new(n).ok())
                {
                    packages.push(module);
                }
            }
        }

        packages.sort();
        packages.dedup();
        Ok(packages)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.project_root).unwrap_or(path);
        self.exclude.is_match(relative)
    }
}

fn compile_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    let mut errors = ConfigErrors::new();

    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => errors.push(ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: e.kind().to_string(),
            }),
        }
    }

    let builder = errors.into_result(builder)?;
    builder.build().map_err(|e| {
        Error::from(ConfigError::InvalidGlob {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })
    })
}

fn is_ignored_dir(path: &Path, root: &Path) -> bool {
    if path == root {
        return false;
    }
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.starts_with('.') || name == "__pycache__")
}

/// Module path of a source file relative to its source root.
///
/// `pkg/sub/mod.py` is `pkg.sub.mod`, `pkg/__init__.py` is `pkg`.
pub fn module_path_for(root: &Path, file: &Path) -> Option<ModulePath> {
    let relative = file.strip_prefix(root).ok()?;
    let mut segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;

    let last = segments.pop()?;
    let stem = last.strip_suffix(".py")?;
    if stem != "__init__" {
        segments.push(stem);
    }

    ModulePath::new(segments.join(".")).ok()
}

/// Every module imported by `source`, which is the code of `module`.
///
/// `is_package` marks an `__init__.py`, which changes what `.` refers to in
/// relative imports.
pub fn parse_imports(source: &str, module: &ModulePath, is_package: bool) -> Vec<ModulePath> {
    let mut imports = Vec::new();

    for statement in logical_lines(source) {
        for part in statement.split(';') {
            if let Some(caps) = FROM_STMT.captures(part) {
                let level = caps[1].len();
                let base = &caps[2];
                let Some(base_path) = resolve_base(module, is_package, level, base) else {
                    continue;
                };
                for name in imported_names(&caps[3]) {
                    let target = if name == "*" {
                        Some(base_path.clone())
                    } else {
                        base_path.join(name).ok()
                    };
                    imports.extend(target);
                }
            } else if let Some(caps) = IMPORT_STMT.captures(part) {
                imports.extend(
                    imported_names(&caps[1]).filter_map(|name| ModulePath::new(name).ok()),
                );
            }
        }
    }

    imports
}

/// Base package of a `from` import; `None` if it climbs above the top level
fn resolve_base(
    module: &ModulePath,
    is_package: bool,
    level: usize,
    base: &str,
) -> Option<ModulePath> {
    if level == 0 {
        return ModulePath::new(base).ok();
    }

    let mut package = if is_package { Some(module.clone()) } else { module.parent() };
    for _ in 1..level {
        package = package?.parent();
    }
    let package = package?;

    if base.is_empty() {
        Some(package)
    } else {
        package.join(base).ok()
    }
}

/// Names of an import list, aliases dropped: `a as b, (c, d)` -> `a, c, d`
fn imported_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',')
        .map(|item| {
            let item = item.trim().trim_start_matches('(').trim_end_matches(')').trim();
            item.split_whitespace().next().unwrap_or("")
        })
        .filter(|name| !name.is_empty())
}

/// Join continuation lines, drop comments and triple-quoted strings
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pending = String::new();
    let mut open_parens = 0isize;
    let mut in_string: Option<&'static str> = None;

    for raw in source.lines() {
        let mut line = raw;

        if let Some(delim) = in_string {
            match line.find(delim) {
                Some(idx) => line = &line[idx + delim.len()..],
                None => continue,
            }
        }

        let (code, paren_delta, open_string) = scan_line(line);
        in_string = open_string;

        let code = code.trim_end();
        if !pending.is_empty() {
            pending.push(' ');
        }

        let (body, continued) = match code.strip_suffix('\\') {
            Some(body) => (body, true),
            None => (code, false),
        };
        pending.push_str(body);

        open_parens = (open_parens + paren_delta).max(0);
        if continued || open_parens > 0 {
            continue;
        }

        lines.push(std::mem::take(&mut pending));
    }

    if !pending.is_empty() {
        lines.push(pending);
    }
    lines
}

/// Split one physical line into its code (comment dropped), the change in
/// bracket depth, and the delimiter of a triple-quoted string left open.
///
/// Brackets and `#` inside string literals are not code.
fn scan_line(line: &str) -> (&str, isize, Option<&'static str>) {
    let bytes = line.as_bytes();
    let mut depth = 0isize;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'#' => return (&line[..i], depth, None),
            b'(' => depth += 1,
            b')' => depth -= 1,
            quote @ (b'"' | b'\'') => {
                let triple = bytes[i..].starts_with(&[quote; 3]);
                let width = if triple { 3 } else { 1 };
                match closing_quote(&bytes[i + width..], quote, triple) {
                    Some(len) => {
                        i += width + len;
                        continue;
                    }
                    None if triple => {
                        let delim = if quote == b'"' { "\"\"\"" } else { "'''" };
                        return (&line[..i], depth, Some(delim));
                    }
                    // Unterminated literal: nothing after it is code
                    None => return (&line[..i], depth, None),
                }
            }
            _ => {}
        }
        i += 1;
    }

    (line, depth, None)
}

/// Length up to and including the closing quote of a string body
fn closing_quote(rest: &[u8], quote: u8, triple: bool) -> Option<usize> {
    let width = if triple { 3 } else { 1 };
    let mut i = 0;

    while i < rest.len() {
        if rest[i] == b'\\' {
            i += 2;
            continue;
        }
        if rest[i] == quote && (!triple || rest[i..].starts_with(&[quote; 3])) {
            return Some(i + width);
        }
        i += 1;
    }
    None
}
