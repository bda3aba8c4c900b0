//! Container environment composition.
//!
//! A manifest lists the variables a service expects, one per line, either as
//! a bare `NAME` (resolved from the process environment at deploy time) or as
//! `NAME=VALUE`. The composed list is what goes into the `environment` block
//! of an ECS container definition.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::errors::{DeployError, Result};

/// Never shipped into a task definition, whatever the manifest says.
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub value: String,
}

impl EnvironmentEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One declaration parsed from a manifest line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub name: String,
    pub value: Option<String>,
}

/// Which source wins when a name has both an inline value and a value in
/// the process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuePrecedence {
    #[default]
    Manifest,
    Environment,
}

/// Read-only variable lookup.
pub trait EnvProvider {
    fn get(&self, name: &str) -> Option<String>;
}

/// The environment of the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvProvider for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvProvider for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Where manifest lines come from.
pub trait ManifestSource {
    fn read_lines(&self) -> Result<Vec<String>>;
}

/// Manifest stored on disk. The file is opened and fully read on each call.
#[derive(Debug, Clone)]
pub struct FileManifest {
    path: PathBuf,
}

impl FileManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestSource for FileManifest {
    fn read_lines(&self) -> Result<Vec<String>> {
        let manifest_err = |source: std::io::Error| DeployError::ManifestError {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(manifest_err)?;
        let reader = BufReader::new(file);

        let lines = reader
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(manifest_err)?;
        tracing::debug!(
            path = %self.path.display(),
            lines = lines.len(),
            "Read variable manifest"
        );
        Ok(lines)
    }
}

impl ManifestSource for str {
    fn read_lines(&self) -> Result<Vec<String>> {
        Ok(self.lines().map(str::to_string).collect())
    }
}

impl ManifestSource for String {
    fn read_lines(&self) -> Result<Vec<String>> {
        self.as_str().read_lines()
    }
}

/// Cut `value` at the first `#` that directly follows whitespace.
///
/// A `#` glued to the preceding character (`abc#def`) is part of the value.
pub fn strip_inline_comment(value: &str) -> &str {
    let mut prev: Option<char> = None;
    for (idx, c) in value.char_indices() {
        if c == '#' && prev.is_some_and(char::is_whitespace) {
            return &value[..idx];
        }
        prev = Some(c);
    }
    value
}

fn strip_export(name: &str) -> &str {
    match name.strip_prefix("export") {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => name,
    }
}

/// Parse a single manifest line. Blank lines, comment lines and lines with
/// an empty name yield `None`.
pub fn parse_manifest_line(line: &str) -> Option<ManifestEntry> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let entry = match line.split_once('=') {
        Some((name, value)) => ManifestEntry {
            name: strip_export(name.trim()).to_string(),
            value: Some(strip_inline_comment(value).trim().to_string()),
        },
        None => ManifestEntry {
            name: strip_export(line).to_string(),
            value: None,
        },
    };

    if entry.name.is_empty() {
        tracing::warn!(line = %line, "Skipping manifest line without a variable name");
        return None;
    }
    Some(entry)
}

pub fn parse_manifest<I, S>(lines: I) -> Vec<ManifestEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter_map(|line| parse_manifest_line(line.as_ref()))
        .collect()
}

/// Resolves manifest declarations into environment entries.
///
/// Duplicate names are not repeated in the output: the first line that
/// resolves a name wins and later lines for it are ignored.
#[derive(Debug, Clone)]
pub struct EnvComposer {
    denylist: BTreeSet<String>,
    precedence: ValuePrecedence,
}

impl EnvComposer {
    pub fn new() -> Self {
        Self {
            denylist: BTreeSet::from([AWS_SECRET_ACCESS_KEY.to_string()]),
            precedence: ValuePrecedence::default(),
        }
    }

    /// Add names to the denylist. The built-in entries stay in place.
    pub fn deny<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denylist.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_precedence(mut self, precedence: ValuePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    pub fn is_denied(&self, name: &str) -> bool {
        self.denylist.contains(name)
    }

    fn resolve<E>(&self, entry: &ManifestEntry, env: &E) -> Option<String>
    where
        E: EnvProvider + ?Sized,
    {
        match self.precedence {
            ValuePrecedence::Manifest => entry.value.clone().or_else(|| env.get(&entry.name)),
            ValuePrecedence::Environment => env.get(&entry.name).or_else(|| entry.value.clone()),
        }
    }

    pub fn compose<E>(&self, entries: &[ManifestEntry], env: &E) -> Vec<EnvironmentEntry>
    where
        E: EnvProvider + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for entry in entries {
            if self.is_denied(&entry.name) {
                tracing::debug!(name = %entry.name, "Omitting denylisted variable");
                continue;
            }
            if seen.contains(entry.name.as_str()) {
                tracing::debug!(name = %entry.name, "Ignoring duplicate manifest entry");
                continue;
            }
            match self.resolve(entry, env) {
                Some(value) => {
                    seen.insert(entry.name.as_str());
                    out.push(EnvironmentEntry::new(entry.name.clone(), value));
                }
                None => {
                    tracing::debug!(name = %entry.name, "Variable not set, skipping");
                }
            }
        }

        out
    }

    pub fn generate<S, E>(&self, source: &S, env: &E) -> Result<Vec<EnvironmentEntry>>
    where
        S: ManifestSource + ?Sized,
        E: EnvProvider + ?Sized,
    {
        let entries = parse_manifest(source.read_lines()?);
        Ok(self.compose(&entries, env))
    }
}

impl Default for EnvComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Compose the container environment from `source` using the default
/// composer: inline values first, `AWS_SECRET_ACCESS_KEY` denied.
pub fn generate_environment_object<S, E>(source: &S, env: &E) -> Result<Vec<EnvironmentEntry>>
where
    S: ManifestSource + ?Sized,
    E: EnvProvider + ?Sized,
{
    EnvComposer::default().generate(source, env)
}
