// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON manifests describing the files to pack.

use {
    crate::environment::canonicalize_path,
    anyhow::{anyhow, Context, Result},
    log::debug,
    packed_resources::ResourceEntry,
    serde::{Deserialize, Serialize},
    std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
    },
};

/// A file registered in a manifest.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Identifier the file is resolved by at run time.
    pub id: i32,

    /// Path to the file. Relative paths are relative to the manifest's directory.
    pub path: PathBuf,

    /// Symbolic name for generated code.
    ///
    /// Derived from the file name when not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The set of files to pack, in container order.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub files: Vec<ManifestEntry>,
}

/// A symbolic name bound to a resource id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResourceSymbol {
    pub name: String,
    pub id: i32,
}

/// The directory relative manifest paths are resolved against.
pub fn manifest_dir(manifest_path: &Path) -> &Path {
    manifest_path.parent().unwrap_or_else(|| Path::new(""))
}

/// Turn an arbitrary string into an upper-case identifier.
///
/// Characters that aren't ASCII alphanumerics become `_`. A leading digit is
/// prefixed with `_`. Returns `None` if nothing usable remains.
pub fn sanitize_symbol(value: &str) -> Option<String> {
    let mut symbol = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect::<String>();

    if symbol.chars().all(|c| c == '_') {
        return None;
    }

    if symbol.starts_with(|c: char| c.is_ascii_digit()) {
        symbol.insert(0, '_');
    }

    Some(symbol)
}

impl ManifestEntry {
    /// Resolve the symbolic name for this entry.
    pub fn symbol_name(&self) -> Option<String> {
        match &self.name {
            Some(name) => sanitize_symbol(name),
            None => self
                .path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(sanitize_symbol),
        }
    }
}

impl Manifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to open '{}' for read", path.display()))?;

        serde_json::from_slice(&data)
            .with_context(|| format!("failed to parse '{}' contents", path.display()))
    }

    /// Load a manifest, starting from an empty one if the file doesn't exist.
    ///
    /// A file that exists but isn't a valid manifest is an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("{} does not exist; starting a new manifest", path.display());
            return Ok(Self::default());
        }

        Self::load(path).context("invalid manifest file, please remove first")
    }

    /// Write the manifest as pretty-printed JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut data = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut data, formatter);
        self.serialize(&mut serializer)?;
        data.push(b'\n');

        std::fs::write(path, data)
            .with_context(|| format!("failed to write to '{}'", path.display()))
    }

    /// The id the next added file receives.
    ///
    /// One past the largest existing id, and never negative.
    pub fn next_id(&self) -> Result<i32> {
        self.files
            .iter()
            .map(|entry| entry.id.checked_add(1))
            .try_fold(0, |acc, id| id.map(|id| acc.max(id)))
            .ok_or_else(|| anyhow!("resource id space exhausted"))
    }

    /// Register files, assigning them consecutive ids.
    ///
    /// Every path must exist. If any doesn't, the manifest is left unchanged.
    /// Returns the ids assigned, in argument order.
    pub fn add_files(&mut self, manifest_path: &Path, paths: &[PathBuf]) -> Result<Vec<i32>> {
        let base_dir = manifest_dir(manifest_path);
        let mut next_id = self.next_id()?;
        let mut added = Vec::with_capacity(paths.len());

        for path in paths {
            if !path.exists() {
                return Err(anyhow!("failed to find file '{}'", path.display()));
            }

            let id = next_id;
            next_id = next_id
                .checked_add(1)
                .ok_or_else(|| anyhow!("resource id space exhausted"))?;

            added.push(ManifestEntry {
                id,
                path: stored_path(base_dir, path)?,
                name: None,
            });
        }

        let ids = added.iter().map(|entry| entry.id).collect();
        self.files.extend(added);

        Ok(ids)
    }

    /// Resolve the filesystem path of every entry.
    pub fn source_paths(&self, manifest_path: &Path) -> Vec<PathBuf> {
        let base_dir = manifest_dir(manifest_path);

        self.files
            .iter()
            .map(|entry| base_dir.join(&entry.path))
            .collect()
    }

    /// Convert to entries the container writer consumes.
    ///
    /// Files are not read here; the writer reads them all before laying out
    /// the container.
    pub fn resolve_entries(&self, manifest_path: &Path) -> Vec<ResourceEntry> {
        self.files
            .iter()
            .zip(self.source_paths(manifest_path))
            .map(|(entry, path)| ResourceEntry::new(entry.id, path))
            .collect()
    }

    /// Resolve the symbolic name of every entry.
    ///
    /// Names must be unique. An entry whose name can't be derived falls back
    /// to `RESOURCE_<index>`.
    pub fn symbols(&self) -> Result<Vec<ResourceSymbol>> {
        let mut seen = BTreeMap::new();
        let mut symbols = Vec::with_capacity(self.files.len());

        for (index, entry) in self.files.iter().enumerate() {
            let name = entry
                .symbol_name()
                .unwrap_or_else(|| format!("RESOURCE_{}", index));

            if let Some(previous) = seen.insert(name.clone(), entry.path.clone()) {
                return Err(anyhow!(
                    "symbol {} is used by both '{}' and '{}'; set an explicit name",
                    name,
                    previous.display(),
                    entry.path.display()
                ));
            }

            symbols.push(ResourceSymbol { name, id: entry.id });
        }

        Ok(symbols)
    }
}

/// Compute the path to record in a manifest for a file.
///
/// Paths are kept as given when the manifest is in the current directory.
/// Otherwise they are made relative to the manifest's directory if the file
/// is beneath it, or absolute if not.
fn stored_path(base_dir: &Path, path: &Path) -> Result<PathBuf> {
    if base_dir.as_os_str().is_empty() {
        return Ok(path.to_path_buf());
    }

    let canonical = canonicalize_path(path)
        .with_context(|| format!("resolving path of '{}'", path.display()))?;
    let canonical_base = canonicalize_path(base_dir)
        .with_context(|| format!("resolving manifest directory '{}'", base_dir.display()))?;

    Ok(match canonical.strip_prefix(&canonical_base) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => canonical,
    })
}
