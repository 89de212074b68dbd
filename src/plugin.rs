//! Plugin directories and their `plugin.json` manifests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FactoryError;

pub const MANIFEST_FILE: &str = "plugin.json";

/// The subset of `plugin.json` the factory reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Team name -> member skill ids. `None` when the field is absent.
    #[serde(default)]
    pub teams: Option<BTreeMap<String, Vec<String>>>,
}

impl PluginManifest {
    /// Read a manifest. A missing file is `Ok(None)`.
    pub fn read(path: &Path, plugin: &str) -> Result<Option<Self>, FactoryError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FactoryError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| FactoryError::InvalidManifest {
                plugin: plugin.to_string(),
                source,
            })
    }
}

#[derive(Debug)]
pub struct Plugin {
    pub name: String,
    pub dir: PathBuf,
    pub manifest: Result<Option<PluginManifest>, FactoryError>,
}

impl Plugin {
    pub fn load(dir: &Path) -> Self {
        let name = dir_name(dir);
        let manifest = PluginManifest::read(&dir.join(MANIFEST_FILE), &name);
        if let Err(e) = &manifest {
            debug!("{}", e);
        }
        Self {
            name,
            dir: dir.to_path_buf(),
            manifest,
        }
    }

    /// Teams declared by this plugin; empty when the manifest is missing or broken.
    pub fn teams(&self) -> BTreeMap<String, Vec<String>> {
        match &self.manifest {
            Ok(Some(manifest)) => manifest.teams.clone().unwrap_or_default(),
            _ => BTreeMap::new(),
        }
    }
}

pub(crate) fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
