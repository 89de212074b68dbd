use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FactoryError {
    /// Nothing was discovered under `<root>/plugins`.
    #[error("no skills or agents found under {}", .0.display())]
    NoNodes(PathBuf),

    #[error("section '{section}' not found in {}", .file.display())]
    SectionNotFound { file: PathBuf, section: String },

    #[error("plugin.json for '{plugin}' is not valid JSON: {source}")]
    InvalidManifest {
        plugin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
