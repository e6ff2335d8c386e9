//! Loading of Kubernetes manifests from a directory.
//!
//! Every `.yaml`/`.yml` file in the directory is decoded as a stream of YAML
//! documents. JSON is valid YAML, so JSON manifests are accepted as well.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to read the '{}' directory", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read the '{}' manifest file", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Error while decoding the '{}' manifest file", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error(
        "Error while decoding the '{}' manifest file: document {index} is not a mapping",
        path.display()
    )]
    NotAnObject { path: PathBuf, index: usize },
}

/// The objects decoded from a single manifest file, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestFile {
    pub path: PathBuf,
    pub objects: Vec<serde_json::Value>,
}

fn is_manifest(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml")
}

/// List the manifest files of `dir` in file name order.
pub fn manifest_paths(dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let read_dir_err = |source| ManifestError::ReadDir {
        path: dir.to_owned(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let path = entry.path();
        if !is_manifest(&path) || !path.is_file() {
            tracing::debug!(path = %path.display(), "skipping non-manifest entry");
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Decode every document of a manifest source. Empty documents are skipped.
pub fn decode_documents(
    path: &Path,
    content: &str,
) -> Result<Vec<serde_json::Value>, ManifestError> {
    let mut objects = Vec::new();
    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let value =
            serde_json::Value::deserialize(document).map_err(|source| ManifestError::Decode {
                path: path.to_owned(),
                source,
            })?;
        match value {
            serde_json::Value::Null => continue,
            serde_json::Value::Object(_) => objects.push(value),
            _ => {
                return Err(ManifestError::NotAnObject {
                    path: path.to_owned(),
                    index,
                })
            }
        }
    }
    Ok(objects)
}

/// Read and decode one manifest file.
pub fn load_file(path: &Path) -> Result<ManifestFile, ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::ReadFile {
        path: path.to_owned(),
        source,
    })?;
    let objects = decode_documents(path, &content)?;
    tracing::debug!(path = %path.display(), count = objects.len(), "decoded manifest file");
    Ok(ManifestFile {
        path: path.to_owned(),
        objects,
    })
}

/// Read and decode every manifest file in `dir`.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_dir(dir: &Path) -> Result<Vec<ManifestFile>, ManifestError> {
    manifest_paths(dir)?.iter().map(|path| load_file(path)).collect()
}
