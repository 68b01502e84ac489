use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("failed to read {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: io::Error,
    },

    #[error("location '{location}' matched no resources")]
    NoMatch { location: String },

    #[error("invalid location '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },
}

/// A single loadable definition document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    File(PathBuf),
    /// An in-memory document, used by tests and programmatic callers.
    Bytes { name: String, contents: Arc<str> },
}

impl Resource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Resource::File(path.into())
    }

    pub fn bytes(name: impl Into<String>, contents: impl AsRef<str>) -> Self {
        Resource::Bytes {
            name: name.into(),
            contents: Arc::from(contents.as_ref()),
        }
    }

    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Resource::File(path) => path.display().to_string(),
            Resource::Bytes { name, .. } => format!("in-memory [{name}]"),
        }
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        match self {
            Resource::File(path) => path.is_file(),
            Resource::Bytes { .. } => true,
        }
    }

    pub fn read_to_string(&self) -> Result<String, ResourceError> {
        match self {
            Resource::File(path) => {
                std::fs::read_to_string(path).map_err(|source| ResourceError::Io {
                    resource: self.description(),
                    source,
                })
            }
            Resource::Bytes { contents, .. } => Ok(contents.to_string()),
        }
    }

    /// Resolve `relative` against this resource's location, staying within
    /// the same resource kind. `None` when the kind has no notion of
    /// relatives (in-memory documents).
    #[must_use]
    pub fn create_relative(&self, relative: &str) -> Option<Resource> {
        match self {
            Resource::File(path) => path
                .parent()
                .map(|dir| Resource::File(dir.join(relative))),
            Resource::Bytes { .. } => None,
        }
    }

    /// The location string relative imports concatenate against when direct
    /// relative resolution falls through.
    #[must_use]
    pub fn base_location(&self) -> Option<String> {
        match self {
            Resource::File(path) => Some(path.display().to_string()),
            Resource::Bytes { .. } => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}

/// Resolves a location string into concrete resources.
///
/// A single location may expand to several resources when the loader
/// supports patterns.
pub trait ResourceLoader {
    fn resolve(&self, location: &str) -> Result<Vec<Resource>, ResourceError>;
}

/// Loads `file:` and plain filesystem locations.
///
/// A `*` wildcard is supported in the final path segment and expands to every
/// matching regular file in sorted order; a pattern matching nothing is an
/// error.
#[derive(Debug, Default, Clone)]
pub struct FileSystemResourceLoader {
    base_dir: Option<PathBuf>,
}

impl FileSystemResourceLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative locations resolve against `base_dir` instead of the process
    /// working directory.
    #[must_use]
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn absolutize(&self, location: &str) -> PathBuf {
        let path = Path::new(location);
        match &self.base_dir {
            Some(base) if !path.is_absolute() => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ResourceLoader for FileSystemResourceLoader {
    fn resolve(&self, location: &str) -> Result<Vec<Resource>, ResourceError> {
        let trimmed = location.strip_prefix("file:").unwrap_or(location);
        if trimmed.is_empty() {
            return Err(ResourceError::InvalidLocation {
                location: location.to_string(),
                reason: "empty path".to_string(),
            });
        }

        let path = self.absolutize(trimmed);
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();

        let Some((prefix, suffix)) = file_name.split_once('*') else {
            return Ok(vec![Resource::File(path)]);
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let entries = std::fs::read_dir(dir).map_err(|source| ResourceError::Io {
            resource: dir.display().to_string(),
            source,
        })?;

        let mut matched = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ResourceError::Io {
                resource: dir.display().to_string(),
                source,
            })?;
            let candidate = entry.path();
            if !candidate.is_file() {
                continue;
            }
            let Some(name) = candidate.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name.starts_with(prefix)
                && name.ends_with(suffix)
                && name.len() >= prefix.len() + suffix.len()
            {
                matched.push(candidate);
            }
        }

        if matched.is_empty() {
            return Err(ResourceError::NoMatch {
                location: location.to_string(),
            });
        }

        matched.sort();
        Ok(matched.into_iter().map(Resource::File).collect())
    }
}

/// Combine a base location with a relative path by replacing the final
/// segment of the base.
#[must_use]
pub(crate) fn apply_relative_path(base: &str, relative: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], relative),
        None => relative.to_string(),
    }
}
