use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while loading, normalizing or classifying a specification.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// The root file or one of its `!include` targets does not exist.
    #[error("specification file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not well-formed YAML.
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// `!include` was attached to something other than a file name.
    #[error("`!include` in {} must be followed by a relative file path", path.display())]
    InvalidInclude { path: PathBuf },

    /// A YAML tag other than `!include` was found.
    #[error("unsupported tag `{tag}` in {}", path.display())]
    UnknownTag { tag: String, path: PathBuf },

    /// A file includes itself, directly or through other files.
    #[error("include cycle detected: {}", display_chain(.chain))]
    IncludeCycle { chain: Vec<PathBuf> },

    /// The document does not describe a usable specification.
    #[error("invalid specification: {0}")]
    Validation(String),
}

impl SpecError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            SpecError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            SpecError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

fn display_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
