//! YAML loading with `!include` support.
//!
//! A specification may be split across files. Any scalar tagged `!include`
//! names another YAML file, resolved against the directory of the file that
//! contains the tag:
//!
//! ```yaml
//! # swagger/swagger.yml
//! openapi: 3.0.0
//! info: !include info.yml
//! paths: !include paths/people.yml
//! ```
//!
//! The included document is loaded with the same rules and spliced in place
//! of the tagged node. Every file visited is recorded so that the hot reload
//! watcher can follow edits to included files too.

use super::error::SpecError;
use serde_yaml::value::{Mapping, TaggedValue};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const INCLUDE_TAG: &str = "!include";

/// A fully resolved YAML document and the files it was assembled from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDocument {
    /// Document root with every `!include` replaced by its contents.
    pub root: Value,
    /// Canonical paths of the root file and all transitively included files,
    /// in first-visit order, without duplicates.
    pub sources: Vec<PathBuf>,
}

/// Load `path` and resolve all `!include` tags below it.
///
/// # Errors
///
/// - [`SpecError::NotFound`] when the root or an included file is missing
/// - [`SpecError::Parse`] when a file is not valid YAML
/// - [`SpecError::IncludeCycle`] when a file ends up including itself
/// - [`SpecError::UnknownTag`] / [`SpecError::InvalidInclude`] for bad tags
pub fn load_document(path: impl AsRef<Path>) -> Result<LoadedDocument, SpecError> {
    let mut loader = IncludeLoader::default();
    let root = loader.load_file(path.as_ref())?;
    Ok(LoadedDocument {
        root,
        sources: loader.sources,
    })
}

#[derive(Default)]
struct IncludeLoader {
    /// Files currently being expanded, outermost first.
    stack: Vec<PathBuf>,
    sources: Vec<PathBuf>,
}

impl IncludeLoader {
    fn load_file(&mut self, path: &Path) -> Result<Value, SpecError> {
        let canonical = fs::canonicalize(path).map_err(|e| SpecError::io(path, e))?;

        if self.stack.contains(&canonical) {
            let mut chain = self.stack.clone();
            chain.push(canonical);
            return Err(SpecError::IncludeCycle { chain });
        }

        let content = fs::read_to_string(&canonical).map_err(|e| SpecError::io(path, e))?;
        let parsed: Value = serde_yaml::from_str(&content).map_err(|source| SpecError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(file = %canonical.display(), depth = self.stack.len(), "Specification file parsed");

        if !self.sources.contains(&canonical) {
            self.sources.push(canonical.clone());
        }

        let base_dir = canonical
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.stack.push(canonical.clone());
        let resolved = self.resolve(parsed, &canonical, &base_dir);
        self.stack.pop();
        resolved
    }

    fn resolve(&mut self, value: Value, file: &Path, base_dir: &Path) -> Result<Value, SpecError> {
        match value {
            Value::Tagged(tagged) => self.resolve_tagged(*tagged, file, base_dir),
            Value::Sequence(items) => items
                .into_iter()
                .map(|item| self.resolve(item, file, base_dir))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            Value::Mapping(map) => {
                let mut out = Mapping::with_capacity(map.len());
                for (k, v) in map {
                    let k = self.resolve(k, file, base_dir)?;
                    let v = self.resolve(v, file, base_dir)?;
                    out.insert(k, v);
                }
                Ok(Value::Mapping(out))
            }
            scalar => Ok(scalar),
        }
    }

    fn resolve_tagged(
        &mut self,
        tagged: TaggedValue,
        file: &Path,
        base_dir: &Path,
    ) -> Result<Value, SpecError> {
        if tagged.tag != INCLUDE_TAG {
            return Err(SpecError::UnknownTag {
                tag: tagged.tag.to_string(),
                path: file.to_path_buf(),
            });
        }

        let relative = match tagged.value {
            Value::String(s) if !s.trim().is_empty() => s,
            _ => {
                return Err(SpecError::InvalidInclude {
                    path: file.to_path_buf(),
                })
            }
        };

        let target = base_dir.join(relative.trim());
        debug!(from = %file.display(), include = %target.display(), "Resolving include");
        self.load_file(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_plain_document_has_single_source() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(dir.path(), "root.yml", "openapi: 3.0.0\n");

        let doc = load_document(&root).unwrap();
        assert_eq!(doc.root["openapi"], Value::String("3.0.0".into()));
        assert_eq!(doc.sources, vec![fs::canonicalize(&root).unwrap()]);
    }

    #[test]
    fn test_include_inside_sequence() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "tag.yml", "name: people\n");
        let root = write(dir.path(), "root.yml", "tags:\n  - !include tag.yml\n  - name: other\n");

        let doc = load_document(&root).unwrap();
        let tags = doc.root["tags"].as_sequence().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0]["name"], Value::String("people".into()));
        assert_eq!(doc.sources.len(), 2);
    }

    #[test]
    fn test_self_include_is_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(dir.path(), "loop.yml", "again: !include loop.yml\n");

        let err = load_document(&root).unwrap_err();
        match err {
            SpecError::IncludeCycle { chain } => assert_eq!(chain.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(dir.path(), "root.yml", "value: !env HOME\n");

        let err = load_document(&root).unwrap_err();
        assert!(matches!(err, SpecError::UnknownTag { ref tag, .. } if tag.ends_with("env")));
    }

    #[test]
    fn test_include_requires_a_path() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(dir.path(), "root.yml", "value: !include [a, b]\n");

        let err = load_document(&root).unwrap_err();
        assert!(matches!(err, SpecError::InvalidInclude { .. }));
    }
}
