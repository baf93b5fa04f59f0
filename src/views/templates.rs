use minijinja::Environment;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` not found")]
    NotFound(String),
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render template `{name}`: {source}")]
    Render {
        name: String,
        #[source]
        source: minijinja::Error,
    },
}

/// Renders HTML templates from a directory.
///
/// Templates are read on every render so edits show up without a restart.
#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let mut path = self.dir.clone();
        for comp in Path::new(name).components() {
            match comp {
                Component::Normal(s) => path.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }

    pub fn render<C: Serialize>(&self, name: &str, ctx: C) -> Result<String, TemplateError> {
        let path = self
            .resolve(name)
            .filter(|p| p.is_file())
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
        let source = fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;

        let render_err = |source| TemplateError::Render {
            name: name.to_string(),
            source,
        };
        let mut env = Environment::new();
        env.add_template(name, &source).map_err(render_err)?;
        let tmpl = env.get_template(name).map_err(render_err)?;
        tmpl.render(ctx).map_err(render_err)
    }
}
