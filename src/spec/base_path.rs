//! Base path resolution.
//!
//! OpenAPI 3 documents list `servers`, each with a URL template whose
//! `{variables}` carry default values. Swagger 2 documents carry a single
//! `basePath`. Either way the result is one canonical URL path prefix per
//! server entry.

use super::error::SpecError;
use super::version::Specification;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

/// Canonical form of a base path: leading `/`, no trailing `/`, `/` for the
/// root.
pub fn canonical_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl Specification {
    /// Resolve the base paths this specification is served under.
    ///
    /// Server entries are read, never modified.
    ///
    /// # Errors
    ///
    /// [`SpecError::Validation`] when a server URL references a variable
    /// without a default or does not parse as a URL.
    pub fn base_paths(&self) -> Result<Vec<String>, SpecError> {
        match self {
            Specification::Swagger2(_) => Ok(vec![canonical_base_path(
                self.document()
                    .get("basePath")
                    .and_then(Value::as_str)
                    .unwrap_or(""),
            )]),
            Specification::OpenApi3(_) => {
                let servers = self
                    .document()
                    .get("servers")
                    .and_then(Value::as_array)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                if servers.is_empty() {
                    return Ok(vec![canonical_base_path("")]);
                }
                servers.iter().map(server_base_path).collect()
            }
        }
    }
}

fn server_base_path(server: &Value) -> Result<String, SpecError> {
    let template = server
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| SpecError::Validation("server entry without a `url`".to_string()))?;
    let url = substitute_variables(template, server.get("variables"))?;

    let path = resolve_path(&url)?;
    Ok(canonical_base_path(&path))
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{([^{}]+)\}").expect("valid placeholder regex"))
}

/// Replace every `{name}` in `template` with `variables.name.default`.
fn substitute_variables(template: &str, variables: Option<&Value>) -> Result<String, SpecError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in placeholder().captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let default = variables
            .and_then(|vars| vars.get(name.as_str()))
            .and_then(|var| var.get("default"))
            .and_then(|d| match d {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                SpecError::Validation(format!(
                    "server url `{template}` uses variable `{}` without a default",
                    name.as_str()
                ))
            })?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&default);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Path component of an absolute or host-relative URL.
fn resolve_path(url: &str) -> Result<String, SpecError> {
    let base = Url::parse("http://localhost/")
        .map_err(|e| SpecError::Validation(format!("invalid base url: {e}")))?;
    let resolved = base
        .join(url)
        .map_err(|e| SpecError::Validation(format!("invalid server url `{url}`: {e}")))?;
    Ok(resolved.path().to_string())
}
