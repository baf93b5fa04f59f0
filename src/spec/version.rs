//! Version detection and the two specification variants.
//!
//! Swagger 2.0 documents declare `swagger: "2.0"`; OpenAPI 3.x documents
//! declare `openapi: 3.x.y`. Anything below major version 3 is handled as
//! the legacy variant.

use super::error::SpecError;
use super::normalize::{normalize_keys, to_json};
use oas3::OpenApiV3Spec;
use serde_json::Value;
use std::fmt;
use tracing::debug;

const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A parsed `major.minor.patch` specification version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SpecVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `"3"`, `"2.0"` or `"3.0.3"`. Missing components default to 0.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().splitn(3, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(p) => p.parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            // Allow pre-release suffixes such as `3.1.0-rc1`.
            Some(p) => p
                .split(|c: char| !c.is_ascii_digit())
                .next()
                .filter(|d| !d.is_empty())?
                .parse()
                .ok()?,
            None => 0,
        };
        Some(Self::new(major, minor, patch))
    }

    pub fn variant(&self) -> SpecVariant {
        if self.major < 3 {
            SpecVariant::Legacy
        } else {
            SpecVariant::Current
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// The two supported schema families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecVariant {
    /// Swagger 2.x
    Legacy,
    /// OpenAPI 3.x
    Current,
}

impl fmt::Display for SpecVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecVariant::Legacy => write!(f, "swagger"),
            SpecVariant::Current => write!(f, "openapi"),
        }
    }
}

/// Read the declared version from `openapi`, falling back to `swagger`.
///
/// # Errors
///
/// [`SpecError::Validation`] when neither field is present or the value is
/// not a version number.
pub fn detect_version(document: &Value) -> Result<SpecVersion, SpecError> {
    let raw = ["openapi", "swagger"]
        .iter()
        .find_map(|field| document.get(*field))
        .ok_or_else(|| {
            SpecError::Validation(
                "unable to get the spec version: no `openapi` or `swagger` field".to_string(),
            )
        })?;

    let text = match raw {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => {
            return Err(SpecError::Validation(format!(
                "spec version must be a string, got {other}"
            )))
        }
    };

    SpecVersion::parse(&text)
        .ok_or_else(|| SpecError::Validation(format!("unrecognised spec version `{text}`")))
}

/// A Swagger 2.x document.
#[derive(Debug, Clone)]
pub struct SwaggerSpec {
    version: SpecVersion,
    document: Value,
}

/// An OpenAPI 3.x document, with its typed model.
#[derive(Debug, Clone)]
pub struct OpenApiSpec {
    version: SpecVersion,
    document: Value,
    model: OpenApiV3Spec,
}

impl OpenApiSpec {
    /// Typed view of the document, used for operation extraction.
    pub fn model(&self) -> &OpenApiV3Spec {
        &self.model
    }
}

/// A loaded specification, classified by version.
#[derive(Debug, Clone)]
pub enum Specification {
    Swagger2(SwaggerSpec),
    OpenApi3(OpenApiSpec),
}

impl Specification {
    /// Normalize keys of a raw YAML document and wrap it in the matching
    /// variant.
    ///
    /// # Errors
    ///
    /// [`SpecError::Validation`] when the version is missing or the document
    /// does not fit the OpenAPI 3 model.
    pub fn from_document(document: &serde_yaml::Value) -> Result<Self, SpecError> {
        let json = to_json(&normalize_keys(document))?;
        Self::from_json(json)
    }

    /// Wrap an already key-normalized JSON document.
    ///
    /// # Errors
    ///
    /// See [`Specification::from_document`].
    pub fn from_json(document: Value) -> Result<Self, SpecError> {
        if !document.is_object() {
            return Err(SpecError::Validation(
                "specification root must be a mapping".to_string(),
            ));
        }
        let version = detect_version(&document)?;
        debug!(%version, variant = %version.variant(), "Specification version detected");

        match version.variant() {
            SpecVariant::Legacy => Ok(Specification::Swagger2(SwaggerSpec { version, document })),
            SpecVariant::Current => {
                let mut typed = document.clone();
                strip_unknown_verbs(&mut typed);
                let model: OpenApiV3Spec = serde_json::from_value(typed).map_err(|e| {
                    SpecError::Validation(format!("not a valid OpenAPI {version} document: {e}"))
                })?;
                Ok(Specification::OpenApi3(OpenApiSpec {
                    version,
                    document,
                    model,
                }))
            }
        }
    }

    pub fn version(&self) -> SpecVersion {
        match self {
            Specification::Swagger2(s) => s.version,
            Specification::OpenApi3(s) => s.version,
        }
    }

    pub fn variant(&self) -> SpecVariant {
        self.version().variant()
    }

    /// The normalized document as served by the spec endpoints.
    pub fn document(&self) -> &Value {
        match self {
            Specification::Swagger2(s) => &s.document,
            Specification::OpenApi3(s) => &s.document,
        }
    }

    pub fn title(&self) -> &str {
        self.document()
            .pointer("/info/title")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// File name the raw document is published under, without extension.
    pub fn spec_file_stem(&self) -> &'static str {
        match self {
            Specification::Swagger2(_) => "swagger",
            Specification::OpenApi3(_) => "openapi",
        }
    }
}

/// Drop path-item keys that are neither HTTP methods nor known path-item
/// fields, so that vendor noise does not fail typed parsing.
fn strip_unknown_verbs(val: &mut Value) {
    if let Some(Value::Object(paths)) = val.get_mut("paths") {
        for item in paths.values_mut() {
            if let Value::Object(obj) = item {
                obj.retain(|k, _| {
                    let lk = k.to_ascii_lowercase();
                    match lk.as_str() {
                        "summary" | "description" | "servers" | "parameters" | "$ref" => true,
                        m if HTTP_METHODS.contains(&m) => true,
                        _ => k.starts_with("x-"),
                    }
                });
            }
        }
    }
}
