//! Specification loading.
//!
//! A root YAML document is read with [`load_document`], which inlines every
//! `!include` tag relative to the including file. The merged tree is then
//! key-normalized and classified as Swagger 2 or OpenAPI 3 by
//! [`Specification::from_document`]. Base paths and operations are derived
//! from the classified document.

mod base_path;
mod build;
mod error;
mod include;
mod normalize;
mod types;
mod version;

pub use base_path::canonical_base_path;
pub use build::build_routes;
pub use error::SpecError;
pub use include::{load_document, LoadedDocument};
pub use normalize::{normalize_keys, to_json};
pub use types::{group_name, join_paths, RouteGroup, RouteKind, RouteMeta};
pub use version::{
    detect_version, OpenApiSpec, SpecVariant, SpecVersion, Specification, SwaggerSpec,
};

use std::path::Path;

/// Load a specification file with its includes and classify it.
///
/// Returns the specification and every file it was assembled from.
///
/// # Errors
///
/// Any loading, parsing or validation failure.
pub fn load_specification(
    path: impl AsRef<Path>,
) -> Result<(Specification, Vec<std::path::PathBuf>), SpecError> {
    let LoadedDocument { root, sources } = load_document(path)?;
    let spec = Specification::from_document(&root)?;
    Ok((spec, sources))
}
