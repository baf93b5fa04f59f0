//! # Application Assembler
//!
//! Turns loaded specifications into route groups and keeps track of the
//! files they came from.
//!
//! Customisation happens through the [`ApiLayer`] trait: every step (load,
//! base path resolution, registration) has a default implementation that a
//! caller can override without touching [`App`] itself.
//!
//! ```rust,ignore
//! let mut app = App::new("swagger");
//! app.add_api("swagger.yml", ApiOptions::default())?;
//! app.add_view(Method::GET, "/", "list_people");
//! let router = Router::new(app.routes());
//! let watched = app.extra_files();
//! ```

use crate::config::ApiOptions;
use crate::spec::{
    build_routes, load_document, LoadedDocument, RouteGroup, RouteKind, RouteMeta,
    SpecError, Specification,
};
use http::Method;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("base path `{base_path}` is already served by {owner}")]
    DuplicateBasePath { base_path: String, owner: String },
}

/// The three customisation points of API registration.
pub trait ApiLayer: Send + Sync {
    /// Read the specification file at `path` and everything it includes.
    fn load_specification(&self, path: &Path) -> Result<LoadedDocument, SpecError> {
        load_document(path)
    }

    /// Base paths the specification is served under.
    fn resolve_base_paths(&self, spec: &Specification) -> Result<Vec<String>, SpecError> {
        spec.base_paths()
    }

    /// Mount the groups of `api` on the registry, one group per base path.
    fn register_routes(&self, registry: &mut RouteRegistry, api: &Api) -> Result<(), AppError> {
        for group in &api.groups {
            registry.register(group.clone(), &api.id)?;
        }
        Ok(())
    }
}

/// Uses every default of [`ApiLayer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultApiLayer;

impl ApiLayer for DefaultApiLayer {}

/// A specification attached to the application.
#[derive(Debug, Clone)]
pub struct Api {
    /// Canonical root file for file-backed APIs, a generated label otherwise.
    pub id: String,
    pub specification: Arc<Specification>,
    pub options: ApiOptions,
    /// De-duplicated, in declaration order.
    pub base_paths: Vec<String>,
    pub groups: Vec<RouteGroup>,
    /// Files the specification was assembled from; empty for in-memory
    /// documents.
    pub sources: Vec<PathBuf>,
}

impl Api {
    fn build(
        id: String,
        specification: Specification,
        options: ApiOptions,
        base_paths: Vec<String>,
        sources: Vec<PathBuf>,
    ) -> Result<Self, SpecError> {
        let operations = build_routes(&specification)?;

        let mut unique: Vec<String> = Vec::with_capacity(base_paths.len());
        for base in base_paths {
            if !unique.contains(&base) {
                unique.push(base);
            }
        }

        let stem = specification.spec_file_stem();
        let groups = unique
            .iter()
            .map(|base| {
                let mut group = RouteGroup::new(base);
                for route in auxiliary_routes(&group.name, stem, &options) {
                    group.push(&route);
                }
                for route in &operations {
                    group.push(route);
                }
                group
            })
            .collect();

        Ok(Self {
            id,
            specification: Arc::new(specification),
            options,
            base_paths: unique,
            groups,
            sources,
        })
    }

    pub fn title(&self) -> &str {
        self.specification.title()
    }
}

/// Spec document and console routes for one group, relative to its base path.
fn auxiliary_routes(group: &str, stem: &str, options: &ApiOptions) -> Vec<RouteMeta> {
    let mut routes = Vec::new();
    if options.spec_endpoints {
        routes.push(RouteMeta::new(
            Method::GET,
            format!("/{stem}.json"),
            format!("{group}.{stem}_json"),
            RouteKind::SpecJson,
        ));
        routes.push(RouteMeta::new(
            Method::GET,
            format!("/{stem}.yaml"),
            format!("{group}.{stem}_yaml"),
            RouteKind::SpecYaml,
        ));
    }
    if options.console_ui {
        let ui = options.console_ui_path.trim_matches('/');
        if options.console_ui_config.is_some() {
            routes.push(RouteMeta::new(
                Method::GET,
                format!("/{ui}/swagger-ui-config.json"),
                format!("{group}_swagger_ui_config"),
                RouteKind::ConsoleUiConfig,
            ));
        }
        routes.push(RouteMeta::new(
            Method::GET,
            format!("/{ui}/"),
            format!("{group}_swagger_ui_index"),
            RouteKind::ConsoleUi,
        ));
    }
    routes
}

/// Route groups keyed by base path. A base path belongs to exactly one API.
#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    groups: Vec<RouteGroup>,
    owners: HashMap<String, String>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `group` on behalf of `owner`.
    ///
    /// # Errors
    ///
    /// [`AppError::DuplicateBasePath`] when another owner already serves the
    /// group's base path.
    pub fn register(&mut self, group: RouteGroup, owner: &str) -> Result<(), AppError> {
        if let Some(existing) = self.owners.get(&group.base_path) {
            return Err(AppError::DuplicateBasePath {
                base_path: group.base_path,
                owner: existing.clone(),
            });
        }
        info!(
            group = %group.name,
            base_path = %group.base_path,
            routes = group.routes.len(),
            "Route group registered"
        );
        self.owners.insert(group.base_path.clone(), owner.to_string());
        self.groups.push(group);
        Ok(())
    }

    /// Drop every group registered by `owner`.
    pub fn remove_owner(&mut self, owner: &str) {
        self.owners.retain(|_, o| o != owner);
        let owners = &self.owners;
        self.groups.retain(|g| owners.contains_key(&g.base_path));
    }

    pub fn groups(&self) -> &[RouteGroup] {
        &self.groups
    }

    pub fn group(&self, base_path: &str) -> Option<&RouteGroup> {
        self.groups.iter().find(|g| g.base_path == base_path)
    }

    pub fn owner(&self, base_path: &str) -> Option<&str> {
        self.owners.get(base_path).map(String::as_str)
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteMeta> {
        self.groups.iter().flat_map(|g| g.routes.iter())
    }
}

/// What the spec endpoints and the console of one base path serve.
#[derive(Debug, Clone)]
pub struct ApiDocument {
    pub specification: Arc<Specification>,
    pub options: ApiOptions,
}

/// Base path to the API mounted there.
pub type ApiDocuments = HashMap<String, ApiDocument>;

#[derive(Debug, Clone)]
enum ApiSource {
    File(PathBuf),
    Document(serde_yaml::Value),
}

#[derive(Debug, Clone)]
struct Registration {
    /// Id of the API this registration produced.
    id: String,
    source: ApiSource,
    options: ApiOptions,
}

/// The assembled application: APIs, route groups, app-level views and the
/// list of files to watch.
pub struct App {
    specification_dir: PathBuf,
    layer: Arc<dyn ApiLayer>,
    registry: RouteRegistry,
    apis: Vec<Api>,
    views: Vec<RouteMeta>,
    extra_files: Vec<PathBuf>,
    registrations: Vec<Registration>,
    documents_added: usize,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("specification_dir", &self.specification_dir)
            .field("apis", &self.apis.len())
            .field("views", &self.views.len())
            .field("extra_files", &self.extra_files)
            .finish()
    }
}

impl App {
    pub fn new(specification_dir: impl Into<PathBuf>) -> Self {
        Self::with_layer(specification_dir, Arc::new(DefaultApiLayer))
    }

    pub fn with_layer(specification_dir: impl Into<PathBuf>, layer: Arc<dyn ApiLayer>) -> Self {
        Self {
            specification_dir: specification_dir.into(),
            layer,
            registry: RouteRegistry::new(),
            apis: Vec::new(),
            views: Vec::new(),
            extra_files: Vec::new(),
            registrations: Vec::new(),
            documents_added: 0,
        }
    }

    pub fn specification_dir(&self) -> &Path {
        &self.specification_dir
    }

    /// Attach the specification file at `path`, relative to the
    /// specification directory.
    ///
    /// Adding the same file again replaces the earlier registration.
    ///
    /// # Errors
    ///
    /// Loading, validation and base path conflicts with other APIs.
    pub fn add_api(&mut self, path: impl AsRef<Path>, options: ApiOptions) -> Result<&Api, AppError> {
        let path = self.specification_dir.join(path.as_ref());
        let LoadedDocument { root, sources } = self.layer.load_specification(&path)?;
        let id = sources
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let specification = Specification::from_document(&root)?;
        let base_paths = self.layer.resolve_base_paths(&specification)?;
        let api = Api::build(id.clone(), specification, options.clone(), base_paths, sources)?;

        let replaced = self.apis.iter().any(|existing| existing.id == id);
        let index = self.attach(api, replaced)?;

        let registration = Registration {
            id,
            source: ApiSource::File(path),
            options,
        };
        match self
            .registrations
            .iter_mut()
            .find(|existing| existing.id == registration.id)
        {
            Some(existing) => *existing = registration,
            None => self.registrations.push(registration),
        }
        Ok(&self.apis[index])
    }

    /// Attach an in-memory specification. Nothing is added to the watch
    /// list.
    ///
    /// # Errors
    ///
    /// See [`App::add_api`].
    pub fn add_api_document(
        &mut self,
        document: serde_yaml::Value,
        options: ApiOptions,
    ) -> Result<&Api, AppError> {
        let specification = Specification::from_document(&document)?;
        let base_paths = self.layer.resolve_base_paths(&specification)?;
        self.documents_added += 1;
        let id = format!("document #{}", self.documents_added);
        let api = Api::build(id.clone(), specification, options.clone(), base_paths, Vec::new())?;

        let index = self.attach(api, false)?;
        self.registrations.push(Registration {
            id,
            source: ApiSource::Document(document),
            options,
        });
        Ok(&self.apis[index])
    }

    /// Register an application page outside any API.
    pub fn add_view(&mut self, method: Method, path: &str, handler_name: &str) {
        debug!(%method, path, handler_name, "View registered");
        self.views
            .push(RouteMeta::new(method, path, handler_name, RouteKind::View));
    }

    /// Register `api`, replacing an API with the same id when `replace` is
    /// set. The registry is only updated when every group mounts.
    fn attach(&mut self, api: Api, replace: bool) -> Result<usize, AppError> {
        let mut staged = self.registry.clone();
        if replace {
            staged.remove_owner(&api.id);
        }
        self.layer.register_routes(&mut staged, &api)?;
        self.registry = staged;

        if replace {
            self.apis.retain(|existing| existing.id != api.id);
        }
        for source in &api.sources {
            if !self.extra_files.contains(source) {
                self.extra_files.push(source.clone());
            }
        }
        info!(
            api = %api.id,
            title = %api.title(),
            variant = %api.specification.variant(),
            base_paths = ?api.base_paths,
            replaced = replace,
            "API added"
        );
        self.apis.push(api);
        Ok(self.apis.len() - 1)
    }

    /// Every route the router should serve: views first, then API groups.
    pub fn routes(&self) -> Vec<RouteMeta> {
        self.views
            .iter()
            .cloned()
            .chain(self.registry.routes().cloned())
            .collect()
    }

    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    pub fn apis(&self) -> &[Api] {
        &self.apis
    }

    /// Specification files to watch for changes.
    pub fn extra_files(&self) -> &[PathBuf] {
        &self.extra_files
    }

    /// The API document served under each base path.
    pub fn documents(&self) -> ApiDocuments {
        let mut documents = ApiDocuments::new();
        for api in &self.apis {
            for base in &api.base_paths {
                documents.insert(
                    base.clone(),
                    ApiDocument {
                        specification: Arc::clone(&api.specification),
                        options: api.options.clone(),
                    },
                );
            }
        }
        documents
    }

    /// Build a fresh application from the same registrations, re-reading
    /// every file.
    ///
    /// # Errors
    ///
    /// The first registration that no longer loads.
    pub fn reload(&self) -> Result<App, AppError> {
        let mut app = App::with_layer(&self.specification_dir, Arc::clone(&self.layer));
        for registration in &self.registrations {
            match &registration.source {
                ApiSource::File(path) => {
                    let relative = path.strip_prefix(&self.specification_dir).unwrap_or(path);
                    app.add_api(relative, registration.options.clone())?;
                }
                ApiSource::Document(doc) => {
                    app.add_api_document(doc.clone(), registration.options.clone())?;
                }
            }
        }
        app.views = self.views.clone();
        Ok(app)
    }
}
