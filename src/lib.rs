//! # people-api
//!
//! **people-api** serves a small people directory whose JSON API is described
//! by an OpenAPI 3 (or Swagger 2) specification split over several YAML files.
//!
//! ## Overview
//!
//! The specification root may pull in other files with the `!include` tag.
//! The loader inlines them recursively, relative to the including file, and
//! remembers every file it read so the server can reload when any of them
//! changes. The merged document is key-normalized, classified by its declared
//! version and mounted under each base path its servers resolve to.
//!
//! ## Architecture
//!
//! - **[`spec`]** - `!include` loading, key normalization, version dispatch,
//!   base path resolution and operation extraction
//! - **[`app`]** - Assembles APIs and views into route groups, one per base path
//! - **[`router`]** - Regex-based path matching
//! - **[`dispatcher`]** - Coroutine-based handler dispatch by handler name
//! - **[`server`]** - HTTP service on top of `may_minihttp`
//! - **[`views`]** - HTML pages and JSON operations over the person store
//! - **[`store`]** - SQLite-backed person storage
//! - **[`hot_reload`]** - Rebuilds routes when a specification file changes
//! - **[`config`]** / **[`logging`]** - YAML configuration and `tracing` setup
//! - **[`cli`]** - The `people-api` command line
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService
//!     participant Router
//!     participant Dispatcher
//!     participant Handler as views::*
//!     participant Store as SqlitePersonStore
//!
//!     Client->>Server: GET /api/people
//!     Server->>Router: route(GET, "/api/people")
//!     Router-->>Server: RouteMatch { handler: read_all_people }
//!     Server->>Dispatcher: dispatch(route_match)
//!     Dispatcher->>Handler: HandlerRequest (channel)
//!     Handler->>Store: all()
//!     Store-->>Handler: Vec<Person>
//!     Handler-->>Dispatcher: HandlerResponse (reply channel)
//!     Dispatcher-->>Server: HandlerResponse
//!     Server-->>Client: 200 application/json
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! people-api init-db --database sqlite://people.db --seed
//! people-api serve --config config/config.yaml --watch
//! ```
//!
//! | Path | Served by |
//! |------|-----------|
//! | `/` | home page listing every person |
//! | `/api/people` | JSON list of people |
//! | `/api/people/{person_id}` | one person, 404 when unknown |
//! | `/api/people-update` | HTML fragment of the person table |
//! | `/api/openapi.json`, `/api/openapi.yaml` | the merged specification |
//! | `/api/ui/` | interactive API console |
//! | `/health` | liveness probe |
//!
//! ## Library Use
//!
//! ```rust,no_run
//! use people_api::{app::App, config::ApiOptions, router::Router};
//! use http::Method;
//!
//! let mut app = App::new("swagger");
//! app.add_api("swagger.yml", ApiOptions::default())?;
//! app.add_view(Method::GET, "/", "list_people");
//!
//! let router = Router::new(app.routes());
//! assert!(router.route(Method::GET, "/api/people").is_some());
//! # Ok::<(), people_api::app::AppError>(())
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod hot_reload;
pub mod logging;
pub mod router;
pub mod server;
pub mod spec;
pub mod static_files;
pub mod store;
pub mod validator;
pub mod views;

pub use app::{Api, App, AppError};
pub use spec::{load_document, load_specification, RouteKind, RouteMeta, Specification};
