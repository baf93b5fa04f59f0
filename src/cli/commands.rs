use crate::{
    app::{App, AppError},
    config::{AppConfig, RuntimeConfig},
    dispatcher::Dispatcher,
    hot_reload::{apply_reload, watch_spec_files},
    router::Router,
    server::{AppService, HttpServer},
    spec::{load_specification, build_routes},
    static_files::StaticFiles,
    store::SqlitePersonStore,
    views::{self, Templates, ViewContext},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use http::Method;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{error, info};

/// Command-line interface for the people service.
#[derive(Parser)]
#[command(name = "people-api")]
#[command(about = "People directory served from an OpenAPI specification", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Create the person table
    InitDb {
        /// Database URL, e.g. sqlite://people.db
        #[arg(long, env = "PEOPLE_DATABASE_URL", default_value = "sqlite://people.db")]
        database: String,

        /// Insert the demo people when the table is empty
        #[arg(long, default_value_t = false)]
        seed: bool,
    },
    /// Print what a specification resolves to
    Inspect {
        /// Root specification file
        #[arg(short, long)]
        spec: PathBuf,
    },
}

/// Flags of `serve`; each one overrides the config file.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// YAML configuration file
    #[arg(short, long, env = "PEOPLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root specification file; its directory becomes the specification directory
    #[arg(short, long)]
    pub spec: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Database URL, e.g. sqlite://people.db
    #[arg(long, env = "PEOPLE_DATABASE_URL")]
    pub database: Option<String>,

    /// Directory holding home.html, people.html and console.html
    #[arg(long)]
    pub templates: Option<PathBuf>,

    /// Directory served under /static/
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Reload routes when a specification file changes
    #[arg(long, default_value_t = false)]
    pub watch: bool,
}

impl ServeArgs {
    /// Load the config file (if any) and apply the flags on top.
    pub fn resolve(&self) -> Result<AppConfig> {
        let mut config = AppConfig::load(self.config.as_deref())?;
        if let Some(spec) = &self.spec {
            config.spec.dir = spec
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            config.spec.file = spec
                .file_name()
                .map(PathBuf::from)
                .with_context(|| format!("invalid spec path {}", spec.display()))?;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(database) = &self.database {
            config.database.url = database.clone();
        }
        if let Some(templates) = &self.templates {
            config.templates_dir = templates.clone();
        }
        if let Some(static_dir) = &self.static_dir {
            config.static_dir = Some(static_dir.clone());
        }
        config.watch |= self.watch;
        config.runtime = config.runtime.apply_env();
        Ok(config)
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => serve(args.resolve()?),
        Commands::InitDb { database, seed } => {
            let inserted = init_db(&database, seed)?;
            println!("person table ready in {database} ({inserted} people inserted)");
            Ok(())
        }
        Commands::Inspect { spec } => {
            print!("{}", inspect(&spec)?);
            Ok(())
        }
    }
}

/// Assemble the application: the configured API plus the home page.
pub fn build_app(config: &AppConfig) -> Result<App, AppError> {
    let mut app = App::new(&config.spec.dir);
    app.add_api(&config.spec.file, config.api.clone())?;
    app.add_view(Method::GET, "/", views::LIST_PEOPLE);
    Ok(app)
}

/// Create the person table, optionally seeding it. Returns the number of
/// people inserted.
pub fn init_db(database: &str, seed: bool) -> Result<usize> {
    let store = SqlitePersonStore::connect(database)
        .with_context(|| format!("failed to open database {database}"))?;
    store.init_schema().context("failed to create person table")?;
    if seed {
        return store.seed().context("failed to seed person table");
    }
    Ok(0)
}

/// Human-readable summary of a specification.
pub fn inspect(spec_path: &Path) -> Result<String> {
    let (spec, sources) = load_specification(spec_path)
        .with_context(|| format!("failed to load {}", spec_path.display()))?;
    let base_paths = spec.base_paths()?;
    let routes = build_routes(&spec)?;

    let mut out = String::new();
    writeln!(out, "title:      {}", spec.title())?;
    writeln!(out, "version:    {} ({})", spec.version(), spec.variant())?;
    writeln!(out, "base paths: {}", base_paths.join(", "))?;
    writeln!(out, "routes:")?;
    for route in &routes {
        writeln!(
            out,
            "  {:<7} {:<30} -> {}",
            route.method.as_str(),
            route.path_pattern,
            route.handler_name
        )?;
    }
    writeln!(out, "files:")?;
    for source in &sources {
        writeln!(out, "  {}", source.display())?;
    }
    Ok(out)
}

/// Run the server until the process is stopped.
pub fn serve(config: AppConfig) -> Result<()> {
    let RuntimeConfig { stack_size } = config.runtime;
    may::config().set_stack_size(stack_size);
    info!(stack_size, "Coroutine stack size configured");

    let store = SqlitePersonStore::connect(&config.database.url)
        .with_context(|| format!("failed to open database {}", config.database.url))?;
    store.init_schema().context("failed to create person table")?;

    let templates = Templates::new(&config.templates_dir);
    let ctx = ViewContext::new(Arc::new(store), templates.clone());
    let mut dispatcher = Dispatcher::with_stack_size(stack_size);
    views::register_views(&mut dispatcher, &ctx);

    let app = build_app(&config)
        .with_context(|| format!("failed to load {}", config.spec_path().display()))?;
    for route in app.routes() {
        if matches!(route.kind, crate::spec::RouteKind::Operation)
            && !dispatcher.has_handler(&route.handler_name)
        {
            error!(handler = %route.handler_name, path = %route.full_path(), "No handler registered for operation");
        }
    }

    let router = Arc::new(RwLock::new(Router::new(app.routes())));
    let documents = Arc::new(RwLock::new(app.documents()));
    let service = AppService::new(
        Arc::clone(&router),
        Arc::new(RwLock::new(dispatcher)),
        Arc::clone(&documents),
        templates,
        config.static_dir.clone().map(StaticFiles::new),
    );

    let _watcher = if config.watch {
        let files = app.extra_files().to_vec();
        let mut app = app;
        let router = Arc::clone(&router);
        let documents = Arc::clone(&documents);
        Some(watch_spec_files(files, move || {
            match apply_reload(&mut app, &router, &documents) {
                Ok(files) => Some(files),
                Err(e) => {
                    error!(error = %e, "hot-reload failed, keeping previous routes");
                    None
                }
            }
        })?)
    } else {
        None
    };

    let addr = config.server.addr();
    let handle = HttpServer(service)
        .start(&addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, watch = config.watch, "people-api started");
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server thread panicked: {e:?}"))?;
    Ok(())
}
