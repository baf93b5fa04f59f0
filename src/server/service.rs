use super::request::{parse_request, ParsedRequest};
use super::response::{write_bytes, write_handler_response};
use crate::app::{ApiDocument, ApiDocuments};
use crate::dispatcher::{Dispatcher, HandlerResponse};
use crate::router::{RouteMatch, Router};
use crate::spec::{join_paths, RouteKind};
use crate::static_files::{StaticFiles, STATIC_PREFIX};
use crate::views::Templates;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::json;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, warn};

/// Template rendered for the API console.
pub const CONSOLE_TEMPLATE: &str = "console.html";

/// The HTTP service shared by every connection.
///
/// Router, dispatcher and API documents sit behind locks so that a spec
/// reload can swap them while the server runs.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<RwLock<Router>>,
    pub dispatcher: Arc<RwLock<Dispatcher>>,
    pub documents: Arc<RwLock<ApiDocuments>>,
    pub templates: Templates,
    pub static_files: Option<StaticFiles>,
}

/// What a request resolved to before it is written out.
#[derive(Debug)]
pub enum Reply {
    Handler(HandlerResponse),
    Bytes {
        content_type: &'static str,
        bytes: Vec<u8>,
    },
}

impl AppService {
    pub fn new(
        router: Arc<RwLock<Router>>,
        dispatcher: Arc<RwLock<Dispatcher>>,
        documents: Arc<RwLock<ApiDocuments>>,
        templates: Templates,
        static_files: Option<StaticFiles>,
    ) -> Self {
        Self {
            router,
            dispatcher,
            documents,
            templates,
            static_files,
        }
    }

    /// Resolve a parsed request to a reply.
    pub fn handle(&self, req: ParsedRequest) -> Reply {
        let ParsedRequest {
            method,
            path,
            headers,
            query_params,
            body,
        } = req;

        let Ok(http_method) = method.parse::<Method>() else {
            return Reply::Handler(HandlerResponse::error(400, "Invalid HTTP method"));
        };

        if http_method == Method::GET && path == "/health" {
            return Reply::Handler(health_response());
        }

        if http_method == Method::GET {
            if let (Some(sf), Some(file)) = (&self.static_files, path.strip_prefix(STATIC_PREFIX)) {
                return match sf.load(file) {
                    Ok((bytes, content_type)) => Reply::Bytes {
                        content_type,
                        bytes,
                    },
                    Err(_) => Reply::Handler(not_found(&method, &path)),
                };
            }
        }

        let route_match = {
            let router = self.router.read().unwrap_or_else(PoisonError::into_inner);
            router.route(http_method, &path)
        };
        let Some(mut route_match) = route_match else {
            return Reply::Handler(not_found(&method, &path));
        };
        route_match.query_params = query_params;

        debug!(
            method = %method,
            path = %path,
            handler = %route_match.handler_name,
            kind = %route_match.kind(),
            "Route matched"
        );

        let response = match route_match.kind() {
            RouteKind::Operation | RouteKind::View => {
                let dispatched = {
                    let dispatcher = self
                        .dispatcher
                        .read()
                        .unwrap_or_else(PoisonError::into_inner);
                    dispatcher.dispatch(route_match, &path, headers, body)
                };
                dispatched.unwrap_or_else(|| {
                    HandlerResponse::json(
                        500,
                        json!({
                            "error": "Handler failed or not registered",
                            "method": method,
                            "path": path
                        }),
                    )
                })
            }
            kind => self.document_response(kind, &route_match),
        };
        Reply::Handler(response)
    }

    fn document_for(&self, base_path: &str) -> Option<ApiDocument> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        documents.get(base_path).cloned()
    }

    /// Spec documents and console pages of the API mounted at the route's
    /// base path.
    fn document_response(&self, kind: RouteKind, route_match: &RouteMatch) -> HandlerResponse {
        let base_path = &route_match.route.base_path;
        let Some(doc) = self.document_for(base_path) else {
            warn!(base_path = %base_path, "No API document for base path");
            return HandlerResponse::error(404, "API document not found");
        };
        let spec = &doc.specification;

        match kind {
            RouteKind::SpecJson => HandlerResponse::json(200, spec.document().clone()),
            RouteKind::SpecYaml => match serde_yaml::to_string(spec.document()) {
                Ok(text) => {
                    let mut resp = HandlerResponse::new(200, Vec::new(), text.into());
                    resp.set_header("content-type", "text/yaml; charset=utf-8".to_string());
                    resp
                }
                Err(e) => {
                    error!(error = %e, "Failed to serialize specification as YAML");
                    HandlerResponse::error(500, "Failed to serialize specification")
                }
            },
            RouteKind::ConsoleUiConfig => HandlerResponse::json(
                200,
                doc.options.console_ui_config.clone().unwrap_or_else(|| json!({})),
            ),
            RouteKind::ConsoleUi => {
                let ui = doc.options.console_ui_path.trim_matches('/');
                let spec_url = doc
                    .options
                    .spec_endpoints
                    .then(|| join_paths(base_path, &format!("/{}.json", spec.spec_file_stem())));
                let config_url = doc
                    .options
                    .console_ui_config
                    .as_ref()
                    .map(|_| join_paths(base_path, &format!("/{ui}/swagger-ui-config.json")));
                let ctx = json!({
                    "title": spec.title(),
                    "spec_url": spec_url,
                    "config_url": config_url,
                });
                match self.templates.render(CONSOLE_TEMPLATE, ctx) {
                    Ok(html) => HandlerResponse::html(200, html),
                    Err(e) => {
                        error!(error = %e, "Failed to render console");
                        HandlerResponse::error(500, &e.to_string())
                    }
                }
            }
            RouteKind::Operation | RouteKind::View => {
                HandlerResponse::error(500, "Handler route served as document")
            }
        }
    }
}

/// Basic health check response, `{ "status": "ok" }`.
pub fn health_response() -> HandlerResponse {
    HandlerResponse::json(200, json!({ "status": "ok" }))
}

fn not_found(method: &str, path: &str) -> HandlerResponse {
    HandlerResponse::json(
        404,
        json!({ "error": "Not Found", "method": method, "path": path }),
    )
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        match self.handle(parse_request(req)) {
            Reply::Handler(resp) => write_handler_response(res, resp),
            Reply::Bytes {
                content_type,
                bytes,
            } => write_bytes(res, 200, content_type, bytes),
        }
        Ok(())
    }
}
