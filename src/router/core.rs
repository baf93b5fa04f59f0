use crate::spec::{RouteKind, RouteMeta};
use http::Method;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<RouteMeta>,
    /// Path parameters extracted from the URL (`{person_id}` -> `"1"`).
    pub path_params: HashMap<String, String>,
    pub handler_name: String,
    /// Query string parameters, filled in by the server.
    pub query_params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn kind(&self) -> RouteKind {
        self.route.kind
    }

    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }
}

struct CompiledRoute {
    method: Method,
    regex: Regex,
    meta: Arc<RouteMeta>,
    param_names: Vec<String>,
}

/// Router to match HTTP requests to handlers.
#[derive(Clone, Default)]
pub struct Router {
    routes: Arc<Vec<CompiledRoute>>,
}

impl Router {
    #[must_use]
    pub fn new(routes: Vec<RouteMeta>) -> Self {
        let mut routes = routes;
        // Most specific first: `/people/update` is tried before `/people/{id}`.
        routes.sort_by_cached_key(|r| std::cmp::Reverse(specificity(&r.full_path())));

        let compiled: Vec<CompiledRoute> = routes
            .into_iter()
            .map(|route| {
                let full_path = route.full_path();
                let (regex, param_names) = Self::path_to_regex(&full_path);
                debug!(
                    method = %route.method,
                    path = %full_path,
                    handler = %route.handler_name,
                    kind = %route.kind,
                    "Route compiled"
                );
                CompiledRoute {
                    method: route.method.clone(),
                    regex,
                    meta: Arc::new(route),
                    param_names,
                }
            })
            .collect();

        info!(routes_count = compiled.len(), "Routing table loaded");
        Self {
            routes: Arc::new(compiled),
        }
    }

    /// Find the first route matching `method` and `path`.
    ///
    /// `HEAD` falls back to the matching `GET` route.
    pub fn route(&self, method: Method, path: &str) -> Option<RouteMatch> {
        self.find(&method, path).or_else(|| {
            if method == Method::HEAD {
                self.find(&Method::GET, path)
            } else {
                None
            }
        })
    }

    fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let path = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        // A trailing slash on the template (console pages) is matched without it.
        let path = if path.is_empty() { "/" } else { path };

        for route in self.routes.iter() {
            if route.method != *method {
                continue;
            }
            let Some(captures) = route.regex.captures(path) else {
                continue;
            };
            let mut params = HashMap::with_capacity(route.param_names.len());
            for (i, name) in route.param_names.iter().enumerate() {
                if let Some(val) = captures.get(i + 1) {
                    params.insert(name.clone(), val.as_str().to_string());
                }
            }
            return Some(RouteMatch {
                route: Arc::clone(&route.meta),
                path_params: params,
                handler_name: route.meta.handler_name.clone(),
                query_params: HashMap::new(),
            });
        }
        None
    }

    /// All mounted routes, most specific first.
    pub fn routes(&self) -> impl Iterator<Item = &RouteMeta> {
        self.routes.iter().map(|r| r.meta.as_ref())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Compile a path template to an anchored regex and its parameter names.
    pub(crate) fn path_to_regex(path: &str) -> (Regex, Vec<String>) {
        let mut pattern = String::with_capacity(path.len() + 5);
        pattern.push('^');
        let mut param_names = Vec::with_capacity(path.matches('{').count());

        for segment in path.split('/') {
            if segment.starts_with('{') && segment.ends_with('}') {
                let param_name = segment
                    .trim_start_matches('{')
                    .trim_end_matches('}')
                    .to_string();
                pattern.push_str("/([^/]+)");
                param_names.push(param_name);
            } else if !segment.is_empty() {
                pattern.push('/');
                pattern.push_str(&regex::escape(segment));
            }
        }
        if pattern.len() == 1 {
            pattern.push('/');
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).expect("escaped path template is a valid regex");
        (regex, param_names)
    }
}

/// Split a raw query string into decoded key/value pairs. Later keys win.
/// Segment count, literal segment count, then length.
fn specificity(path: &str) -> (usize, usize, usize) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let literals = segments
        .iter()
        .filter(|s| !(s.starts_with('{') && s.ends_with('}')))
        .count();
    (segments.len(), literals, path.len())
}

pub fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
