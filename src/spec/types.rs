use http::Method;

/// What a matched route is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    /// An operation declared in a specification, dispatched by handler name.
    Operation,
    /// An application page registered outside any specification.
    View,
    /// The normalized specification as JSON.
    SpecJson,
    /// The normalized specification as YAML.
    SpecYaml,
    /// Interactive API console page.
    ConsoleUi,
    /// Configuration object for the console.
    ConsoleUiConfig,
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RouteKind::Operation => "operation",
            RouteKind::View => "view",
            RouteKind::SpecJson => "spec-json",
            RouteKind::SpecYaml => "spec-yaml",
            RouteKind::ConsoleUi => "console-ui",
            RouteKind::ConsoleUiConfig => "console-ui-config",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub method: Method,
    /// Path template relative to `base_path`, e.g. `/people/{person_id}`.
    pub path_pattern: String,
    pub handler_name: String,
    pub kind: RouteKind,
    /// Canonical base path of the owning route group (`/` for the root).
    pub base_path: String,
    pub summary: Option<String>,
}

impl RouteMeta {
    pub fn new(
        method: Method,
        path_pattern: impl Into<String>,
        handler_name: impl Into<String>,
        kind: RouteKind,
    ) -> Self {
        Self {
            method,
            path_pattern: path_pattern.into(),
            handler_name: handler_name.into(),
            kind,
            base_path: "/".to_string(),
            summary: None,
        }
    }

    /// Copy of this route mounted under `base_path`.
    pub fn mounted_at(&self, base_path: &str) -> Self {
        Self {
            base_path: base_path.to_string(),
            ..self.clone()
        }
    }

    /// Base path and path template joined into the path the router matches.
    pub fn full_path(&self) -> String {
        join_paths(&self.base_path, &self.path_pattern)
    }
}

/// Join a canonical base path and a route path.
pub fn join_paths(base_path: &str, path: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{path}"),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{path}"),
    }
}

/// A named set of routes served under one base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGroup {
    pub name: String,
    pub base_path: String,
    pub routes: Vec<RouteMeta>,
}

impl RouteGroup {
    pub fn new(base_path: &str) -> Self {
        Self {
            name: group_name(base_path),
            base_path: base_path.to_string(),
            routes: Vec::new(),
        }
    }

    /// Add a route, rebasing it onto this group.
    pub fn push(&mut self, route: &RouteMeta) {
        self.routes.push(route.mounted_at(&self.base_path));
    }
}

/// Endpoint-safe group name derived from a base path.
pub fn group_name(base_path: &str) -> String {
    let name: String = base_path
        .trim_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        "root".to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/people"), "/people");
        assert_eq!(join_paths("/api", "/people"), "/api/people");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn test_group_name() {
        assert_eq!(group_name("/"), "root");
        assert_eq!(group_name("/api/v1"), "api_v1");
        assert_eq!(group_name("/api/v1.2-beta"), "api_v1_2_beta");
    }

    #[test]
    fn test_group_rebases_routes() {
        let mut group = RouteGroup::new("/api");
        group.push(&RouteMeta::new(
            Method::GET,
            "/people",
            "read_all_people",
            RouteKind::Operation,
        ));
        assert_eq!(group.name, "api");
        assert_eq!(group.routes[0].base_path, "/api");
        assert_eq!(group.routes[0].full_path(), "/api/people");
    }
}
