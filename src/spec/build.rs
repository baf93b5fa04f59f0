use super::error::SpecError;
use super::types::{RouteKind, RouteMeta};
use super::version::{OpenApiSpec, Specification};
use crate::validator::{fail_if_issues, ValidationIssue};
use http::Method;
use serde_json::Value;
use tracing::debug;

const SWAGGER_METHODS: [&str; 7] = ["get", "put", "post", "delete", "options", "head", "patch"];

/// Extract one [`RouteMeta`] per operation, relative to the spec's base
/// paths.
///
/// The handler name comes from an `x-handler` extension when present, else
/// from `operationId`.
///
/// # Errors
///
/// [`SpecError::Validation`] listing every operation without a handler name.
pub fn build_routes(spec: &Specification) -> Result<Vec<RouteMeta>, SpecError> {
    let mut issues = Vec::new();
    let routes = match spec {
        Specification::OpenApi3(openapi) => openapi_routes(openapi, &mut issues),
        Specification::Swagger2(_) => swagger_routes(spec.document(), &mut issues),
    };
    fail_if_issues(issues)?;
    debug!(count = routes.len(), title = %spec.title(), "Operations extracted");
    Ok(routes)
}

fn openapi_routes(spec: &OpenApiSpec, issues: &mut Vec<ValidationIssue>) -> Vec<RouteMeta> {
    let mut routes = Vec::new();
    let Some(paths) = spec.model().paths.as_ref() else {
        return routes;
    };

    for (path, item) in paths {
        for (method, operation) in item.methods() {
            let method = method.clone();
            let location = format!("{} -> {}", path, method);

            let from_extension = operation.extensions.iter().find_map(|(key, val)| {
                let key = key.strip_prefix("x-").unwrap_or(key);
                match val {
                    Value::String(s) if key.starts_with("handler") => Some(s.clone()),
                    _ => None,
                }
            });

            let Some(handler_name) = from_extension.or_else(|| operation.operation_id.clone())
            else {
                issues.push(ValidationIssue::new(
                    &location,
                    "MissingHandler",
                    "Missing operationId or x-handler extension",
                ));
                continue;
            };

            let mut route = RouteMeta::new(method, path.clone(), handler_name, RouteKind::Operation);
            route.summary = operation.summary.clone();
            routes.push(route);
        }
    }
    routes
}

fn swagger_routes(document: &Value, issues: &mut Vec<ValidationIssue>) -> Vec<RouteMeta> {
    let mut routes = Vec::new();
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return routes;
    };

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        for (verb, operation) in item {
            let verb = verb.to_ascii_lowercase();
            if !SWAGGER_METHODS.contains(&verb.as_str()) {
                continue;
            }
            let Ok(method) = Method::from_bytes(verb.to_ascii_uppercase().as_bytes()) else {
                continue;
            };
            let location = format!("{} -> {}", path, method);

            let handler_name = operation
                .get("x-handler")
                .or_else(|| operation.get("operationId"))
                .and_then(Value::as_str)
                .map(str::to_string);

            let Some(handler_name) = handler_name else {
                issues.push(ValidationIssue::new(
                    &location,
                    "MissingHandler",
                    "Missing operationId or x-handler extension",
                ));
                continue;
            };

            let mut route = RouteMeta::new(method, path.clone(), handler_name, RouteKind::Operation);
            route.summary = operation
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string);
            routes.push(route);
        }
    }
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_openapi_routes() {
        let spec = Specification::from_json(json!({
            "openapi": "3.0.0",
            "info": { "title": "People", "version": "1.0" },
            "paths": {
                "/people": {
                    "get": {
                        "operationId": "read_all_people",
                        "summary": "List people",
                        "responses": { "200": { "description": "OK" } }
                    }
                },
                "/people/{person_id}": {
                    "get": {
                        "operationId": "read_one_person",
                        "responses": { "200": { "description": "OK" } }
                    }
                }
            }
        }))
        .unwrap();

        let routes = build_routes(&spec).unwrap();
        assert_eq!(routes.len(), 2);
        let list = routes.iter().find(|r| r.path_pattern == "/people").unwrap();
        assert_eq!(list.method, Method::GET);
        assert_eq!(list.handler_name, "read_all_people");
        assert_eq!(list.summary.as_deref(), Some("List people"));
        assert_eq!(list.kind, RouteKind::Operation);
    }

    #[test]
    fn test_swagger_routes() {
        let spec = Specification::from_json(json!({
            "swagger": "2.0",
            "basePath": "/api",
            "paths": {
                "/people": {
                    "parameters": [],
                    "get": { "operationId": "read_all_people" },
                    "post": { "x-handler": "create_person", "operationId": "ignored" }
                }
            }
        }))
        .unwrap();

        let routes = build_routes(&spec).unwrap();
        assert_eq!(routes.len(), 2);
        let post = routes.iter().find(|r| r.method == Method::POST).unwrap();
        assert_eq!(post.handler_name, "create_person");
    }

    #[test]
    fn test_missing_handler_is_an_error() {
        let spec = Specification::from_json(json!({
            "swagger": "2.0",
            "paths": { "/people": { "get": { "summary": "no id" } } }
        }))
        .unwrap();

        let err = build_routes(&spec).unwrap_err();
        assert!(err.to_string().contains("MissingHandler"));
    }
}
