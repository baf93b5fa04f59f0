//! # View Functions
//!
//! HTML pages and the JSON handlers named by the people specification. All of
//! them read from a shared [`PersonStore`].
//!
//! | handler              | output                         |
//! |----------------------|--------------------------------|
//! | `list_people`        | `home.html`                    |
//! | `list_people_update` | `people.html`                  |
//! | `read_all_people`    | JSON array of people           |
//! | `read_one_person`    | JSON person, 404 when missing  |

mod templates;

pub use templates::{TemplateError, Templates};

use crate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use crate::store::{PersonStore, StoreError};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

pub const LIST_PEOPLE: &str = "list_people";
pub const LIST_PEOPLE_UPDATE: &str = "list_people_update";
pub const READ_ALL_PEOPLE: &str = "read_all_people";
pub const READ_ONE_PERSON: &str = "read_one_person";

/// Every handler name this module provides.
pub const HANDLERS: [&str; 4] = [
    LIST_PEOPLE,
    LIST_PEOPLE_UPDATE,
    READ_ALL_PEOPLE,
    READ_ONE_PERSON,
];

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Shared state of the view handlers.
#[derive(Clone)]
pub struct ViewContext {
    pub store: Arc<dyn PersonStore>,
    pub templates: Templates,
}

impl ViewContext {
    pub fn new(store: Arc<dyn PersonStore>, templates: Templates) -> Self {
        Self { store, templates }
    }
}

fn people_page(ctx: &ViewContext, template: &str) -> Result<String, ViewError> {
    let people = ctx.store.all()?;
    Ok(ctx.templates.render(template, json!({ "people": people }))?)
}

/// Home page with every person.
pub fn list_people(ctx: &ViewContext) -> Result<String, ViewError> {
    people_page(ctx, "home.html")
}

/// The people page, same data as [`list_people`].
pub fn list_people_update(ctx: &ViewContext) -> Result<String, ViewError> {
    people_page(ctx, "people.html")
}

pub fn read_all_people(ctx: &ViewContext) -> Result<HandlerResponse, ViewError> {
    let people = ctx.store.all()?;
    Ok(HandlerResponse::json(200, json!(people)))
}

pub fn read_one_person(ctx: &ViewContext, req: &HandlerRequest) -> Result<HandlerResponse, ViewError> {
    let raw = req.get_path_param("person_id").unwrap_or_default();
    let Ok(id) = raw.parse::<i64>() else {
        return Ok(HandlerResponse::error(
            400,
            &format!("person_id must be an integer, got `{raw}`"),
        ));
    };
    match ctx.store.get(id)? {
        Some(person) => Ok(HandlerResponse::json(200, json!(person))),
        None => Ok(HandlerResponse::error(
            404,
            &format!("Person with ID {id} not found"),
        )),
    }
}

fn into_response(handler: &str, result: Result<HandlerResponse, ViewError>) -> HandlerResponse {
    result.unwrap_or_else(|e| {
        error!(handler = %handler, error = %e, "View failed");
        HandlerResponse::error(500, &e.to_string())
    })
}

/// Register every view handler on `dispatcher`.
pub fn register_views(dispatcher: &mut Dispatcher, ctx: &ViewContext) {
    let c = ctx.clone();
    dispatcher.register_fn(LIST_PEOPLE, move |_req| {
        into_response(
            LIST_PEOPLE,
            list_people(&c).map(|html| HandlerResponse::html(200, html)),
        )
    });

    let c = ctx.clone();
    dispatcher.register_fn(LIST_PEOPLE_UPDATE, move |_req| {
        into_response(
            LIST_PEOPLE_UPDATE,
            list_people_update(&c).map(|html| HandlerResponse::html(200, html)),
        )
    });

    let c = ctx.clone();
    dispatcher.register_fn(READ_ALL_PEOPLE, move |_req| {
        into_response(READ_ALL_PEOPLE, read_all_people(&c))
    });

    let c = ctx.clone();
    dispatcher.register_fn(READ_ONE_PERSON, move |req| {
        into_response(READ_ONE_PERSON, read_one_person(&c, req))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Person;
    use may::sync::mpsc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStore {
        people: Mutex<Vec<Person>>,
        broken: bool,
    }

    impl MemoryStore {
        fn with(people: &[(&str, &str)]) -> Self {
            let people = people
                .iter()
                .enumerate()
                .map(|(i, (fname, lname))| Person {
                    id: i as i64 + 1,
                    fname: fname.to_string(),
                    lname: lname.to_string(),
                    timestamp: "2024-01-01 00:00:00".to_string(),
                })
                .collect();
            Self {
                people: Mutex::new(people),
                broken: false,
            }
        }
    }

    impl PersonStore for MemoryStore {
        fn all(&self) -> Result<Vec<Person>, StoreError> {
            if self.broken {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            Ok(self.people.lock().unwrap().clone())
        }

        fn get(&self, id: i64) -> Result<Option<Person>, StoreError> {
            Ok(self.all()?.into_iter().find(|p| p.id == id))
        }
    }

    fn ctx(store: MemoryStore) -> (tempfile::TempDir, ViewContext) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("home.html"),
            "<ul>{% for p in people %}<li>{{ p.fname }} {{ p.lname }}</li>{% endfor %}</ul>",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("people.html"),
            "{% for p in people %}{{ p.id }}:{{ p.lname }};{% endfor %}",
        )
        .unwrap();
        let ctx = ViewContext::new(Arc::new(store), Templates::new(dir.path()));
        (dir, ctx)
    }

    fn request(person_id: &str) -> HandlerRequest {
        let (reply_tx, _rx) = mpsc::channel();
        HandlerRequest {
            method: http::Method::GET,
            path: format!("/api/people/{person_id}"),
            handler_name: READ_ONE_PERSON.to_string(),
            path_params: HashMap::from([("person_id".to_string(), person_id.to_string())]),
            query_params: HashMap::new(),
            headers: HashMap::new(),
            body: None,
            reply_tx,
        }
    }

    #[test]
    fn test_list_people_renders_everyone() {
        let (_dir, ctx) = ctx(MemoryStore::with(&[("Tooth", "Fairy"), ("Bunny", "Easter")]));
        let html = list_people(&ctx).unwrap();
        assert_eq!(html, "<ul><li>Tooth Fairy</li><li>Bunny Easter</li></ul>");
    }

    #[test]
    fn test_list_people_update_uses_people_template() {
        let (_dir, ctx) = ctx(MemoryStore::with(&[("Tooth", "Fairy"), ("Bunny", "Easter")]));
        assert_eq!(list_people_update(&ctx).unwrap(), "1:Fairy;2:Easter;");
    }

    #[test]
    fn test_empty_store_renders_empty_page() {
        let (_dir, ctx) = ctx(MemoryStore::with(&[]));
        assert_eq!(list_people(&ctx).unwrap(), "<ul></ul>");
    }

    #[test]
    fn test_store_failure_propagates() {
        let mut store = MemoryStore::with(&[]);
        store.broken = true;
        let (_dir, ctx) = ctx(store);
        assert!(matches!(list_people(&ctx), Err(ViewError::Store(_))));
        let resp = into_response(READ_ALL_PEOPLE, read_all_people(&ctx));
        assert_eq!(resp.status, 500);
    }

    #[test]
    fn test_read_one_person() {
        let (_dir, ctx) = ctx(MemoryStore::with(&[("Tooth", "Fairy")]));
        let found = read_one_person(&ctx, &request("1")).unwrap();
        assert_eq!(found.status, 200);
        assert_eq!(found.body["lname"], "Fairy");

        assert_eq!(read_one_person(&ctx, &request("9")).unwrap().status, 404);
        assert_eq!(read_one_person(&ctx, &request("abc")).unwrap().status, 400);
    }

    #[test]
    fn test_read_all_people_json() {
        let (_dir, ctx) = ctx(MemoryStore::with(&[("Tooth", "Fairy"), ("Bunny", "Easter")]));
        let resp = read_all_people(&ctx).unwrap();
        assert_eq!(resp.body.as_array().unwrap().len(), 2);
        assert_eq!(resp.get_header("content-type"), Some("application/json"));
    }
}
