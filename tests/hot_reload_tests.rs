use http::Method;
use people_api::app::App;
use people_api::config::ApiOptions;
use people_api::hot_reload::{apply_reload, watch_spec_files};
use people_api::router::Router;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

mod common;
use common::temp_files::{people_tree, write, PEOPLE_PATH};

fn handler_at(router: &RwLock<Router>, path: &str) -> Option<String> {
    router
        .read()
        .unwrap()
        .route(Method::GET, path)
        .map(|m| m.handler_name)
}

fn wait_for<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..60 {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    false
}

#[test]
fn test_apply_reload_swaps_routes() {
    let dir = people_tree();
    let mut app = App::new(dir.path());
    app.add_api("swagger.yml", ApiOptions::default()).unwrap();
    let router = RwLock::new(Router::new(app.routes()));
    let documents = RwLock::new(app.documents());

    write(
        dir.path(),
        "paths/people.yml",
        &PEOPLE_PATH.replace("read_all_people", "list_everyone"),
    );
    let files = apply_reload(&mut app, &router, &documents).unwrap();
    assert_eq!(files.len(), 4);
    assert_eq!(handler_at(&router, "/api/people").as_deref(), Some("list_everyone"));
}

#[test]
fn test_failed_reload_keeps_previous_routes() {
    let dir = people_tree();
    let mut app = App::new(dir.path());
    app.add_api("swagger.yml", ApiOptions::default()).unwrap();
    let router = RwLock::new(Router::new(app.routes()));
    let documents = RwLock::new(app.documents());

    write(dir.path(), "paths/people.yml", "get: [broken\n");
    assert!(apply_reload(&mut app, &router, &documents).is_err());
    assert_eq!(
        handler_at(&router, "/api/people").as_deref(),
        Some("read_all_people")
    );
    assert_eq!(app.extra_files().len(), 4);
}

#[test]
fn test_editing_included_file_triggers_reload() {
    let _tracing = common::test_server::test_tracing();
    let dir = people_tree();
    let mut app = App::new(dir.path());
    app.add_api("swagger.yml", ApiOptions::default()).unwrap();
    let router = Arc::new(RwLock::new(Router::new(app.routes())));
    let documents = Arc::new(RwLock::new(app.documents()));
    let reloads = Arc::new(Mutex::new(0usize));

    let files = app.extra_files().to_vec();
    let watcher = {
        let router = Arc::clone(&router);
        let documents = Arc::clone(&documents);
        let reloads = Arc::clone(&reloads);
        watch_spec_files(files, move || {
            *reloads.lock().unwrap() += 1;
            apply_reload(&mut app, &router, &documents).ok()
        })
        .unwrap()
    };

    // allow watcher thread to start
    std::thread::sleep(Duration::from_millis(100));

    write(
        dir.path(),
        "paths/people.yml",
        &PEOPLE_PATH.replace("read_all_people", "list_everyone"),
    );
    assert!(wait_for(|| {
        handler_at(&router, "/api/people").as_deref() == Some("list_everyone")
    }));

    // Unrelated files in the same directory do not reload.
    std::thread::sleep(Duration::from_millis(300));
    let before = *reloads.lock().unwrap();
    write(dir.path(), "notes.txt", "scratch");
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(*reloads.lock().unwrap(), before);

    drop(watcher);
}

#[test]
fn test_newly_included_file_is_watched() {
    let dir = people_tree();
    let mut app = App::new(dir.path());
    app.add_api("swagger.yml", ApiOptions::default()).unwrap();
    let router = Arc::new(RwLock::new(Router::new(app.routes())));
    let documents = Arc::new(RwLock::new(app.documents()));

    let files = app.extra_files().to_vec();
    let watcher = {
        let router = Arc::clone(&router);
        let documents = Arc::clone(&documents);
        watch_spec_files(files, move || apply_reload(&mut app, &router, &documents).ok()).unwrap()
    };
    std::thread::sleep(Duration::from_millis(100));

    // Point /people at a file in a new directory.
    write(
        dir.path(),
        "v2/people.yml",
        &PEOPLE_PATH.replace("read_all_people", "people_v2"),
    );
    let root = std::fs::read_to_string(dir.path().join("swagger.yml")).unwrap();
    write(
        dir.path(),
        "swagger.yml",
        &root.replace("paths/people.yml", "v2/people.yml"),
    );
    assert!(wait_for(|| {
        handler_at(&router, "/api/people").as_deref() == Some("people_v2")
    }));

    write(
        dir.path(),
        "v2/people.yml",
        &PEOPLE_PATH.replace("read_all_people", "people_v3"),
    );
    assert!(wait_for(|| {
        handler_at(&router, "/api/people").as_deref() == Some("people_v3")
    }));

    drop(watcher);
}
