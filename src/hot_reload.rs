//! # Hot Reload Module
//!
//! Watches the files a specification was assembled from and rebuilds the
//! application when one of them changes.
//!
//! Each source file's parent directory is watched non-recursively (editors
//! often replace files rather than write them in place) and events are
//! filtered against the tracked file set. Bursts of events are collapsed
//! into one reload.
//!
//! ```rust,ignore
//! let watcher = watch_spec_files(app.extra_files().to_vec(), move || {
//!     match apply_reload(&mut app, &router, &documents) {
//!         Ok(files) => Some(files),
//!         Err(e) => { error!(error = %e, "reload failed"); None }
//!     }
//! })?;
//! ```
//!
//! A failed reload is logged and the previous routes stay live.

use crate::app::{ApiDocuments, App, AppError};
use crate::router::Router;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEBOUNCE: Duration = Duration::from_millis(50);

/// Files being tracked and the directories watched for them.
#[derive(Default)]
struct Tracked {
    files: HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
}

impl Tracked {
    fn update(&mut self, watcher: &mut RecommendedWatcher, files: &[PathBuf]) -> notify::Result<()> {
        self.files = files
            .iter()
            .map(|f| f.canonicalize().unwrap_or_else(|_| f.clone()))
            .collect();
        for file in &self.files {
            let Some(dir) = file.parent() else { continue };
            if self.dirs.insert(dir.to_path_buf()) {
                watcher.watch(dir, RecursiveMode::NonRecursive)?;
                debug!(dir = %dir.display(), "Watching directory");
            }
        }
        Ok(())
    }

    fn matches(&self, paths: &[PathBuf]) -> bool {
        paths.iter().any(|p| {
            self.files.contains(p)
                || p.canonicalize()
                    .map(|c| self.files.contains(&c))
                    .unwrap_or(false)
        })
    }
}

fn is_change(event: &Event) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
}

/// Stops the watcher thread when dropped.
pub struct SpecWatcher {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for SpecWatcher {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Call `on_change` whenever one of `files` is modified or created.
///
/// `on_change` returns the new set of files to track, or `None` to keep the
/// current set.
///
/// # Errors
///
/// A directory cannot be watched or the watcher thread cannot start.
pub fn watch_spec_files<F>(files: Vec<PathBuf>, mut on_change: F) -> notify::Result<SpecWatcher>
where
    F: FnMut() -> Option<Vec<PathBuf>> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
    let mut watcher = RecommendedWatcher::new(tx, Config::default())?;
    let mut tracked = Tracked::default();
    tracked.update(&mut watcher, &files)?;
    info!(files = tracked.files.len(), "Watching specification files");

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let thread = std::thread::Builder::new()
        .name("spec-watcher".to_string())
        .spawn(move || {
            while !stop_flag.load(Ordering::SeqCst) {
                match rx.recv_timeout(POLL_INTERVAL) {
                    Ok(Ok(event)) => {
                        if !is_change(&event) || !tracked.matches(&event.paths) {
                            continue;
                        }
                        while rx.recv_timeout(DEBOUNCE).is_ok() {}
                        info!(paths = ?event.paths, "Specification changed");
                        if let Some(files) = on_change() {
                            if let Err(e) = tracked.update(&mut watcher, &files) {
                                warn!(error = %e, "Failed to watch new specification files");
                            }
                        }
                    }
                    Ok(Err(e)) => warn!(error = %e, "Watch error"),
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        })
        .map_err(notify::Error::io)?;

    Ok(SpecWatcher {
        stop,
        thread: Some(thread),
    })
}

/// Rebuild `app` from its registrations and swap the live router and API
/// documents. Returns the files the new application was built from.
///
/// # Errors
///
/// The reload failed; `app`, `router` and `documents` are unchanged.
pub fn apply_reload(
    app: &mut App,
    router: &RwLock<Router>,
    documents: &RwLock<ApiDocuments>,
) -> Result<Vec<PathBuf>, AppError> {
    let fresh = app.reload()?;
    let new_router = Router::new(fresh.routes());
    let new_documents = fresh.documents();

    *router.write().unwrap_or_else(PoisonError::into_inner) = new_router;
    *documents.write().unwrap_or_else(PoisonError::into_inner) = new_documents;
    *app = fresh;

    info!(
        routes = app.routes().len(),
        files = app.extra_files().len(),
        "hot-reload: routes updated"
    );
    Ok(app.extra_files().to_vec())
}
