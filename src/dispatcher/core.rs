use crate::config::DEFAULT_STACK_SIZE;
use crate::router::RouteMatch;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Request data passed to a handler coroutine.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub method: Method,
    /// Concrete request path.
    pub path: String,
    pub handler_name: String,
    pub path_params: HashMap<String, String>,
    pub query_params: HashMap<String, String>,
    /// Header names are lower-cased.
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

impl HandlerRequest {
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name).map(String::as_str)
    }

    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Send the response for this request.
    pub fn respond(&self, response: HandlerResponse) {
        if self.reply_tx.send(response).is_err() {
            warn!(handler_name = %self.handler_name, "Reply channel closed before response was sent");
        }
    }
}

/// Response sent back from a handler coroutine.
///
/// A `Value::String` body with a non-JSON `content-type` is written verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    #[serde(skip_serializing)]
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(
            status,
            vec![("content-type".to_string(), "application/json".to_string())],
            body,
        )
    }

    #[must_use]
    pub fn html(status: u16, body: String) -> Self {
        Self::new(
            status,
            vec![(
                "content-type".to_string(),
                "text/html; charset=utf-8".to_string(),
            )],
            Value::String(body),
        )
    }

    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "error": message }))
    }

    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header.
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value));
    }
}

pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Registry of handler names to their coroutine channels.
#[derive(Clone)]
pub struct Dispatcher {
    pub handlers: HashMap<String, HandlerSender>,
    stack_size: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::with_stack_size(DEFAULT_STACK_SIZE)
    }

    #[must_use]
    pub fn with_stack_size(stack_size: usize) -> Self {
        Dispatcher {
            handlers: HashMap::new(),
            stack_size,
        }
    }

    pub fn has_handler(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Add a handler sender, replacing any existing one with the same name.
    pub fn add_route(&mut self, handler_name: &str, sender: HandlerSender) {
        if self.handlers.remove(handler_name).is_some() {
            warn!(
                handler_name = %handler_name,
                "Replaced existing handler - old coroutine will exit"
            );
        }
        self.handlers.insert(handler_name.to_string(), sender);
        info!(
            handler_name = %handler_name,
            total_handlers = self.handlers.len(),
            "Handler registered successfully"
        );
    }

    /// Spawn a coroutine that feeds requests named `name` to `handler_fn`.
    ///
    /// # Safety
    ///
    /// Spawning goes through `may::coroutine::Builder::spawn`, which is
    /// unsafe in the `may` runtime. The runtime must be configured and the
    /// handler must answer every request through its reply channel.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let handler_name = name.to_string();
        let stack_size = self.stack_size;

        // SAFETY: the handler is Send + 'static and owns everything it uses.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .name(handler_name.clone())
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(handler_name = %handler_name, stack_size, "Handler coroutine start");
                    for req in rx.iter() {
                        let reply_tx = req.reply_tx.clone();
                        let start = Instant::now();

                        if let Err(panic) =
                            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                                handler_fn(req);
                            }))
                        {
                            let panic_message = panic
                                .downcast_ref::<&str>()
                                .map(|s| (*s).to_string())
                                .or_else(|| panic.downcast_ref::<String>().cloned())
                                .unwrap_or_else(|| "unknown panic".to_string());
                            error!(
                                handler_name = %handler_name,
                                panic_message = %panic_message,
                                "Handler panicked"
                            );
                            let _ = reply_tx.send(HandlerResponse::error(
                                500,
                                &format!("Handler panicked: {panic_message}"),
                            ));
                        } else {
                            debug!(
                                handler_name = %handler_name,
                                execution_time_ms = start.elapsed().as_millis() as u64,
                                "Handler execution complete"
                            );
                        }
                    }
                    debug!(handler_name = %handler_name, "Handler coroutine exit");
                })
        };

        if let Err(e) = spawn_result {
            error!(handler_name = %name, error = %e, "Failed to spawn handler coroutine");
            return;
        }

        self.add_route(name, tx);
    }

    /// Register a function that computes the response; the reply is sent for
    /// it.
    pub fn register_fn<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(&HandlerRequest) -> HandlerResponse + Send + 'static,
    {
        // SAFETY: the wrapper answers every request exactly once.
        unsafe {
            self.register_handler(name, move |req: HandlerRequest| {
                let response = handler_fn(&req);
                req.respond(response);
            });
        }
    }

    /// Send a matched request to its handler and wait for the reply.
    ///
    /// Returns `None` when no handler is registered under the route's name.
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        path: &str,
        headers: HashMap<String, String>,
        body: Option<Value>,
    ) -> Option<HandlerResponse> {
        let Some(tx) = self.handlers.get(&route_match.handler_name) else {
            error!(
                handler_name = %route_match.handler_name,
                available_handlers = ?self.handlers.keys().collect::<Vec<_>>(),
                "Handler not found"
            );
            return None;
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        let request = HandlerRequest {
            method: route_match.route.method.clone(),
            path: path.to_string(),
            handler_name: route_match.handler_name,
            path_params: route_match.path_params,
            query_params: route_match.query_params,
            headers,
            body,
            reply_tx,
        };
        let handler_name = request.handler_name.clone();

        let start = Instant::now();
        if let Err(e) = tx.send(request) {
            error!(handler_name = %handler_name, error = %e, "Failed to send request to handler");
            return Some(HandlerResponse::error(
                503,
                &format!("Handler '{handler_name}' is not running"),
            ));
        }

        match reply_rx.recv() {
            Ok(response) => {
                debug!(
                    handler_name = %handler_name,
                    latency_ms = start.elapsed().as_millis() as u64,
                    status = response.status,
                    "Handler response received"
                );
                Some(response)
            }
            Err(e) => {
                error!(handler_name = %handler_name, error = %e, "Handler channel closed");
                Some(HandlerResponse::error(
                    503,
                    &format!("Handler '{handler_name}' is not responding"),
                ))
            }
        }
    }
}
