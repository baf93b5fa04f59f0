//! HTTP serving on top of `may_minihttp`.
//!
//! [`AppService`] resolves every request through the shared router: API
//! operations and views go to the dispatcher, spec documents and console
//! pages are served from the mounted API documents.

mod http_server;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request, split_path, ParsedRequest};
pub use service::{health_response, AppService, Reply, CONSOLE_TEMPLATE};
