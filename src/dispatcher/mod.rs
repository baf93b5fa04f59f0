//! # Dispatcher Module
//!
//! Coroutine-based handler dispatch.
//!
//! Every registered handler runs in its own `may` coroutine and receives
//! [`HandlerRequest`]s over an MPSC channel. Each request carries a reply
//! channel; the handler answers with exactly one [`HandlerResponse`].
//!
//! ```rust,ignore
//! let mut dispatcher = Dispatcher::with_stack_size(0x8000);
//! dispatcher.register_fn("read_all_people", |req| {
//!     HandlerResponse::json(200, serde_json::json!([]))
//! });
//! ```
//!
//! Handler panics are caught and answered with a 500. Replacing a handler
//! drops the old sender, which ends the old coroutine once its queue drains.

mod core;

pub use core::{Dispatcher, HandlerRequest, HandlerResponse, HandlerSender};
