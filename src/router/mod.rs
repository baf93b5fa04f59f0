//! # Router Module
//!
//! Matches incoming requests against the routes of every mounted route group.
//!
//! Each [`RouteMeta`](crate::spec::RouteMeta) carries its own base path, so a
//! single router serves several APIs side by side. Path templates such as
//! `/people/{person_id}` are compiled to anchored regexes at startup; matching
//! is a linear scan over routes ordered most specific first: more segments,
//! then more literal segments, so `/people/update` wins over
//! `/people/{person_id}`.
//!
//! ```rust,ignore
//! let router = Router::new(app.routes());
//! if let Some(m) = router.route(Method::GET, "/api/people/1") {
//!     println!("{} {:?}", m.handler_name, m.path_params);
//! }
//! ```

mod core;

pub use core::{parse_query, RouteMatch, Router};
