//! # CLI Module
//!
//! Command-line entry points of the `people-api` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! ```bash
//! people-api serve --config config/config.yaml --port 8080 --watch
//! ```
//!
//! Loads the configuration (flags override the file), opens the database,
//! assembles the application from the root specification and serves it.
//! With `--watch`, edits to any file of the specification (includes too)
//! reload the routes in place.
//!
//! ### `init-db`
//!
//! ```bash
//! people-api init-db --database sqlite://people.db --seed
//! ```
//!
//! ### `inspect`
//!
//! ```bash
//! people-api inspect --spec swagger/swagger.yml
//! ```
//!
//! Prints the version, base paths, operations and source files of a
//! specification.

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{build_app, init_db, inspect, run_cli, serve, Cli, Commands, ServeArgs};
