//! Person storage.
//!
//! Handlers see people through the [`PersonStore`] trait; the server wires in
//! [`SqlitePersonStore`].

mod sqlite;

pub use sqlite::SqlitePersonStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("failed to start the database runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// A row of the `person` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i64,
    pub lname: String,
    pub fname: String,
    pub timestamp: String,
}

/// People inserted by `init-db --seed`, as `(fname, lname)`.
pub const DEMO_PEOPLE: [(&str, &str); 3] = [
    ("Tooth", "Fairy"),
    ("Knecht", "Ruprecht"),
    ("Bunny", "Easter"),
];

pub trait PersonStore: Send + Sync {
    /// Every person, ordered by id.
    fn all(&self) -> Result<Vec<Person>, StoreError>;

    fn get(&self, id: i64) -> Result<Option<Person>, StoreError>;
}
