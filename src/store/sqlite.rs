use super::{Person, PersonStore, StoreError, DEMO_PEOPLE};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tokio::runtime::Runtime;
use tracing::{debug, info};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS person (
    id INTEGER PRIMARY KEY,
    lname TEXT NOT NULL,
    fname TEXT NOT NULL,
    timestamp TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

/// SQLite-backed store.
///
/// Handlers run on `may` coroutines, so queries are driven to completion on
/// an owned tokio runtime with `block_on`.
pub struct SqlitePersonStore {
    runtime: Runtime,
    pool: SqlitePool,
}

impl SqlitePersonStore {
    /// Open (creating when missing) the database at `url`, e.g.
    /// `sqlite://people.db`.
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("people-db")
            .enable_all()
            .build()?;

        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // An in-memory database lives and dies with its single connection.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = runtime.block_on(
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(options),
        )?;

        info!(url = %url, "Database connected");
        Ok(Self { runtime, pool })
    }

    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.runtime
            .block_on(sqlx::query(CREATE_TABLE).execute(&self.pool))?;
        debug!("person table ready");
        Ok(())
    }

    pub fn insert(&self, fname: &str, lname: &str) -> Result<i64, StoreError> {
        let result = self.runtime.block_on(
            sqlx::query("INSERT INTO person (lname, fname) VALUES (?, ?)")
                .bind(lname)
                .bind(fname)
                .execute(&self.pool),
        )?;
        Ok(result.last_insert_rowid())
    }

    /// Insert the demo people unless the table already has rows.
    ///
    /// Returns the number of rows inserted.
    pub fn seed(&self) -> Result<usize, StoreError> {
        let count: i64 = self.runtime.block_on(
            sqlx::query_scalar("SELECT COUNT(*) FROM person").fetch_one(&self.pool),
        )?;
        if count > 0 {
            info!(existing = count, "person table already populated, skipping seed");
            return Ok(0);
        }
        for (fname, lname) in DEMO_PEOPLE {
            self.insert(fname, lname)?;
        }
        info!(inserted = DEMO_PEOPLE.len(), "Demo people inserted");
        Ok(DEMO_PEOPLE.len())
    }
}

impl PersonStore for SqlitePersonStore {
    fn all(&self) -> Result<Vec<Person>, StoreError> {
        let people = self.runtime.block_on(
            sqlx::query_as::<_, Person>(
                "SELECT id, lname, fname, timestamp FROM person ORDER BY id",
            )
            .fetch_all(&self.pool),
        )?;
        Ok(people)
    }

    fn get(&self, id: i64) -> Result<Option<Person>, StoreError> {
        let person = self.runtime.block_on(
            sqlx::query_as::<_, Person>(
                "SELECT id, lname, fname, timestamp FROM person WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )?;
        Ok(person)
    }
}
