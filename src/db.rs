use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::{Path, PathBuf};

use crate::error::Error;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

diesel::define_sql_function! {
    /// SQLite's own `lower` only folds ASCII. Registered on every connection.
    fn unicode_lower(text: Text) -> Text;
}

/// Handle on the SQLite file. Every request opens its own connection.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Database {
        Database { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn connect(&self) -> Result<SqliteConnection, Error> {
        let mut conn = SqliteConnection::establish(&format!("{}", self.path.display()))?;
        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut conn)?;
        unicode_lower_utils::register_impl(&mut conn, |text: String| text.to_lowercase())?;
        Ok(conn)
    }

    /// Runs `f` on a fresh connection, which is closed again when `f` returns.
    pub fn run<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, Error>,
    {
        let mut conn = self.connect()?;
        f(&mut conn)
    }

    /// Brings the schema up to date, returning how many migrations ran.
    pub fn migrate(&self) -> Result<usize, Error> {
        let mut conn = self.connect()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(Error::Migration)?;
        Ok(applied.len())
    }
}
