use crate::error::Error;
use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use slog::{info, Logger};

pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Thin wrapper around the r2d2-pooled diesel connection, the one way every
/// storage operation reaches postgres.
#[derive(Clone)]
pub struct Store {
    pool: r2d2::Pool<ConnectionManager<PgConnection>>,
    log: Logger,
}

impl Store {
    /// Connects, builds the pool, and runs any pending migrations before
    /// returning. `max_size` bounds the number of concurrent transactions
    /// the storage layer can have open.
    pub fn connect(database_url: &str, max_size: u32, log: Logger) -> Result<Self, Error> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = r2d2::Pool::builder().max_size(max_size).build(manager)?;

        let mut conn = pool.get()?;
        conn.run_pending_migrations(MIGRATIONS)
            .map_err(Error::Migration)?;
        info!(log, "storage ready"; "max_connections" => max_size);

        Ok(Self { pool, log })
    }

    pub fn conn(&self) -> Result<PooledConnection, Error> {
        Ok(self.pool.get()?)
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }
}
