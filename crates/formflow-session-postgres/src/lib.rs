//! PostgreSQL session record store
//!
//! For deployments where several server instances share one session store.
//! Field data is kept in a `JSONB` column.

mod config;
mod postgres_session_store;

pub use config::PostgresSessionStoreConfig;
pub use postgres_session_store::PostgresSessionStore;
