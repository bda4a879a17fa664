//! style-persistence
//!
//! Implementaciones Postgres (Diesel + r2d2) de los puertos de style-core:
//! - `pg`: `PgKnowledgeSource` (pautas base y legales) y `PgArtifactStore`
//!   (guías publicadas, append-only).
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde `.env`.
//! - `schema`: tablas Diesel declaradas para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgArtifactStore, PgKnowledgeSource, PgPool, PoolProvider};
