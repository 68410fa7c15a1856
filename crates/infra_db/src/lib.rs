//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the claim calculation system using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] holds
//! row-level queries and [`adapters`] implements the domain ports on top
//! of them. A committed calculation replaces the claim row and its line
//! items in one transaction guarded by the claim's version.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresClaimStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresClaimStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::PostgresClaimStore;
