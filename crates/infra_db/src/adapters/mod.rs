//! Domain Adapters
//!
//! Implementations of the claims domain ports backed by PostgreSQL.
//! Each adapter implements the port traits and translates between domain
//! values and the row types of the repository layer.

pub mod claims;

pub use claims::PostgresClaimStore;
