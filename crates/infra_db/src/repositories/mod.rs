//! Repository layer
//!
//! Row-level database access used by the adapters.

pub mod claims;

pub use claims::ClaimsRepository;
