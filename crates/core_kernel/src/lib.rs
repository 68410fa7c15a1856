//! Core Kernel - Foundational types and utilities for the claims system
//!
//! This crate provides the fundamental building blocks used across the workspace:
//! - Money types with integer minor-unit arithmetic
//! - Strongly-typed identifiers
//! - Port error and health types shared by adapters

pub mod money;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{
    ProductId, ClauseId, DiagnosisId, ReceiptId, ClaimId, LineItemId,
};
pub use error::CoreError;
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
