//! Shared types, errors, and configuration for the koperasi back office.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers with decimal precision (rupiah parsing and rounding)
//! - Typed IDs for type-safe entity references
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - Staff identity claims issued by the external identity provider

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

#[cfg(test)]
mod error_tests;
#[cfg(test)]
mod jwt_tests;

pub use auth::Claims;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtError, JwtService};
