//! GoShop Core - Shared domain types.
//!
//! This crate provides the types shared by every GoShop component:
//! - `api` - The HTTP service (auth, catalog, checkout, admin)
//! - `cli` - Command-line tools for migrations and admin management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. The optional `sqlite` feature adds `sqlx` encoding so the
//! same types can be bound and decoded directly by the repositories.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money amounts, roles and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
