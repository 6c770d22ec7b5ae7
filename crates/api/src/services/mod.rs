//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password hashing, token issuing/verification, register/login
//! - `payment` - Payment gateway abstraction and the Xendit invoice client
//! - `uploads` - Product image storage on local disk

pub mod auth;
pub mod payment;
pub mod uploads;
