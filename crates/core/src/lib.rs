//! Khaja Core - Shared types library.
//!
//! This crate provides common types used across all Khaja components:
//! - `client` - API gateway, cart, and checkout library
//! - `cli` - Terminal front end for browsing and ordering
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, phone
//!   numbers, and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
