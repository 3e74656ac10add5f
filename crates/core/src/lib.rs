//! Marketstall Core - Shared types library.
//!
//! This crate provides the domain types used by the storefront:
//! - Newtype IDs for the remote API's records
//! - Decimal prices with display formatting
//! - Address kinds, product labels and validated email addresses
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async.
//! The storefront's API client deserializes straight into these types.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
