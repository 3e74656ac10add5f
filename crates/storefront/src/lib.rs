//! Marketstall storefront library.
//!
//! A server-rendered shop front for the Marketstall commerce API: catalog,
//! cart, checkout, address book and payment history. All durable state lives
//! behind the API; this crate renders it and forwards shopper actions.
//!
//! The binary in `main.rs` wires configuration, tracing and Sentry around
//! [`routes::app`]; tests drive the same router directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
