//! Core types for Marketstall.
//!
//! Type-safe wrappers for the domain concepts the remote API exposes.

pub mod address;
pub mod email;
pub mod id;
pub mod label;
pub mod price;

pub use address::{AddressType, UnknownAddressType};
pub use email::{Email, EmailError};
pub use id::*;
pub use label::ProductLabel;
pub use price::{CurrencyCode, Price};
