//! Types the storefront keeps in the visitor's session.
//!
//! Durable state (products, orders, addresses, payments) lives behind the
//! commerce API; only the signed-in identity and one-shot flash messages
//! are held here.

pub mod flash;
pub mod session;

pub use flash::{Flash, FlashLevel};
pub use session::{CurrentUser, keys as session_keys};
