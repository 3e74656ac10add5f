//! Address book classification.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Whether an address is used for billing or shipping.
///
/// The API encodes the kind as a single letter (`"B"` / `"S"`); the
/// storefront URLs use the lowercase word (`/account/addresses/billing`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    #[serde(rename = "B")]
    Billing,
    #[serde(rename = "S")]
    Shipping,
}

impl AddressType {
    pub const ALL: [Self; 2] = [Self::Billing, Self::Shipping];

    /// Wire code used in API payloads and the `address_type` query parameter.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Billing => "B",
            Self::Shipping => "S",
        }
    }

    /// URL path segment.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Billing => "billing",
            Self::Shipping => "shipping",
        }
    }

    /// Human label, e.g. "Billing".
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Billing => "Billing",
            Self::Shipping => "Shipping",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a string names no address type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown address type: {0}")]
pub struct UnknownAddressType(pub String);

impl FromStr for AddressType {
    type Err = UnknownAddressType;

    /// Accepts the URL slug or the wire code, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "billing" | "b" => Ok(Self::Billing),
            "shipping" | "s" => Ok(Self::Shipping),
            _ => Err(UnknownAddressType(s.to_string())),
        }
    }
}
