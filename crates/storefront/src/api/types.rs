//! Wire types for the commerce API.
//!
//! Field names follow the API's JSON. Types that only travel one way derive
//! only the serde half they need.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketstall_core::{
    AddressId, AddressType, ItemOptionId, OptionId, OrderItemId, PaymentId, Price, ProductId,
    ProductLabel, UserId,
};

// =============================================================================
// Products
// =============================================================================

/// Product as returned by the product list.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub discount_price: Option<Price>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub label: ProductLabel,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductSummary {
    /// Price the shopper pays: the discount price when present.
    #[must_use]
    pub fn effective_price(&self) -> Price {
        self.discount_price.unwrap_or(self.price)
    }

    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.discount_price.is_some()
    }
}

/// Product detail with its selectable options.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub summary: ProductSummary,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
}

/// An option group such as "Color" or "Size".
#[derive(Debug, Clone, Deserialize)]
pub struct ProductOption {
    pub id: OptionId,
    pub name: String,
    #[serde(default)]
    pub item_options: Vec<ItemOption>,
}

impl ProductOption {
    fn contains(&self, value: ItemOptionId) -> bool {
        self.item_options.iter().any(|o| o.id == value)
    }
}

/// One selectable value of an option group.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemOption {
    pub id: ItemOptionId,
    pub value: String,
    /// Swatch or preview image, as a media path.
    #[serde(default)]
    pub attachment: Option<String>,
}

/// Why a submitted option selection cannot be added to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Select a {0}")]
    Missing(String),
    #[error("That {0} is not available for this product")]
    InvalidValue(String),
    #[error("Unknown product option")]
    UnknownOption,
}

/// Prefix of the form fields carrying option selections (`option_<OptionId>`).
pub const OPTION_FIELD_PREFIX: &str = "option_";

impl ProductDetail {
    /// Turn the submitted option fields into the ordered list of selected
    /// option values the add-to-cart endpoint expects.
    ///
    /// Fields are `option_<OptionId>=<ItemOptionId>`; other fields are
    /// ignored and an empty value counts as "not selected". The result
    /// follows the product's option order, one value per option group.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if a field names an option this product
    /// does not have, a value belongs to a different option, or an option
    /// group is left unselected.
    pub fn resolve_selection(
        &self,
        fields: &[(String, String)],
    ) -> Result<Vec<ItemOptionId>, SelectionError> {
        let mut chosen: HashMap<OptionId, ItemOptionId> = HashMap::new();

        for (key, value) in fields {
            let Some(raw_option) = key.strip_prefix(OPTION_FIELD_PREFIX) else {
                continue;
            };
            let option = raw_option
                .parse::<OptionId>()
                .ok()
                .and_then(|id| self.options.iter().find(|o| o.id == id))
                .ok_or(SelectionError::UnknownOption)?;

            if value.trim().is_empty() {
                continue;
            }
            let value_id = value
                .parse::<ItemOptionId>()
                .ok()
                .filter(|v| option.contains(*v))
                .ok_or_else(|| SelectionError::InvalidValue(option.name.to_lowercase()))?;

            chosen.insert(option.id, value_id);
        }

        self.options
            .iter()
            .map(|option| {
                chosen
                    .get(&option.id)
                    .copied()
                    .ok_or_else(|| SelectionError::Missing(option.name.to_lowercase()))
            })
            .collect()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// The shopper's active (unordered) order, i.e. the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    pub total: Price,
    #[serde(default)]
    pub coupon: Option<Coupon>,
}

impl Order {
    /// Number of cart lines (not units).
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.order_items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order_items.is_empty()
    }

    #[must_use]
    pub fn find_item(&self, id: OrderItemId) -> Option<&OrderItem> {
        self.order_items.iter().find(|item| item.id == id)
    }
}

/// A cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub item_obj: ProductSummary,
    #[serde(default)]
    pub item_options: Vec<OrderItemOption>,
    pub quantity: u32,
    pub final_price: Price,
}

impl OrderItem {
    #[must_use]
    pub const fn is_discounted(&self) -> bool {
        self.item_obj.is_discounted()
    }

    /// The option values this line was added with, in add-to-cart form.
    #[must_use]
    pub fn option_ids(&self) -> Vec<ItemOptionId> {
        self.item_options.iter().map(|o| o.id).collect()
    }

    /// "Color: Red, Size: L" style summary of the chosen options.
    #[must_use]
    pub fn options_summary(&self) -> String {
        self.item_options
            .iter()
            .map(|o| match &o.option {
                Some(group) => format!("{}: {}", group.name, o.value),
                None => o.value.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Option value attached to a cart line.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemOption {
    pub id: ItemOptionId,
    pub value: String,
    #[serde(default)]
    pub option: Option<OptionRef>,
}

/// Reference to the option group a value belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct OptionRef {
    pub id: OptionId,
    pub name: String,
}

/// A coupon applied to the order.
#[derive(Debug, Clone, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub amount: Price,
}

/// A completed payment.
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub amount: Price,
    /// ISO-8601; with or without offset depending on the API's timezone setting.
    pub timestamp: String,
}

impl Payment {
    /// Parse the timestamp, treating offset-less values as UTC.
    #[must_use]
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }
}

// =============================================================================
// Addresses
// =============================================================================

/// A saved address.
#[derive(Debug, Clone, Deserialize)]
pub struct Address {
    pub id: AddressId,
    pub user: UserId,
    pub street_address: String,
    #[serde(default)]
    pub apartment_address: String,
    /// ISO 3166 country code.
    pub country: String,
    pub zip: String,
    pub address_type: AddressType,
    #[serde(default)]
    pub default: bool,
}

impl Address {
    /// One-line summary used in selects and lists.
    #[must_use]
    pub fn summary(&self) -> String {
        [
            self.street_address.as_str(),
            self.apartment_address.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// The address marked as default, if any; the first one wins.
#[must_use]
pub fn default_address_id(addresses: &[Address]) -> Option<AddressId> {
    addresses.iter().find(|a| a.default).map(|a| a.id)
}

/// Body for creating or updating an address.
#[derive(Debug, Clone, Serialize)]
pub struct AddressInput {
    pub user: UserId,
    pub address_type: AddressType,
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip: String,
    pub default: bool,
}

/// A country the API accepts for addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
}

/// Convert the API's `{code: name}` map into a list sorted by name.
#[must_use]
pub fn countries_from_map(map: HashMap<String, String>) -> Vec<Country> {
    let mut countries: Vec<Country> = map
        .into_iter()
        .map(|(code, name)| Country { code, name })
        .collect();
    countries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
    countries
}

// =============================================================================
// Request / response bodies
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignupRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password1: &'a str,
    pub password2: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddToCartRequest<'a> {
    pub slug: &'a str,
    pub options: &'a [ItemOptionId],
}

#[derive(Debug, Serialize)]
pub(crate) struct SlugRequest<'a> {
    pub slug: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CouponRequest<'a> {
    pub code: &'a str,
}

/// Body for the checkout endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    #[serde(rename = "stripeToken")]
    pub card_token: String,
    #[serde(rename = "defaultBillingAddress")]
    pub billing_address: AddressId,
    #[serde(rename = "defaultShippingAddress")]
    pub shipping_address: AddressId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserIdResponse {
    #[serde(rename = "userID")]
    pub user_id: UserId,
}
