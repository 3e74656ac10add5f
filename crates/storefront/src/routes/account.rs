//! Account route handlers: address book and payment history.
//!
//! These routes require authentication.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marketstall_core::{AddressId, AddressType, UserId};

use super::cart::flash_outcome;
use super::layout::Layout;
use crate::api::{Address, AddressInput, ApiError, Country, Payment};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CspNonce, RequireAuth, forget_rejected_user};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Tab in the account navigation.
#[derive(Clone, Debug)]
pub struct TabView {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

fn tabs(active_href: &str) -> Vec<TabView> {
    let mut tabs: Vec<TabView> = AddressType::ALL
        .iter()
        .map(|kind| TabView {
            label: match kind {
                AddressType::Billing => "Billing Address",
                AddressType::Shipping => "Shipping Address",
            },
            href: addresses_path(*kind),
            active: false,
        })
        .collect();
    tabs.push(TabView {
        label: "Payment History",
        href: "/account/payments".to_string(),
        active: false,
    });
    for tab in &mut tabs {
        tab.active = tab.href == active_href;
    }
    tabs
}

fn addresses_path(kind: AddressType) -> String {
    format!("/account/addresses/{}", kind.slug())
}

/// Saved address display data.
#[derive(Clone, Debug)]
pub struct AddressView {
    pub id: AddressId,
    pub street_address: String,
    pub apartment_address: String,
    pub country: String,
    pub zip: String,
    pub default: bool,
}

impl AddressView {
    fn new(address: &Address, countries: &[Country]) -> Self {
        let country = countries
            .iter()
            .find(|c| c.code == address.country)
            .map_or_else(|| address.country.clone(), |c| c.name.clone());
        Self {
            id: address.id,
            street_address: address.street_address.clone(),
            apartment_address: address.apartment_address.clone(),
            country,
            zip: address.zip.clone(),
            default: address.default,
        }
    }
}

/// Country select option.
#[derive(Clone, Debug)]
pub struct CountryOptionView {
    pub code: String,
    pub name: String,
    pub selected: bool,
}

/// Create or update form state.
#[derive(Clone, Debug)]
pub struct AddressFormView {
    pub action: String,
    pub submit_label: &'static str,
    pub editing: bool,
    pub street_address: String,
    pub apartment_address: String,
    pub zip: String,
    pub default: bool,
    pub countries: Vec<CountryOptionView>,
}

impl AddressFormView {
    fn create(kind: AddressType, countries: &[Country]) -> Self {
        Self {
            action: addresses_path(kind),
            submit_label: "Create",
            editing: false,
            street_address: String::new(),
            apartment_address: String::new(),
            zip: String::new(),
            default: false,
            countries: country_options(countries, None),
        }
    }

    fn update(kind: AddressType, address: &Address, countries: &[Country]) -> Self {
        Self {
            action: format!("{}/{}", addresses_path(kind), address.id),
            submit_label: "Update",
            editing: true,
            street_address: address.street_address.clone(),
            apartment_address: address.apartment_address.clone(),
            zip: address.zip.clone(),
            default: address.default,
            countries: country_options(countries, Some(&address.country)),
        }
    }
}

fn country_options(countries: &[Country], selected: Option<&str>) -> Vec<CountryOptionView> {
    countries
        .iter()
        .map(|c| CountryOptionView {
            code: c.code.clone(),
            name: c.name.clone(),
            selected: Some(c.code.as_str()) == selected,
        })
        .collect()
}

/// Payment history row.
#[derive(Clone, Debug)]
pub struct PaymentView {
    pub id: String,
    pub amount: String,
    pub date: String,
}

impl From<&Payment> for PaymentView {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id.to_string(),
            amount: payment.amount.display(),
            date: payment.timestamp_utc().map_or_else(
                || payment.timestamp.clone(),
                |ts| ts.format("%Y-%m-%d %H:%M").to_string(),
            ),
        }
    }
}

// =============================================================================
// Form Types
// =============================================================================

/// Address form data.
#[derive(Debug, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub street_address: String,
    #[serde(default)]
    pub apartment_address: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub zip: String,
    /// Checkbox; present when ticked.
    pub default: Option<String>,
}

impl AddressForm {
    /// Validate locally and build the API body.
    ///
    /// # Errors
    ///
    /// Returns the message to flash for a missing field or unknown country.
    pub fn into_input(
        self,
        user: UserId,
        kind: AddressType,
        countries: &[Country],
    ) -> std::result::Result<AddressInput, &'static str> {
        let street_address = self.street_address.trim().to_string();
        let country = self.country.trim().to_string();
        let zip = self.zip.trim().to_string();

        if street_address.is_empty() {
            return Err("Street address is required");
        }
        if country.is_empty() {
            return Err("Country is required");
        }
        if !countries.iter().any(|c| c.code == country) {
            return Err("Please choose a country from the list");
        }
        if zip.is_empty() {
            return Err("Zip code is required");
        }

        Ok(AddressInput {
            user,
            address_type: kind,
            street_address,
            apartment_address: self.apartment_address.trim().to_string(),
            country,
            zip,
            default: self.default.is_some(),
        })
    }
}

/// Query for the address page.
#[derive(Debug, Deserialize)]
pub struct AddressesQuery {
    pub edit: Option<AddressId>,
}

// =============================================================================
// Templates
// =============================================================================

/// Address book page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/addresses.html")]
pub struct AddressesTemplate {
    pub layout: Layout,
    pub tabs: Vec<TabView>,
    pub kind_label: &'static str,
    pub kind_slug: &'static str,
    pub addresses: Vec<AddressView>,
    pub form: AddressFormView,
}

/// Payment history page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/payments.html")]
pub struct PaymentsTemplate {
    pub layout: Layout,
    pub tabs: Vec<TabView>,
    pub payments: Vec<PaymentView>,
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_kind(raw: &str) -> Result<AddressType> {
    raw.parse::<AddressType>()
        .map_err(|_| AppError::NotFound(format!("address book {raw}")))
}

async fn api_call<T>(
    session: &Session,
    call: impl Future<Output = std::result::Result<T, ApiError>>,
) -> Result<T> {
    match call.await {
        Ok(value) => Ok(value),
        Err(e) => Err(forget_rejected_user(session, e).await),
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Account root: the billing address book.
pub async fn index() -> Redirect {
    Redirect::to(&addresses_path(AddressType::Billing))
}

/// Display the address book for one kind.
#[instrument(skip(state, session, user, nonce, query))]
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    nonce: CspNonce,
    Path(kind): Path<String>,
    Query(query): Query<AddressesQuery>,
) -> Result<impl IntoResponse> {
    let kind = parse_kind(&kind)?;
    let list = api_call(&session, state.api().addresses(&user.token, kind)).await?;
    let countries = state.api().countries().await?;

    let form = query
        .edit
        .and_then(|id| list.iter().find(|a| a.id == id))
        .map_or_else(
            || AddressFormView::create(kind, &countries),
            |address| AddressFormView::update(kind, address, &countries),
        );

    Ok(AddressesTemplate {
        layout: Layout::load(&state, &session, Some(&user), nonce).await,
        tabs: tabs(&addresses_path(kind)),
        kind_label: kind.label(),
        kind_slug: kind.slug(),
        addresses: list
            .iter()
            .map(|a| AddressView::new(a, &countries))
            .collect(),
        form,
    })
}

/// Validate a submitted address form, flashing the problem on failure.
async fn validated_input(
    state: &AppState,
    session: &Session,
    user: &crate::models::CurrentUser,
    kind: AddressType,
    form: AddressForm,
) -> Result<Option<AddressInput>> {
    let countries = state.api().countries().await?;
    let user_id = api_call(session, state.api().user_id(&user.token)).await?;

    match form.into_input(user_id, kind, &countries) {
        Ok(input) => Ok(Some(input)),
        Err(message) => {
            Flash::error(message).push(session).await;
            Ok(None)
        }
    }
}

/// Create an address.
#[instrument(skip(state, session, user, form))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(kind): Path<String>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let back = addresses_path(kind);

    if let Some(input) = validated_input(&state, &session, &user, kind, form).await? {
        let outcome = state.api().create_address(&user.token, &input).await;
        flash_outcome(&session, outcome, Some("Address created")).await?;
    }

    Ok(Redirect::to(&back).into_response())
}

/// Update an address.
#[instrument(skip(state, session, user, form), fields(address_id = %id))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path((kind, id)): Path<(String, AddressId)>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;
    let base = addresses_path(kind);

    let Some(input) = validated_input(&state, &session, &user, kind, form).await? else {
        return Ok(Redirect::to(&format!("{base}?edit={id}")).into_response());
    };

    let outcome = state.api().update_address(&user.token, id, &input).await;
    flash_outcome(&session, outcome, Some("Address updated")).await?;

    Ok(Redirect::to(&base).into_response())
}

/// Delete an address.
#[instrument(skip(state, session, user), fields(address_id = %id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path((kind, id)): Path<(String, AddressId)>,
) -> Result<Response> {
    let kind = parse_kind(&kind)?;

    let outcome = state.api().delete_address(&user.token, id).await;
    flash_outcome(&session, outcome, Some("Address deleted")).await?;

    Ok(Redirect::to(&addresses_path(kind)).into_response())
}

/// Display payment history.
#[instrument(skip(state, session, user, nonce))]
pub async fn payments(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let payments = api_call(&session, state.api().payments(&user.token)).await?;

    Ok(PaymentsTemplate {
        layout: Layout::load(&state, &session, Some(&user), nonce).await,
        tabs: tabs("/account/payments"),
        payments: payments.iter().map(PaymentView::from).collect(),
    })
}
