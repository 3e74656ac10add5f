//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use marketstall_core::ProductId;

use super::layout::Layout;
use crate::api::{ApiClient, ApiError, ProductDetail, ProductSummary};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::{CspNonce, OptionalAuth, RequireAuth, forget_rejected_user};
use crate::models::Flash;
use crate::state::AppState;

// =============================================================================
// View Types
// =============================================================================

/// Label badge display data.
#[derive(Clone, Debug)]
pub struct BadgeView {
    pub text: String,
    pub color: String,
}

/// Product card display data.
#[derive(Clone, Debug)]
pub struct ProductCardView {
    pub id: ProductId,
    pub title: String,
    pub category: String,
    pub description: String,
    /// Price the shopper pays.
    pub price: String,
    /// Struck-through list price when discounted.
    pub original_price: Option<String>,
    pub badge: Option<BadgeView>,
    pub image: Option<String>,
}

impl ProductCardView {
    pub fn new(product: &ProductSummary, api: &ApiClient) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            category: product.category.clone(),
            description: product.description.clone(),
            price: product.effective_price().display(),
            original_price: product.is_discounted().then(|| product.price.display()),
            badge: product.label.is_visible().then(|| BadgeView {
                text: product.label.as_str().to_string(),
                color: product.label.badge_color().unwrap_or("grey").to_string(),
            }),
            image: product.image.as_deref().map(|path| api.media_url(path)),
        }
    }
}

/// One selectable option value.
#[derive(Clone, Debug)]
pub struct OptionValueView {
    pub id: String,
    pub value: String,
    pub attachment: Option<String>,
}

/// An option group with its values, rendered as a select.
#[derive(Clone, Debug)]
pub struct OptionGroupView {
    /// Form field name, `option_<id>`.
    pub field: String,
    pub name: String,
    pub values: Vec<OptionValueView>,
}

fn option_groups(product: &ProductDetail, api: &ApiClient) -> Vec<OptionGroupView> {
    product
        .options
        .iter()
        .map(|option| OptionGroupView {
            field: format!("{}{}", crate::api::types::OPTION_FIELD_PREFIX, option.id),
            name: option.name.clone(),
            values: option
                .item_options
                .iter()
                .map(|value| OptionValueView {
                    id: value.id.to_string(),
                    value: value.value.clone(),
                    attachment: value.attachment.as_deref().map(|path| api.media_url(path)),
                })
                .collect(),
        })
        .collect()
}

// =============================================================================
// Templates
// =============================================================================

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub products: Vec<ProductCardView>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: ProductCardView,
    pub long_description: Option<String>,
    pub options: Vec<OptionGroupView>,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Display product listing page.
#[instrument(skip(state, session, user, nonce))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    nonce: CspNonce,
) -> Result<impl IntoResponse> {
    let products = state.api().list_products().await?;
    let products = products
        .iter()
        .map(|p| ProductCardView::new(p, state.api()))
        .collect();

    Ok(ProductsIndexTemplate {
        layout: Layout::load(&state, &session, user.as_ref(), nonce).await,
        products,
    })
}

/// Display product detail page.
#[instrument(skip(state, session, user, nonce), fields(product_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    nonce: CspNonce,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let product = state.api().get_product(id).await?;

    Ok(ProductShowTemplate {
        layout: Layout::load(&state, &session, user.as_ref(), nonce).await,
        product: ProductCardView::new(&product.summary, state.api()),
        long_description: product.long_description.clone(),
        options: option_groups(&product, state.api()),
    })
}

/// Add the product with the submitted option selection to the cart.
#[instrument(skip(state, session, user, form), fields(product_id = %id))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<Vec<(String, String)>>,
) -> Result<Response> {
    let back = format!("/products/{id}");
    let product = state.api().get_product(id).await?;

    let options = match product.resolve_selection(&form) {
        Ok(options) => options,
        Err(e) => {
            Flash::error(e.to_string()).push(&session).await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    match state
        .api()
        .add_to_cart(&user.token, &product.summary.slug, &options)
        .await
    {
        Ok(()) => {
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("slug", product.summary.slug.as_str())]),
            );
            Flash::success("Added to cart").push(&session).await;
        }
        Err(e @ ApiError::Rejected { .. }) => {
            Flash::error(e.user_message()).push(&session).await;
        }
        Err(e) => return Err(forget_rejected_user(&session, e).await),
    }

    Ok(Redirect::to(&back).into_response())
}
