//! Product catalog endpoints.

use tracing::instrument;

use marketstall_core::ProductId;

use super::{ApiClient, ApiError, ProductDetail, ProductSummary};

impl ApiClient {
    /// List every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductSummary>, ApiError> {
        self.get_json("api/product-list/", None).await
    }

    /// Fetch a single product with its option groups.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<ProductDetail, ApiError> {
        self.get_json(&format!("api/products/{id}/"), None).await
    }
}
