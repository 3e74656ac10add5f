//! Address book endpoints.

use std::collections::HashMap;

use reqwest::Method;
use tracing::instrument;

use marketstall_core::{AddressId, AddressType, UserId};

use super::types::UserIdResponse;
use super::{Address, AddressInput, ApiClient, ApiError, AuthToken, Country, countries_from_map};

impl ApiClient {
    /// Saved addresses of one kind.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token))]
    pub async fn addresses(
        &self,
        token: &AuthToken,
        kind: AddressType,
    ) -> Result<Vec<Address>, ApiError> {
        self.get_json(
            &format!("api/address/list/?address_type={}", kind.code()),
            Some(token),
        )
        .await
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the API's field message when the
    /// address is invalid.
    #[instrument(skip_all, fields(kind = %input.address_type))]
    pub async fn create_address(
        &self,
        token: &AuthToken,
        input: &AddressInput,
    ) -> Result<(), ApiError> {
        self.send_json(Method::POST, "api/address/create/", Some(token), input)
            .await
            .map(drop)
    }

    /// Replace an existing address.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the address was deleted meanwhile.
    #[instrument(skip_all, fields(address_id = %id))]
    pub async fn update_address(
        &self,
        token: &AuthToken,
        id: AddressId,
        input: &AddressInput,
    ) -> Result<(), ApiError> {
        self.send_json(
            Method::PUT,
            &format!("api/address/{id}/update/"),
            Some(token),
            input,
        )
        .await
        .map(drop)
    }

    /// Delete an address.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn delete_address(&self, token: &AuthToken, id: AddressId) -> Result<(), ApiError> {
        self.delete(&format!("api/address/{id}/delete/"), token)
            .await
    }

    /// Countries accepted for addresses, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn countries(&self) -> Result<Vec<Country>, ApiError> {
        let map: HashMap<String, String> = self.get_json("api/country/list/", None).await?;
        Ok(countries_from_map(map))
    }

    /// Numeric id of the authenticated user, needed in address bodies.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn user_id(&self, token: &AuthToken) -> Result<UserId, ApiError> {
        let response: UserIdResponse = self.get_json("api/user/id/", Some(token)).await?;
        Ok(response.user_id)
    }
}
