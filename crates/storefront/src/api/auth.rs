//! Token authentication endpoints.

use reqwest::Method;
use tracing::instrument;

use super::types::{LoginRequest, SignupRequest, TokenResponse};
use super::{ApiClient, ApiError, AuthToken};

impl ApiClient {
    /// Exchange credentials for an auth token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] with the API's message when the
    /// credentials are wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthToken, ApiError> {
        let path = "rest-auth/login/";
        let body = self
            .send_json(
                Method::POST,
                path,
                None,
                &LoginRequest { username, password },
            )
            .await?;
        let token: TokenResponse = Self::parse(&body, path)?;
        Ok(AuthToken::new(token.key))
    }

    /// Register a new account; the API logs the shopper in immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] when the username is taken, the email
    /// is invalid, or the password fails the API's rules.
    #[instrument(skip(self, password, password_confirmation))]
    pub async fn signup(
        &self,
        username: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> Result<AuthToken, ApiError> {
        let path = "rest-auth/registration/";
        let body = self
            .send_json(
                Method::POST,
                path,
                None,
                &SignupRequest {
                    username,
                    email,
                    password1: password,
                    password2: password_confirmation,
                },
            )
            .await?;
        let token: TokenResponse = Self::parse(&body, path)?;
        Ok(AuthToken::new(token.key))
    }

    /// Invalidate the token on the API side.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &AuthToken) -> Result<(), ApiError> {
        let path = "rest-auth/logout/";
        let builder = self.request(Method::POST, path, Some(token))?;
        self.send(builder, path).await.map(drop)
    }
}
