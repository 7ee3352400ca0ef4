use std::time::Duration;

use oauth2::{basic::BasicClient, ClientId, ClientSecret, RefreshToken, TokenResponse, TokenUrl};

use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::modules::settings::cli::SETTINGS;
use crate::raise_error;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
    /// Present only when the provider rotated the refresh token.
    pub refresh_token: Option<String>,
}

/// Exchanges a refresh token for a new access token at the Google token endpoint.
#[derive(Clone, Debug)]
pub struct OAuth2Flow {
    client_id: String,
    client_secret: String,
    token_url: String,
    timeout: Duration,
}

impl OAuth2Flow {
    pub fn new(client_id: &str, client_secret: &str, token_url: &str, timeout: Duration) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            token_url: token_url.to_string(),
            timeout,
        }
    }

    pub fn from_settings() -> Self {
        Self::new(
            &SETTINGS.rustcampaign_google_client_id,
            &SETTINGS.rustcampaign_google_client_secret,
            &SETTINGS.rustcampaign_oauth2_token_url,
            Duration::from_secs(SETTINGS.rustcampaign_http_timeout_secs),
        )
    }

    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> RustCampaignResult<RefreshedToken> {
        if self.client_id.is_empty() {
            return Err(raise_error!(
                "Google OAuth2 client id is not configured; access tokens cannot be refreshed"
                    .into(),
                ErrorCode::MissingConfiguration
            ));
        }
        let token_url = TokenUrl::new(self.token_url.clone())
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InvalidParameter))?;

        let mut client = BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_token_uri(token_url);
        if !self.client_secret.is_empty() {
            client = client.set_client_secret(ClientSecret::new(self.client_secret.clone()));
        }
        let http_client = self.build_http_client()?;

        let response = client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| {
                raise_error!(
                    format!("Failed to retrieve refresh token response: {}", e),
                    ErrorCode::CredentialRefreshFailed
                )
            })?;

        Ok(RefreshedToken {
            access_token: response.access_token().secret().to_owned(),
            refresh_token: response.refresh_token().map(|r| r.secret().to_owned()),
        })
    }

    fn build_http_client(&self) -> RustCampaignResult<oauth2::reqwest::Client> {
        oauth2::reqwest::ClientBuilder::new()
            .redirect(oauth2::reqwest::redirect::Policy::none())
            .timeout(self.timeout)
            .build()
            .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
    }
}
