// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::{Duration, Instant};

use http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::modules::composer::OutgoingEmail;
use crate::modules::credentials::Credentials;
use crate::modules::delivery::retry::RetryPolicy;
use crate::modules::delivery::{DeliveryClient, DeliveryError};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::modules::metrics::RUSTCAMPAIGN_EMAIL_SEND_DURATION_SECONDS;
use crate::modules::oauth2::flow::OAuth2Flow;
use crate::modules::settings::cli::SETTINGS;
use crate::{raise_error, rustcampaign_version};

const RATE_LIMIT_REASONS: [&str; 2] = ["rateLimitExceeded", "userRateLimitExceeded"];

#[derive(Debug, Default, Deserialize)]
struct GoogleErrorBody {
    error: Option<GoogleError>,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleError {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleErrorDetail {
    reason: Option<String>,
}

/// Maps a non-success Gmail API response to a delivery outcome.
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> DeliveryError {
    let parsed: GoogleErrorBody = serde_json::from_str(body).unwrap_or_default();
    let detail = parsed.error.unwrap_or_default();
    let reason = detail
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )
            .trim_end()
            .to_string()
        });
    let rate_limit_reason = detail.errors.iter().any(|e| {
        e.reason
            .as_deref()
            .is_some_and(|r| RATE_LIMIT_REASONS.contains(&r))
    });

    match status {
        StatusCode::TOO_MANY_REQUESTS => DeliveryError::RateLimited { reason },
        StatusCode::FORBIDDEN if rate_limit_reason => DeliveryError::RateLimited { reason },
        StatusCode::UNAUTHORIZED => DeliveryError::Unauthorized { reason },
        _ => DeliveryError::Rejected {
            status: status.as_u16(),
            reason,
        },
    }
}

/// Sends through `users.messages.send` of the Gmail REST API.
pub struct GmailClient {
    client: reqwest::Client,
    api_url: String,
    tokeninfo_url: String,
    oauth2: OAuth2Flow,
    retry: RetryPolicy,
}

impl GmailClient {
    pub fn new(
        api_url: &str,
        tokeninfo_url: &str,
        oauth2: OAuth2Flow,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> RustCampaignResult<Self> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(format!("RustCampaign/{}", rustcampaign_version!()))
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                raise_error!(
                    format!("Failed to build HTTP client: {:#?}", e),
                    ErrorCode::InternalError
                )
            })?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            tokeninfo_url: tokeninfo_url.to_string(),
            oauth2,
            retry,
        })
    }

    pub fn from_settings() -> RustCampaignResult<Self> {
        Self::new(
            &SETTINGS.rustcampaign_gmail_api_url,
            &SETTINGS.rustcampaign_tokeninfo_url,
            OAuth2Flow::from_settings(),
            RetryPolicy::from_settings(),
            Duration::from_secs(SETTINGS.rustcampaign_http_timeout_secs),
        )
    }

    fn send_url(&self) -> String {
        format!("{}/gmail/v1/users/me/messages/send", self.api_url)
    }

    async fn post_raw(&self, access_token: &str, raw: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.send_url())
            .bearer_auth(access_token)
            .json(&json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport {
                reason: format!("{}", e),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

impl DeliveryClient for GmailClient {
    async fn validate_credentials(&self, credentials: &Credentials) -> bool {
        let result = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("access_token", credentials.access_token.as_str())])
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                debug!(
                    identity = %credentials.identity_email,
                    status = response.status().as_u16(),
                    "Access token failed introspection"
                );
                false
            }
            Err(e) => {
                warn!(
                    identity = %credentials.identity_email,
                    "Token introspection request failed: {}", e
                );
                false
            }
        }
    }

    async fn refresh_credentials(&self, credentials: &mut Credentials) -> Result<(), DeliveryError> {
        let refresh_token =
            credentials
                .refresh_token
                .clone()
                .ok_or_else(|| DeliveryError::CredentialRefresh {
                    reason: "no refresh token available".into(),
                })?;
        let refreshed = self
            .oauth2
            .refresh_access_token(&refresh_token)
            .await
            .map_err(|e| DeliveryError::CredentialRefresh {
                reason: e.to_string(),
            })?;
        credentials.access_token = refreshed.access_token;
        if let Some(rotated) = refreshed.refresh_token {
            credentials.refresh_token = Some(rotated);
        }
        info!(identity = %credentials.identity_email, "Refreshed Gmail access token");
        Ok(())
    }

    async fn send(
        &self,
        credentials: &mut Credentials,
        email: &OutgoingEmail,
    ) -> Result<(), DeliveryError> {
        let raw = email.to_gmail_raw()?;
        let started = Instant::now();
        let mut retries = 0;
        let mut refreshed = false;

        let result = loop {
            match self.post_raw(&credentials.access_token, &raw).await {
                Ok(()) => break Ok(()),
                Err(DeliveryError::Unauthorized { reason }) if !refreshed => {
                    debug!(recipient = %email.to, "Access token rejected ({}), refreshing", reason);
                    self.refresh_credentials(credentials).await?;
                    refreshed = true;
                }
                Err(error @ DeliveryError::RateLimited { .. }) => {
                    if !self.retry.allows(retries) {
                        break Err(error);
                    }
                    let delay = self.retry.delay(retries);
                    retries += 1;
                    warn!(
                        recipient = %email.to,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "Gmail rate limit hit, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => break Err(error),
            }
        };

        RUSTCAMPAIGN_EMAIL_SEND_DURATION_SECONDS
            .with_label_values(&[if result.is_ok() { "success" } else { "failure" }])
            .observe(started.elapsed().as_secs_f64());
        result
    }
}
