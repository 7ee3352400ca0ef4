// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::future::Future;

use snafu::Snafu;

use crate::modules::composer::OutgoingEmail;
use crate::modules::credentials::Credentials;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignError;

pub mod gmail;
pub mod retry;
#[cfg(test)]
mod tests;

/// Outcome of a failed provider call, classified for the send loop.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub))]
pub enum DeliveryError {
    #[snafu(display("rate limited by provider: {reason}"))]
    RateLimited { reason: String },
    #[snafu(display("access token rejected: {reason}"))]
    Unauthorized { reason: String },
    #[snafu(display("{reason}"))]
    Rejected { status: u16, reason: String },
    #[snafu(display("network error: {reason}"))]
    Transport { reason: String },
    #[snafu(display("credential refresh failed: {reason}"))]
    CredentialRefresh { reason: String },
    #[snafu(display("message could not be built: {reason}"))]
    InvalidMessage { reason: String },
}

impl DeliveryError {
    /// Credential failures end the whole batch; everything else stays local to one recipient.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DeliveryError::Unauthorized { .. } | DeliveryError::CredentialRefresh { .. }
        )
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, DeliveryError::RateLimited { .. })
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            DeliveryError::RateLimited { .. } => ErrorCode::GmailRateLimited,
            DeliveryError::Unauthorized { .. } => ErrorCode::PermissionDenied,
            DeliveryError::Rejected { .. } => ErrorCode::GmailApiCallFailed,
            DeliveryError::Transport { .. } => ErrorCode::NetworkError,
            DeliveryError::CredentialRefresh { .. } => ErrorCode::CredentialRefreshFailed,
            DeliveryError::InvalidMessage { .. } => ErrorCode::MessageBuildFailed,
        }
    }
}

impl From<RustCampaignError> for DeliveryError {
    fn from(error: RustCampaignError) -> Self {
        match error.code() {
            ErrorCode::MessageBuildFailed => DeliveryError::InvalidMessage {
                reason: error.to_string(),
            },
            ErrorCode::CredentialRefreshFailed
            | ErrorCode::MissingRefreshToken
            | ErrorCode::MissingConfiguration => DeliveryError::CredentialRefresh {
                reason: error.to_string(),
            },
            _ => DeliveryError::Transport {
                reason: error.to_string(),
            },
        }
    }
}

/// A mail provider the send loop can push messages through.
///
/// `send` takes the credentials mutably: an implementation that refreshes an
/// expired access token writes the new one back so the rest of the batch reuses it.
pub trait DeliveryClient: Send + Sync + 'static {
    /// Cheap pre-flight check that the access token is currently accepted.
    fn validate_credentials(&self, credentials: &Credentials) -> impl Future<Output = bool> + Send;

    fn refresh_credentials(
        &self,
        credentials: &mut Credentials,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    fn send(
        &self,
        credentials: &mut Credentials,
        email: &OutgoingEmail,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}
