// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::common::auth::UserContext;
use crate::modules::context::AppContext;
use crate::modules::credentials::{ConnectGmailRequest, CredentialProvider, GmailConnectionStatus};
use crate::modules::delivery::DeliveryClient;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::response::SendingStats;
use crate::modules::rest::ApiResult;
use poem::web::Data;
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;

pub struct GmailApi;

#[OpenApi(prefix_path = "/api/v1", tag = "ApiTags::Gmail")]
impl GmailApi {
    /// Store the OAuth tokens used to send through the caller's Gmail account
    #[oai(path = "/gmail/credentials", method = "put", operation_id = "connect_gmail")]
    async fn connect_gmail(
        &self,
        /// Tokens granted by the Google consent flow
        payload: Json<ConnectGmailRequest>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<GmailConnectionStatus>> {
        let credentials = app.credentials.connect(&context.user_id, payload.0)?;
        let kind = app
            .quota
            .policy()
            .classify(Some(credentials.identity_email.as_str()));
        app.quota.set_account_kind(&context.user_id, kind);
        Ok(Json(GmailConnectionStatus {
            connected: true,
            identity_email: Some(credentials.identity_email),
            token_valid: None,
            has_refresh_token: credentials.refresh_token.is_some(),
            connected_at: app.credentials.connected_at(&context.user_id),
        }))
    }

    /// Forget the stored Gmail tokens
    #[oai(path = "/gmail/credentials", method = "delete", operation_id = "disconnect_gmail")]
    async fn disconnect_gmail(
        &self,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<()> {
        app.credentials.disconnect(&context.user_id);
        Ok(())
    }

    /// Report whether a Gmail account is connected and its token still works
    #[oai(path = "/gmail/status", method = "get", operation_id = "gmail_status")]
    async fn gmail_status(
        &self,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<GmailConnectionStatus>> {
        let Some(credentials) = app.credentials.credentials_for(&context.user_id) else {
            return Ok(Json(GmailConnectionStatus::default()));
        };
        let token_valid = app.delivery.validate_credentials(&credentials).await;
        Ok(Json(GmailConnectionStatus {
            connected: true,
            identity_email: Some(credentials.identity_email),
            token_valid: Some(token_valid),
            has_refresh_token: credentials.refresh_token.is_some(),
            connected_at: app.credentials.connected_at(&context.user_id),
        }))
    }

    /// Today's sending counter, ceiling and remaining allowance
    #[oai(path = "/gmail/stats", method = "get", operation_id = "sending_stats")]
    async fn sending_stats(
        &self,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<SendingStats>> {
        Ok(Json(app.quota.get_daily_stats(&context.user_id).into()))
    }
}
