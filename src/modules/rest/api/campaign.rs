// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::campaign::entity::Campaign;
use crate::modules::campaign::progress::SendProgress;
use crate::modules::campaign::service::SendCampaignRequest;
use crate::modules::common::auth::UserContext;
use crate::modules::context::AppContext;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::response::{CancelCampaignResponse, SendCampaignResponse};
use crate::modules::rest::ApiResult;
use poem::web::Data;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;

pub struct CampaignApi;

#[OpenApi(prefix_path = "/api/v1", tag = "ApiTags::Campaign")]
impl CampaignApi {
    /// Start sending a campaign to every contact of a list.
    ///
    /// Returns immediately. Poll the progress endpoint for the running counters.
    #[oai(path = "/campaigns/send", method = "post", operation_id = "send_campaign")]
    async fn send_campaign(
        &self,
        payload: Json<SendCampaignRequest>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<SendCampaignResponse>> {
        let outcome = app.campaigns.start(&context.user_id, payload.0)?;
        Ok(Json(outcome.into()))
    }

    /// List the caller's campaigns, newest first
    #[oai(path = "/campaigns", method = "get", operation_id = "list_campaigns")]
    async fn list_campaigns(
        &self,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<Vec<Campaign>>> {
        Ok(Json(app.campaigns.list(&context.user_id)))
    }

    #[oai(path = "/campaigns/:campaign_id", method = "get", operation_id = "get_campaign")]
    async fn get_campaign(
        &self,
        /// The campaign ID
        campaign_id: Path<String>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<Campaign>> {
        Ok(Json(app.campaigns.get(&context.user_id, &campaign_id.0)?))
    }

    /// Latest progress snapshot, available for a limited time after the run started
    #[oai(
        path = "/campaigns/:campaign_id/progress",
        method = "get",
        operation_id = "campaign_progress"
    )]
    async fn campaign_progress(
        &self,
        /// The campaign ID
        campaign_id: Path<String>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<SendProgress>> {
        Ok(Json(
            app.campaigns.progress(&context.user_id, &campaign_id.0)?,
        ))
    }

    /// Stop a running campaign after the email currently being sent
    #[oai(
        path = "/campaigns/:campaign_id/cancel",
        method = "post",
        operation_id = "cancel_campaign"
    )]
    async fn cancel_campaign(
        &self,
        /// The campaign ID
        campaign_id: Path<String>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<CancelCampaignResponse>> {
        let cancelled = app.campaigns.cancel(&context.user_id, &campaign_id.0)?;
        Ok(Json(CancelCampaignResponse { cancelled }))
    }
}
