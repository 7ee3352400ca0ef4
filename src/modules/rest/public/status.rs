use std::sync::Arc;

use crate::modules::context::AppContext;
use crate::{rustcampaign_version, utc_now};
use poem::{handler, web::Data, web::Json, IntoResponse};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Object)]
pub struct ServiceStatus {
    /// The service uptime in milliseconds since it started.
    pub uptime_ms: i64,
    pub version: String,
    /// Campaigns currently preparing or sending.
    pub active_campaigns: u32,
    /// Progress entries held in memory, finished ones included.
    pub tracked_campaigns: u32,
}

impl ServiceStatus {
    pub fn collect(context: &AppContext) -> Self {
        Self {
            uptime_ms: utc_now!() - context.started_at,
            version: rustcampaign_version!().into(),
            active_campaigns: context.registry.active_count() as u32,
            tracked_campaigns: context.registry.len() as u32,
        }
    }
}

#[handler]
pub async fn get_status(context: Data<&Arc<AppContext>>) -> impl IntoResponse {
    Json(ServiceStatus::collect(&context))
}
