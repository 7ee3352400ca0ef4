// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::campaign::entity::CampaignStore;
use crate::modules::campaign::orchestrator::{BulkSender, Pacing};
use crate::modules::campaign::registry::ProgressRegistry;
use crate::modules::campaign::service::CampaignService;
use crate::modules::composer::Composer;
use crate::modules::contacts::ContactListStore;
use crate::modules::credentials::CredentialStore;
use crate::modules::delivery::gmail::GmailClient;
use crate::modules::error::RustCampaignResult;
use crate::modules::quota::{DailyLimitPolicy, QuotaTracker};
use crate::utc_now;

pub trait Initialize {
    async fn initialize() -> RustCampaignResult<()>;
}

pub trait RustCampaignTask {
    fn start(context: Arc<AppContext>);
}

/// Everything the HTTP handlers and background tasks share.
pub struct AppContext {
    pub quota: Arc<QuotaTracker>,
    pub credentials: Arc<CredentialStore>,
    pub contacts: Arc<ContactListStore>,
    pub registry: Arc<ProgressRegistry>,
    pub delivery: Arc<GmailClient>,
    pub campaigns: CampaignService<GmailClient>,
    /// Unix epoch milliseconds.
    pub started_at: i64,
}

impl AppContext {
    pub fn from_settings() -> RustCampaignResult<Arc<Self>> {
        let quota = Arc::new(QuotaTracker::new(DailyLimitPolicy::from_settings()));
        let delivery = Arc::new(GmailClient::from_settings()?);
        let credentials = Arc::new(CredentialStore::new());
        let contacts = Arc::new(ContactListStore::new());
        let registry = Arc::new(ProgressRegistry::from_settings());

        let sender = Arc::new(BulkSender::new(
            quota.clone(),
            delivery.clone(),
            Composer::from_settings(),
            Pacing::from_settings(),
        ));
        let campaigns = CampaignService::new(
            sender,
            Arc::new(CampaignStore::new()),
            registry.clone(),
            credentials.clone(),
            contacts.clone(),
        );

        Ok(Arc::new(Self {
            quota,
            credentials,
            contacts,
            registry,
            delivery,
            campaigns,
            started_at: utc_now!(),
        }))
    }
}
