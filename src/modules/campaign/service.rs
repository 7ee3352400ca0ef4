// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use dashmap::DashMap;

use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::entity::{Campaign, CampaignStore};
use super::observer::Observers;
use super::orchestrator::{BulkSender, CampaignRequest, CancelHandle};
use super::progress::SendProgress;
use super::registry::ProgressRegistry;
use crate::modules::contacts::ContactListStore;
use crate::modules::credentials::{CredentialProvider, CredentialStore};
use crate::modules::delivery::DeliveryClient;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::modules::metrics::RUSTCAMPAIGN_CAMPAIGNS_TOTAL;
use crate::modules::quota::QuotaState;
use crate::raise_error;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct SendCampaignRequest {
    /// Contact list to send to.
    pub email_list_id: String,
    #[oai(validator(min_length = 1, max_length = 998))]
    pub subject: String,
    /// Body template. May contain `{name}`, `{company}` and `{email}`.
    #[oai(validator(min_length = 1))]
    pub body: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartOutcome {
    Started { campaign_id: String, total: u32 },
    /// Nothing was started because today's quota is already used up.
    LimitReached(QuotaState),
}

pub struct CampaignService<D: DeliveryClient> {
    sender: Arc<BulkSender<D>>,
    campaigns: Arc<CampaignStore>,
    registry: Arc<ProgressRegistry>,
    credentials: Arc<CredentialStore>,
    contacts: Arc<ContactListStore>,
    /// Stop flags of runs still in flight. Independent of progress retention.
    running: Arc<DashMap<String, CancelHandle>>,
}

impl<D: DeliveryClient> CampaignService<D> {
    pub fn new(
        sender: Arc<BulkSender<D>>,
        campaigns: Arc<CampaignStore>,
        registry: Arc<ProgressRegistry>,
        credentials: Arc<CredentialStore>,
        contacts: Arc<ContactListStore>,
    ) -> Self {
        Self {
            sender,
            campaigns,
            registry,
            credentials,
            contacts,
            running: Arc::new(DashMap::new()),
        }
    }

    /// Validates the request and starts the run in the background.
    pub fn start(
        &self,
        user_id: &str,
        request: SendCampaignRequest,
    ) -> RustCampaignResult<StartOutcome> {
        if request.subject.trim().is_empty() || request.body.trim().is_empty() {
            return Err(raise_error!(
                "Subject and body must not be empty".into(),
                ErrorCode::InvalidParameter
            ));
        }
        let list = self.contacts.get(user_id, &request.email_list_id)?;
        let credentials = self.credentials.get(user_id)?;

        let quota = self.sender.quota();
        let kind = quota
            .policy()
            .classify(Some(credentials.identity_email.as_str()));
        quota.set_account_kind(user_id, kind);
        let stats = quota.get_daily_stats(user_id);
        if stats.is_exhausted() {
            info!(
                user_id,
                sent_today = stats.emails_sent_today,
                daily_limit = stats.daily_limit,
                "Campaign refused, daily limit already reached"
            );
            return Ok(StartOutcome::LimitReached(stats));
        }

        let campaign = self.campaigns.create(
            user_id,
            &list.id,
            &request.subject,
            &request.body,
            &credentials.identity_email,
        );
        let total = list.contacts.len() as u32;
        let cancel = CancelHandle::new();
        self.registry.put(&campaign.id, SendProgress::new(total));
        self.running.insert(campaign.id.clone(), cancel.clone());
        self.campaigns.mark_sending(&campaign.id);

        let run_request = CampaignRequest {
            campaign_id: campaign.id.clone(),
            user_id: user_id.to_string(),
            subject: request.subject,
            body_template: request.body,
            contacts: list.contacts,
            credentials: Some(credentials.clone()),
        };
        let sender = self.sender.clone();
        let campaigns = self.campaigns.clone();
        let store = self.credentials.clone();
        let running = self.running.clone();
        let observers = Observers::new()
            .with(self.registry.clone())
            .with(self.campaigns.clone());
        let owner = user_id.to_string();

        tokio::spawn(async move {
            let campaign_id = run_request.campaign_id.clone();
            let outcome = sender.run(run_request, &observers, &cancel).await;
            running.remove(&campaign_id);
            if let Some(updated) = &outcome.credentials {
                if *updated != credentials {
                    store.update_credentials(&owner, updated);
                }
            }
            RUSTCAMPAIGN_CAMPAIGNS_TOTAL
                .with_label_values(&[outcome.progress.status.as_str()])
                .inc();
            campaigns.finish(&campaign_id, &outcome.progress);
        });

        info!(user_id, campaign_id = %campaign.id, total, "Campaign queued");
        Ok(StartOutcome::Started {
            campaign_id: campaign.id,
            total,
        })
    }

    pub fn progress(&self, user_id: &str, campaign_id: &str) -> RustCampaignResult<SendProgress> {
        self.campaigns.get(user_id, campaign_id)?;
        self.registry.get(campaign_id).ok_or_else(|| {
            raise_error!(
                format!(
                    "Progress of campaign '{}' is no longer tracked (retention is {} seconds)",
                    campaign_id,
                    self.registry.retention().as_secs()
                ),
                ErrorCode::ResourceNotFound
            )
        })
    }

    pub fn cancel(&self, user_id: &str, campaign_id: &str) -> RustCampaignResult<bool> {
        self.campaigns.get(user_id, campaign_id)?;
        let finished = self
            .registry
            .get(campaign_id)
            .is_some_and(|progress| progress.status.is_terminal());
        let cancelled = !finished
            && self
                .running
                .get(campaign_id)
                .map(|handle| handle.cancel())
                .is_some();
        if cancelled {
            info!(user_id, campaign_id, "Campaign cancellation requested");
        }
        Ok(cancelled)
    }

    pub fn get(&self, user_id: &str, campaign_id: &str) -> RustCampaignResult<Campaign> {
        self.campaigns.get(user_id, campaign_id)
    }

    pub fn list(&self, user_id: &str) -> Vec<Campaign> {
        self.campaigns.list(user_id)
    }

    /// Signals every run still in flight. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        self.running
            .iter()
            .map(|entry| entry.value().cancel())
            .count()
    }

    pub fn registry(&self) -> &Arc<ProgressRegistry> {
        &self.registry
    }
}
