// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use dashmap::DashMap;
use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

use super::observer::ProgressObserver;
use super::progress::{SendProgress, SendStatus};
use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::{generate_token, raise_error, utc_now};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Enum)]
#[serde(rename_all = "snake_case")]
#[oai(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Sending,
    Sent,
    Failed,
}

impl CampaignStatus {
    /// Final record status for a finished run.
    ///
    /// A run that stopped early still counts as sent when at least one message went out.
    pub fn from_outcome(progress: &SendProgress) -> Self {
        match progress.status {
            SendStatus::Preparing | SendStatus::Sending => CampaignStatus::Sending,
            SendStatus::Failed => CampaignStatus::Failed,
            SendStatus::Completed | SendStatus::LimitReached | SendStatus::Cancelled => {
                if progress.sent > 0 {
                    CampaignStatus::Sent
                } else {
                    CampaignStatus::Failed
                }
            }
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct Campaign {
    pub id: String,
    pub user_id: String,
    pub email_list_id: String,
    pub subject: String,
    pub body_template: String,
    pub sender_identity: String,
    pub status: CampaignStatus,
    pub sent_count: u32,
    pub failed_count: u32,
    /// How the last run ended, once it has.
    pub outcome: Option<SendStatus>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub sent_at: Option<i64>,
}

#[derive(Default)]
pub struct CampaignStore {
    campaigns: DashMap<String, Campaign>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        user_id: &str,
        email_list_id: &str,
        subject: &str,
        body_template: &str,
        sender_identity: &str,
    ) -> Campaign {
        let campaign = Campaign {
            id: generate_token!(96),
            user_id: user_id.to_string(),
            email_list_id: email_list_id.to_string(),
            subject: subject.to_string(),
            body_template: body_template.to_string(),
            sender_identity: sender_identity.to_string(),
            status: CampaignStatus::Draft,
            created_at: utc_now!(),
            ..Default::default()
        };
        self.campaigns.insert(campaign.id.clone(), campaign.clone());
        campaign
    }

    pub fn get(&self, user_id: &str, campaign_id: &str) -> RustCampaignResult<Campaign> {
        self.campaigns
            .get(campaign_id)
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .ok_or_else(|| {
                raise_error!(
                    format!("Campaign '{}' not found", campaign_id),
                    ErrorCode::ResourceNotFound
                )
            })
    }

    /// Campaigns of a user, newest first.
    pub fn list(&self, user_id: &str) -> Vec<Campaign> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.value().clone())
            .collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        campaigns
    }

    pub fn mark_sending(&self, campaign_id: &str) {
        if let Some(mut campaign) = self.campaigns.get_mut(campaign_id) {
            if campaign.status == CampaignStatus::Draft {
                campaign.status = CampaignStatus::Sending;
            }
        }
    }

    /// Running counters, written on every snapshot while the run is in flight.
    pub fn record_progress(&self, campaign_id: &str, progress: &SendProgress) {
        if let Some(mut campaign) = self.campaigns.get_mut(campaign_id) {
            campaign.sent_count = progress.sent;
            campaign.failed_count = progress.failed;
        }
    }

    pub fn finish(&self, campaign_id: &str, progress: &SendProgress) -> Option<Campaign> {
        let mut campaign = self.campaigns.get_mut(campaign_id)?;
        campaign.status = CampaignStatus::from_outcome(progress);
        campaign.sent_count = progress.sent;
        campaign.failed_count = progress.failed;
        campaign.outcome = Some(progress.status);
        if progress.sent > 0 {
            campaign.sent_at = Some(utc_now!());
        }
        Some(campaign.value().clone())
    }
}

impl ProgressObserver for CampaignStore {
    fn on_progress(&self, campaign_id: &str, progress: &SendProgress) {
        self.record_progress(campaign_id, progress);
    }
}
