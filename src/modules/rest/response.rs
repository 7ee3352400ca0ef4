use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

use crate::modules::campaign::service::StartOutcome;
use crate::modules::quota::{AccountKind, QuotaState};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, Enum)]
#[oai(rename_all = "snake_case")]
pub enum SendCampaignStatus {
    Started,
    LimitReached,
}

/// Reply to a send request. `campaign_id` is set only when the run was started.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct SendCampaignResponse {
    pub status: SendCampaignStatus,
    pub campaign_id: Option<String>,
    /// Number of contacts the run will go through.
    pub total: u32,
    pub message: String,
    /// Present when the request was refused because of the daily limit.
    pub quota: Option<QuotaState>,
}

impl From<StartOutcome> for SendCampaignResponse {
    fn from(outcome: StartOutcome) -> Self {
        match outcome {
            StartOutcome::Started { campaign_id, total } => Self {
                status: SendCampaignStatus::Started,
                campaign_id: Some(campaign_id),
                total,
                message: format!("Sending to {} contacts", total),
                quota: None,
            },
            StartOutcome::LimitReached(quota) => Self {
                status: SendCampaignStatus::LimitReached,
                campaign_id: None,
                total: 0,
                message: format!(
                    "Daily sending limit reached ({}/{}). Try again tomorrow.",
                    quota.emails_sent_today, quota.daily_limit
                ),
                quota: Some(quota),
            },
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct CancelCampaignResponse {
    /// False when the campaign had already finished or is no longer tracked.
    pub cancelled: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct SendingStats {
    pub emails_sent_today: u32,
    pub daily_limit: u32,
    pub remaining: u32,
    pub last_reset_date: String,
    pub account_kind: AccountKind,
}

impl From<QuotaState> for SendingStats {
    fn from(state: QuotaState) -> Self {
        Self {
            remaining: state.remaining(),
            emails_sent_today: state.emails_sent_today,
            daily_limit: state.daily_limit,
            last_reset_date: state.last_reset_date.to_string(),
            account_kind: state.account_kind,
        }
    }
}
