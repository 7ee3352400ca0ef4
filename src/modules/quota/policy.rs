// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{HashMap, HashSet};

use poem_openapi::Enum;
use serde::{Deserialize, Serialize};

use crate::modules::settings::cli::SETTINGS;

/// Plan tier of a sending identity.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Enum)]
pub enum AccountKind {
    /// Personal mailbox on a consumer domain.
    #[default]
    Free,
    /// Mailbox hosted on an organization's own domain.
    Organization,
}

/// Decides the daily ceiling of a user.
///
/// The tier comes from the domain of the identity the user sends from: consumer
/// domains are free tier, everything else is treated as an organization account.
/// Explicit per-user overrides win over the tier default.
#[derive(Clone, Debug)]
pub struct DailyLimitPolicy {
    free_limit: u32,
    organization_limit: u32,
    consumer_domains: HashSet<String>,
    overrides: HashMap<String, u32>,
}

impl DailyLimitPolicy {
    pub fn new(
        free_limit: u32,
        organization_limit: u32,
        consumer_domains: HashSet<String>,
    ) -> Self {
        Self {
            free_limit: free_limit.max(1),
            organization_limit: organization_limit.max(1),
            consumer_domains: consumer_domains
                .into_iter()
                .map(|d| d.trim().to_lowercase())
                .collect(),
            overrides: HashMap::new(),
        }
    }

    pub fn from_settings() -> Self {
        Self::new(
            SETTINGS.rustcampaign_free_daily_limit,
            SETTINGS.rustcampaign_organization_daily_limit,
            SETTINGS.rustcampaign_consumer_domains.clone(),
        )
    }

    /// A zero override is ignored since a ceiling must stay positive.
    pub fn with_override(mut self, user_id: &str, limit: u32) -> Self {
        if limit > 0 {
            self.overrides.insert(user_id.to_string(), limit);
        }
        self
    }

    pub fn classify(&self, identity_email: Option<&str>) -> AccountKind {
        let domain = identity_email
            .and_then(|email| email.rsplit_once('@'))
            .map(|(_, domain)| domain.trim().to_lowercase());
        match domain {
            Some(domain) if !domain.is_empty() && !self.consumer_domains.contains(&domain) => {
                AccountKind::Organization
            }
            _ => AccountKind::Free,
        }
    }

    pub fn limit_for_kind(&self, kind: AccountKind) -> u32 {
        match kind {
            AccountKind::Free => self.free_limit,
            AccountKind::Organization => self.organization_limit,
        }
    }

    pub fn daily_limit_for(&self, user_id: &str, kind: AccountKind) -> u32 {
        self.overrides
            .get(user_id)
            .copied()
            .unwrap_or_else(|| self.limit_for_kind(kind))
    }
}

impl Default for DailyLimitPolicy {
    fn default() -> Self {
        Self::new(
            2,
            2000,
            ["gmail.com", "googlemail.com"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}
