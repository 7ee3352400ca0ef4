// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::debug;

use super::observer::ProgressObserver;
use super::progress::{SendProgress, SendStatus};
use crate::modules::settings::cli::SETTINGS;

struct TrackedCampaign {
    progress: SendProgress,
    tracked_at: Instant,
}

/// Latest progress snapshot per running campaign.
///
/// An entry lives for a fixed window counted from the first snapshot stored for
/// it, polled or not. Expired entries vanish on read and are swept by
/// [`prune`](ProgressRegistry::prune). A snapshot arriving after its entry expired
/// starts a new window.
pub struct ProgressRegistry {
    entries: DashMap<String, TrackedCampaign>,
    retention: Duration,
}

impl ProgressRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
        }
    }

    pub fn from_settings() -> Self {
        Self::new(Duration::from_secs(
            SETTINGS.rustcampaign_progress_retention_secs,
        ))
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    fn expired(&self, tracked_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(tracked_at) >= self.retention
    }

    pub fn put(&self, campaign_id: &str, progress: SendProgress) {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(campaign_id.to_string())
            .or_insert_with(|| TrackedCampaign {
                progress: SendProgress::default(),
                tracked_at: now,
            });
        if self.expired(entry.tracked_at, now) {
            entry.tracked_at = now;
        }
        entry.progress = progress;
    }

    pub fn get(&self, campaign_id: &str) -> Option<SendProgress> {
        let now = Instant::now();
        let removed = self
            .entries
            .remove_if(campaign_id, |_, tracked| self.expired(tracked.tracked_at, now));
        if removed.is_some() {
            debug!(campaign_id, "Progress entry expired");
            return None;
        }
        self.entries.get(campaign_id).map(|e| e.progress.clone())
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, tracked| !self.expired(tracked.tracked_at, now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.progress.status,
                    SendStatus::Preparing | SendStatus::Sending
                )
            })
            .count()
    }
}

impl ProgressObserver for ProgressRegistry {
    fn on_progress(&self, campaign_id: &str, progress: &SendProgress) {
        self.put(campaign_id, progress.clone());
    }
}
