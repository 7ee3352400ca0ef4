// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-user daily send quota.
//!
//! Counters live in memory and roll over lazily: the first access on a new UTC
//! calendar day resets `emails_sent_today`. Every mutation of a user's counter runs
//! under that user's map entry lock, so concurrent campaigns of one user see a
//! single consistent count.
//!
//! Sends go through [`QuotaTracker::try_acquire`], which reserves a slot before the
//! provider call. A reserved slot either becomes a recorded send through
//! [`QuotaPermit::commit`] or is given back when the permit is dropped, so a
//! failed send never consumes quota and two campaigns can never both take the
//! last slot.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::raise_error;

pub use policy::{AccountKind, DailyLimitPolicy};

pub mod policy;
#[cfg(test)]
mod tests;

pub type DateSource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct QuotaState {
    /// Confirmed sends since the last reset.
    pub emails_sent_today: u32,
    /// Ceiling for the current day.
    pub daily_limit: u32,
    /// UTC date the counter was last reset.
    pub last_reset_date: NaiveDate,
    /// Plan tier the ceiling was derived from.
    pub account_kind: AccountKind,
}

impl QuotaState {
    pub fn remaining(&self) -> u32 {
        self.daily_limit.saturating_sub(self.emails_sent_today)
    }

    pub fn is_exhausted(&self) -> bool {
        self.emails_sent_today >= self.daily_limit
    }
}

#[derive(Debug)]
struct QuotaEntry {
    sent_today: u32,
    reserved: u32,
    kind: AccountKind,
    last_reset_date: NaiveDate,
}

impl QuotaEntry {
    fn new(today: NaiveDate) -> Self {
        Self {
            sent_today: 0,
            reserved: 0,
            kind: AccountKind::default(),
            last_reset_date: today,
        }
    }

    fn roll_over(&mut self, user_id: &str, today: NaiveDate) {
        if self.last_reset_date != today {
            info!(
                user_id,
                previous_date = %self.last_reset_date,
                "Reset daily send count"
            );
            self.sent_today = 0;
            self.reserved = 0;
            self.last_reset_date = today;
        }
    }
}

pub struct QuotaTracker {
    entries: DashMap<String, QuotaEntry>,
    policy: DailyLimitPolicy,
    today: DateSource,
}

impl QuotaTracker {
    pub fn new(policy: DailyLimitPolicy) -> Self {
        Self::with_date_source(policy, Arc::new(|| Utc::now().date_naive()))
    }

    pub fn with_date_source(policy: DailyLimitPolicy, today: DateSource) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
            today,
        }
    }

    pub fn policy(&self) -> &DailyLimitPolicy {
        &self.policy
    }

    /// Records the plan tier of a user, typically once their sending identity is known.
    pub fn set_account_kind(&self, user_id: &str, kind: AccountKind) {
        let today = (self.today)();
        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| QuotaEntry::new(today));
        entry.roll_over(user_id, today);
        entry.kind = kind;
    }

    pub fn daily_limit_for(&self, user_id: &str) -> u32 {
        let kind = self
            .entries
            .get(user_id)
            .map(|e| e.kind)
            .unwrap_or_default();
        self.policy.daily_limit_for(user_id, kind)
    }

    /// Current counters of a user. Never fails; unknown users start at zero.
    pub fn get_daily_stats(&self, user_id: &str) -> QuotaState {
        let today = (self.today)();
        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| QuotaEntry::new(today));
        entry.roll_over(user_id, today);
        self.snapshot(user_id, &entry)
    }

    /// Counts one confirmed send that did not go through a permit.
    ///
    /// Refuses instead of counting past the ceiling.
    pub fn record_send(&self, user_id: &str) -> RustCampaignResult<QuotaState> {
        let today = (self.today)();
        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| QuotaEntry::new(today));
        entry.roll_over(user_id, today);
        let limit = self.policy.daily_limit_for(user_id, entry.kind);
        if entry.sent_today + entry.reserved >= limit {
            return Err(raise_error!(
                format!(
                    "Daily sending limit reached ({}/{})",
                    entry.sent_today, limit
                ),
                ErrorCode::ExceedsLimitation
            ));
        }
        entry.sent_today += 1;
        Ok(self.snapshot(user_id, &entry))
    }

    /// Reserves one send slot for `user_id`.
    ///
    /// Returns the current state when no slot is left for today.
    pub fn try_acquire(self: &Arc<Self>, user_id: &str) -> Result<QuotaPermit, QuotaState> {
        let today = (self.today)();
        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| QuotaEntry::new(today));
        entry.roll_over(user_id, today);
        let limit = self.policy.daily_limit_for(user_id, entry.kind);
        if entry.sent_today + entry.reserved >= limit {
            return Err(self.snapshot(user_id, &entry));
        }
        entry.reserved += 1;
        debug!(
            user_id,
            sent_today = entry.sent_today,
            reserved = entry.reserved,
            "Reserved send slot"
        );
        Ok(QuotaPermit {
            tracker: Arc::clone(self),
            user_id: user_id.to_string(),
            date: today,
            committed: false,
        })
    }

    fn snapshot(&self, user_id: &str, entry: &QuotaEntry) -> QuotaState {
        QuotaState {
            emails_sent_today: entry.sent_today,
            daily_limit: self.policy.daily_limit_for(user_id, entry.kind),
            last_reset_date: entry.last_reset_date,
            account_kind: entry.kind,
        }
    }

    fn settle(&self, user_id: &str, date: NaiveDate, sent: bool) {
        let today = (self.today)();
        let mut entry = self
            .entries
            .entry(user_id.to_string())
            .or_insert_with(|| QuotaEntry::new(today));
        if entry.last_reset_date == date {
            entry.reserved = entry.reserved.saturating_sub(1);
        }
        if sent {
            entry.roll_over(user_id, today);
            // A send confirmed after midnight is charged to the new day, but never past its ceiling.
            let limit = self.policy.daily_limit_for(user_id, entry.kind);
            if entry.sent_today < limit {
                entry.sent_today += 1;
            } else {
                warn!(
                    user_id,
                    reserved_on = %date,
                    today = %today,
                    daily_limit = limit,
                    "Send confirmed after the day rolled over; new day is already full, not counted"
                );
            }
        }
    }
}

/// One reserved send slot. Dropping it without [`commit`](QuotaPermit::commit) releases the slot.
pub struct QuotaPermit {
    tracker: Arc<QuotaTracker>,
    user_id: String,
    date: NaiveDate,
    committed: bool,
}

impl QuotaPermit {
    /// Converts the reservation into a recorded send.
    pub fn commit(mut self) -> QuotaState {
        self.committed = true;
        self.tracker.settle(&self.user_id, self.date, true);
        self.tracker.get_daily_stats(&self.user_id)
    }
}

impl Drop for QuotaPermit {
    fn drop(&mut self) {
        if !self.committed {
            self.tracker.settle(&self.user_id, self.date, false);
        }
    }
}
