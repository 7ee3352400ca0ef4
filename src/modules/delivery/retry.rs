// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use crate::modules::settings::cli::SETTINGS;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Fixed wait between attempts.
    Linear,
    /// Wait grows by `base` per attempt.
    Exponential { base: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub strategy: RetryStrategy,
    pub max_retries: Option<u32>,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_settings() -> Self {
        Self {
            strategy: RetryStrategy::Exponential { base: 2 },
            max_retries: Some(SETTINGS.rustcampaign_send_max_retries),
            base_delay: Duration::from_millis(SETTINGS.rustcampaign_send_backoff_base_ms),
        }
    }

    /// Whether a retry is allowed after `retries_done` earlier retries.
    pub fn allows(&self, retries_done: u32) -> bool {
        self.max_retries.is_none_or(|max| retries_done < max)
    }

    /// Wait before retry number `attempt`, counted from zero.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self.strategy {
            RetryStrategy::Linear => self.base_delay,
            RetryStrategy::Exponential { base } => {
                let factor = base.max(1).saturating_pow(attempt);
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::Exponential { base: 2 },
            max_retries: Some(3),
            base_delay: Duration::from_secs(1),
        }
    }
}
