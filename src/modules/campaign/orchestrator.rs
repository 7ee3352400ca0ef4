// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{error, info, warn};

use super::observer::ProgressObserver;
use super::progress::{SendProgress, SendStatus};
use crate::modules::composer::Composer;
use crate::modules::contacts::Contact;
use crate::modules::credentials::Credentials;
use crate::modules::delivery::DeliveryClient;
use crate::modules::metrics::{FAILURE, LIMITED, RUSTCAMPAIGN_EMAIL_SENT_TOTAL, SUCCESS};
use crate::modules::quota::QuotaTracker;
use crate::modules::settings::cli::SETTINGS;

/// Cooperative stop flag shared between a running campaign and whoever may cancel it.
#[derive(Clone, Debug, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Randomized wait between two consecutive sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub min: Duration,
    pub max: Duration,
}

impl Pacing {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_settings() -> Self {
        Self::new(
            Duration::from_millis(SETTINGS.rustcampaign_send_delay_min_ms),
            Duration::from_millis(SETTINGS.rustcampaign_send_delay_max_ms),
        )
    }

    pub fn next_delay(&self) -> Duration {
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        if max <= min {
            return self.min;
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Everything one run needs. Contacts are sent in the given order.
#[derive(Clone, Debug)]
pub struct CampaignRequest {
    pub campaign_id: String,
    pub user_id: String,
    pub subject: String,
    pub body_template: String,
    pub contacts: Vec<Contact>,
    pub credentials: Option<Credentials>,
}

#[derive(Clone, Debug)]
pub struct SendOutcome {
    pub progress: SendProgress,
    /// Credentials as they stand after the run, including any refreshed access token.
    pub credentials: Option<Credentials>,
}

struct Run<'a> {
    campaign_id: &'a str,
    observer: &'a dyn ProgressObserver,
    progress: SendProgress,
}

impl Run<'_> {
    fn emit(&self) {
        debug_assert!(self.progress.processed() <= self.progress.total);
        self.observer.on_progress(self.campaign_id, &self.progress);
    }

    fn finish(&mut self, status: SendStatus) {
        self.progress.transition(status);
        self.emit();
    }

    fn abort(&mut self, reason: String) {
        warn!(campaign_id = self.campaign_id, "Campaign not started: {}", reason);
        self.progress.errors.push(reason);
        self.finish(SendStatus::Failed);
    }
}

/// Runs one campaign: quota check, personalize, deliver and pace, contact by contact.
pub struct BulkSender<D: DeliveryClient> {
    quota: Arc<QuotaTracker>,
    delivery: Arc<D>,
    composer: Composer,
    pacing: Pacing,
}

impl<D: DeliveryClient> BulkSender<D> {
    pub fn new(quota: Arc<QuotaTracker>, delivery: Arc<D>, composer: Composer, pacing: Pacing) -> Self {
        Self {
            quota,
            delivery,
            composer,
            pacing,
        }
    }

    pub fn quota(&self) -> &Arc<QuotaTracker> {
        &self.quota
    }

    pub async fn run(
        &self,
        request: CampaignRequest,
        observer: &dyn ProgressObserver,
        cancel: &CancelHandle,
    ) -> SendOutcome {
        let CampaignRequest {
            campaign_id,
            user_id,
            subject,
            body_template,
            contacts,
            credentials,
        } = request;

        let mut run = Run {
            campaign_id: &campaign_id,
            observer,
            progress: SendProgress::new(contacts.len() as u32),
        };
        run.emit();

        let mut credentials = match self.prepare(&mut run, &contacts, &subject, &body_template, credentials).await {
            Some(credentials) => credentials,
            None => {
                return SendOutcome {
                    progress: run.progress,
                    credentials: None,
                }
            }
        };

        if cancel.is_cancelled() {
            info!(campaign_id, "Campaign cancelled before sending");
            run.finish(SendStatus::Cancelled);
            return SendOutcome {
                progress: run.progress,
                credentials: Some(credentials),
            };
        }

        run.progress.transition(SendStatus::Sending);
        run.emit();
        info!(
            campaign_id,
            user_id,
            total = run.progress.total,
            "Campaign sending started"
        );

        let total = contacts.len();
        for (index, contact) in contacts.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    campaign_id,
                    sent = run.progress.sent,
                    failed = run.progress.failed,
                    "Campaign cancelled"
                );
                run.finish(SendStatus::Cancelled);
                return SendOutcome {
                    progress: run.progress,
                    credentials: Some(credentials),
                };
            }

            run.progress.current_email = Some(contact.email.clone());

            let permit = match self.quota.try_acquire(&user_id) {
                Ok(permit) => permit,
                Err(state) => {
                    let reason = format!(
                        "daily sending limit reached ({}/{})",
                        state.emails_sent_today, state.daily_limit
                    );
                    warn!(
                        campaign_id,
                        user_id,
                        remaining_contacts = total - index,
                        "Daily limit reached, stopping campaign"
                    );
                    for skipped in &contacts[index..] {
                        run.progress.record_failure(&skipped.email, &reason);
                        RUSTCAMPAIGN_EMAIL_SENT_TOTAL
                            .with_label_values(&[LIMITED])
                            .inc();
                    }
                    run.finish(SendStatus::LimitReached);
                    return SendOutcome {
                        progress: run.progress,
                        credentials: Some(credentials),
                    };
                }
            };

            let email = self.composer.compose(
                &credentials.identity_email,
                contact,
                &subject,
                &body_template,
            );

            match self.delivery.send(&mut credentials, &email).await {
                Ok(()) => {
                    let state = permit.commit();
                    run.progress.sent += 1;
                    RUSTCAMPAIGN_EMAIL_SENT_TOTAL
                        .with_label_values(&[SUCCESS])
                        .inc();
                    info!(
                        campaign_id,
                        recipient = %contact.email,
                        sent_today = state.emails_sent_today,
                        daily_limit = state.daily_limit,
                        "Email sent"
                    );
                }
                Err(e) => {
                    drop(permit);
                    run.progress.record_failure(&contact.email, &e.to_string());
                    RUSTCAMPAIGN_EMAIL_SENT_TOTAL
                        .with_label_values(&[FAILURE])
                        .inc();
                    if e.is_fatal() {
                        error!(
                            campaign_id,
                            recipient = %contact.email,
                            "Credential failure, aborting campaign: {}", e
                        );
                        run.finish(SendStatus::Failed);
                        return SendOutcome {
                            progress: run.progress,
                            credentials: Some(credentials),
                        };
                    }
                    warn!(
                        campaign_id,
                        recipient = %contact.email,
                        "Email failed: {}", e
                    );
                }
            }

            run.emit();

            if index + 1 < total {
                let delay = self.pacing.next_delay();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }

        info!(
            campaign_id,
            sent = run.progress.sent,
            failed = run.progress.failed,
            "Campaign completed"
        );
        run.finish(SendStatus::Completed);
        SendOutcome {
            progress: run.progress,
            credentials: Some(credentials),
        }
    }

    /// Checks preconditions. Returns usable credentials, or `None` after reporting failure.
    async fn prepare(
        &self,
        run: &mut Run<'_>,
        contacts: &[Contact],
        subject: &str,
        body_template: &str,
        credentials: Option<Credentials>,
    ) -> Option<Credentials> {
        if contacts.is_empty() {
            run.abort("No contacts to send to".into());
            return None;
        }
        if subject.trim().is_empty() {
            run.abort("Subject must not be empty".into());
            return None;
        }
        if body_template.trim().is_empty() {
            run.abort("Email body must not be empty".into());
            return None;
        }
        let mut credentials = match credentials {
            Some(credentials) => credentials,
            None => {
                run.abort("Gmail is not connected".into());
                return None;
            }
        };

        if !self.delivery.validate_credentials(&credentials).await {
            if let Err(e) = self.delivery.refresh_credentials(&mut credentials).await {
                run.abort(format!("Gmail credentials are no longer valid: {}", e));
                return None;
            }
        }
        Some(credentials)
    }
}
