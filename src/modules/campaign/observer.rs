// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::progress::SendProgress;

/// Receives every snapshot a campaign run emits, in send order.
///
/// Called inline from the send loop, so implementations must return quickly and
/// must not block.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, campaign_id: &str, progress: &SendProgress);
}

/// Adapts a closure into an observer.
pub struct CallbackObserver<F>(pub F);

impl<F> ProgressObserver for CallbackObserver<F>
where
    F: Fn(&str, &SendProgress) + Send + Sync,
{
    fn on_progress(&self, campaign_id: &str, progress: &SendProgress) {
        (self.0)(campaign_id, progress)
    }
}

impl ProgressObserver for mpsc::UnboundedSender<SendProgress> {
    fn on_progress(&self, _campaign_id: &str, progress: &SendProgress) {
        let _ = self.send(progress.clone());
    }
}

/// Keeps only the latest snapshot for watchers.
impl ProgressObserver for watch::Sender<SendProgress> {
    fn on_progress(&self, _campaign_id: &str, progress: &SendProgress) {
        self.send_replace(progress.clone());
    }
}

impl<T: ProgressObserver + ?Sized> ProgressObserver for Arc<T> {
    fn on_progress(&self, campaign_id: &str, progress: &SendProgress) {
        (**self).on_progress(campaign_id, progress)
    }
}

/// Forwards each snapshot to several observers in order.
#[derive(Default)]
pub struct Observers {
    inner: Vec<Arc<dyn ProgressObserver>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.inner.push(observer);
        self
    }
}

impl ProgressObserver for Observers {
    fn on_progress(&self, campaign_id: &str, progress: &SendProgress) {
        for observer in &self.inner {
            observer.on_progress(campaign_id, progress);
        }
    }
}
