// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::modules::common::signal::SIGNAL_MANAGER;
use crate::modules::context::{AppContext, RustCampaignTask};
use crate::modules::metrics::RUSTCAMPAIGN_TRACKED_CAMPAIGNS;
use crate::modules::scheduler::periodic::PeriodicTask;

const PRUNE_INTERVAL: Duration = Duration::from_secs(30);

/// Sweeps expired progress entries so abandoned campaigns do not pile up.
pub struct RegistryPruneTask;

impl RustCampaignTask for RegistryPruneTask {
    fn start(context: Arc<AppContext>) {
        let periodic_task = PeriodicTask::new("progress-registry-prune");

        let task = move || {
            let registry = context.registry.clone();
            async move {
                let removed = registry.prune();
                RUSTCAMPAIGN_TRACKED_CAMPAIGNS.set(registry.len() as i64);
                if removed > 0 {
                    debug!(removed, remaining = registry.len(), "Pruned progress entries");
                }
                Ok(())
            }
        };

        periodic_task.start(task, PRUNE_INTERVAL, false, false);
    }
}

/// Cancels campaigns still sending when the process is asked to stop.
pub struct ShutdownCancelTask;

impl RustCampaignTask for ShutdownCancelTask {
    fn start(context: Arc<AppContext>) {
        tokio::spawn(async move {
            SIGNAL_MANAGER.wait().await;
            let cancelled = context.campaigns.cancel_all();
            if cancelled > 0 {
                info!(cancelled, "Cancelled running campaigns on shutdown");
            }
        });
    }
}

pub struct PeriodicTasks;

impl PeriodicTasks {
    pub fn start_background_tasks(context: Arc<AppContext>) {
        RegistryPruneTask::start(context.clone());
        ShutdownCancelTask::start(context);
    }
}
