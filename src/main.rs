use mimalloc::MiMalloc;
use modules::{
    context::{AppContext, Initialize},
    error::RustCampaignResult,
    logger,
    rest::start_http_server,
    settings::cli::SETTINGS,
    tasks::PeriodicTasks,
};
use std::sync::Arc;
use tracing::{error, info};

use crate::modules::{common::signal::SignalManager, metrics::MetricsService};

mod modules;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

static LOGO: &str = r#"
  ____            _    ____                                  _
 |  _ \ _   _ ___| |_ / ___|__ _ _ __ ___  _ __   __ _(_) __ _ _ __
 | |_) | | | / __| __| |   / _` | '_ ` _ \| '_ \ / _` | |/ _` | '_ \
 |  _ <| |_| \__ \ |_| |__| (_| | | | | | | |_) | (_| | | (_| | | | |
 |_| \_\\__,_|___/\__|\____\__,_|_| |_| |_| .__/ \__,_|_|\__, |_| |_|
                                          |_|            |___/
"#;

#[tokio::main]
async fn main() -> RustCampaignResult<()> {
    logger::initialize_logging();
    info!("{}", LOGO);
    info!("Starting rustcampaign-server");
    info!("Version:  {}", rustcampaign_version!());
    info!("Git:      [{}]", env!("GIT_HASH"));

    let context = match initialize().await {
        Ok(context) => context,
        Err(error) => {
            eprintln!("{:?}", error);
            return Err(error);
        }
    };

    info!(
        free_daily_limit = SETTINGS.rustcampaign_free_daily_limit,
        organization_daily_limit = SETTINGS.rustcampaign_organization_daily_limit,
        "Daily sending limits loaded"
    );

    if let Err(e) = start_http_server(context).await {
        error!("Failed to start REST server: {}", e);
        return Err(e);
    }
    info!("RustCampaign stopped");
    Ok(())
}

/// Initialize shared services and start background tasks.
async fn initialize() -> RustCampaignResult<Arc<AppContext>> {
    SignalManager::initialize().await?;
    MetricsService::initialize().await?;
    let context = AppContext::from_settings()?;
    PeriodicTasks::start_background_tasks(context.clone());
    Ok(context)
}
