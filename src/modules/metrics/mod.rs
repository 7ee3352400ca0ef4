use std::sync::LazyLock;

use crate::rustcampaign_version;
use crate::{
    modules::{context::Initialize, error::RustCampaignResult},
    utc_now,
};
use prometheus::{
    register_gauge, register_gauge_vec, register_histogram_vec, register_int_counter_vec,
    register_int_gauge, Gauge, GaugeVec, HistogramVec, IntCounterVec, IntGauge,
};

pub mod endpoint;

pub const SUCCESS: &str = "success";
pub const FAILURE: &str = "failure";
pub const LIMITED: &str = "limit_reached";

// Metric name constants
pub const METRIC_REQUEST_DURATION_BY_STATUS: &str =
    "rustcampaign_request_duration_seconds_by_status";
pub const METRIC_REQUEST_DURATION_BY_METHOD_AND_OPERATION: &str =
    "rustcampaign_request_duration_seconds_by_method_and_operation";
pub const METRIC_REQUEST_TOTAL_BY_METHOD_AND_OPERATION: &str =
    "rustcampaign_request_total_by_method_and_operation";
pub const METRIC_EMAIL_SENT_TOTAL: &str = "rustcampaign_email_sent_total";
pub const METRIC_EMAIL_SEND_DURATION_SECONDS: &str = "rustcampaign_email_send_duration_seconds";
pub const METRIC_CAMPAIGNS_TOTAL: &str = "rustcampaign_campaigns_total";
pub const METRIC_TRACKED_CAMPAIGNS: &str = "rustcampaign_tracked_campaigns";
pub const METRIC_BUILD_INFO: &str = "rustcampaign_build_info";
pub const METRIC_START_TIMESTAMP: &str = "rustcampaign_start_timestamp";

pub static RUSTCAMPAIGN_BUILD_INFO: LazyLock<GaugeVec> = LazyLock::new(|| {
    register_gauge_vec!(
        METRIC_BUILD_INFO,
        "Build information including version and commit hash",
        &["version", "commit"]
    )
    .expect("Failed to register rustcampaign_build_info")
});

pub static RUSTCAMPAIGN_START_TIMESTAMP: LazyLock<Gauge> = LazyLock::new(|| {
    register_gauge!(
        METRIC_START_TIMESTAMP,
        "Unix timestamp when RustCampaign started"
    )
    .expect("Failed to register rustcampaign_start_timestamp")
});

pub static RUSTCAMPAIGN_REQUEST_DURATION_BY_STATUS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec!(
        METRIC_REQUEST_DURATION_BY_STATUS,
        "Distribution of HTTP request durations, measured in seconds, grouped by response status code",
        &["status"]
    )
    .expect("Failed to register request_duration_seconds_by_status")
});

pub static RUSTCAMPAIGN_REQUEST_DURATION_BY_METHOD_AND_OPERATION: LazyLock<HistogramVec> =
    LazyLock::new(|| {
        register_histogram_vec!(
            METRIC_REQUEST_DURATION_BY_METHOD_AND_OPERATION,
            "Distribution of HTTP request durations, measured in seconds, grouped by method, operation ID, and status code",
            &["method", "operation", "status"]
        )
        .expect("Failed to register request_duration_seconds_by_method_and_operation")
    });

pub static RUSTCAMPAIGN_REQUEST_TOTAL_BY_METHOD_AND_OPERATION: LazyLock<IntCounterVec> =
    LazyLock::new(|| {
        register_int_counter_vec!(
            METRIC_REQUEST_TOTAL_BY_METHOD_AND_OPERATION,
            "Total number of HTTP requests, grouped by method, operation ID, and status code",
            &["method", "operation", "status"]
        )
        .expect("Failed to register request_total_by_method_and_operation")
    });

/// Per-recipient outcomes: `success`, `failure` or `limit_reached`.
pub static RUSTCAMPAIGN_EMAIL_SENT_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        METRIC_EMAIL_SENT_TOTAL,
        "Total number of campaign emails by outcome",
        &["outcome"]
    )
    .expect("Failed to register rustcampaign_email_sent_total")
});

pub static RUSTCAMPAIGN_EMAIL_SEND_DURATION_SECONDS: LazyLock<HistogramVec> =
    LazyLock::new(|| {
        register_histogram_vec!(
            METRIC_EMAIL_SEND_DURATION_SECONDS,
            "Time spent delivering one email through the Gmail API, retries included",
            &["outcome"]
        )
        .expect("Failed to register rustcampaign_email_send_duration_seconds")
    });

pub static RUSTCAMPAIGN_CAMPAIGNS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec!(
        METRIC_CAMPAIGNS_TOTAL,
        "Total number of finished campaign runs by terminal status",
        &["status"]
    )
    .expect("Failed to register rustcampaign_campaigns_total")
});

pub static RUSTCAMPAIGN_TRACKED_CAMPAIGNS: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge!(
        METRIC_TRACKED_CAMPAIGNS,
        "Campaign progress entries currently held in memory"
    )
    .expect("Failed to register rustcampaign_tracked_campaigns")
});

pub struct MetricsService;

impl Initialize for MetricsService {
    async fn initialize() -> RustCampaignResult<()> {
        let now = utc_now!();
        RUSTCAMPAIGN_START_TIMESTAMP.set((now / 1000) as f64);
        let version = rustcampaign_version!();
        let commit = env!("GIT_HASH");
        RUSTCAMPAIGN_BUILD_INFO
            .with_label_values(&[version, commit])
            .set(1.0);
        Ok(())
    }
}
