// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use crate::modules::common::auth::{ApiGuard, USER_HEADER};
use crate::modules::common::error::ErrorCapture;
use crate::modules::common::log::Tracing;
use crate::modules::common::signal::SIGNAL_MANAGER;
use crate::modules::common::timeout::{Timeout, TIMEOUT_HEADER};
use crate::modules::context::AppContext;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::handler::error_handler;
use crate::modules::error::RustCampaignResult;
use crate::modules::metrics::endpoint::PrometheusEndpoint;
use crate::modules::rest::public::status::get_status;
use crate::modules::settings::cli::SETTINGS;
use crate::raise_error;

use super::error::ApiErrorResponse;
use api::create_openapi_service;
use poem::get;
use poem::listener::TcpListener;
use poem::middleware::{CatchPanic, Compression};
use poem::{middleware::Cors, EndpointExt, Route, Server};

pub mod api;
pub mod public;
pub mod response;

pub type ApiResult<T, E = ApiErrorResponse> = std::result::Result<T, E>;

const DESCRIPTION: &str = r#"
    RustCampaign sends personalized email campaigns through each user's own Gmail account.

    - Contact lists are personalized per recipient and wrapped in a branded HTML shell.
    - A per-account daily ceiling is enforced across concurrent campaigns.
    - Progress of every run can be polled while it is tracked, and a running campaign can be cancelled.
"#;

pub async fn start_http_server(context: Arc<AppContext>) -> RustCampaignResult<()> {
    let listener = TcpListener::bind((
        SETTINGS.rustcampaign_bind_ip.clone(),
        SETTINGS.rustcampaign_http_port,
    ));

    let api_service = create_openapi_service()
        .description(DESCRIPTION)
        .summary("Bulk email campaigns over the Gmail API");

    let swagger = api_service.swagger_ui();
    let redoc = api_service.redoc();
    let spec_json = api_service.spec_endpoint();

    let open_api_route = Route::new()
        .nest_no_strip("/api/v1", api_service)
        .with(ApiGuard)
        .with(ErrorCapture)
        .with(Timeout)
        .with(Tracing);

    let mut cors_origins = SETTINGS.rustcampaign_cors_origins.clone();
    if cors_origins.is_empty() {
        cors_origins = ["*".to_string()].into_iter().collect();
    }

    let cors = Cors::new()
        .allow_origins(cors_origins)
        .allow_credentials(true)
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS", "HEAD"])
        .allow_headers(vec!["Content-Type", USER_HEADER, TIMEOUT_HEADER])
        .expose_headers(vec!["Accept"])
        .max_age(SETTINGS.rustcampaign_cors_max_age);

    let route = Route::new()
        .nest("/api-docs/swagger", swagger)
        .nest("/api-docs/redoc", redoc)
        .nest("/api-docs/spec.json", spec_json)
        .nest("/metrics", PrometheusEndpoint)
        .nest("/api/status", get(get_status))
        .nest_no_strip("/api/v1", open_api_route)
        .with(cors)
        .with_if(
            SETTINGS.rustcampaign_http_compression_enabled,
            Compression::new(),
        )
        .with(CatchPanic::new())
        .data(context);

    let server = Server::new(listener)
        .name("RustCampaign API Service")
        .idle_timeout(Duration::from_secs(60))
        .run_with_graceful_shutdown(
            route.catch_all_error(error_handler),
            SIGNAL_MANAGER.wait(),
            Some(Duration::from_secs(5)),
        );
    println!(
        "RustCampaign API Service is now running on port {}.",
        SETTINGS.rustcampaign_http_port
    );
    server
        .await
        .map_err(|e| raise_error!(format!("{:#?}", e), ErrorCode::InternalError))
}
