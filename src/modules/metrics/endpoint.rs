// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use poem::{
    http::{Method, StatusCode},
    Endpoint, Request, Response, Result,
};
use prometheus::{default_registry, Encoder, TextEncoder};

use crate::modules::context::AppContext;
use crate::modules::metrics::RUSTCAMPAIGN_TRACKED_CAMPAIGNS;

/// Prometheus text exposition of the default registry.
///
/// Gauges derived from live state are refreshed right before encoding.
pub struct PrometheusEndpoint;

impl Endpoint for PrometheusEndpoint {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        if req.method() != Method::GET && req.method() != Method::HEAD {
            return Ok(StatusCode::METHOD_NOT_ALLOWED.into());
        }
        if let Some(context) = req.data::<Arc<AppContext>>() {
            RUSTCAMPAIGN_TRACKED_CAMPAIGNS.set(context.registry.len() as i64);
        }
        let encoder = TextEncoder::new();
        let metric_families = default_registry().gather();
        let mut result = Vec::new();
        match encoder.encode(&metric_families, &mut result) {
            Ok(()) => Ok(Response::builder()
                .content_type(encoder.format_type())
                .body(result)),
            Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PrometheusEndpoint;
    use crate::modules::metrics::RUSTCAMPAIGN_EMAIL_SENT_TOTAL;
    use crate::modules::metrics::SUCCESS;
    use poem::http::StatusCode;
    use poem::test::TestClient;

    #[tokio::test]
    async fn exposes_campaign_metrics_over_get_only() {
        RUSTCAMPAIGN_EMAIL_SENT_TOTAL
            .with_label_values(&[SUCCESS])
            .inc();
        let client = TestClient::new(PrometheusEndpoint);

        let response = client.get("/").send().await;
        response.assert_status_is_ok();
        let text = response.0.into_body().into_string().await.unwrap();
        assert!(text.contains("rustcampaign_email_sent_total"));

        client
            .post("/")
            .send()
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
