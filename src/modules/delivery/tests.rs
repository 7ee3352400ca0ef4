use std::sync::Arc;
use std::time::{Duration, Instant};

use http::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::gmail::{classify_failure, GmailClient};
use super::retry::{RetryPolicy, RetryStrategy};
use super::{DeliveryClient, DeliveryError};
use crate::modules::campaign::observer::Observers;
use crate::modules::campaign::orchestrator::{BulkSender, CampaignRequest, CancelHandle, Pacing};
use crate::modules::campaign::progress::SendStatus;
use crate::modules::composer::{Brand, Composer};
use crate::modules::contacts::Contact;
use crate::modules::credentials::Credentials;
use crate::modules::oauth2::flow::OAuth2Flow;
use crate::modules::quota::{DailyLimitPolicy, QuotaTracker};

const SEND_PATH: &str = "/gmail/v1/users/me/messages/send";

fn client_for(server: &MockServer) -> GmailClient {
    let oauth2 = OAuth2Flow::new(
        "client-id",
        "client-secret",
        &format!("{}/token", server.uri()),
        Duration::from_secs(5),
    );
    let retry = RetryPolicy {
        strategy: RetryStrategy::Exponential { base: 2 },
        max_retries: Some(3),
        base_delay: Duration::from_millis(5),
    };
    GmailClient::new(
        &server.uri(),
        &format!("{}/tokeninfo", server.uri()),
        oauth2,
        retry,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn credentials(refresh: Option<&str>) -> Credentials {
    Credentials {
        access_token: "stale-or-valid".into(),
        refresh_token: refresh.map(String::from),
        identity_email: "sender@example.com".into(),
    }
}

fn email() -> crate::modules::composer::OutgoingEmail {
    Composer::new(Brand {
        name: "RustCampaign".into(),
        tagline: "Tagline".into(),
    })
    .compose(
        "sender@example.com",
        &Contact::new("jo@acme.io").with_name("Jo"),
        "Hi {name}",
        "Hello {name}",
    )
}

fn rate_limit_body() -> serde_json::Value {
    json!({
        "error": {
            "code": 429,
            "message": "Too many concurrent requests for user",
            "errors": [{ "reason": "rateLimitExceeded" }]
        }
    })
}

#[tokio::test]
async fn successful_send_posts_raw_message_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Bearer stale-or-valid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(None);
    client.send(&mut creds, &email()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["raw"].as_str().is_some_and(|raw| !raw.is_empty()));
}

#[tokio::test]
async fn rate_limited_twice_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_body()))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .with_priority(2)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(None);
    let started = Instant::now();
    client.send(&mut creds, &email()).await.unwrap();
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
    // Two waits: 5ms then 10ms.
    assert!(started.elapsed() >= Duration::from_millis(15));
}

#[tokio::test]
async fn campaign_rides_out_rate_limits_on_a_single_contact() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "expires_in": "3000" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_body()))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .with_priority(2)
        .mount(&server)
        .await;

    let quota = Arc::new(QuotaTracker::new(DailyLimitPolicy::default()));
    let sender = BulkSender::new(
        quota.clone(),
        Arc::new(client_for(&server)),
        Composer::new(Brand {
            name: "RustCampaign".into(),
            tagline: "Tagline".into(),
        }),
        Pacing::none(),
    );
    let request = CampaignRequest {
        campaign_id: "rate-limited".into(),
        user_id: "alice".into(),
        subject: "Hi {name}".into(),
        body_template: "Hello {name}".into(),
        contacts: vec![Contact::new("jo@acme.io").with_name("Jo")],
        credentials: Some(credentials(None)),
    };

    let started = Instant::now();
    let outcome = sender
        .run(request, &Observers::new(), &CancelHandle::new())
        .await;
    assert!(started.elapsed() >= Duration::from_millis(15));
    assert_eq!(outcome.progress.status, SendStatus::Completed);
    assert_eq!(outcome.progress.sent, 1);
    assert_eq!(outcome.progress.failed, 0);
    assert!(outcome.progress.errors.is_empty());
    assert_eq!(quota.get_daily_stats("alice").emails_sent_today, 1);
}

#[tokio::test]
async fn rate_limit_gives_up_after_three_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(rate_limit_body()))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(None);
    let err = client.send(&mut creds, &email()).await.unwrap_err();
    assert!(err.is_rate_limit());
    assert!(!err.is_fatal());
    assert_eq!(err.to_string(), "rate limited by provider: Too many concurrent requests for user");
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn unauthorized_refreshes_token_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Bearer stale-or-valid"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "Invalid Credentials" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "token_type": "Bearer",
            "expires_in": 3599
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Bearer fresh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "m1" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(Some("refresh-token"));
    client.send(&mut creds, &email()).await.unwrap();
    assert_eq!(creds.access_token, "fresh-token");
    assert_eq!(creds.refresh_token.as_deref(), Some("refresh-token"));
}

#[tokio::test]
async fn unauthorized_without_refresh_token_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(None);
    let err = client.send(&mut creds, &email()).await.unwrap_err();
    assert!(matches!(err, DeliveryError::CredentialRefresh { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn failed_refresh_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(Some("revoked"));
    let err = client.send(&mut creds, &email()).await.unwrap_err();
    assert!(matches!(err, DeliveryError::CredentialRefresh { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn other_failures_are_rejections_with_provider_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid To header" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let mut creds = credentials(Some("refresh-token"));
    let err = client.send(&mut creds, &email()).await.unwrap_err();
    assert_eq!(
        err,
        DeliveryError::Rejected {
            status: 400,
            reason: "Invalid To header".into()
        }
    );
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn validate_credentials_uses_token_info() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .and(query_param("access_token", "stale-or-valid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "sender@example.com",
            "expires_in": "3000"
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tokeninfo"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_description": "Invalid Value"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(client.validate_credentials(&credentials(None)).await);

    let mut bad = credentials(None);
    bad.access_token = "garbage".into();
    assert!(!client.validate_credentials(&bad).await);
}

#[test]
fn forbidden_with_rate_limit_reason_is_retryable() {
    let body = json!({
        "error": {
            "code": 403,
            "message": "User-rate limit exceeded",
            "errors": [{ "reason": "userRateLimitExceeded" }]
        }
    })
    .to_string();
    assert!(classify_failure(StatusCode::FORBIDDEN, &body).is_rate_limit());

    let body = json!({
        "error": { "code": 403, "message": "Insufficient Permission", "errors": [{ "reason": "insufficientPermissions" }] }
    })
    .to_string();
    assert!(matches!(
        classify_failure(StatusCode::FORBIDDEN, &body),
        DeliveryError::Rejected { status: 403, .. }
    ));
}

#[test]
fn unparseable_error_body_falls_back_to_status_text() {
    let err = classify_failure(StatusCode::BAD_GATEWAY, "<html>oops</html>");
    assert_eq!(
        err,
        DeliveryError::Rejected {
            status: 502,
            reason: "HTTP 502 Bad Gateway".into()
        }
    );
}
