// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem::{Endpoint, IntoResponse, Middleware, Request, Response, Result};
use tracing::debug;

use crate::modules::common::auth::USER_HEADER;
use crate::modules::error::handler::error_handler;

/// Turns every error escaping the API routes into the uniform `{code, message}` payload.
pub struct ErrorCapture;

pub struct ErrorCaptureEndpoint<E> {
    ep: E,
}

impl<E: Endpoint> Middleware<E> for ErrorCapture {
    type Output = ErrorCaptureEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        ErrorCaptureEndpoint { ep }
    }
}

impl<E: Endpoint> Endpoint for ErrorCaptureEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> Result<Self::Output> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let user = req.header(USER_HEADER).map(str::to_string);
        match self.ep.call(req).await {
            Ok(response) => Ok(response.into_response()),
            Err(error) => {
                debug!(
                    %method,
                    path,
                    user = user.as_deref().unwrap_or("-"),
                    status = error.status().as_u16(),
                    "API request failed: {}", error
                );
                Ok(error_handler(error).await.into_response())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCapture;
    use crate::modules::common::auth::{ApiGuard, USER_HEADER};
    use poem::http::StatusCode;
    use poem::test::TestClient;
    use poem::{handler, EndpointExt, Route};

    #[handler]
    fn hello() -> &'static str {
        "hello"
    }

    #[tokio::test]
    async fn missing_user_header_is_reported_as_json() {
        let app = Route::new()
            .at("/hello", poem::get(hello))
            .with(ApiGuard)
            .with(ErrorCapture);
        let client = TestClient::new(app);

        let response = client.get("/hello").send().await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let json = response.json().await;
        json.value().object().get("code").assert_i64(20000);

        let response = client.get("/hello").header(USER_HEADER, "alice").send().await;
        response.assert_status_is_ok();
        response.assert_text("hello").await;
    }
}
