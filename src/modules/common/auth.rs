// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::code::ErrorCode;
use poem::{Endpoint, FromRequest, Middleware, Request, RequestBody, Result};
use std::sync::Arc;

use super::create_api_error_response;

/// Header carrying the already-authenticated user identity.
///
/// Authentication itself happens upstream (reverse proxy or gateway); the service
/// only trusts the header and uses it to scope credentials, quota and campaigns.
pub const USER_HEADER: &str = "X-RustCampaign-User";

pub struct ApiGuard;

pub struct ApiGuardEndpoint<E> {
    ep: E,
}

impl<E: Endpoint> Middleware<E> for ApiGuard {
    type Output = ApiGuardEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        ApiGuardEndpoint { ep }
    }
}

impl<E: Endpoint> Endpoint for ApiGuardEndpoint<E> {
    type Output = E::Output;

    async fn call(&self, mut req: Request) -> Result<Self::Output> {
        let context = extract_user_context(&req)?;
        req.set_data(Arc::new(context));
        self.ep.call(req).await
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserContext {
    pub user_id: String,
}

impl<'a> FromRequest<'a> for UserContext {
    async fn from_request(req: &'a Request, _body: &mut RequestBody) -> Result<Self> {
        match req.data::<Arc<UserContext>>() {
            Some(context) => Ok(context.as_ref().clone()),
            None => extract_user_context(req),
        }
    }
}

pub fn extract_user_context(req: &Request) -> Result<UserContext> {
    let user_id = req
        .header(USER_HEADER)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            create_api_error_response(
                &format!("Missing the {} header", USER_HEADER),
                ErrorCode::PermissionDenied,
            )
        })?;

    if user_id.len() > 256 {
        return Err(create_api_error_response(
            "User identifier is too long",
            ErrorCode::InvalidParameter,
        ));
    }

    Ok(UserContext {
        user_id: user_id.to_string(),
    })
}
