// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::error::{code::ErrorCode, ApiError, ApiErrorResponse, RustCampaignError};
use poem::{IntoResponse, Response};
use poem_openapi::payload::Json;

/// Error code for framework errors raised before a handler ran.
fn classify(error: &poem::Error) -> Option<ErrorCode> {
    // Routing
    if error.is::<poem::error::NotFoundError>() {
        return Some(ErrorCode::ResourceNotFound);
    }
    if error.is::<poem::error::MethodNotAllowedError>() {
        return Some(ErrorCode::MethodNotAllowed);
    }
    // Request decoding: path ids, JSON bodies, the identity header
    if error.is::<poem::error::ParsePathError>()
        || error.is::<poem::error::ParseQueryError>()
        || error.is::<poem::error::ParseJsonError>()
        || error.is::<poem::error::ParseTypedHeaderError>()
        || error.is::<poem::error::ReadBodyError>()
        || error.is::<poem_openapi::error::ParseRequestPayloadError>()
        || error.is::<poem_openapi::error::ContentTypeError>()
        || error.is::<poem_openapi::error::ParseParamError>()
        || error.is::<poem_openapi::error::ParsePathError>()
    {
        return Some(ErrorCode::InvalidParameter);
    }
    if error.is::<poem_openapi::error::AuthorizationError>() {
        return Some(ErrorCode::PermissionDenied);
    }
    None
}

fn api_error_response(error: &poem::Error, code: ErrorCode) -> Response {
    let api_error = ApiError::new_with_error_code(error.to_string(), code as u32);
    let mut response = ApiErrorResponse::Generic(code.status(), Json(api_error)).into_response();
    // Keep the status poem chose, e.g. 415 for a wrong content type.
    response.set_status(error.status());
    response
}

pub async fn error_handler(error: poem::Error) -> impl poem::IntoResponse {
    // Already carries `{code, message}`.
    if error.is::<RustCampaignError>() {
        return error.into_response();
    }

    if let Some(code) = classify(&error) {
        return api_error_response(&error, code);
    }

    if error.has_source() {
        api_error_response(&error, ErrorCode::UnhandledPoemError)
    } else {
        error.into_response()
    }
}
