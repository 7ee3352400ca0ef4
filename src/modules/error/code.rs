// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use poem::http::StatusCode;
use poem_openapi::Enum;

#[derive(Copy, Clone, Debug, Enum, Eq, PartialEq)]
#[repr(u32)]
pub enum ErrorCode {
    // Client-side errors (10000–10999)
    InvalidParameter = 10000,
    MissingConfiguration = 10020,
    ExceedsLimitation = 10040,
    RequestTimeout = 10080,
    MethodNotAllowed = 10090,

    // Authentication and authorization errors (20000–20999)
    PermissionDenied = 20000,
    GmailNotConnected = 20050,
    MissingRefreshToken = 20060,
    CredentialRefreshFailed = 20070,

    // Resource errors (30000–30999)
    ResourceNotFound = 30000,
    AlreadyExists = 30010,
    TooManyRequest = 30020,

    // Network connection errors (40000–40999)
    NetworkError = 40000,
    ConnectionTimeout = 40010,
    HttpResponseError = 40030,

    // Mail service errors (50000–50999)
    MessageBuildFailed = 50030,
    GmailApiCallFailed = 50070,
    GmailRateLimited = 50090,

    // Internal system errors (70000–70999)
    InternalError = 70000,
    UnhandledPoemError = 70010,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::InvalidParameter
            | ErrorCode::MissingConfiguration
            | ErrorCode::ExceedsLimitation
            | ErrorCode::GmailNotConnected => StatusCode::BAD_REQUEST,
            ErrorCode::PermissionDenied
            | ErrorCode::MissingRefreshToken
            | ErrorCode::CredentialRefreshFailed => StatusCode::UNAUTHORIZED,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ErrorCode::AlreadyExists => StatusCode::CONFLICT,
            ErrorCode::TooManyRequest | ErrorCode::GmailRateLimited => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ErrorCode::InternalError
            | ErrorCode::MessageBuildFailed
            | ErrorCode::GmailApiCallFailed
            | ErrorCode::HttpResponseError
            | ErrorCode::NetworkError
            | ErrorCode::ConnectionTimeout
            | ErrorCode::UnhandledPoemError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorCode;
    use poem::http::StatusCode;

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(ErrorCode::InvalidParameter.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::GmailNotConnected.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn codes_keep_their_numeric_ranges() {
        assert_eq!(ErrorCode::InvalidParameter as u32, 10000);
        assert_eq!(ErrorCode::ResourceNotFound as u32, 30000);
        assert_eq!(ErrorCode::GmailRateLimited as u32, 50090);
        assert_eq!(
            ErrorCode::GmailRateLimited.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }
}
