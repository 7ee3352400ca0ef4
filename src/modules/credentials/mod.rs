// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use dashmap::DashMap;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::{raise_error, utc_now, validate_email};

/// OAuth credentials a user granted for sending through their Gmail account.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Mailbox the messages are sent from.
    pub identity_email: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"***")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "***"))
            .field("identity_email", &self.identity_email)
            .finish()
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct ConnectGmailRequest {
    #[oai(validator(min_length = 1))]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub identity_email: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct GmailConnectionStatus {
    pub connected: bool,
    pub identity_email: Option<String>,
    /// Whether the stored access token passed introspection. Absent when not connected.
    pub token_valid: Option<bool>,
    pub has_refresh_token: bool,
    pub connected_at: Option<i64>,
}

#[derive(Clone, Debug)]
struct StoredCredentials {
    credentials: Credentials,
    connected_at: i64,
}

/// Supplies the credentials a campaign sends with.
pub trait CredentialProvider: Send + Sync {
    fn credentials_for(&self, user_id: &str) -> Option<Credentials>;

    /// Persists tokens obtained by a refresh so later campaigns start with them.
    ///
    /// A refresh token is only replaced when the provider rotated it.
    fn update_credentials(&self, user_id: &str, refreshed: &Credentials);
}

#[derive(Default)]
pub struct CredentialStore {
    entries: DashMap<String, StoredCredentials>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(
        &self,
        user_id: &str,
        request: ConnectGmailRequest,
    ) -> RustCampaignResult<Credentials> {
        let identity_email = request.identity_email.trim().to_string();
        validate_email!(&identity_email)?;
        if request.access_token.trim().is_empty() {
            return Err(raise_error!(
                "Access token must not be empty".into(),
                ErrorCode::InvalidParameter
            ));
        }
        let credentials = Credentials {
            access_token: request.access_token,
            refresh_token: request.refresh_token.filter(|t| !t.trim().is_empty()),
            identity_email,
        };
        info!(
            user_id,
            identity_email = %credentials.identity_email,
            has_refresh_token = credentials.refresh_token.is_some(),
            "Gmail account connected"
        );
        self.entries.insert(
            user_id.to_string(),
            StoredCredentials {
                credentials: credentials.clone(),
                connected_at: utc_now!(),
            },
        );
        Ok(credentials)
    }

    pub fn get(&self, user_id: &str) -> RustCampaignResult<Credentials> {
        self.credentials_for(user_id).ok_or_else(|| {
            raise_error!(
                "Gmail is not connected. Connect a Gmail account before sending.".into(),
                ErrorCode::GmailNotConnected
            )
        })
    }

    pub fn connected_at(&self, user_id: &str) -> Option<i64> {
        self.entries.get(user_id).map(|e| e.connected_at)
    }

    pub fn disconnect(&self, user_id: &str) -> bool {
        let removed = self.entries.remove(user_id).is_some();
        if removed {
            info!(user_id, "Gmail account disconnected");
        }
        removed
    }
}

impl CredentialProvider for CredentialStore {
    fn credentials_for(&self, user_id: &str) -> Option<Credentials> {
        self.entries.get(user_id).map(|e| e.credentials.clone())
    }

    fn update_credentials(&self, user_id: &str, refreshed: &Credentials) {
        if let Some(mut entry) = self.entries.get_mut(user_id) {
            let stored = &mut entry.credentials;
            if stored.identity_email != refreshed.identity_email {
                return;
            }
            stored.access_token = refreshed.access_token.clone();
            if let Some(rotated) = &refreshed.refresh_token {
                stored.refresh_token = Some(rotated.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ConnectGmailRequest {
        ConnectGmailRequest {
            access_token: "ya29.token".into(),
            refresh_token: Some("1//refresh".into()),
            identity_email: "sender@example.com".into(),
        }
    }

    #[test]
    fn connect_update_and_disconnect() {
        let store = CredentialStore::new();
        assert_eq!(
            store.get("alice").unwrap_err().code(),
            ErrorCode::GmailNotConnected
        );

        store.connect("alice", request()).unwrap();
        let mut refreshed = store.get("alice").unwrap();
        refreshed.access_token = "ya29.fresh".into();
        store.update_credentials("alice", &refreshed);
        let credentials = store.get("alice").unwrap();
        assert_eq!(credentials.access_token, "ya29.fresh");
        assert_eq!(credentials.refresh_token.as_deref(), Some("1//refresh"));

        refreshed.refresh_token = Some("1//rotated".into());
        store.update_credentials("alice", &refreshed);
        assert_eq!(
            store.get("alice").unwrap().refresh_token.as_deref(),
            Some("1//rotated")
        );
        assert!(store.connected_at("alice").is_some());

        assert!(store.disconnect("alice"));
        assert!(!store.disconnect("alice"));
        assert!(store.credentials_for("alice").is_none());
    }

    #[test]
    fn refresh_for_a_replaced_account_is_ignored() {
        let store = CredentialStore::new();
        store.connect("alice", request()).unwrap();
        let mut stale = store.get("alice").unwrap();
        stale.access_token = "ya29.stale".into();
        stale.identity_email = "other@example.com".into();
        store.update_credentials("alice", &stale);
        assert_eq!(store.get("alice").unwrap().access_token, "ya29.token");
    }

    #[test]
    fn blank_refresh_token_is_dropped_and_bad_identity_rejected() {
        let store = CredentialStore::new();
        let mut req = request();
        req.refresh_token = Some("  ".into());
        assert!(store.connect("alice", req).unwrap().refresh_token.is_none());

        let mut req = request();
        req.identity_email = "not an email".into();
        assert!(store.connect("bob", req).is_err());
    }

    #[test]
    fn debug_output_hides_tokens() {
        let rendered = format!("{:?}", request_credentials());
        assert!(!rendered.contains("ya29"));
        assert!(rendered.contains("sender@example.com"));
    }

    fn request_credentials() -> Credentials {
        Credentials {
            access_token: "ya29.secret".into(),
            refresh_token: Some("1//secret".into()),
            identity_email: "sender@example.com".into(),
        }
    }
}
