// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use dashmap::DashMap;
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::{generate_token, raise_error, utc_now, validate_email};

/// One recipient. The address is its identity within a list.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct Contact {
    pub email: String,
    pub name: Option<String>,
    pub company: Option<String>,
    /// Any additional columns of the uploaded list, carried but not interpreted.
    #[serde(default)]
    #[oai(default)]
    pub extra: BTreeMap<String, String>,
}

impl Contact {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct ContactList {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub contacts: Vec<Contact>,
    pub contact_count: u32,
    /// Creation time, unix epoch milliseconds.
    pub created_at: i64,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct ContactListRequest {
    /// Display name of the list.
    #[oai(validator(min_length = 1, max_length = 256))]
    pub name: String,
    pub description: Option<String>,
    pub contacts: Vec<Contact>,
}

/// Summary used when listing, without the contacts themselves.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize, Object)]
pub struct ContactListSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub contact_count: u32,
    pub created_at: i64,
}

impl From<&ContactList> for ContactListSummary {
    fn from(list: &ContactList) -> Self {
        Self {
            id: list.id.clone(),
            name: list.name.clone(),
            description: list.description.clone(),
            contact_count: list.contact_count,
            created_at: list.created_at,
        }
    }
}

/// Checks every contact and normalizes whitespace around the address.
pub fn validate_contacts(contacts: Vec<Contact>) -> RustCampaignResult<Vec<Contact>> {
    if contacts.is_empty() {
        return Err(raise_error!(
            "Contact list must contain at least one contact".into(),
            ErrorCode::InvalidParameter
        ));
    }
    contacts
        .into_iter()
        .enumerate()
        .map(|(index, mut contact)| {
            contact.email = contact.email.trim().to_string();
            validate_email!(&contact.email).map_err(|_| {
                raise_error!(
                    format!(
                        "Contact #{} has an invalid email address: '{}'",
                        index, contact.email
                    ),
                    ErrorCode::InvalidParameter
                )
            })?;
            Ok(contact)
        })
        .collect()
}

#[derive(Default)]
pub struct ContactListStore {
    lists: DashMap<String, ContactList>,
}

impl ContactListStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &self,
        user_id: &str,
        request: ContactListRequest,
    ) -> RustCampaignResult<ContactList> {
        let contacts = validate_contacts(request.contacts)?;
        let list = ContactList {
            id: generate_token!(96),
            user_id: user_id.to_string(),
            name: request.name,
            description: request.description,
            contact_count: contacts.len() as u32,
            contacts,
            created_at: utc_now!(),
        };
        info!(
            user_id,
            list_id = %list.id,
            contact_count = list.contact_count,
            "Contact list created"
        );
        self.lists.insert(list.id.clone(), list.clone());
        Ok(list)
    }

    /// Lists are only visible to their owner.
    pub fn get(&self, user_id: &str, list_id: &str) -> RustCampaignResult<ContactList> {
        self.lists
            .get(list_id)
            .filter(|list| list.user_id == user_id)
            .map(|list| list.value().clone())
            .ok_or_else(|| {
                raise_error!(
                    format!("Contact list '{}' not found", list_id),
                    ErrorCode::ResourceNotFound
                )
            })
    }

    pub fn list(&self, user_id: &str) -> Vec<ContactListSummary> {
        let mut lists: Vec<ContactListSummary> = self
            .lists
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| ContactListSummary::from(entry.value()))
            .collect();
        lists.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        lists
    }

    pub fn delete(&self, user_id: &str, list_id: &str) -> RustCampaignResult<()> {
        self.lists
            .remove_if(list_id, |_, list| list.user_id == user_id)
            .map(|_| ())
            .ok_or_else(|| {
                raise_error!(
                    format!("Contact list '{}' not found", list_id),
                    ErrorCode::ResourceNotFound
                )
            })
    }
}
