// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use crate::modules::common::auth::UserContext;
use crate::modules::contacts::{ContactList, ContactListRequest, ContactListSummary};
use crate::modules::context::AppContext;
use crate::modules::rest::api::ApiTags;
use crate::modules::rest::ApiResult;
use poem::web::Data;
use poem_openapi::param::Path;
use poem_openapi::payload::Json;
use poem_openapi::OpenApi;

pub struct ContactListApi;

#[OpenApi(prefix_path = "/api/v1", tag = "ApiTags::ContactList")]
impl ContactListApi {
    /// Create a contact list
    #[oai(path = "/contact-lists", method = "post", operation_id = "create_contact_list")]
    async fn create_contact_list(
        &self,
        payload: Json<ContactListRequest>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<ContactList>> {
        Ok(Json(app.contacts.create(&context.user_id, payload.0)?))
    }

    /// List the caller's contact lists, newest first
    #[oai(path = "/contact-lists", method = "get", operation_id = "list_contact_lists")]
    async fn list_contact_lists(
        &self,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<Vec<ContactListSummary>>> {
        Ok(Json(app.contacts.list(&context.user_id)))
    }

    /// Get a contact list with all of its contacts
    #[oai(path = "/contact-lists/:list_id", method = "get", operation_id = "get_contact_list")]
    async fn get_contact_list(
        &self,
        /// The contact list ID
        list_id: Path<String>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<Json<ContactList>> {
        Ok(Json(app.contacts.get(&context.user_id, &list_id.0)?))
    }

    /// Delete a contact list
    #[oai(
        path = "/contact-lists/:list_id",
        method = "delete",
        operation_id = "delete_contact_list"
    )]
    async fn delete_contact_list(
        &self,
        /// The contact list ID
        list_id: Path<String>,
        context: UserContext,
        app: Data<&Arc<AppContext>>,
    ) -> ApiResult<()> {
        Ok(app.contacts.delete(&context.user_id, &list_id.0)?)
    }
}
