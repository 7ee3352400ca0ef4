// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use campaign::CampaignApi;
use contacts::ContactListApi;
use gmail::GmailApi;
use poem_openapi::{OpenApiService, Tags};

use crate::rustcampaign_version;

pub mod campaign;
pub mod contacts;
pub mod gmail;

#[derive(Tags)]
pub enum ApiTags {
    Gmail,
    ContactList,
    Campaign,
}

type RustCampaignOpenApi = (GmailApi, ContactListApi, CampaignApi);

pub fn create_openapi_service() -> OpenApiService<RustCampaignOpenApi, ()> {
    OpenApiService::new(
        (GmailApi, ContactListApi, CampaignApi),
        "RustCampaignApi",
        rustcampaign_version!(),
    )
}
