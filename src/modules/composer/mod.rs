// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use std::borrow::Cow;

use mail_send::mail_builder::{headers::address::Address, MessageBuilder};

use crate::modules::contacts::Contact;
use crate::modules::error::code::ErrorCode;
use crate::modules::error::RustCampaignResult;
use crate::modules::settings::cli::SETTINGS;
use crate::{base64_encode_url_safe_no_pad, generate_token, raise_error, utc_now};

pub use personalize::personalize;
pub use shell::{html_to_text, is_html_document, wrap_as_email, Brand, WrappedEmail};

pub mod personalize;
pub mod shell;

/// A fully personalized message for one recipient, ready for a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl OutgoingEmail {
    /// RFC 5322 message with a multipart/alternative body (plain text first, then HTML).
    pub fn to_mime(&self) -> RustCampaignResult<Vec<u8>> {
        let to = Address::new_address(
            self.to_name.as_ref().map(|n| Cow::Owned(n.clone())),
            Cow::Owned(self.to.clone()),
        );
        let from = Address::new_address(None::<Cow<'_, str>>, Cow::Owned(self.from.clone()));
        MessageBuilder::new()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .message_id(generate_message_id())
            .text_body(self.text.clone())
            .html_body(self.html.clone())
            .write_to_vec()
            .map_err(|e| {
                raise_error!(
                    format!("Failed to build MIME message for {}: {:#?}", self.to, e),
                    ErrorCode::MessageBuildFailed
                )
            })
    }

    /// The `raw` field of a Gmail `users.messages.send` request.
    pub fn to_gmail_raw(&self) -> RustCampaignResult<String> {
        let mime = self.to_mime()?;
        Ok(base64_encode_url_safe_no_pad!(&mime))
    }
}

fn generate_message_id() -> String {
    format!("{}.{}@rustcampaign", utc_now!(), generate_token!(96))
}

/// Turns a campaign template into per-recipient messages.
#[derive(Clone, Debug)]
pub struct Composer {
    brand: Brand,
}

impl Composer {
    pub fn new(brand: Brand) -> Self {
        Self { brand }
    }

    pub fn from_settings() -> Self {
        Self::new(Brand {
            name: SETTINGS.rustcampaign_brand_name.clone(),
            tagline: SETTINGS.rustcampaign_brand_tagline.clone(),
        })
    }

    pub fn brand(&self) -> &Brand {
        &self.brand
    }

    pub fn compose(
        &self,
        sender: &str,
        contact: &Contact,
        subject_template: &str,
        body_template: &str,
    ) -> OutgoingEmail {
        let subject = personalize(subject_template, contact);
        let body = personalize(body_template, contact);
        let wrapped = wrap_as_email(&self.brand, &subject, &body);
        let text = html_to_text(&body);
        OutgoingEmail {
            from: sender.to_string(),
            to: contact.email.clone(),
            to_name: contact.name.clone().filter(|n| !n.trim().is_empty()),
            subject: wrapped.subject,
            html: wrapped.html,
            text,
        }
    }
}
