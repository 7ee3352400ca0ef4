// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use crate::modules::contacts::Contact;

pub const DEFAULT_NAME: &str = "there";
pub const DEFAULT_COMPANY: &str = "your company";

/// Substitutes `{name}`, `{company}` and `{email}` in `template`.
///
/// Matching is literal and case-sensitive. Missing or blank fields fall back to
/// "there" and "your company"; every other `{...}` sequence is left as written.
pub fn personalize(template: &str, contact: &Contact) -> String {
    let name = non_blank(contact.name.as_deref()).unwrap_or(DEFAULT_NAME);
    let company = non_blank(contact.company.as_deref()).unwrap_or(DEFAULT_COMPANY);
    template
        .replace("{name}", name)
        .replace("{company}", company)
        .replace("{email}", &contact.email)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
