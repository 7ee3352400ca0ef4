// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use scraper::{Html, Selector};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Brand {
    pub name: String,
    pub tagline: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WrappedEmail {
    pub subject: String,
    pub html: String,
}

pub fn is_html_document(body: &str) -> bool {
    let head: String = body
        .trim_start()
        .chars()
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Places `body` inside the branded layout unless it is already a full document.
///
/// The body is trusted markup and is inserted without escaping; newlines become `<br>`.
pub fn wrap_as_email(brand: &Brand, subject: &str, body: &str) -> WrappedEmail {
    if is_html_document(body) {
        return WrappedEmail {
            subject: subject.to_string(),
            html: body.to_string(),
        };
    }

    let content = body.replace("\r\n", "\n").replace('\n', "<br>");
    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{subject}</title>
</head>
<body style="margin: 0; padding: 0; background-color: #f4f4f4; font-family: Arial, Helvetica, sans-serif;">
    <table cellpadding="0" cellspacing="0" border="0" width="100%" style="background-color: #f4f4f4; padding: 20px;">
        <tr>
            <td align="center">
                <table cellpadding="0" cellspacing="0" border="0" width="600" style="max-width: 600px; background-color: #ffffff; border-radius: 8px;">
                    <tr>
                        <td style="background-color: #4f46e5; padding: 30px; text-align: center; border-radius: 8px 8px 0 0;">
                            <h1 style="color: #ffffff; margin: 0; font-size: 28px;">{brand}</h1>
                            <p style="color: #ffffff; margin: 10px 0 0 0; font-size: 16px;">{tagline}</p>
                        </td>
                    </tr>
                    <tr>
                        <td style="padding: 40px 30px;">
                            <div style="color: #333333; line-height: 1.6; font-size: 16px;">
                                {content}
                            </div>
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color: #f8f9fa; padding: 30px; text-align: center; border-radius: 0 0 8px 8px; border-top: 1px solid #e9ecef;">
                            <p style="color: #6c757d; margin: 0; font-size: 14px;">Sent by <strong>{brand}</strong></p>
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#,
        subject = subject,
        brand = brand.name,
        tagline = brand.tagline,
        content = content,
    );

    WrappedEmail {
        subject: subject.to_string(),
        html,
    }
}

/// Readable text rendition of an HTML body for the plain alternative part.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }
    let prepared = html
        .replace("<br>", "<br>\n")
        .replace("<br/>", "<br/>\n")
        .replace("<br />", "<br />\n");
    let document = Html::parse_document(&prepared);
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    root.text()
        .flat_map(|chunk| chunk.lines())
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
