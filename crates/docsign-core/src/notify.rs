//! Notification policy and mail composition
//!
//! Messages are composed here and delivered by the caller's transport, so
//! every delivery failure surfaces as a `Result` at the call site.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::{Contact, Document, UserDetails};

/// A person a mail is addressed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub name: String,
    pub email: String,
}

impl From<&UserDetails> for Recipient {
    fn from(user: &UserDetails) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

impl From<&Contact> for Recipient {
    fn from(contact: &Contact) -> Self {
        Self {
            name: contact.name.clone(),
            email: contact.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn pdf(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: "application/pdf".to_string(),
            bytes,
        }
    }
}

/// A composed mail ready for a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: Vec<Recipient>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

/// Whether the creator hears about a non-final signature
///
/// Remaining is counted against the placeholders, and the creator is only
/// told while more than one signature is still outstanding.
pub fn should_notify_progress(placeholder_count: usize, signed_count: usize) -> bool {
    placeholder_count as i64 - signed_count as i64 > 1
}

/// Signers followed by the creator, deduplicated by case-insensitive email
pub fn completion_recipients(signers: &[Contact], creator: &UserDetails) -> Vec<Recipient> {
    let mut seen = HashSet::new();
    signers
        .iter()
        .map(Recipient::from)
        .chain(std::iter::once(Recipient::from(creator)))
        .filter(|r| seen.insert(r.email.trim().to_lowercase()))
        .collect()
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%B %d, %Y at %I:%M %p UTC").to_string()
}

/// Minimal HTML escaping for values interpolated into mail bodies
fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a body fragment in the shared mail layout
fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
</head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <div style="background: linear-gradient(135deg, #1d3a73 0%, #142a55 100%); color: white; padding: 30px; border-radius: 8px 8px 0 0; text-align: center;">
        <h1 style="margin: 0; font-size: 24px;">{title}</h1>
    </div>

    <div style="background: #ffffff; padding: 30px; border: 1px solid #e5e7eb; border-top: none; border-radius: 0 0 8px 8px;">
{body}
    </div>

    <div style="text-align: center; margin-top: 20px; font-size: 12px; color: #9ca3af;">
        <p>Sent via QuickCash - Secure Document Signing</p>
    </div>
</body>
</html>"#,
        title = title,
        body = body,
    )
}

fn detail_box(label: &str, value: &str) -> String {
    format!(
        r#"        <div style="background: #f9fafb; padding: 15px; border-radius: 6px; margin-bottom: 25px;">
            <p style="margin: 0; font-size: 14px; color: #6b7280;">{label}</p>
            <p style="margin: 5px 0 0 0; font-size: 16px; font-weight: 600;">{value}</p>
        </div>
"#,
        label = label,
        value = escape_html(value),
    )
}

/// Mail to the creator after a non-final signature
pub fn progress_email(
    document: &Document,
    signer: &UserDetails,
    signed_at: DateTime<Utc>,
    remaining: usize,
) -> MailMessage {
    let mut body = format!(
        r#"        <p style="font-size: 16px; margin-bottom: 20px;">
            <strong>{signer}</strong> has signed your document.
        </p>
"#,
        signer = escape_html(&signer.name),
    );
    body.push_str(&detail_box("Document Name", &document.name));
    body.push_str(&detail_box("Signed At", &format_timestamp(signed_at)));
    body.push_str(&detail_box("Signatures Remaining", &remaining.to_string()));

    MailMessage {
        to: vec![Recipient::from(&document.created_by)],
        subject: format!("{} has signed {}", signer.name, document.name),
        html: layout("Document Signed", &body),
        attachments: Vec::new(),
    }
}

/// Mail to everyone once all signatures are in
pub fn completion_email(
    document: &Document,
    recipients: Vec<Recipient>,
    signed_pdf: Attachment,
    certificate: Attachment,
) -> MailMessage {
    let signers: Vec<String> = crate::audit::signed_entries(&document.audit_trail)
        .map(|entry| {
            let time = entry
                .signed_on
                .map(format_timestamp)
                .unwrap_or_else(|| "Unknown".to_string());
            format!(
                "<li style=\"margin: 10px 0;\"><strong>{}</strong> - {}</li>",
                escape_html(&entry.user_details.name),
                time
            )
        })
        .collect();

    let mut body = String::from(
        r#"        <p style="font-size: 16px; margin-bottom: 20px;">
            All parties have signed. The signed document and its Certificate of Completion are attached.
        </p>
"#,
    );
    body.push_str(&detail_box("Document Name", &document.name));
    body.push_str(&format!(
        r#"        <div style="background: #f9fafb; padding: 15px; border-radius: 6px; margin-bottom: 25px;">
            <p style="margin: 0 0 10px 0; font-size: 14px; color: #6b7280;">Signers</p>
            <ul style="margin: 0; padding-left: 20px; list-style-type: none;">
                {}
            </ul>
        </div>
"#,
        signers.join("\n                ")
    ));

    MailMessage {
        to: recipients,
        subject: format!("Document completed: {}", document.name),
        html: layout("All Parties Have Signed", &body),
        attachments: vec![signed_pdf, certificate],
    }
}

/// Copy of a signed document for arbitrary recipients
///
/// The certificate is attached only when one has been generated.
pub fn forward_email(
    document: &Document,
    sender: &UserDetails,
    recipients: Vec<Recipient>,
    signed_pdf: Attachment,
    certificate: Option<Attachment>,
) -> MailMessage {
    let mut body = format!(
        r#"        <p style="font-size: 16px; margin-bottom: 20px;">
            <strong>{sender}</strong> shared a signed document with you.
        </p>
"#,
        sender = escape_html(&sender.display_identity()),
    );
    body.push_str(&detail_box("Document Name", &document.name));

    let mut attachments = vec![signed_pdf];
    attachments.extend(certificate);

    MailMessage {
        to: recipients,
        subject: format!("{} shared {}", sender.name, document.name),
        html: layout("Signed Document", &body),
        attachments,
    }
}
