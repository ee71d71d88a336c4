//! Outgoing message envelope construction
//!
//! Builds the minimal RFC 822 envelope the Gmail API expects in the
//! `raw` field of send and draft requests.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::gmail::types::OutgoingEmail;

/// Subject used when the caller does not provide one
const SUBJECT_PLACEHOLDER: &str = "No Subject";

/// Encode text for a MIME header (RFC 2047, base64 variant).
///
/// ASCII text passes through untouched.
pub fn encode_mime_header(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && c != '\r' && c != '\n') {
        return text.to_string();
    }

    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Build the RFC 822 envelope for an outgoing email.
///
/// Recipients are comma-joined, the subject falls back to a placeholder,
/// and the content type follows the explicit HTML flag. A reply adds both
/// `In-Reply-To` and `References` citing the replied-to identifier.
pub fn build_envelope(email: &OutgoingEmail) -> String {
    let mut lines = Vec::new();

    lines.push("From: me".to_string());
    lines.push(format!("To: {}", email.to.join(", ")));

    if let Some(cc) = &email.cc {
        if !cc.is_empty() {
            lines.push(format!("Cc: {}", cc.join(", ")));
        }
    }

    if let Some(bcc) = &email.bcc {
        if !bcc.is_empty() {
            lines.push(format!("Bcc: {}", bcc.join(", ")));
        }
    }

    let subject = email.subject.as_deref().unwrap_or(SUBJECT_PLACEHOLDER);
    lines.push(format!("Subject: {}", encode_mime_header(subject)));

    if let Some(in_reply_to) = &email.in_reply_to {
        lines.push(format!("In-Reply-To: {}", in_reply_to));
        lines.push(format!("References: {}", in_reply_to));
    }

    lines.push("MIME-Version: 1.0".to_string());

    if email.html.unwrap_or(false) {
        lines.push("Content-Type: text/html; charset=utf-8".to_string());
    } else {
        lines.push("Content-Type: text/plain; charset=utf-8".to_string());
    }

    lines.push(String::new());
    lines.push(email.body.clone());

    lines.join("\r\n")
}

/// Encode an envelope for the Gmail API wire format (base64url, no padding).
pub fn encode_envelope(envelope: &str) -> String {
    URL_SAFE_NO_PAD.encode(envelope.as_bytes())
}
