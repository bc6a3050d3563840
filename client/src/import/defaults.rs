//! Fields the create endpoints require but import files never carry.

use uuid::Uuid;

use crate::models::{EntityKind, Record};

/// Username derived from the e-mail local part.
pub fn username_from_email(email: &str) -> Option<String> {
    let local = email.trim().split('@').next()?.trim();
    if local.is_empty() {
        None
    } else {
        Some(local.to_lowercase())
    }
}

/// Random one-time password; the account owner resets it on first login.
pub fn temporary_password() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("Tmp#{}", &raw[..12])
}

/// Fill in `username`, `password` and `role` where the kind needs them and
/// the row left them blank. Values already present are never overwritten.
pub fn apply_defaults(kind: EntityKind, record: &mut Record) {
    let schema = kind.schema();

    if schema.needs_credentials {
        if !record.contains("username") {
            if let Some(username) = kind
                .resolve(record, "email")
                .as_deref()
                .and_then(username_from_email)
            {
                record.insert("username", username);
            }
        }
        if !record.contains("password") {
            record.insert("password", temporary_password());
        }
    }

    if let Some(role) = schema.default_role {
        if !record.contains("role") {
            record.insert("role", role);
        }
    }
}
