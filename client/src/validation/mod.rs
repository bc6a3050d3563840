//! Row validation for imports.
//!
//! Checks required fields and the value formats declared in the registry.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::models::{EntityKind, FieldFormat, Record};

static EMAIL_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

static TIME_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(:\d{2})?$").ok());

fn is_match(re: &Lazy<Option<Regex>>, value: &str) -> bool {
    Lazy::force(re).as_ref().is_some_and(|re| re.is_match(value))
}

pub fn is_valid_email(value: &str) -> bool {
    is_match(&EMAIL_RE, value.trim())
}

pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
}

pub fn is_valid_time(value: &str) -> bool {
    let value = value.trim();
    is_match(&TIME_RE, value)
        && (NaiveTime::parse_from_str(value, "%H:%M").is_ok()
            || NaiveTime::parse_from_str(value, "%H:%M:%S").is_ok())
}

fn check_format(field: &str, value: &str, format: FieldFormat) -> Result<(), ValidationError> {
    let (ok, message) = match format {
        FieldFormat::Email => (is_valid_email(value), "invalid email"),
        FieldFormat::Date => (is_valid_date(value), "expected YYYY-MM-DD"),
        FieldFormat::Time => (is_valid_time(value), "expected HH:MM"),
    };
    if ok {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        })
    }
}

/// Validate one import record. Returns every problem found, in field order:
/// missing required fields first, then badly formatted values.
pub fn validate_record(kind: EntityKind, record: &Record) -> Vec<ValidationError> {
    let schema = kind.schema();
    let mut errors = Vec::new();

    for field in schema.required {
        if kind.resolve(record, field).is_none() {
            errors.push(ValidationError::MissingField((*field).to_string()));
        }
    }

    for def in schema.fields {
        let Some(format) = def.format else { continue };
        if let Some(value) = record.text(def.name) {
            if let Err(e) = check_format(def.name, &value, format) {
                errors.push(e);
            }
        }
    }

    errors
}
