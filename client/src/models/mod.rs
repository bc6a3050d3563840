//! Domain models for the CampusDesk data layer.
//!
//! - [`Record`] - one entity as an ordered field-name to JSON-scalar map
//! - [`EntityKind`] - Student, Teacher, Administrator, School, Subject, TimetableEntry
//! - [`EntitySchema`] - the per-kind field registry (see [`registry`])
//! - [`ColumnSpec`] - an export column (`key`, `label`)
//!
//! Entity kinds share no schema. Instead of probing records with fallback
//! chains, every kind declares its fields once, with aliases, and all
//! lookups go through [`EntityKind::resolve`].

pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub use registry::{EntitySchema, FieldDef, FieldFormat};

// =============================================================================
// Record
// =============================================================================

/// A single business object as returned by the records API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wrap a JSON value if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Follow a dotted path (`school.name`) through nested objects.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.0.get(path) {
            return Some(v);
        }
        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Scalar value at `path` rendered as text. Blank strings, nulls and
    /// containers yield `None`.
    pub fn text(&self, path: &str) -> Option<String> {
        self.lookup(path).and_then(scalar_text)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.0.remove(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.text(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Render a scalar JSON value as display text.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// =============================================================================
// Entity Kind
// =============================================================================

/// The kinds of records the console manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Student,
    Teacher,
    Administrator,
    School,
    Subject,
    TimetableEntry,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Student,
        EntityKind::Teacher,
        EntityKind::Administrator,
        EntityKind::School,
        EntityKind::Subject,
        EntityKind::TimetableEntry,
    ];

    /// Static registry entry for this kind.
    pub fn schema(self) -> &'static EntitySchema {
        registry::schema(self)
    }

    /// Remote listing path.
    pub fn list_path(self) -> &'static str {
        self.schema().list_path
    }

    /// Remote create path.
    pub fn create_path(self) -> &'static str {
        self.schema().create_path
    }

    /// Natural-key value of a record, if it has one.
    pub fn key_of(self, record: &Record) -> Option<String> {
        self.resolve(record, self.schema().key_field)
    }

    /// Resolve a canonical field through its alias chain. Fields that the
    /// registry does not know are read directly (dotted paths allowed).
    pub fn resolve(self, record: &Record, field: &str) -> Option<String> {
        match self.schema().field(field) {
            Some(def) => def.candidates().find_map(|name| record.text(name)),
            None => record.text(field),
        }
    }

    /// Same as [`resolve`](Self::resolve) but returns the raw JSON value,
    /// so numbers can sort numerically.
    pub fn resolve_value<'a>(self, record: &'a Record, field: &str) -> Option<&'a Value> {
        let present = |v: &&Value| scalar_text(v).is_some();
        match self.schema().field(field) {
            Some(def) => def
                .candidates()
                .find_map(|name| record.lookup(name).filter(present)),
            None => record.lookup(field).filter(present),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Teacher => "teacher",
            EntityKind::Administrator => "administrator",
            EntityKind::School => "school",
            EntityKind::Subject => "subject",
            EntityKind::TimetableEntry => "timetable",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" | "students" => Ok(EntityKind::Student),
            "teacher" | "teachers" => Ok(EntityKind::Teacher),
            "admin" | "admins" | "administrator" | "administrators" => {
                Ok(EntityKind::Administrator)
            }
            "school" | "schools" => Ok(EntityKind::School),
            "subject" | "subjects" => Ok(EntityKind::Subject),
            "timetable" | "timetables" | "timetable-entry" | "timetable_entry" => {
                Ok(EntityKind::TimetableEntry)
            }
            other => Err(format!(
                "Unsupported entity type: '{}'. Supported: student, teacher, admin, school, subject, timetable",
                other
            )),
        }
    }
}

// =============================================================================
// Export Columns
// =============================================================================

/// One export column: the field to read and the header label to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
}

impl ColumnSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
        }
    }
}
