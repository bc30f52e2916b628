//! Resume records
//!
//! A record is one JSON object read from an input file, held as a BSON
//! document so it can be inserted as-is. Loading stamps the creation
//! metadata; image references live under `person.images`.

use bson::{oid::ObjectId, Bson, Document};
use chrono::{DateTime, Utc};
use tracing::error;

use crate::types::{ImportError, Result};

/// Field holding the creation time of the record
pub const INSERT_TIMESTAMP_FIELD: &str = "insertTimeStamp";

/// Field holding the last update time (null until updated)
pub const UPDATE_TIMESTAMP_FIELD: &str = "updateTimeStamp";

/// Field set on an image reference once its blob is stored
pub const IMAGE_OID_FIELD: &str = "oid";

/// An image entry of `person.images` that names a file to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Position in `person.images`
    pub index: usize,
    /// Path of the image file
    pub file: String,
}

/// One parsed resume document
#[derive(Debug, Clone)]
pub struct Record {
    source_name: String,
    document: Document,
}

impl Record {
    /// Parse `raw` and stamp it with the current time
    pub fn load(raw: &[u8], source_name: &str) -> Result<Self> {
        Self::load_at(raw, source_name, Utc::now())
    }

    /// Parse `raw` and stamp it with `now`
    pub fn load_at(raw: &[u8], source_name: &str, now: DateTime<Utc>) -> Result<Self> {
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(raw)
            .map_err(|e| parse_failure(raw, source_name, e))?;

        let mut document: Document = fields
            .into_iter()
            .map(|(key, value)| (key, json_to_bson(value)))
            .collect();

        document.insert(INSERT_TIMESTAMP_FIELD, bson::DateTime::from_chrono(now));
        document.insert(UPDATE_TIMESTAMP_FIELD, Bson::Null);

        Ok(Self {
            source_name: source_name.to_string(),
            document,
        })
    }

    /// Name of the file the record was read from
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Top-level `title`, used to label log lines
    pub fn title(&self) -> Option<&str> {
        self.document.get_str("title").ok()
    }

    /// Image entries with a non-empty `file`, in array order
    pub fn image_refs(&self) -> Vec<ImageRef> {
        let Some(images) = self
            .document
            .get_document("person")
            .ok()
            .and_then(|person| person.get_array("images").ok())
        else {
            return Vec::new();
        };

        images
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                let file = entry.as_document()?.get_str("file").ok()?;
                (!file.is_empty()).then(|| ImageRef {
                    index,
                    file: file.to_string(),
                })
            })
            .collect()
    }

    /// Set `person.images[index].oid`; false if there is no such entry
    pub fn set_image_oid(&mut self, index: usize, oid: ObjectId) -> bool {
        let entry = self
            .document
            .get_document_mut("person")
            .ok()
            .and_then(|person| person.get_array_mut("images").ok())
            .and_then(|images| images.get_mut(index));

        match entry {
            Some(Bson::Document(image)) => {
                image.insert(IMAGE_OID_FIELD, oid);
                true
            }
            _ => false,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

/// JSON value as BSON, keeping key order.
///
/// Integers that fit `i64` stay integers; larger ones become doubles, since
/// BSON has no unsigned 64-bit type.
fn json_to_bson(value: serde_json::Value) -> Bson {
    use serde_json::Value;

    match value {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Bson::Int64(i),
            None => Bson::Double(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => Bson::String(s),
        Value::Array(items) => Bson::Array(items.into_iter().map(json_to_bson).collect()),
        Value::Object(fields) => Bson::Document(
            fields
                .into_iter()
                .map(|(key, value)| (key, json_to_bson(value)))
                .collect(),
        ),
    }
}

fn parse_failure(raw: &[u8], source_name: &str, err: impl std::fmt::Display) -> ImportError {
    error!(
        source = %source_name,
        error = %err,
        data = %String::from_utf8_lossy(raw),
        "JSON parsing error"
    );
    ImportError::Parse {
        source_name: source_name.to_string(),
        message: err.to_string(),
    }
}
