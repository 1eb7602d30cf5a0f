//! Row models returned by repositories.
//!
//! Lecture and document collections are persisted as JSON arrays in TEXT
//! columns; decoding into domain types happens here, not in SQL.

use crate::model::Batch;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

/// A full `batches` row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BatchRow {
    pub id: String,
    pub title: String,
    pub banner: String,
    pub lectures: String,
    pub documents: String,
    pub last_updated: DateTime<Utc>,
}

impl TryFrom<BatchRow> for Batch {
    type Error = anyhow::Error;

    fn try_from(row: BatchRow) -> Result<Self> {
        let lectures = decode_collection(&row.lectures)
            .with_context(|| format!("batch {} has corrupt lectures", row.id))?;
        let documents = decode_collection(&row.documents)
            .with_context(|| format!("batch {} has corrupt documents", row.id))?;
        Ok(Batch {
            id: row.id,
            title: row.title,
            banner: row.banner,
            lectures,
            documents,
            last_updated: row.last_updated,
        })
    }
}

/// Decode a stored JSON array of opaque records.
pub fn decode_collection(raw: &str) -> Result<Vec<Value>> {
    Ok(serde_json::from_str(raw)?)
}

/// Encode opaque records for storage.
pub fn encode_collection(items: &[Value]) -> Result<String> {
    Ok(serde_json::to_string(items)?)
}
