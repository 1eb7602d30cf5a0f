use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lecture record as delivered by the upstream catalog. The schema is owned
/// upstream, so it is stored and served verbatim.
pub type Lecture = Value;

/// Document (PDF topic) record, opaque like [`Lecture`].
pub type Document = Value;

/// A mirrored batch with its full lecture and document collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub title: String,
    pub banner: String,
    pub lectures: Vec<Lecture>,
    pub documents: Vec<Document>,
    pub last_updated: DateTime<Utc>,
}

/// Listing projection of [`Batch`]: everything except the heavy collections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub id: String,
    pub title: String,
    pub banner: String,
    pub last_updated: DateTime<Utc>,
}

impl From<Batch> for BatchSummary {
    fn from(batch: Batch) -> Self {
        Self {
            id: batch.id,
            title: batch.title,
            banner: batch.banner,
            last_updated: batch.last_updated,
        }
    }
}
