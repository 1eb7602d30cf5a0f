use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Field names tried, in order, for a batch's lecture collection.
pub const LECTURE_FIELDS: &[&str] = &["classes", "data"];

/// Field names tried, in order, for a batch's document collection.
pub const DOCUMENT_FIELDS: &[&str] = &["topics"];

/// Raw `/allbatch` body. Entries stay untyped so one malformed entry cannot
/// fail the whole listing.
#[derive(Deserialize, Debug)]
pub struct AllBatchResp {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl AllBatchResp {
    /// Decode every entry, dropping the ones that are not a usable batch.
    pub fn into_batches(self) -> Vec<UpstreamBatch> {
        self.data
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match UpstreamBatch::deserialize(&entry) {
                Ok(batch) => Some(batch),
                Err(err) => {
                    warn!(index, %err, %entry, "skipping malformed upstream batch entry");
                    None
                }
            })
            .collect()
    }
}

/// Batch entry of the upstream `/allbatch` listing. Unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UpstreamBatch {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub banner: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "batch id must be a string or number, got {}",
            other
        ))),
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Return the first candidate field of `payload` that holds a non-empty array,
/// or an empty collection when none does.
pub fn pick_collection(payload: &Value, candidates: &[&str]) -> Vec<Value> {
    candidates
        .iter()
        .filter_map(|name| payload.get(*name).and_then(Value::as_array))
        .find(|items| !items.is_empty())
        .cloned()
        .unwrap_or_default()
}
