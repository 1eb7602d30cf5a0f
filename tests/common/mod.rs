#![allow(dead_code)]

use anyhow::{anyhow, Result};
use catalog_mirror::upstream::{CatalogSource, UpstreamBatch};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub async fn setup_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

#[derive(Default)]
struct CatalogState {
    batches: Vec<UpstreamBatch>,
    list_error: Option<String>,
    lectures: HashMap<String, Result<Value, String>>,
    documents: HashMap<String, Result<Value, String>>,
    calls: Vec<String>,
}

/// Scripted upstream catalog that records every call it receives.
#[derive(Clone, Default)]
pub struct RecordingCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl RecordingCatalog {
    pub async fn add_batch(&self, id: &str, title: &str, banner: &str) {
        self.state.lock().await.batches.push(UpstreamBatch {
            id: id.into(),
            title: Some(title.into()),
            banner: Some(banner.into()),
        });
    }

    pub async fn set_lectures(&self, id: &str, payload: Value) {
        self.state.lock().await.lectures.insert(id.into(), Ok(payload));
    }

    pub async fn fail_lectures(&self, id: &str) {
        self.state
            .lock()
            .await
            .lectures
            .insert(id.into(), Err("lectures unavailable".into()));
    }

    pub async fn set_documents(&self, id: &str, payload: Value) {
        self.state.lock().await.documents.insert(id.into(), Ok(payload));
    }

    pub async fn fail_documents(&self, id: &str) {
        self.state
            .lock()
            .await
            .documents
            .insert(id.into(), Err("documents unavailable".into()));
    }

    pub async fn fail_listing(&self, message: &str) {
        self.state.lock().await.list_error = Some(message.into());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }
}

fn scripted(entry: Option<&Result<Value, String>>) -> Result<Value> {
    match entry {
        Some(Ok(v)) => Ok(v.clone()),
        Some(Err(msg)) => Err(anyhow!(msg.clone())),
        None => Ok(Value::Object(Default::default())),
    }
}

#[async_trait::async_trait]
impl CatalogSource for RecordingCatalog {
    async fn list_batches(&self) -> Result<Vec<UpstreamBatch>> {
        let mut state = self.state.lock().await;
        state.calls.push("allbatch".into());
        match &state.list_error {
            Some(msg) => Err(anyhow!(msg.clone())),
            None => Ok(state.batches.clone()),
        }
    }

    async fn fetch_lectures(&self, batch_id: &str) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("chapter/{}", batch_id));
        scripted(state.lectures.get(batch_id))
    }

    async fn fetch_documents(&self, batch_id: &str) -> Result<Value> {
        let mut state = self.state.lock().await;
        state.calls.push(format!("pdf/{}", batch_id));
        scripted(state.documents.get(batch_id))
    }
}
