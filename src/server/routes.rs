use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::state::{GuardedSyncRunner, ServerState, ServiceInfo};
use crate::db::{self, Pool};
use crate::model::{BatchSummary, Document, Lecture};
use crate::sync::SyncReport;

pub const BATCH_NOT_FOUND: &str = "Batch not found";
pub const PDFS_NOT_FOUND: &str = "PDFs not found";

#[derive(Serialize)]
struct Endpoints {
    all_batches: &'static str,
    force_sync: &'static str,
    batch_details: &'static str,
    pdf_details: &'static str,
}

#[derive(Serialize)]
struct HomeResponse {
    message: &'static str,
    status: &'static str,
    sync_interval: String,
    endpoints: Endpoints,
    author: String,
}

#[derive(Serialize)]
struct Failure {
    success: bool,
    message: String,
}

#[derive(Serialize)]
struct SyncSuccess {
    success: bool,
    message: String,
    report: SyncReport,
}

#[derive(Serialize)]
struct BatchList {
    success: bool,
    data: Vec<BatchSummary>,
}

#[derive(Serialize)]
struct LectureList {
    success: bool,
    classes: Vec<Lecture>,
}

#[derive(Serialize)]
struct DocumentList {
    success: bool,
    topics: Vec<Document>,
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Failure {
        success: false,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}

fn store_failure(err: anyhow::Error) -> Response {
    error!(?err, "store read failed");
    failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
}

/// Human form of the sync period, e.g. "Every 2 minutes".
pub fn describe_interval(period: Duration) -> String {
    let secs = period.as_secs();
    match secs {
        60 => "Every minute".to_string(),
        s if s > 0 && s % 60 == 0 => format!("Every {} minutes", s / 60),
        1 => "Every second".to_string(),
        s => format!("Every {} seconds", s),
    }
}

async fn home(State(info): State<Arc<ServiceInfo>>) -> Response {
    Json(HomeResponse {
        message: "Catalog mirror API is live and running",
        status: "Healthy",
        sync_interval: describe_interval(info.sync_interval),
        endpoints: Endpoints {
            all_batches: "/allbatch",
            force_sync: "/force-sync",
            batch_details: "/chapter/[batch_id]",
            pdf_details: "/pdf/[batch_id]",
        },
        author: info.author.clone(),
    })
    .into_response()
}

async fn force_sync(State(runner): State<GuardedSyncRunner>) -> Response {
    match runner.run_now().await {
        Ok(report) => Json(SyncSuccess {
            success: true,
            message: format!(
                "Sync successful! {} batches updated.",
                report.batches_written
            ),
            report,
        })
        .into_response(),
        Err(err) => failure(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

async fn all_batches(State(pool): State<Pool>) -> Response {
    match db::list_batches(&pool).await {
        Ok(data) => Json(BatchList {
            success: true,
            data,
        })
        .into_response(),
        Err(err) => store_failure(err),
    }
}

// Unknown ids answer 200 with success=false; clients rely on that shape.
async fn batch_lectures(State(pool): State<Pool>, Path(id): Path<String>) -> Response {
    match db::get_lectures(&pool, &id).await {
        Ok(Some(classes)) => Json(LectureList {
            success: true,
            classes,
        })
        .into_response(),
        Ok(None) => failure(StatusCode::OK, BATCH_NOT_FOUND),
        Err(err) => store_failure(err),
    }
}

async fn batch_documents(State(pool): State<Pool>, Path(id): Path<String>) -> Response {
    match db::get_documents(&pool, &id).await {
        Ok(Some(topics)) => Json(DocumentList {
            success: true,
            topics,
        })
        .into_response(),
        Ok(None) => failure(StatusCode::OK, PDFS_NOT_FOUND),
        Err(err) => store_failure(err),
    }
}

pub fn make_app(state: ServerState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/force-sync", get(force_sync))
        .route("/allbatch", get(all_batches))
        .route("/chapter/{id}", get(batch_lectures))
        .route("/pdf/{id}", get(batch_documents))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
