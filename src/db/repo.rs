use super::model::{decode_collection, encode_collection, BatchRow};
use crate::model::{Batch, BatchSummary, Document, Lecture};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    // WAL lets the HTTP readers proceed while a sync pass is writing.
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {}", database_url))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("failed to open database")?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") {
        return url.to_string();
    }

    // sqlite::memory: or sqlite::memory:?cache=shared
    if url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);

    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };

    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Insert or wholesale-replace the batch keyed by `batch.id`.
///
/// One statement per batch, so readers see either the previous pass's record
/// or this one, never a mix.
#[instrument(skip_all, fields(batch_id = %batch.id))]
pub async fn upsert_batch(pool: &Pool, batch: &Batch) -> Result<()> {
    let lectures = encode_collection(&batch.lectures)?;
    let documents = encode_collection(&batch.documents)?;
    sqlx::query(
        "INSERT INTO batches (id, title, banner, lectures, documents, last_updated) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET \
            title = excluded.title, \
            banner = excluded.banner, \
            lectures = excluded.lectures, \
            documents = excluded.documents, \
            last_updated = excluded.last_updated",
    )
    .bind(&batch.id)
    .bind(&batch.title)
    .bind(&batch.banner)
    .bind(lectures)
    .bind(documents)
    .bind(batch.last_updated)
    .execute(pool)
    .await
    .context("failed to upsert batch")?;
    Ok(())
}

/// All batches without their lecture/document collections, ordered by id.
#[instrument(skip_all)]
pub async fn list_batches(pool: &Pool) -> Result<Vec<BatchSummary>> {
    let rows: Vec<(String, String, String, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, title, banner, last_updated FROM batches ORDER BY id")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(id, title, banner, last_updated)| BatchSummary {
            id,
            title,
            banner,
            last_updated,
        })
        .collect())
}

#[instrument(skip_all)]
pub async fn get_batch(pool: &Pool, id: &str) -> Result<Option<Batch>> {
    let row = sqlx::query_as::<_, BatchRow>(
        "SELECT id, title, banner, lectures, documents, last_updated FROM batches WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(Batch::try_from).transpose()
}

#[instrument(skip_all)]
pub async fn get_lectures(pool: &Pool, id: &str) -> Result<Option<Vec<Lecture>>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT lectures FROM batches WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    raw.map(|raw| decode_collection(&raw)).transpose()
}

#[instrument(skip_all)]
pub async fn get_documents(pool: &Pool, id: &str) -> Result<Option<Vec<Document>>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT documents FROM batches WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    raw.map(|raw| decode_collection(&raw)).transpose()
}

#[instrument(skip_all)]
pub async fn count_batches(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM batches")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn setup_pool() -> Pool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        pool
    }

    fn batch(id: &str, title: &str) -> Batch {
        Batch {
            id: id.into(),
            title: title.into(),
            banner: format!("{}.png", id),
            lectures: vec![json!({"n": 1})],
            documents: vec![json!({"topic": "a"}), json!({"topic": "b"})],
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn prepare_url_keeps_memory_and_rebuilds_paths() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            prepare_sqlite_url("postgres://localhost/db"),
            "postgres://localhost/db"
        );
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("nested").join("mirror.db");
        let url = format!("sqlite:{}?mode=rwc", path.display());
        let rebuilt = prepare_sqlite_url(&url);
        assert_eq!(rebuilt, format!("sqlite://{}?mode=rwc", path.display()));
        assert!(path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn upsert_creates_then_replaces() {
        let pool = setup_pool().await;
        upsert_batch(&pool, &batch("b1", "First")).await.unwrap();
        assert_eq!(count_batches(&pool).await.unwrap(), 1);

        let mut updated = batch("b1", "Renamed");
        updated.lectures = vec![];
        updated.documents = vec![json!({"topic": "z"})];
        upsert_batch(&pool, &updated).await.unwrap();
        assert_eq!(count_batches(&pool).await.unwrap(), 1);

        let stored = get_batch(&pool, "b1").await.unwrap().unwrap();
        assert_eq!(stored.id, "b1");
        assert_eq!(stored.title, "Renamed");
        assert!(stored.lectures.is_empty());
        assert_eq!(stored.documents, vec![json!({"topic": "z"})]);
        assert_eq!(
            stored.last_updated.timestamp_millis(),
            updated.last_updated.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn point_reads_and_missing_ids() {
        let pool = setup_pool().await;
        upsert_batch(&pool, &batch("b2", "Two")).await.unwrap();
        upsert_batch(&pool, &batch("b1", "One")).await.unwrap();

        let lectures = get_lectures(&pool, "b1").await.unwrap().unwrap();
        assert_eq!(lectures, vec![json!({"n": 1})]);
        let documents = get_documents(&pool, "b2").await.unwrap().unwrap();
        assert_eq!(documents.len(), 2);

        assert!(get_lectures(&pool, "nope").await.unwrap().is_none());
        assert!(get_documents(&pool, "nope").await.unwrap().is_none());
        assert!(get_batch(&pool, "nope").await.unwrap().is_none());

        let listed = list_batches(&pool).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b1", "b2"]);
        assert_eq!(listed[0].title, "One");
        assert_eq!(listed[0].banner, "b1.png");
    }
}
