//! Document upload, listing and deletion

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::providers::MetadataFilter;
use crate::server::state::AppState;
use crate::types::{
    DocumentSummary, ListParams, SearchHit, SearchParams, SessionScope, UploadBatchResponse,
    UploadFailure, UploadResponse,
};

/// A file read from a multipart upload
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// POST /api/documents/upload - Upload files into a session
///
/// Fields named `session` select an existing session; every field with a
/// file name is ingested. Without a session a new timestamped one is made.
pub async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadBatchResponse>> {
    let mut session: Option<SessionScope> = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "session" {
            let value = field
                .text()
                .await
                .map_err(|e| Error::bad_request(format!("Failed to read session: {}", e)))?;
            if !value.trim().is_empty() {
                session = Some(SessionScope::new(value.trim())?);
            }
            continue;
        }

        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::bad_request(format!("Failed to read '{}': {}", filename, e)))?;
        files.push(UploadedFile {
            filename,
            data: data.to_vec(),
        });
    }

    if files.is_empty() {
        return Err(Error::bad_request("No files in upload"));
    }

    let session = session.unwrap_or_else(SessionScope::timestamped);
    Ok(Json(ingest_files(&state, &session, files).await))
}

/// Ingest files one by one, collecting per-file failures
pub async fn ingest_files(
    state: &AppState,
    session: &SessionScope,
    files: Vec<UploadedFile>,
) -> UploadBatchResponse {
    let limit = state.config().server.max_upload_size;
    let mut documents = Vec::new();
    let mut failed = Vec::new();

    for file in files {
        tracing::info!("Processing file: {} ({} bytes)", file.filename, file.data.len());

        let result = if file.data.len() > limit {
            Err(Error::FileTooLarge {
                filename: file.filename.clone(),
                size: file.data.len(),
                limit,
            })
        } else {
            state
                .ingestion()
                .ingest(&file.data, &file.filename, session)
                .await
        };

        match result {
            Ok(record) => documents.push(UploadResponse::from_record(&record, &file.filename)),
            Err(e) => {
                tracing::warn!("Failed to ingest {}: {}", file.filename, e);
                failed.push(UploadFailure {
                    filename: file.filename,
                    error: e.to_string(),
                });
            }
        }
    }

    UploadBatchResponse {
        session: session.to_string(),
        documents,
        failed,
    }
}

/// GET /api/documents - List stored documents
pub async fn list_documents(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<DocumentSummary>>> {
    let mut filter = MetadataFilter::new().has("doc_id");
    if let Some(session) = params.session.filter(|s| !s.is_empty()) {
        filter = filter.eq("timestamp", session);
    }

    let records = state.store().get_where(&filter).await?;
    let summaries = records
        .into_iter()
        .map(|record| {
            let field = |key: &str| record.metadata.get(key).cloned().unwrap_or(Value::Null);
            DocumentSummary {
                doc_id: field("doc_id").as_str().unwrap_or_default().to_string(),
                session: field("timestamp").as_str().unwrap_or_default().to_string(),
                pages: field("pages").as_u64().unwrap_or(0) as u32,
                word_count: field("word_count").as_u64().unwrap_or(0) as usize,
                id: record.id,
            }
        })
        .collect();

    Ok(Json(summaries))
}

/// GET /api/documents/search - Stored records ranked against `q`
pub async fn search_documents(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>> {
    if params.q.trim().is_empty() {
        return Err(Error::bad_request("Search text must not be empty"));
    }

    let hits = state.store().query(&params.q, params.n_results).await?;
    tracing::debug!("Search '{}' matched {} records", params.q, hits.len());
    Ok(Json(hits.into_iter().map(SearchHit::from).collect()))
}

/// DELETE /api/documents/:id - Delete a document by composite id
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let removed = state.store().delete(std::slice::from_ref(&id)).await?;
    if removed == 0 {
        return Err(Error::DocumentNotFound(id));
    }

    tracing::info!("Deleted document {}", id);
    Ok(Json(json!({ "deleted": id })))
}
