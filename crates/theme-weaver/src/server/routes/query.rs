//! Per-document query endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryParams, QueryResponse, SessionScope};

/// GET /api/query/query_documents - Answer a question for each document of a session
pub async fn query_documents(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>> {
    let question = params.q.trim();
    if question.is_empty() {
        return Err(Error::bad_request("Query must not be empty"));
    }
    let session = SessionScope::new(params.timestamp.trim())?;

    tracing::info!("Query: \"{}\" (session {})", question, session);
    let answers = state.query().process_query(question, &session).await?;
    let failed = answers.iter().filter(|a| a.is_error()).count();
    if failed > 0 {
        tracing::warn!("{} of {} answers failed", failed, answers.len());
    }

    Ok(Json(QueryResponse {
        query: question.to_string(),
        session: session.to_string(),
        answers,
    }))
}
