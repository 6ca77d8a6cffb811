//! Theme analysis endpoint

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::generation::{label_documents, ThemeInput};
use crate::server::state::AppState;
use crate::types::{ListParams, SessionScope, Theme, ThemeAnalysisResponse, ThemeRequest};

/// POST /api/themes/analyze - Identify themes across documents
///
/// Inline `document_texts` take precedence over `session` and are stored
/// under a fresh scope tag. A session's themes are stored under the session
/// itself, replacing its previous analysis.
pub async fn analyze_themes(
    State(state): State<AppState>,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<ThemeAnalysisResponse>> {
    let (documents, session) = if !request.document_texts.is_empty() {
        (label_documents(request.document_texts, &request.document_ids), None)
    } else if let Some(session) = request.session.as_deref() {
        let session = SessionScope::new(session)?;
        (session_documents(&state, &session).await?, Some(session))
    } else {
        return Err(Error::bad_request(
            "Provide document_texts or a session to analyze",
        ));
    };

    let (analysis, scope) = match session {
        Some(session) => (
            state
                .themes()
                .identify_session_themes(&documents, &session)
                .await?,
            session.to_string(),
        ),
        None => {
            let scope = state.next_theme_scope();
            (state.themes().identify_themes(&documents, &scope).await?, scope)
        }
    };

    Ok(Json(ThemeAnalysisResponse {
        document_count: documents.len(),
        themes: analysis.themes,
        model_used: analysis.model,
        scope,
    }))
}

/// GET /api/themes?session= - Themes stored for a session
pub async fn list_themes(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Theme>>> {
    let session = params
        .session
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::bad_request("session is required"))?;
    let session = SessionScope::new(session)?;

    Ok(Json(state.themes().stored_themes(session.as_str()).await?))
}

/// GET /api/themes/:theme_id - One stored theme
pub async fn get_theme(
    State(state): State<AppState>,
    Path(theme_id): Path<String>,
) -> Result<Json<Theme>> {
    Ok(Json(state.themes().theme(&theme_id).await?))
}

async fn session_documents(state: &AppState, session: &SessionScope) -> Result<Vec<ThemeInput>> {
    let records = state.query().session_documents(session).await?;
    Ok(records
        .into_iter()
        .map(|record| ThemeInput {
            label: record
                .metadata
                .get("doc_id")
                .and_then(Value::as_str)
                .unwrap_or(&record.id)
                .to_string(),
            text: record.text,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::chain::tests::ScriptedProvider;
    use crate::providers::{KnowledgeStore, MetadataFilter};
    use crate::server::routes::documents::{ingest_files, UploadedFile};
    use crate::server::state::tests::test_state;
    use std::sync::Arc;

    const REPLY: &str = "Theme: Records\nShared paperwork.\nEvidence:\n- DOC001: a form\n";

    #[tokio::test]
    async fn test_analyze_inline_texts() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new("p", true, vec![Ok(REPLY.to_string())]));
        let (state, store) = test_state(dir.path(), provider);

        let Json(response) = analyze_themes(
            State(state),
            Json(ThemeRequest {
                document_texts: vec!["one".to_string(), "two".to_string()],
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.document_count, 2);
        assert_eq!(response.model_used, "scripted-model");
        assert_eq!(response.themes[0].theme_id, format!("{}_theme_1", response.scope));
        assert!(store.get(&response.themes[0].theme_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_analyze_session_uses_short_ids() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new("p", true, vec![Ok(REPLY.to_string())]));
        let (state, _) = test_state(dir.path(), provider.clone());
        let session = SessionScope::new("s1").unwrap();
        ingest_files(
            &state,
            &session,
            vec![UploadedFile {
                filename: "a.pdf".to_string(),
                data: b"pdf".to_vec(),
            }],
        )
        .await;

        let Json(response) = analyze_themes(
            State(state.clone()),
            Json(ThemeRequest {
                session: Some("s1".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.document_count, 1);
        assert_eq!(response.scope, "s1");
        assert_eq!(response.themes[0].theme_id, "s1_theme_1");
        assert_eq!(response.themes[0].referenced_document_ids, vec!["DOC001"]);
        assert!(provider.prompts.lock()[0].contains("DOC001:\n"));

        let session_themes = state
            .store()
            .get_where(&MetadataFilter::new().eq("timestamp", "s1").has("name"))
            .await
            .unwrap();
        assert_eq!(session_themes.len(), 1);
        assert_eq!(session_themes[0].id, "s1_theme_1");

        let Json(listed) = list_themes(
            State(state.clone()),
            Query(ListParams {
                session: Some("s1".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(listed, response.themes);

        let Json(theme) = get_theme(State(state), Path("s1_theme_1".to_string()))
            .await
            .unwrap();
        assert_eq!(theme.name, "Records");
        assert_eq!(theme.evidence_lines, vec!["- DOC001: a form"]);
    }

    #[tokio::test]
    async fn test_theme_lookups_reject_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new("p", true, vec![]));
        let (state, _) = test_state(dir.path(), provider);

        let err = list_themes(State(state.clone()), Query(ListParams::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let err = get_theme(State(state), Path("missing_theme_1".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_analyze_requires_input() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new("p", true, vec![]));
        let (state, _) = test_state(dir.path(), provider);

        let err = analyze_themes(State(state.clone()), Json(ThemeRequest::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));

        let err = analyze_themes(
            State(state),
            Json(ThemeRequest {
                session: Some("empty".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }
}
