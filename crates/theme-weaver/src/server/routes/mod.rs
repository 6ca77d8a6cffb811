//! API routes

pub mod documents;
pub mod query;
pub mod themes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_request_size: usize) -> Router<AppState> {
    Router::new()
        // Documents
        .route(
            "/documents/upload",
            post(documents::upload_documents).layer(DefaultBodyLimit::max(max_request_size)),
        )
        .route("/documents", get(documents::list_documents))
        .route("/documents/search", get(documents::search_documents))
        .route("/documents/:id", delete(documents::delete_document))
        // Query
        .route("/query/query_documents", get(query::query_documents))
        // Themes
        .route("/themes", get(themes::list_themes))
        .route("/themes/analyze", post(themes::analyze_themes))
        .route("/themes/:theme_id", get(themes::get_theme))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "theme-weaver",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document research and theme identification",
        "endpoints": {
            "POST /api/documents/upload": "Upload PDFs or images into a session",
            "GET /api/documents": "List stored documents (?session=)",
            "GET /api/documents/search": "Rank stored records against ?q= (?n_results=, default 5)",
            "DELETE /api/documents/:id": "Delete a document by <session>_<doc_id>",
            "GET /api/query/query_documents": "Answer ?q= for each document of ?timestamp=",
            "POST /api/themes/analyze": "Identify themes across texts or a session",
            "GET /api/themes": "Themes stored for ?session=",
            "GET /api/themes/:theme_id": "One stored theme"
        }
    }))
}
