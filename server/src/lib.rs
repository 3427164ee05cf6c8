use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use engine::corpus::load_dir;
use engine::Index;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize {
    10
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: u32,
    pub source: String,
    pub score: f64,
    pub snippet: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub index: Arc<Index>,
}

/// Load the corpus, build the index, and wire the routes. The index is
/// fully built before the router exists, so every handler only ever sees
/// the finished read-only index.
pub fn build_app<P: AsRef<std::path::Path>>(corpus_dir: P) -> Result<Router> {
    let corpus = load_dir(corpus_dir.as_ref())?;
    let index = Index::build(corpus);
    tracing::info!(
        num_docs = index.num_docs(),
        vocabulary = index.vocabulary_size(),
        "index ready"
    );
    let state = AppState {
        index: Arc::new(index),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new()
                    .allow_origin(AllowOrigin::list(origins))
                    .allow_methods(Any)
                    .allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/document/:doc_id", get(document_handler))
        .with_state(state)
        .layer(cors);
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let ranked = state.index.search(&params.query);
    let total_hits = ranked.len();
    let k = params.k.clamp(1, 100);

    let raw_terms: Vec<String> = params
        .query
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();

    let results: Vec<SearchHit> = ranked
        .into_iter()
        .take(k)
        .map(|hit| {
            let snippet = snippet_from_file(&hit.source, &raw_terms);
            SearchHit {
                doc_id: hit.doc_id,
                source: hit.source.display().to_string(),
                score: hit.score,
                snippet,
            }
        })
        .collect();

    Json(SearchResponse {
        query: params.query,
        took_s: start.elapsed().as_secs_f64(),
        total_hits,
        results,
    })
}

pub async fn document_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "document not found" })),
        )
    };
    let source = state.index.source(doc_id).ok_or_else(not_found)?;
    let text = std::fs::read_to_string(source).map_err(|_| not_found())?;
    Ok(Json(serde_json::json!({
        "doc_id": doc_id,
        "source": source.display().to_string(),
        "text": text,
    })))
}

fn snippet_from_file(path: &std::path::Path, raw_terms: &[String]) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    if text.is_empty() {
        return None;
    }
    // window around the first case-insensitive occurrence of any raw term
    let mut first_idx: Option<usize> = None;
    for term in raw_terms {
        if term.trim().is_empty() {
            continue;
        }
        if let Some(pos) = find_case_insensitive(&text, term) {
            first_idx = Some(pos);
            break;
        }
    }
    let snippet = match first_idx {
        Some(idx) => {
            let start = floor_char_boundary(&text, idx.saturating_sub(100));
            let end = ceil_char_boundary(&text, (idx + 200).min(text.len()));
            text[start..end].to_string()
        }
        None => text.chars().take(200).collect(),
    };
    Some(highlight_terms(&snippet, raw_terms))
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack.to_lowercase().find(&needle.to_lowercase())
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn ceil_char_boundary(s: &str, mut i: usize) -> usize {
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

fn highlight_terms(snippet: &str, terms: &[String]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() {
            continue;
        }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        s = pat
            .replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0]))
            .to_string();
    }
    s
}
