//! The HTTP endpoint.
//!
//! | Route | |
//! |---|---|
//! | `POST /index-paper` | Index a paper; the body is an [`IndexRequest`] |
//! | `GET /papers?limit=N` | Stored records, most recently indexed first |
//! | `GET /papers/{arxiv_id}` | One stored record, by identifier in any accepted form |
//! | `GET /health` | Liveness |
//!
//! Every route answers CORS preflights from any origin.

use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
  Json, Router,
};
use paperwiki::indexer::ErrorResponse;
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::*;

/// Records returned by `GET /papers` when no limit is given.
const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct ListParams {
  limit: Option<usize>,
}

/// Builds the router serving `indexer`.
pub fn router(indexer: Arc<Indexer>) -> Router {
  Router::new()
    .route("/index-paper", post(index_paper))
    .route("/papers", get(list_papers))
    .route("/papers/{arxiv_id}", get(get_paper))
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(indexer)
}

fn error(status: StatusCode, message: impl std::fmt::Display) -> Response {
  (status, Json(json!({ "error": message.to_string() }))).into_response()
}

async fn index_paper(
  State(indexer): State<Arc<Indexer>>,
  payload: std::result::Result<Json<IndexRequest>, JsonRejection>,
) -> Response {
  let request = match payload {
    Ok(Json(request)) => request,
    Err(rejection) => {
      let status = rejection.status();
      warn!("Rejected index request with {status}: {}", rejection.body_text());
      let failure =
        ErrorResponse { error: rejection.body_text(), debug: None, status: status.as_u16() };
      return (status, Json(failure)).into_response();
    },
  };

  match indexer.respond(&request).await {
    Ok(response) => Json(response).into_response(),
    Err(failure) => {
      let status =
        StatusCode::from_u16(failure.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
      (status, Json(failure)).into_response()
    },
  }
}

async fn list_papers(
  State(indexer): State<Arc<Indexer>>,
  Query(params): Query<ListParams>,
) -> Response {
  let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
  match List::newest(limit).execute(indexer.database()).await {
    Ok(records) => Json(records).into_response(),
    Err(e) => {
      warn!("Listing papers failed: {e}");
      error(StatusCode::INTERNAL_SERVER_ERROR, e)
    },
  }
}

async fn get_paper(State(indexer): State<Arc<Indexer>>, Path(arxiv_id): Path<String>) -> Response {
  let id = CanonicalId::parse(&arxiv_id);
  match Lookup::by_arxiv_id(id.as_str()).execute(indexer.database()).await {
    Ok(Some(record)) => Json(record).into_response(),
    Ok(None) => error(StatusCode::NOT_FOUND, format!("{id} is not indexed")),
    Err(e) => {
      warn!("Lookup of {id} failed: {e}");
      error(StatusCode::INTERNAL_SERVER_ERROR, e)
    },
  }
}

async fn health() -> Json<serde_json::Value> { Json(json!({ "ok": true })) }
