//! Query endpoint routing.

use axum::{extract::State, routing::post, Json, Router};
use dukaan_core::StoreId;
use serde::Deserialize;
use std::sync::Arc;

use crate::engine::{InsightAnswer, InsightEngine};
use crate::error::InsightError;

#[derive(Clone)]
pub struct InsightState {
    pub engine: Arc<InsightEngine>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    pub store_id: StoreId,
}

/// Builds the `/query` router.
pub fn insight_router(engine: Arc<InsightEngine>) -> Router {
    Router::new()
        .route("/query", post(query_insight))
        .with_state(InsightState { engine })
}

/// `POST /query`: one question in, one answer out.
async fn query_insight(
    State(state): State<InsightState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<InsightAnswer>, InsightError> {
    tracing::info!(store_id = %request.store_id, "Insight question received");
    let answer = state
        .engine
        .ask(&request.question, request.store_id)
        .await?;
    Ok(Json(answer))
}
