use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use identity::AuthContext;
use mbom::Mbom;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// `POST /v1/mbom` request body (spec §6 `{batch_id, approved_by}`).
#[derive(Debug, Deserialize)]
pub struct MbomRequest {
    pub batch_id: String,
    pub approved_by: String,
}

/// `POST /v1/mbom` — sign a previously scanned batch (spec §4.I/§6).
pub async fn create_mbom(
    State(state): State<Arc<ServerState>>,
    Extension(_ctx): Extension<AuthContext>,
    Json(request): Json<MbomRequest>,
) -> ServerResult<impl IntoResponse> {
    let batch = state
        .recent_batches
        .get(&request.batch_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| ServerError::BatchNotFound(request.batch_id.clone()))?;

    let record = mbom::sign(&batch, &request.approved_by, &state.hmac_secret)?;
    Ok(Json(record))
}

/// `POST /v1/mbom/verify` — verify a signed MBOM (spec §4.I/§6).
pub async fn verify_mbom(
    State(state): State<Arc<ServerState>>,
    Extension(_ctx): Extension<AuthContext>,
    Json(record): Json<Mbom>,
) -> ServerResult<impl IntoResponse> {
    let outcome = mbom::verify(&record, &state.hmac_secret)?;
    Ok(Json(outcome))
}
