use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use identity::{generate_api_key, hash_api_key, display_prefix, ApiKeyRecord, AuthContext};

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// `GET /v1/keys/usage` response: current-month usage against quota (spec
/// §4.G "current-month usage sum").
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub documents_scanned_this_month: i64,
    pub monthly_quota: i64,
    pub subscription_tier: String,
}

pub async fn usage(
    State(state): State<Arc<ServerState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ServerResult<impl IntoResponse> {
    let documents_scanned_this_month =
        state.auth.store().monthly_documents_scanned(&ctx.user.id, Utc::now()).await?;
    Ok(Json(UsageResponse {
        documents_scanned_this_month,
        monthly_quota: ctx.user.monthly_quota,
        subscription_tier: ctx.user.subscription_tier,
    }))
}

/// `POST /v1/keys/create` request body: a human-readable label for the new
/// key, issued under the authenticated caller's existing user account.
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    pub name: String,
}

/// `POST /v1/keys/create` response. `api_key` is the plaintext value —
/// shown exactly once, never retrievable again (spec §3 "Plaintext is
/// never stored").
#[derive(Debug, Serialize)]
pub struct CreateKeyResponse {
    pub api_key: String,
    pub record: ApiKeyRecord,
}

pub async fn create_key(
    State(state): State<Arc<ServerState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<CreateKeyRequest>,
) -> ServerResult<impl IntoResponse> {
    if request.name.trim().is_empty() {
        return Err(ServerError::InvalidInput("key name must not be empty".to_string()));
    }

    let plaintext = generate_api_key();
    let record = ApiKeyRecord {
        id: uuid::Uuid::new_v4().to_string(),
        key_hash: hash_api_key(&plaintext),
        key_prefix: display_prefix(&plaintext),
        user_id: ctx.user.id.clone(),
        name: request.name,
        is_active: true,
        created_at: Utc::now(),
        last_used_at: None,
    };
    state.auth.store().create_api_key(&record).await?;

    Ok(Json(CreateKeyResponse { api_key: plaintext, record }))
}

/// `GET /v1/keys/me` — every key belonging to the authenticated user.
pub async fn me(
    State(state): State<Arc<ServerState>>,
    Extension(ctx): Extension<AuthContext>,
) -> ServerResult<impl IntoResponse> {
    let keys = state.auth.store().list_api_keys_for_user(&ctx.user.id).await?;
    Ok(Json(serde_json::json!({ "user": ctx.user, "keys": keys })))
}

/// `DELETE /v1/keys/{id}` — deactivate a key. A caller may only deactivate
/// their own keys.
pub async fn delete_key(
    State(state): State<Arc<ServerState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(key_id): Path<String>,
) -> ServerResult<impl IntoResponse> {
    let target = state
        .auth
        .store()
        .get_api_key_by_id(&key_id)
        .await?
        .ok_or(ServerError::NotFound)?;

    if target.user_id != ctx.user.id {
        return Err(ServerError::Forbidden);
    }

    state.auth.store().deactivate_api_key(&key_id).await?;
    Ok(Json(serde_json::json!({ "id": key_id, "status": "deactivated" })))
}
