use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use identity::{AuthContext, UsageRecord};
use pipeline::{BatchResult, BatchSummary, CancellationFlag, Document, ScanResult};

use crate::error::ServerResult;
use crate::state::ServerState;

/// `POST /v1/scan` / `POST /v1/analyze` request body (spec §6).
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub docs: Vec<Document>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// Shared response shape for both endpoints (spec §6 `POST /v1/scan`
/// response). Pagination applies only to `results`; `summary` always
/// reflects the full batch.
#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub batch_id: String,
    pub results: Vec<ScanResult>,
    pub summary: BatchSummary,
}

/// `POST /v1/scan` — cached detection, with the full (unpaginated) batch
/// kept around briefly so a subsequent `POST /v1/mbom` can sign exactly
/// what was returned (spec §4.I).
pub async fn scan(
    State(state): State<Arc<ServerState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ScanRequest>,
) -> ServerResult<impl IntoResponse> {
    let start = std::time::Instant::now();
    let (page, page_size) = (request.page, request.page_size);
    let outcome = run_scan(&state, &ctx, request.docs, true).await;
    record_usage(&state, &ctx, "/v1/scan", &outcome, start.elapsed());

    let batch = outcome?;
    state.recent_batches.insert(batch.batch_id.clone(), batch.clone());
    Ok(Json(paginate(batch, page, page_size)))
}

/// `POST /v1/analyze` — same detectors, no cache writes (spec §4.J).
pub async fn analyze(
    State(state): State<Arc<ServerState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(request): Json<ScanRequest>,
) -> ServerResult<impl IntoResponse> {
    let start = std::time::Instant::now();
    let (page, page_size) = (request.page, request.page_size);
    let outcome = run_scan(&state, &ctx, request.docs, false).await;
    record_usage(&state, &ctx, "/v1/analyze", &outcome, start.elapsed());

    let batch = outcome?;
    Ok(Json(paginate(batch, page, page_size)))
}

async fn run_scan(
    state: &ServerState,
    ctx: &AuthContext,
    docs: Vec<Document>,
    cache_writes: bool,
) -> ServerResult<BatchResult> {
    state.auth.check_quota(&ctx.user, docs.len()).await?;
    let batch = state.pipeline.run_batch(docs, None, cache_writes, CancellationFlag::new()).await?;
    Ok(batch)
}

fn record_usage(
    state: &ServerState,
    ctx: &AuthContext,
    endpoint: &str,
    outcome: &ServerResult<BatchResult>,
    elapsed: std::time::Duration,
) {
    let (documents_scanned, status_code) = match outcome {
        Ok(batch) => (batch.results.len() as i64, 200),
        Err(_) => (0, 500),
    };
    state.usage.record(UsageRecord {
        user_id: ctx.user.id.clone(),
        api_key_id: ctx.api_key.id.clone(),
        endpoint: endpoint.to_string(),
        timestamp: Utc::now(),
        documents_scanned,
        tokens_used: 0,
        cost_cents: 0,
        response_time_ms: Some(elapsed.as_millis() as i64),
        status_code,
    });
}

/// Slice `results` to the requested page (spec §6 "Pagination applies to
/// `results` only; summary is computed over the full batch").
fn paginate(batch: BatchResult, page: Option<usize>, page_size: Option<usize>) -> ScanResponse {
    let results = match (page, page_size) {
        (Some(page), Some(page_size)) if page_size > 0 => {
            let start = page.saturating_mul(page_size);
            batch.results.into_iter().skip(start).take(page_size).collect()
        }
        _ => batch.results,
    };
    ScanResponse { batch_id: batch.batch_id, results, summary: batch.summary }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(doc_id: &str) -> ScanResult {
        ScanResult {
            doc_id: doc_id.to_string(),
            risk: 10,
            quarantine: false,
            action: "allow".to_string(),
            reasons: vec![],
            confidence: 0.6,
            spans: vec![],
            signals: pipeline::SignalBreakdown { heuristic: 0.1, embedding: 0.1, unicode: 0.0, compression_bomb: false, homoglyphs: false },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn pagination_slices_results_but_keeps_full_summary() {
        let results: Vec<ScanResult> = (0..10).map(|i| sample_result(&format!("d{i}"))).collect();
        let summary = BatchSummary::compute(&results);
        let batch = BatchResult { batch_id: "b1".to_string(), results, summary };
        let page = paginate(batch, Some(1), Some(3));
        assert_eq!(page.results.len(), 3);
        assert_eq!(page.results[0].doc_id, "d3");
        assert_eq!(page.summary.total_docs, 10);
    }

    #[test]
    fn no_pagination_returns_all_results() {
        let results: Vec<ScanResult> = (0..5).map(|i| sample_result(&format!("d{i}"))).collect();
        let summary = BatchSummary::compute(&results);
        let batch = BatchResult { batch_id: "b1".to_string(), results, summary };
        let page = paginate(batch, None, None);
        assert_eq!(page.results.len(), 5);
    }
}
