//! Pipeline trigger and status handlers.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use kpulse_core::PipelineStatus;
use kpulse_pipeline::{
    CollectReport, NewsCycleReport, RoundupReport, TranslateReport, TriggerSource,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct TranslateQuery {
    /// Kept as text; anything that is not a non-negative integer means
    /// "use the default batch size".
    pub limit: Option<String>,
}

impl TranslateQuery {
    fn limit(&self) -> Option<usize> {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<usize>().ok())
    }
}

pub(super) async fn collect(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CollectReport>>, ApiError> {
    let report = state
        .pipeline
        .collect_tracked(TriggerSource::Http)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(report, req_id.0)))
}

pub(super) async fn translate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<TranslateQuery>,
) -> Result<Json<ApiResponse<TranslateReport>>, ApiError> {
    let report = state
        .pipeline
        .translate_tracked(query.limit(), TriggerSource::Http)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(report, req_id.0)))
}

pub(super) async fn cron_news(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<NewsCycleReport>> {
    let report = state.pipeline.run_news_cycle(TriggerSource::Http).await;
    Json(ApiResponse::new(report, req_id.0))
}

pub(super) async fn cron_weekly_roundup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<RoundupReport>>, ApiError> {
    let report = state
        .pipeline
        .roundup_tracked(TriggerSource::Http)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(report, req_id.0)))
}

pub(super) async fn status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<PipelineStatus>>, ApiError> {
    let status = state
        .pipeline
        .status()
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(Json(ApiResponse::new(status, req_id.0)))
}
