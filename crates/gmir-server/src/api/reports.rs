use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use gmir_pipeline::{PgReportStore, ReportItem, ReportRun, ReportStore};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_store_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ReportsQuery {
    pub limit: Option<i64>,
}

/// A run together with its items, items ordered by region.
#[derive(Debug, Serialize)]
pub(super) struct ReportDetail {
    run: ReportRun,
    items: Vec<ReportItem>,
}

pub(super) async fn list_reports(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<ApiResponse<Vec<ReportRun>>>, ApiError> {
    let store = PgReportStore::new(state.pool.clone());
    let data = store
        .list_runs(normalize_limit(query.limit))
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_latest_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ReportDetail>>, ApiError> {
    let store = PgReportStore::new(state.pool.clone());
    let run = store
        .latest_run()
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "no reports yet"))?;

    detail_response(&store, run, req_id).await
}

pub(super) async fn get_report_by_date(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(date): Path<String>,
) -> Result<Json<ApiResponse<ReportDetail>>, ApiError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            "date must be formatted as YYYY-MM-DD",
        )
    })?;

    let store = PgReportStore::new(state.pool.clone());
    let run = store
        .get_run_by_date(date)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no report for {date}"),
            )
        })?;

    detail_response(&store, run, req_id).await
}

async fn detail_response(
    store: &PgReportStore,
    run: ReportRun,
    req_id: RequestId,
) -> Result<Json<ApiResponse<ReportDetail>>, ApiError> {
    let items = store
        .list_items(run.id)
        .await
        .map_err(|e| map_store_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ReportDetail { run, items },
        meta: ResponseMeta::new(req_id.0),
    }))
}
