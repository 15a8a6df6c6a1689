//! Admin HTTP handlers

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::SlotGenerationService;
use crate::interfaces::http::common::{
    domain_error, ok, query_error, ApiError, ApiResponse, ApiResult, ValidatedJson,
};

use super::dto::*;

#[derive(Clone)]
pub struct AdminAppState {
    pub generation: Arc<SlotGenerationService>,
}

type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

fn created<T>(data: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(ApiResponse::success(data))))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/slots/generate/day",
    tag = "Admin",
    request_body = GenerateDayRequest,
    responses(
        (status = 201, description = "Generation report (0 slots on closed days)", body = ApiResponse<GenerationReportDto>)
    )
)]
pub async fn generate_day(
    State(state): State<AdminAppState>,
    ValidatedJson(req): ValidatedJson<GenerateDayRequest>,
) -> Created<GenerationReportDto> {
    let report = state
        .generation
        .generate_for_day(req.date)
        .await
        .map_err(domain_error)?;
    created(report.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/slots/generate/range",
    tag = "Admin",
    request_body = GenerateRangeRequest,
    responses(
        (status = 201, description = "Generation report", body = ApiResponse<GenerationReportDto>),
        (status = 400, description = "Inverted or too long range")
    )
)]
pub async fn generate_range(
    State(state): State<AdminAppState>,
    ValidatedJson(req): ValidatedJson<GenerateRangeRequest>,
) -> Created<GenerationReportDto> {
    let report = state
        .generation
        .generate_for_range(req.start_date, req.end_date)
        .await
        .map_err(domain_error)?;
    created(report.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/slots/generate/month",
    tag = "Admin",
    params(MonthParams),
    responses(
        (status = 201, description = "Generation report", body = ApiResponse<GenerationReportDto>),
        (status = 400, description = "Year or month out of bounds")
    )
)]
pub async fn generate_month(
    State(state): State<AdminAppState>,
    params: Result<Query<MonthParams>, QueryRejection>,
) -> Created<GenerationReportDto> {
    let Query(params) = params.map_err(query_error)?;
    let report = state
        .generation
        .generate_for_month(params.year, params.month)
        .await
        .map_err(domain_error)?;
    created(report.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/slots/generate/season/{name}",
    tag = "Admin",
    params(("name" = String, Path, description = "Configured season name")),
    responses(
        (status = 201, description = "Generation report", body = ApiResponse<GenerationReportDto>),
        (status = 404, description = "Unknown season")
    )
)]
pub async fn generate_season(
    State(state): State<AdminAppState>,
    Path(name): Path<String>,
) -> Created<GenerationReportDto> {
    let report = state
        .generation
        .generate_for_season(&name)
        .await
        .map_err(domain_error)?;
    created(report.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/slots/clean-future",
    tag = "Admin",
    responses((status = 200, description = "Future slots without bookings removed", body = ApiResponse<CleanReportDto>))
)]
pub async fn clean_future(State(state): State<AdminAppState>) -> ApiResult<CleanReportDto> {
    let deleted = state
        .generation
        .clean_future_unbooked()
        .await
        .map_err(domain_error)?;
    ok(CleanReportDto { deleted })
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/slots/reset/season/{name}",
    tag = "Admin",
    params(("name" = String, Path, description = "Configured season name")),
    responses(
        (status = 200, description = "Cleanup and regeneration counts", body = ApiResponse<ResetReportDto>),
        (status = 404, description = "Unknown season")
    )
)]
pub async fn reset_season(
    State(state): State<AdminAppState>,
    Path(name): Path<String>,
) -> ApiResult<ResetReportDto> {
    let report = state
        .generation
        .reset_season(&name)
        .await
        .map_err(domain_error)?;
    ok(report.into())
}
