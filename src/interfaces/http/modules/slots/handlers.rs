//! Slot HTTP handlers

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::SlotService;
use crate::domain::Slot;
use crate::interfaces::http::common::{
    domain_error, ok, parse_date, query_error, ApiError, ApiResponse, ApiResult, ValidatedJson,
};

use super::dto::*;

#[derive(Clone)]
pub struct SlotAppState {
    pub slots: Arc<SlotService>,
}

fn dtos(slots: Vec<Slot>) -> Vec<SlotDto> {
    slots.into_iter().map(SlotDto::from).collect()
}

fn filter(params: Result<Query<AvailabilityFilter>, QueryRejection>) -> Result<bool, ApiError> {
    params.map(|Query(f)| f.available_only).map_err(query_error)
}

#[utoipa::path(
    get,
    path = "/api/v1/slots",
    tag = "Slots",
    params(AvailabilityFilter),
    responses((status = 200, description = "All slots by start time", body = ApiResponse<Vec<SlotDto>>))
)]
pub async fn list_slots(
    State(state): State<SlotAppState>,
    params: Result<Query<AvailabilityFilter>, QueryRejection>,
) -> ApiResult<Vec<SlotDto>> {
    let available_only = filter(params)?;
    let slots = state.slots.list(available_only).await.map_err(domain_error)?;
    ok(dtos(slots))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/{id}",
    tag = "Slots",
    params(("id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Slot", body = ApiResponse<SlotDto>),
        (status = 404, description = "Slot not found")
    )
)]
pub async fn get_slot(State(state): State<SlotAppState>, Path(id): Path<i32>) -> ApiResult<SlotDto> {
    let slot = state.slots.get(id).await.map_err(domain_error)?;
    ok(slot.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/{id}/available",
    tag = "Slots",
    params(("id" = i32, Path, description = "Slot ID")),
    responses(
        (status = 200, description = "Availability", body = ApiResponse<SlotAvailabilityDto>),
        (status = 404, description = "Slot not found")
    )
)]
pub async fn slot_availability(
    State(state): State<SlotAppState>,
    Path(id): Path<i32>,
) -> ApiResult<SlotAvailabilityDto> {
    let slot = state.slots.get(id).await.map_err(domain_error)?;
    ok(SlotAvailabilityDto {
        slot_id: slot.id,
        available: slot.is_available(),
        remaining_capacity: slot.remaining_capacity(),
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/day/{date}",
    tag = "Slots",
    params(("date" = String, Path, description = "YYYY-MM-DD"), AvailabilityFilter),
    responses(
        (status = 200, description = "Slots starting that day", body = ApiResponse<Vec<SlotDto>>),
        (status = 400, description = "Invalid date")
    )
)]
pub async fn slots_for_day(
    State(state): State<SlotAppState>,
    Path(date): Path<String>,
    params: Result<Query<AvailabilityFilter>, QueryRejection>,
) -> ApiResult<Vec<SlotDto>> {
    let date = parse_date(&date)?;
    let available_only = filter(params)?;
    let slots = state
        .slots
        .for_day(date, available_only)
        .await
        .map_err(domain_error)?;
    ok(dtos(slots))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/week/{date}",
    tag = "Slots",
    params(("date" = String, Path, description = "Any day of the week, YYYY-MM-DD"), AvailabilityFilter),
    responses(
        (status = 200, description = "Slots from Monday to Sunday", body = ApiResponse<Vec<SlotDto>>),
        (status = 400, description = "Invalid date")
    )
)]
pub async fn slots_for_week(
    State(state): State<SlotAppState>,
    Path(date): Path<String>,
    params: Result<Query<AvailabilityFilter>, QueryRejection>,
) -> ApiResult<Vec<SlotDto>> {
    let date = parse_date(&date)?;
    let available_only = filter(params)?;
    let slots = state
        .slots
        .for_week(date, available_only)
        .await
        .map_err(domain_error)?;
    ok(dtos(slots))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/range",
    tag = "Slots",
    params(SlotRangeParams),
    responses(
        (status = 200, description = "Slots inside the range", body = ApiResponse<Vec<SlotDto>>),
        (status = 400, description = "Invalid range")
    )
)]
pub async fn slots_in_range(
    State(state): State<SlotAppState>,
    params: Result<Query<SlotRangeParams>, QueryRejection>,
) -> ApiResult<Vec<SlotDto>> {
    let Query(params) = params.map_err(query_error)?;
    let slots = state
        .slots
        .in_range(params.from, params.to, params.available_only)
        .await
        .map_err(domain_error)?;
    ok(dtos(slots))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/future",
    tag = "Slots",
    responses((status = 200, description = "Slots starting after now", body = ApiResponse<Vec<SlotDto>>))
)]
pub async fn future_slots(State(state): State<SlotAppState>) -> ApiResult<Vec<SlotDto>> {
    let slots = state.slots.future().await.map_err(domain_error)?;
    ok(dtos(slots))
}

#[utoipa::path(
    get,
    path = "/api/v1/slots/past",
    tag = "Slots",
    responses((status = 200, description = "Slots that ended, most recent first", body = ApiResponse<Vec<SlotDto>>))
)]
pub async fn past_slots(State(state): State<SlotAppState>) -> ApiResult<Vec<SlotDto>> {
    let slots = state.slots.past().await.map_err(domain_error)?;
    ok(dtos(slots))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots",
    tag = "Slots",
    request_body = CreateSlotRequest,
    responses(
        (status = 201, description = "Slot created", body = ApiResponse<SlotDto>),
        (status = 400, description = "Invalid slot")
    )
)]
pub async fn create_slot(
    State(state): State<SlotAppState>,
    ValidatedJson(req): ValidatedJson<CreateSlotRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SlotDto>>), ApiError> {
    let slot = state
        .slots
        .create_slot(req.start_time, req.end_time, req.capacity)
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(slot.into()))))
}

#[utoipa::path(
    post,
    path = "/api/v1/slots/generate",
    tag = "Slots",
    request_body = GenerateSlotsRequest,
    responses(
        (status = 201, description = "Slots created", body = ApiResponse<Vec<SlotDto>>),
        (status = 400, description = "Invalid range or duration")
    )
)]
pub async fn generate_slots(
    State(state): State<SlotAppState>,
    ValidatedJson(req): ValidatedJson<GenerateSlotsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<SlotDto>>>), ApiError> {
    let slots = state
        .slots
        .generate_between(
            req.start_time,
            req.end_time,
            chrono::Duration::minutes(req.duration_minutes),
        )
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(dtos(slots)))))
}

#[utoipa::path(
    put,
    path = "/api/v1/slots/{id}/open",
    tag = "Slots",
    params(("id" = i32, Path, description = "Slot ID")),
    request_body = SetOpenRequest,
    responses(
        (status = 200, description = "Updated slot", body = ApiResponse<SlotDto>),
        (status = 404, description = "Slot not found")
    )
)]
pub async fn set_slot_open(
    State(state): State<SlotAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<SetOpenRequest>,
) -> ApiResult<SlotDto> {
    let slot = state
        .slots
        .set_open(id, req.is_open)
        .await
        .map_err(domain_error)?;
    ok(slot.into())
}
