//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::BookingService;
use crate::domain::{BookingStatus, BookingWithSlot};
use crate::interfaces::http::common::{
    domain_error, ok, parse_date, query_error, ApiError, ApiResponse, ApiResult, EmptyData,
    ValidatedJson,
};

use super::dto::*;

#[derive(Clone)]
pub struct BookingAppState {
    pub bookings: Arc<BookingService>,
}

fn dtos(bookings: Vec<BookingWithSlot>) -> Vec<BookingDto> {
    bookings.into_iter().map(BookingDto::from).collect()
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking reserved", body = ApiResponse<BookingDto>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Slot not found"),
        (status = 409, description = "Slot unavailable, duplicate plate, or concurrent update")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingDto>>), ApiError> {
    let created = state
        .bookings
        .create(req.into())
        .await
        .map_err(domain_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    responses((status = 200, description = "All bookings", body = ApiResponse<Vec<BookingDto>>))
)]
pub async fn list_bookings(State(state): State<BookingAppState>) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.bookings.list().await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<BookingDto> {
    let booking = state.bookings.get(id).await.map_err(domain_error)?;
    ok(booking.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/plate/{plate}",
    tag = "Bookings",
    params(("plate" = String, Path, description = "Vehicle plate")),
    responses((status = 200, description = "Bookings for the vehicle", body = ApiResponse<Vec<BookingDto>>))
)]
pub async fn bookings_by_plate(
    State(state): State<BookingAppState>,
    Path(plate): Path<String>,
) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.bookings.by_plate(&plate).await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/phone/{phone}",
    tag = "Bookings",
    params(("phone" = String, Path, description = "Contact phone")),
    responses((status = 200, description = "Bookings for the phone number", body = ApiResponse<Vec<BookingDto>>))
)]
pub async fn bookings_by_phone(
    State(state): State<BookingAppState>,
    Path(phone): Path<String>,
) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.bookings.by_phone(&phone).await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/day/{date}",
    tag = "Bookings",
    params(("date" = String, Path, description = "YYYY-MM-DD")),
    responses(
        (status = 200, description = "Bookings whose slot starts that day", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Invalid date")
    )
)]
pub async fn bookings_for_day(
    State(state): State<BookingAppState>,
    Path(date): Path<String>,
) -> ApiResult<Vec<BookingDto>> {
    let date = parse_date(&date)?;
    let bookings = state.bookings.for_day(date).await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/week/{date}",
    tag = "Bookings",
    params(("date" = String, Path, description = "Any day of the week, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Bookings from Monday to Sunday", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Invalid date")
    )
)]
pub async fn bookings_for_week(
    State(state): State<BookingAppState>,
    Path(date): Path<String>,
) -> ApiResult<Vec<BookingDto>> {
    let date = parse_date(&date)?;
    let bookings = state.bookings.for_week(date).await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/range",
    tag = "Bookings",
    params(BookingRangeParams),
    responses(
        (status = 200, description = "Bookings whose slot lies inside the range", body = ApiResponse<Vec<BookingDto>>),
        (status = 400, description = "Invalid range")
    )
)]
pub async fn bookings_in_range(
    State(state): State<BookingAppState>,
    params: Result<Query<BookingRangeParams>, QueryRejection>,
) -> ApiResult<Vec<BookingDto>> {
    let Query(params) = params.map_err(query_error)?;
    let bookings = state
        .bookings
        .in_range(params.from, params.to)
        .await
        .map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/future",
    tag = "Bookings",
    responses((status = 200, description = "Bookings on slots starting after now", body = ApiResponse<Vec<BookingDto>>))
)]
pub async fn future_bookings(State(state): State<BookingAppState>) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.bookings.future().await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/past",
    tag = "Bookings",
    responses((status = 200, description = "Bookings on slots that ended", body = ApiResponse<Vec<BookingDto>>))
)]
pub async fn past_bookings(State(state): State<BookingAppState>) -> ApiResult<Vec<BookingDto>> {
    let bookings = state.bookings.past().await.map_err(domain_error)?;
    ok(dtos(bookings))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/status",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Slot full when reactivating a cancelled booking")
    )
)]
pub async fn update_booking_status(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
    ValidatedJson(req): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<BookingDto> {
    let updated = state
        .bookings
        .update_status(id, BookingStatus::from(req.status))
        .await
        .map_err(domain_error)?;
    ok(updated.into())
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/confirm",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Confirmed booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn confirm_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<BookingDto> {
    let updated = state.bookings.confirm(id).await.map_err(domain_error)?;
    ok(updated.into())
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Cancelled booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<BookingDto> {
    let updated = state.bookings.cancel(id).await.map_err(domain_error)?;
    ok(updated.into())
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/complete",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Completed booking", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn complete_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<BookingDto> {
    let updated = state.bookings.complete(id).await.map_err(domain_error)?;
    ok(updated.into())
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = i32, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking deleted", body = ApiResponse<EmptyData>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<i32>,
) -> ApiResult<EmptyData> {
    state.bookings.delete(id).await.map_err(domain_error)?;
    ok(EmptyData {})
}
