//! API Router with Swagger UI

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{BookingService, SlotGenerationService, SlotService};
use crate::config::CalendarConfig;
use crate::domain::{DomainResult, RepositoryProvider};
use crate::infrastructure::SeaOrmRepositoryProvider;
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::modules::{admin, bookings, health, metrics, request_id, slots};

/// Everything the HTTP layer needs. Handlers pull their own slice of it
/// through `FromRef`.
#[derive(Clone)]
pub struct AppServices {
    pub slots: Arc<SlotService>,
    pub generation: Arc<SlotGenerationService>,
    pub bookings: Arc<BookingService>,
    pub db: DatabaseConnection,
    pub metrics: PrometheusHandle,
    pub started_at: Arc<Instant>,
}

impl AppServices {
    pub fn new(
        db: DatabaseConnection,
        calendar: CalendarConfig,
        transaction_timeout: Duration,
        metrics: PrometheusHandle,
    ) -> DomainResult<Self> {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        Ok(Self {
            slots: Arc::new(SlotService::new(repos.clone(), transaction_timeout)),
            generation: Arc::new(SlotGenerationService::new(
                repos.clone(),
                calendar,
                transaction_timeout,
            )?),
            bookings: Arc::new(BookingService::new(repos, transaction_timeout)),
            db,
            metrics,
            started_at: Arc::new(Instant::now()),
        })
    }
}

impl FromRef<AppServices> for slots::SlotAppState {
    fn from_ref(s: &AppServices) -> Self {
        slots::SlotAppState {
            slots: Arc::clone(&s.slots),
        }
    }
}

impl FromRef<AppServices> for bookings::BookingAppState {
    fn from_ref(s: &AppServices) -> Self {
        bookings::BookingAppState {
            bookings: Arc::clone(&s.bookings),
        }
    }
}

impl FromRef<AppServices> for admin::AdminAppState {
    fn from_ref(s: &AppServices) -> Self {
        admin::AdminAppState {
            generation: Arc::clone(&s.generation),
        }
    }
}

impl FromRef<AppServices> for health::HealthState {
    fn from_ref(s: &AppServices) -> Self {
        health::HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<AppServices> for metrics::MetricsState {
    fn from_ref(s: &AppServices) -> Self {
        metrics::MetricsState {
            handle: s.metrics.clone(),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Slots
        slots::list_slots,
        slots::get_slot,
        slots::slot_availability,
        slots::slots_for_day,
        slots::slots_for_week,
        slots::slots_in_range,
        slots::future_slots,
        slots::past_slots,
        slots::create_slot,
        slots::generate_slots,
        slots::set_slot_open,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::get_booking,
        bookings::bookings_by_plate,
        bookings::bookings_by_phone,
        bookings::bookings_for_day,
        bookings::bookings_for_week,
        bookings::bookings_in_range,
        bookings::future_bookings,
        bookings::past_bookings,
        bookings::update_booking_status,
        bookings::confirm_booking,
        bookings::cancel_booking,
        bookings::complete_booking,
        bookings::delete_booking,
        // Admin
        admin::generate_day,
        admin::generate_range,
        admin::generate_month,
        admin::generate_season,
        admin::clean_future,
        admin::reset_season,
    ),
    components(
        schemas(
            ApiResponse<String>,
            EmptyData,
            health::HealthResponse,
            health::ComponentHealth,
            slots::SlotDto,
            slots::SlotAvailabilityDto,
            slots::CreateSlotRequest,
            slots::GenerateSlotsRequest,
            slots::SetOpenRequest,
            bookings::VehicleTypeDto,
            bookings::BookingStatusDto,
            bookings::CreateBookingRequest,
            bookings::UpdateStatusRequest,
            bookings::BookingDto,
            admin::GenerateDayRequest,
            admin::GenerateRangeRequest,
            admin::GenerationReportDto,
            admin::CleanReportDto,
            admin::ResetReportDto,
        )
    ),
    tags(
        (name = "Health", description = "Server health check endpoints"),
        (name = "Slots", description = "Slot calendar: availability, day/week/range views, direct creation, open/close override"),
        (name = "Bookings", description = "Customer bookings: create, look up, status changes, deletion"),
        (name = "Admin", description = "Calendar generation by day, range, month or season and cleanup of unbooked future slots"),
    ),
    info(
        title = "Garage Booking API",
        version = "1.0.0",
        description = "REST API for garage appointment slots and bookings",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

fn slot_routes() -> Router<AppServices> {
    Router::new()
        .route("/", get(slots::list_slots).post(slots::create_slot))
        .route("/day/{date}", get(slots::slots_for_day))
        .route("/week/{date}", get(slots::slots_for_week))
        .route("/range", get(slots::slots_in_range))
        .route("/future", get(slots::future_slots))
        .route("/past", get(slots::past_slots))
        .route("/generate", post(slots::generate_slots))
        .route("/{id}", get(slots::get_slot))
        .route("/{id}/available", get(slots::slot_availability))
        .route("/{id}/open", put(slots::set_slot_open))
}

fn booking_routes() -> Router<AppServices> {
    Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/plate/{plate}", get(bookings::bookings_by_plate))
        .route("/phone/{phone}", get(bookings::bookings_by_phone))
        .route("/day/{date}", get(bookings::bookings_for_day))
        .route("/week/{date}", get(bookings::bookings_for_week))
        .route("/range", get(bookings::bookings_in_range))
        .route("/future", get(bookings::future_bookings))
        .route("/past", get(bookings::past_bookings))
        .route(
            "/{id}",
            get(bookings::get_booking).delete(bookings::delete_booking),
        )
        .route("/{id}/status", put(bookings::update_booking_status))
        .route("/{id}/confirm", put(bookings::confirm_booking))
        .route("/{id}/cancel", put(bookings::cancel_booking))
        .route("/{id}/complete", put(bookings::complete_booking))
}

fn admin_routes() -> Router<AppServices> {
    Router::new()
        .route("/generate/day", post(admin::generate_day))
        .route("/generate/range", post(admin::generate_range))
        .route("/generate/month", post(admin::generate_month))
        .route("/generate/season/{name}", post(admin::generate_season))
        .route("/clean-future", delete(admin::clean_future))
        .route("/reset/season/{name}", post(admin::reset_season))
}

/// Create the API router with all routes
pub fn create_api_router(services: AppServices) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .nest("/api/v1/slots", slot_routes())
        .nest("/api/v1/bookings", booking_routes())
        .nest("/api/v1/admin/slots", admin_routes())
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .with_state(services)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration as ChronoDuration, Utc};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::{json, Value};

    use crate::infrastructure::database::memory_db;

    async fn app() -> Router {
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let services = AppServices::new(
            memory_db().await,
            CalendarConfig::default(),
            Duration::from_secs(5),
            handle,
        )
        .unwrap();
        create_api_router(services)
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        use tower::Service;
        let mut svc = app.clone().into_service();
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                builder = builder.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = svc.call(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn create_slot(app: &Router, capacity: i32) -> i64 {
        let start = Utc::now() + ChronoDuration::days(3);
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/slots",
            Some(json!({
                "start_time": start.to_rfc3339(),
                "end_time": (start + ChronoDuration::hours(1)).to_rfc3339(),
                "capacity": capacity,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_i64().unwrap()
    }

    fn booking(slot_id: i64, plate: &str, phone: &str) -> Value {
        json!({
            "slot_id": slot_id,
            "plate": plate,
            "mileage": 85000,
            "vehicle_type": "Car",
            "phone": phone,
            "email": "client@example.com",
        })
    }

    #[tokio::test]
    async fn full_slot_answers_409() {
        let app = app().await;
        let slot_id = create_slot(&app, 1).await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(booking(slot_id, "AB-123-CD", "0612345678")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["success"], true);

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(booking(slot_id, "EF-456-GH", "0698765432")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);

        let (status, body) = send(&app, "GET", &format!("/api/v1/slots/{slot_id}/available"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["available"], false);
    }

    #[tokio::test]
    async fn malformed_phone_answers_400() {
        let app = app().await;
        let slot_id = create_slot(&app, 2).await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/bookings",
            Some(booking(slot_id, "AB-123-CD", "call me")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("phone"));
    }

    #[tokio::test]
    async fn unknown_ids_answer_404() {
        let app = app().await;
        let (status, _) = send(&app, "GET", "/api/v1/slots/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "PUT", "/api/v1/bookings/999/cancel", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "POST", "/api/v1/admin/slots/generate/season/none", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_date_answers_400() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/api/v1/slots/day/13-45-2030", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn health_reports_database_ok() {
        let app = app().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"]["status"], "ok");
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text() {
        use tower::Service;
        let app = app().await;
        let mut svc = app.into_service();
        let resp = svc
            .call(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        use tower::Service;
        let app = app().await;
        let mut svc = app.into_service();
        let req = Request::builder()
            .uri("/health")
            .header(request_id::REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        let resp = svc.call(req).await.unwrap();
        assert_eq!(
            resp.headers().get(request_id::REQUEST_ID_HEADER).unwrap(),
            "abc-123"
        );
    }
}
