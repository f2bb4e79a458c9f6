use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod choices;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod policy;
pub mod reports;
pub mod repository;
pub mod storage;

// Routing split by required authentication (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use identity::{IdentityState, MockIdentity, SupabaseIdentity};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document for every route, served at `/api-docs/openapi.json` and
/// browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::get_me, handlers::users::list_users, handlers::users::get_user,
        handlers::users::create_user, handlers::users::update_user, handlers::users::delete_user,
        handlers::documents::get_presigned_url, handlers::documents::list_documents,
        handlers::documents::get_document, handlers::documents::create_document,
        handlers::documents::delete_document,
        handlers::dashboard::get_overview, handlers::dashboard::get_stats, handlers::dashboard::get_chart_data,
        handlers::dashboard::get_notifications, handlers::dashboard::get_summary,
        handlers::dashboard::get_suggestions, handlers::dashboard::get_timeline,
        handlers::dashboard::get_calendar,
        handlers::districts::list_districts, handlers::districts::get_district,
        handlers::districts::create_district, handlers::districts::update_district,
        handlers::districts::delete_district,
        handlers::initiatives::list_initiatives, handlers::initiatives::get_initiative,
        handlers::initiatives::create_initiative, handlers::initiatives::update_initiative,
        handlers::initiatives::delete_initiative, handlers::initiatives::add_sheet,
        handlers::initiatives::add_event,
        handlers::tasks::list_tasks, handlers::tasks::get_task, handlers::tasks::create_task,
        handlers::tasks::update_task, handlers::tasks::delete_task, handlers::tasks::update_task_status,
        handlers::notes::list_notes, handlers::notes::get_note, handlers::notes::create_note,
        handlers::notes::update_note, handlers::notes::delete_note,
        handlers::reports::initiatives_report, handlers::reports::tasks_report, handlers::reports::export_csv
    ),
    components(
        schemas(
            choices::Role, choices::InitiativeStatus, choices::InitiativeType, choices::TaskPriority,
            choices::TaskStatus, choices::NoteType,
            models::District, models::User, models::Initiative, models::Task, models::Note,
            models::Document, models::InitiativeSheet, models::Event,
            models::CreateDistrictRequest, models::UpdateDistrictRequest,
            models::CreateInitiativeRequest, models::UpdateInitiativeRequest,
            models::CreateTaskRequest, models::UpdateTaskRequest, models::TaskStatusForm,
            models::StatusUpdateResponse, models::CreateNoteRequest, models::UpdateNoteRequest,
            models::CreateDocumentRequest, models::CreateSheetRequest, models::CreateEventRequest,
            models::CreateUserRequest, models::UpdateUserRequest, models::UploadPurpose,
            models::PresignedUrlRequest, models::PresignedUrlResponse,
            models::DistrictDetail, models::InitiativeDetail, models::TaskDetail,
            reports::DashboardStats, reports::ChartData, reports::ChartDataset,
            reports::InitiativeReportRow, reports::TasksReport, reports::Notification,
            reports::NotificationsResponse, reports::Summary, reports::Suggestion,
            reports::SuggestionKind, reports::SuggestionsResponse, reports::CalendarEntry,
            reports::CalendarEntryKind, reports::DashboardOverview,
        )
    ),
    tags(
        (name = "district-dashboard", description = "District initiative and task tracking API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container for every service a handler may need. Cloning is
/// cheap: each field is an `Arc` or small config value.
#[derive(Clone)]
pub struct AppState {
    /// Persistence, Postgres in production and in-memory in tests.
    pub repo: RepositoryState,
    /// Object storage for presigned uploads and object size lookups.
    pub storage: StorageState,
    /// External auth service used when an admin creates an account.
    pub identity: IdentityState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        app_state.identity.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 before routing if `AuthUser` cannot be resolved.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles public, authenticated and admin routes, applies the authentication
/// layer to the latter two, and wraps everything in the request-id, tracing and
/// CORS stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Every log line emitted while serving a request carries its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
