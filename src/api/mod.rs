use crate::config::AppConfig;
use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::services::identity::IdentityVerifier;
use crate::services::review_queue::ReviewQueueService;
use crate::services::vault::FileVault;
use crate::services::workflow::VerificationWorkflow;
use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::{Json, Router};
use hyper::Method;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, Instrument};
use utoipa::{Modify, OpenApi};
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub mod docs;
pub mod routes;
pub mod types;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::submit_verification,
        routes::my_verification,
        routes::file_appeal,
        routes::get_verification_file,
        routes::admin_list_verifications,
        routes::admin_verification_stats,
        routes::admin_approve_verification,
        routes::admin_reject_verification,
        routes::admin_delete_verification,
        routes::admin_list_appeals,
        routes::admin_appeal_stats,
        routes::admin_approve_appeal,
        routes::admin_reject_appeal,
        routes::debug_token,
    ),
    components(
        schemas(
            types::SubmitVerificationResponse,
            types::MyVerificationResponse,
            types::AppealRequest,
            types::AppealResponse,
            types::RejectRequest,
            types::ReviewResponse,
            types::VerificationListResponse,
            types::AppealListResponse,
            types::StatsResponse,
            types::TokenDebugResponse,
            crate::models::verification::VerificationRecord,
            crate::models::verification::VerificationStatus,
            crate::models::appeal::AppealRecord,
        )
    ),
    tags(
        (name = "Verification", description = "Identity-verification submission, appeal and evidence retrieval. All endpoints require a bearer credential."),
        (name = "Admin", description = "Review queues and state transitions. Requires the admin role claim.")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearerAuth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
        openapi.security = Some(vec![utoipa::openapi::security::SecurityRequirement::new(
            "bearerAuth",
            Vec::<String>::new(),
        )]);
    }
}

/// Shared handler dependencies, built once at startup. The store connection
/// and credential verifier are constructor dependencies, never ambient
/// singletons.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityVerifier>,
    pub vault: Arc<FileVault>,
    pub workflow: Arc<VerificationWorkflow>,
    pub queues: Arc<ReviewQueueService>,
}

impl AppState {
    pub fn build(
        store: Arc<SqliteDatabase>,
        identity: Arc<IdentityVerifier>,
        vault: Arc<FileVault>,
    ) -> Self {
        Self {
            identity,
            vault,
            workflow: Arc::new(VerificationWorkflow::new(store.clone())),
            queues: Arc::new(ReviewQueueService::new(store)),
        }
    }
}

pub async fn request_id_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());
    let span = tracing::info_span!("request", request_id = %request_id, method = %req.method(), uri = %req.uri());
    async move { next.run(req).await }.instrument(span).await
}

pub fn build_router(state: AppState, config: &AppConfig) -> Router {
    let openapi = ApiDoc::openapi();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .nest("/api/verification", routes::verification_router())
        .nest("/api/admin", routes::admin_router())
        .route("/health", axum::routing::get(health_check))
        // OpenAPI documentation routes
        .route("/docs/openapi.json", axum::routing::get(openapi_json))
        .route("/docs/markdown", axum::routing::get(api_markdown))
        .route("/docs", axum::routing::get(api_documentation))
        // Swagger UI
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", openapi.clone()))
        // Redoc UI
        .merge(Redoc::with_url("/api/redoc", openapi))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Main entry point for the API server: wires the store, verifier and vault
/// together and serves until shutdown.
pub async fn start_http_server(config: AppConfig) -> Result<()> {
    let store = Arc::new(SqliteDatabase::new(&config.database_path).await?);
    let identity = Arc::new(IdentityVerifier::new(&config.jwt_secret));
    let vault = Arc::new(FileVault::new(config.upload_root.clone()));
    let state = AppState::build(store, identity, vault);

    let requests_per_sec = config.rate_limit_per_sec;
    let app = build_router(state, &config).layer(axum::middleware::from_fn(
        move |req, next| crate::utils::middleware::per_ip_rate_limit(requests_per_sec, req, next),
    ));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address: {}", e)))?;

    info!(action = "http_server_started", addr = %addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Unavailable(format!("Failed to bind {}: {}", addr, e)))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Export OpenAPI specification as JSON
async fn openapi_json() -> Json<Value> {
    let openapi = ApiDoc::openapi();
    Json(serde_json::to_value(openapi).unwrap_or_default())
}

/// Serves the API documentation as downloadable Markdown.
async fn api_markdown() -> impl IntoResponse {
    let markdown = docs::generate_markdown_docs();
    axum::response::Response::builder()
        .header("Content-Type", "text/markdown")
        .header(
            "Content-Disposition",
            "attachment; filename=\"API_DOCUMENTATION.md\"",
        )
        .body(axum::body::Body::from(markdown))
        .unwrap_or_else(|_| axum::response::Response::new(axum::body::Body::empty()))
}

/// Serves the main API documentation HTML page.
async fn api_documentation() -> impl IntoResponse {
    axum::response::Html(docs::generate_documentation_html())
}
