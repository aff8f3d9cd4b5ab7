use crate::api::types::*;
use crate::api::AppState;
use crate::errors::{AppError, Result};
use axum::extract::{FromRequestParts, Multipart, Path, Query, State};
use axum::http::{header::AUTHORIZATION, request::Parts, StatusCode};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tracing::info;
use uuid::Uuid;

// Bearer extractor for Authorization: Bearer ...
pub struct AuthBearer(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        if let Some(auth) = parts.headers.get(AUTHORIZATION) {
            if let Ok(auth_str) = auth.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    return Ok(AuthBearer(token.trim().to_string()));
                }
            }
        }
        Err(AppError::Unauthenticated(
            "Missing or invalid Authorization header".to_string(),
        ))
    }
}

fn require_admin(state: &AppState, token: &str) -> Result<()> {
    if state.identity.admin_from_bearer(token) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin privileges required".to_string()))
    }
}

/// Subject-facing verification endpoints
pub fn verification_router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_verification))
        .route("/mine", get(my_verification))
        .route("/appeal", post(file_appeal))
        .route("/file/:subject_id/:file_name", get(get_verification_file))
}

/// Admin review endpoints
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/verification/list", get(admin_list_verifications))
        .route("/verification/stats", get(admin_verification_stats))
        .route("/verification/:id/approve", post(admin_approve_verification))
        .route("/verification/:id/reject", post(admin_reject_verification))
        .route("/verification/:id", delete(admin_delete_verification))
        .route("/appeal/list", get(admin_list_appeals))
        .route("/appeal/stats", get(admin_appeal_stats))
        .route("/appeal/:id/approve", post(admin_approve_appeal))
        .route("/appeal/:id/reject", post(admin_reject_appeal))
        .route("/debug/token", get(debug_token))
}

#[utoipa::path(
    post,
    path = "/api/verification",
    responses(
        (status = 200, body = SubmitVerificationResponse, description = "Verification submitted"),
        (status = 400, description = "Missing or invalid evidence files"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 409, description = "A pending verification already exists")
    ),
    tag = "Verification"
)]
pub async fn submit_verification(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    mut multipart: Multipart,
) -> Result<Json<SubmitVerificationResponse>> {
    let identity = state.identity.verify(&token)?;

    // Guard before touching storage so a duplicate submission leaves no
    // orphaned files; submit() re-checks before the write.
    state.workflow.ensure_no_pending(&identity.subject_id).await?;

    let mut id_file: Option<(String, Vec<u8>)> = None;
    let mut proof_file: Option<(String, Vec<u8>)> = None;
    let mut selfie_file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidUpload(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidUpload(format!("Failed to read file part: {}", e)))?;
        match name.as_str() {
            "idFile" | "idDocument" => id_file = Some((file_name, data.to_vec())),
            "proofFile" | "proofOfResidence" => proof_file = Some((file_name, data.to_vec())),
            "selfieFile" | "selfie" => selfie_file = Some((file_name, data.to_vec())),
            _ => {}
        }
    }

    let missing = || {
        AppError::InvalidUpload("idFile, proofFile and selfieFile are all required".to_string())
    };
    let (id_name, id_bytes) = id_file.ok_or_else(missing)?;
    let (proof_name, proof_bytes) = proof_file.ok_or_else(missing)?;
    let (selfie_name, selfie_bytes) = selfie_file.ok_or_else(missing)?;

    let id_document = state
        .vault
        .store(&identity.subject_id, &id_bytes, &id_name)
        .await?;
    let residency_proof = state
        .vault
        .store(&identity.subject_id, &proof_bytes, &proof_name)
        .await?;
    let selfie = state
        .vault
        .store(&identity.subject_id, &selfie_bytes, &selfie_name)
        .await?;

    let record = state
        .workflow
        .submit(&identity, id_document, residency_proof, selfie)
        .await?;

    Ok(Json(SubmitVerificationResponse {
        success: true,
        message: "Verification submitted.".to_string(),
        id: record.id,
        id_document_url: record.id_document_url,
        residency_proof_url: record.residency_proof_url,
        selfie_url: record.selfie_url,
    }))
}

#[utoipa::path(
    get,
    path = "/api/verification/mine",
    responses(
        (status = 200, body = MyVerificationResponse, description = "Latest verification for the caller, if any"),
        (status = 401, description = "Missing or invalid credential")
    ),
    tag = "Verification"
)]
pub async fn my_verification(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<MyVerificationResponse>> {
    let identity = state.identity.verify(&token)?;
    let verification = state
        .workflow
        .latest_for_subject(&identity.subject_id)
        .await?;
    Ok(Json(MyVerificationResponse {
        has_verification: verification.is_some(),
        verification,
    }))
}

#[utoipa::path(
    post,
    path = "/api/verification/appeal",
    request_body = AppealRequest,
    responses(
        (status = 200, body = AppealResponse, description = "Appeal filed, verification pending again"),
        (status = 400, description = "Latest verification is not rejected"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 404, description = "No verification to appeal")
    ),
    tag = "Verification"
)]
pub async fn file_appeal(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Json(req): Json<AppealRequest>,
) -> Result<Json<AppealResponse>> {
    let identity = state.identity.verify(&token)?;
    let message = req.message.unwrap_or_default();
    let appeal = state.workflow.file_appeal(&identity, &message).await?;
    Ok(Json(AppealResponse {
        success: true,
        message: "Appeal submitted, verification is now pending.".to_string(),
        appeal_id: appeal.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/verification/file/{subject_id}/{file_name}",
    responses(
        (status = 200, description = "Evidence file bytes"),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Requester is neither the owner nor an admin"),
        (status = 404, description = "File not found")
    ),
    params(
        ("subject_id" = String, Path, description = "Owning subject"),
        ("file_name" = String, Path, description = "Stored evidence file name")
    ),
    tag = "Verification"
)]
pub async fn get_verification_file(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Path((subject_id, file_name)): Path<(String, String)>,
) -> Result<Response> {
    let identity = state.identity.verify(&token)?;
    let (bytes, content_type) = state
        .vault
        .retrieve(&identity, &subject_id, &file_name)
        .await?;
    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", file_name),
        )
        .body(axum::body::Body::from(bytes))
        .map_err(|e| AppError::Internal(format!("Failed to build file response: {}", e)))
}

#[utoipa::path(
    get,
    path = "/api/admin/verification/list",
    params(ListQuery),
    responses(
        (status = 200, body = VerificationListResponse),
        (status = 400, description = "Bad status or stale cursor"),
        (status = 403, description = "Admin privileges required")
    ),
    tag = "Admin"
)]
pub async fn admin_list_verifications(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Query(query): Query<ListQuery>,
) -> Result<Json<VerificationListResponse>> {
    require_admin(&state, &token)?;
    let status = query.status.parse()?;
    let page = state
        .queues
        .list_verifications(status, query.page_size, query.cursor)
        .await?;
    Ok(Json(VerificationListResponse {
        items: page.items,
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/verification/stats",
    responses(
        (status = 200, body = StatsResponse),
        (status = 403, description = "Admin privileges required")
    ),
    tag = "Admin"
)]
pub async fn admin_verification_stats(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<StatsResponse>> {
    require_admin(&state, &token)?;
    let counts = state.queues.verification_stats().await?;
    Ok(Json(StatsResponse {
        pending: counts.pending,
        approved: counts.approved,
        rejected: counts.rejected,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/verification/{id}/approve",
    responses(
        (status = 200, body = ReviewResponse),
        (status = 400, description = "Verification is not pending"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Verification not found")
    ),
    params(("id" = Uuid, Path, description = "Verification id")),
    tag = "Admin"
)]
pub async fn admin_approve_verification(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>> {
    require_admin(&state, &token)?;
    state.workflow.approve_verification(&id).await?;
    Ok(Json(ReviewResponse {
        message: "Verification approved.".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/verification/{id}/reject",
    request_body = RejectRequest,
    responses(
        (status = 200, body = ReviewResponse),
        (status = 400, description = "Verification is not pending"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Verification not found")
    ),
    params(("id" = Uuid, Path, description = "Verification id")),
    tag = "Admin"
)]
pub async fn admin_reject_verification(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<ReviewResponse>> {
    require_admin(&state, &token)?;
    let reason = req.reason.unwrap_or_default();
    state.workflow.reject_verification(&id, &reason).await?;
    Ok(Json(ReviewResponse {
        message: "Verification rejected.".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/verification/{id}",
    responses(
        (status = 200, body = ReviewResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Verification not found")
    ),
    params(("id" = Uuid, Path, description = "Verification id")),
    tag = "Admin"
)]
pub async fn admin_delete_verification(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>> {
    require_admin(&state, &token)?;
    state.workflow.delete_verification(&id).await?;
    Ok(Json(ReviewResponse {
        message: "Verification deleted.".to_string(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/appeal/list",
    params(ListQuery),
    responses(
        (status = 200, body = AppealListResponse),
        (status = 400, description = "Bad status or stale cursor"),
        (status = 403, description = "Admin privileges required")
    ),
    tag = "Admin"
)]
pub async fn admin_list_appeals(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Query(query): Query<ListQuery>,
) -> Result<Json<AppealListResponse>> {
    require_admin(&state, &token)?;
    let status = query.status.parse()?;
    let page = state
        .queues
        .list_appeals(status, query.page_size, query.cursor)
        .await?;
    Ok(Json(AppealListResponse {
        items: page.items,
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/appeal/stats",
    responses(
        (status = 200, body = StatsResponse),
        (status = 403, description = "Admin privileges required")
    ),
    tag = "Admin"
)]
pub async fn admin_appeal_stats(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<StatsResponse>> {
    require_admin(&state, &token)?;
    let counts = state.queues.appeal_stats().await?;
    Ok(Json(StatsResponse {
        pending: counts.pending,
        approved: counts.approved,
        rejected: counts.rejected,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/appeal/{id}/approve",
    responses(
        (status = 200, body = ReviewResponse),
        (status = 400, description = "Appeal is not pending"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Appeal not found")
    ),
    params(("id" = Uuid, Path, description = "Appeal id")),
    tag = "Admin"
)]
pub async fn admin_approve_appeal(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Path(id): Path<Uuid>,
) -> Result<Json<ReviewResponse>> {
    require_admin(&state, &token)?;
    state.workflow.approve_appeal(&id).await?;
    Ok(Json(ReviewResponse {
        message: "Appeal approved.".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/appeal/{id}/reject",
    request_body = RejectRequest,
    responses(
        (status = 200, body = ReviewResponse),
        (status = 400, description = "Appeal is not pending"),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Appeal not found")
    ),
    params(("id" = Uuid, Path, description = "Appeal id")),
    tag = "Admin"
)]
pub async fn admin_reject_appeal(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
    Path(id): Path<Uuid>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<ReviewResponse>> {
    require_admin(&state, &token)?;
    let reason = req.reason.unwrap_or_default();
    state.workflow.reject_appeal(&id, &reason).await?;
    Ok(Json(ReviewResponse {
        message: "Appeal rejected.".to_string(),
    }))
}

// Credential introspection for local troubleshooting: verifies the
// presented token and echoes what the verifier extracted.
#[utoipa::path(
    get,
    path = "/api/admin/debug/token",
    responses(
        (status = 200, body = TokenDebugResponse),
        (status = 401, description = "Missing or invalid credential")
    ),
    tag = "Admin"
)]
pub async fn debug_token(
    State(state): State<AppState>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<TokenDebugResponse>> {
    let identity = state.identity.verify(&token)?;
    info!(action = "debug_token", subject = %identity.subject_id);
    Ok(Json(TokenDebugResponse {
        subject_id: identity.subject_id,
        email: identity.email,
        role: identity.role,
    }))
}
