use crate::models::appeal::AppealRecord;
use crate::models::verification::VerificationRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitVerificationResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
    pub id_document_url: String,
    pub residency_proof_url: String,
    pub selfie_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyVerificationResponse {
    pub has_verification: bool,
    pub verification: Option<VerificationRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AppealRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppealResponse {
    pub success: bool,
    pub message: String,
    pub appeal_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListQuery {
    /// pending | approved | rejected
    pub status: String,
    pub page_size: Option<i64>,
    /// Id of the last record of the previous page.
    pub cursor: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerificationListResponse {
    pub items: Vec<VerificationRecord>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppealListResponse {
    pub items: Vec<AppealRecord>,
    pub next_cursor: Option<Uuid>,
    pub has_more: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub pending: i64,
    pub approved: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenDebugResponse {
    pub subject_id: String,
    pub email: String,
    pub role: Option<String>,
}
