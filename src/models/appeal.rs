use crate::models::verification::VerificationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// An appeal against a rejected verification. `verification_id` is a
/// back-reference, not ownership: reviewing the appeal cascades a mirrored
/// transition onto the referenced verification on a best-effort basis. The
/// evidence URLs are denormalized copies kept for display in the review
/// queue.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AppealRecord {
    pub id: Uuid,
    pub verification_id: Uuid,
    pub subject_id: String,
    pub subject_email: String,
    pub id_document_url: String,
    pub residency_proof_url: String,
    pub selfie_url: String,
    pub message: String,
    pub status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub comment: Option<String>,
}
