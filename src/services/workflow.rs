use crate::database::sqlite::SqliteDatabase;
use crate::errors::{AppError, Result};
use crate::models::appeal::AppealRecord;
use crate::models::verification::{VerificationRecord, VerificationStatus};
use crate::services::identity::VerifiedIdentity;
use crate::services::vault::StoredEvidence;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// The verification/appeal state machine. All record mutations go through
/// here; handlers only gate on identity and role.
pub struct VerificationWorkflow {
    store: Arc<SqliteDatabase>,
}

impl VerificationWorkflow {
    pub fn new(store: Arc<SqliteDatabase>) -> Self {
        Self { store }
    }

    /// Guard: at most one pending verification per subject. Read-then-write,
    /// so two racing submissions can both pass; best-effort, not a
    /// transactional guarantee.
    pub async fn ensure_no_pending(&self, subject_id: &str) -> Result<()> {
        if let Some(latest) = self.store.latest_verification_for_subject(subject_id).await? {
            if latest.status == VerificationStatus::Pending {
                return Err(AppError::Conflict(
                    "You already have a pending verification. Please wait for admin review."
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    pub async fn submit(
        &self,
        identity: &VerifiedIdentity,
        id_document: StoredEvidence,
        residency_proof: StoredEvidence,
        selfie: StoredEvidence,
    ) -> Result<VerificationRecord> {
        self.ensure_no_pending(&identity.subject_id).await?;

        let record = VerificationRecord {
            id: Uuid::new_v4(),
            subject_id: identity.subject_id.clone(),
            subject_email: identity.email.clone(),
            id_document_url: id_document.url,
            residency_proof_url: residency_proof.url,
            selfie_url: selfie.url,
            status: VerificationStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
            comment: None,
            appeal_message: None,
            appealed_at: None,
        };
        self.store.create_verification(&record).await?;
        info!(action = "verification_submitted", subject = %record.subject_id, id = %record.id);
        Ok(record)
    }

    pub async fn latest_for_subject(
        &self,
        subject_id: &str,
    ) -> Result<Option<VerificationRecord>> {
        self.store.latest_verification_for_subject(subject_id).await
    }

    pub async fn approve_verification(&self, id: &Uuid) -> Result<()> {
        let record = self
            .store
            .get_verification(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Verification not found".to_string()))?;
        if record.status != VerificationStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Only pending verifications can be approved (current status: {})",
                record.status
            )));
        }
        self.store
            .update_verification_review(id, VerificationStatus::Approved, Utc::now(), None)
            .await?;
        info!(action = "verification_approved", id = %id);
        Ok(())
    }

    pub async fn reject_verification(&self, id: &Uuid, comment: &str) -> Result<()> {
        let record = self
            .store
            .get_verification(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Verification not found".to_string()))?;
        if record.status != VerificationStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Only pending verifications can be rejected (current status: {})",
                record.status
            )));
        }
        self.store
            .update_verification_review(id, VerificationStatus::Rejected, Utc::now(), Some(comment))
            .await?;
        info!(action = "verification_rejected", id = %id);
        Ok(())
    }

    /// Files an appeal against the subject's latest verification, which must
    /// be rejected. Creates the appeal record and reopens the verification
    /// for a fresh review cycle (pending again, review fields cleared).
    pub async fn file_appeal(
        &self,
        identity: &VerifiedIdentity,
        message: &str,
    ) -> Result<AppealRecord> {
        let latest = self
            .store
            .latest_verification_for_subject(&identity.subject_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No verification found to appeal".to_string()))?;
        if latest.status != VerificationStatus::Rejected {
            return Err(AppError::InvalidState(
                "Only rejected verifications can be appealed".to_string(),
            ));
        }

        let now = Utc::now();
        let appeal = AppealRecord {
            id: Uuid::new_v4(),
            verification_id: latest.id,
            subject_id: latest.subject_id.clone(),
            subject_email: latest.subject_email.clone(),
            id_document_url: latest.id_document_url.clone(),
            residency_proof_url: latest.residency_proof_url.clone(),
            selfie_url: latest.selfie_url.clone(),
            message: message.to_string(),
            status: VerificationStatus::Pending,
            created_at: now,
            reviewed_at: None,
            comment: None,
        };
        self.store.create_appeal(&appeal).await?;
        self.store
            .reopen_verification(&latest.id, message, now)
            .await?;
        info!(action = "appeal_filed", subject = %identity.subject_id, verification = %latest.id, appeal = %appeal.id);
        Ok(appeal)
    }

    pub async fn approve_appeal(&self, id: &Uuid) -> Result<()> {
        let appeal = self
            .store
            .get_appeal(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appeal not found".to_string()))?;
        if appeal.status != VerificationStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Only pending appeals can be approved (current status: {})",
                appeal.status
            )));
        }
        self.store
            .update_appeal_review(id, VerificationStatus::Approved, Utc::now(), None)
            .await?;
        info!(action = "appeal_approved", id = %id);
        self.cascade_review(&appeal, VerificationStatus::Approved, None)
            .await;
        Ok(())
    }

    pub async fn reject_appeal(&self, id: &Uuid, comment: &str) -> Result<()> {
        let appeal = self
            .store
            .get_appeal(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appeal not found".to_string()))?;
        if appeal.status != VerificationStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Only pending appeals can be rejected (current status: {})",
                appeal.status
            )));
        }
        self.store
            .update_appeal_review(id, VerificationStatus::Rejected, Utc::now(), Some(comment))
            .await?;
        info!(action = "appeal_rejected", id = %id);
        self.cascade_review(&appeal, VerificationStatus::Rejected, Some(comment))
            .await;
        Ok(())
    }

    /// Best-effort mirror onto the linked verification. The appeal's own
    /// review has already committed; a failed cascade is logged, not raised.
    async fn cascade_review(
        &self,
        appeal: &AppealRecord,
        status: VerificationStatus,
        comment: Option<&str>,
    ) {
        if let Err(e) = self
            .store
            .update_verification_review(&appeal.verification_id, status, Utc::now(), comment)
            .await
        {
            warn!(action = "appeal_cascade_failed", appeal = %appeal.id, verification = %appeal.verification_id, error = %e);
        }
    }

    /// Administrative override, independent of the workflow.
    pub async fn delete_verification(&self, id: &Uuid) -> Result<()> {
        if !self.store.delete_verification(id).await? {
            return Err(AppError::NotFound("Verification not found".to_string()));
        }
        info!(action = "verification_deleted", id = %id);
        Ok(())
    }
}
