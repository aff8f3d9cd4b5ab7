use crate::errors::{AppError, Result};
use crate::services::identity::{IdentityVerifier, VerifiedIdentity};
use crate::utils::validation::Validator;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// A stored evidence file: the on-disk name plus the authenticated retrieval
/// URL handed back to clients. Handles resolve only through `retrieve`.
#[derive(Debug, Clone)]
pub struct StoredEvidence {
    pub file_name: String,
    pub url: String,
}

/// Subject-scoped evidence storage. Files are personally identifying, so
/// this is the single choke point enforcing owner-or-admin access: handles
/// look like URLs but are never directly browsable.
#[derive(Debug)]
pub struct FileVault {
    root: PathBuf,
}

impl FileVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn subject_dir(&self, subject_id: &str) -> PathBuf {
        self.root.join("verifications").join(subject_id)
    }

    pub async fn store(
        &self,
        subject_id: &str,
        bytes: &[u8],
        original_name: &str,
    ) -> Result<StoredEvidence> {
        Validator::validate_evidence_file(original_name, bytes.len() as u64)?;
        if !is_safe_path_segment(subject_id) {
            return Err(AppError::InvalidUpload("Invalid subject id".to_string()));
        }

        let dir = self.subject_dir(subject_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload directory: {}", e)))?;

        // Timestamp plus random suffix keeps concurrent uploads from the
        // same subject collision-free.
        let suffix = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "{}_{}_{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            &suffix[..8],
            Validator::sanitize_file_name(original_name)
        );
        let path = dir.join(&file_name);
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store evidence file: {}", e)))?;

        let url = format!("/api/verification/file/{}/{}", subject_id, file_name);
        Ok(StoredEvidence { file_name, url })
    }

    /// Streams a stored file back to its owning subject or an administrator.
    /// The access check runs before any filesystem probe, so non-owners get
    /// Forbidden whether or not the file exists.
    pub async fn retrieve(
        &self,
        requester: &VerifiedIdentity,
        subject_id: &str,
        file_name: &str,
    ) -> Result<(Vec<u8>, &'static str)> {
        if !IdentityVerifier::is_admin(requester) && requester.subject_id != subject_id {
            return Err(AppError::Forbidden(
                "You do not have access to this file".to_string(),
            ));
        }
        if !is_safe_path_segment(subject_id) || !is_safe_path_segment(file_name) {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        let path = self.subject_dir(subject_id).join(file_name);
        match fs::read(&path).await {
            Ok(bytes) => Ok((bytes, content_type_for(file_name))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to read evidence file: {}",
                e
            ))),
        }
    }
}

fn is_safe_path_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains('/')
        && !segment.contains('\\')
}

pub fn content_type_for(name: &str) -> &'static str {
    let ext = std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_follow_extension() {
        assert_eq!(content_type_for("scan.PDF"), "application/pdf");
        assert_eq!(content_type_for("selfie.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("proof.png"), "image/png");
        assert_eq!(content_type_for("mystery.bin"), "application/octet-stream");
        assert_eq!(content_type_for("noextension"), "application/octet-stream");
    }

    #[test]
    fn path_segments_are_screened() {
        assert!(is_safe_path_segment("emp-1"));
        assert!(!is_safe_path_segment(".."));
        assert!(!is_safe_path_segment("a/b"));
        assert!(!is_safe_path_segment("a\\b"));
        assert!(!is_safe_path_segment(""));
    }
}
