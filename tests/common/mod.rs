#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use uuid::Uuid;
use veriflow_backend::models::verification::{VerificationRecord, VerificationStatus};
use veriflow_backend::services::identity::{Claims, VerifiedIdentity};
use veriflow_backend::services::vault::StoredEvidence;

pub const SECRET: &str = "test-secret";

pub fn token(sub: &str, role: Option<&str>) -> String {
    let now = Utc::now();
    let claims = Claims {
        sub: sub.to_string(),
        email: Some(format!("{}@example.com", sub)),
        role: role.map(|r| r.to_string()),
        exp: (now + Duration::hours(1)).timestamp(),
        iat: now.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_ref()),
    )
    .unwrap()
}

pub fn identity(sub: &str, role: Option<&str>) -> VerifiedIdentity {
    VerifiedIdentity {
        subject_id: sub.to_string(),
        email: format!("{}@example.com", sub),
        role: role.map(|r| r.to_string()),
    }
}

pub fn evidence(subject: &str, name: &str) -> StoredEvidence {
    StoredEvidence {
        file_name: name.to_string(),
        url: format!("/api/verification/file/{}/{}", subject, name),
    }
}

pub fn verification(
    subject: &str,
    status: VerificationStatus,
    created_at: DateTime<Utc>,
) -> VerificationRecord {
    let id = Uuid::new_v4();
    VerificationRecord {
        id,
        subject_id: subject.to_string(),
        subject_email: format!("{}@example.com", subject),
        id_document_url: format!("/api/verification/file/{}/id-{}.jpg", subject, id),
        residency_proof_url: format!("/api/verification/file/{}/proof-{}.pdf", subject, id),
        selfie_url: format!("/api/verification/file/{}/selfie-{}.png", subject, id),
        status,
        created_at,
        reviewed_at: None,
        comment: None,
        appeal_message: None,
        appealed_at: None,
    }
}
