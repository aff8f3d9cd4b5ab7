use crate::errors::{AppError, Result};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    pub subject_id: String,
    pub email: String,
    pub role: Option<String>,
}

/// Verifies bearer credentials issued by the external identity provider.
/// Pure verification: no side effects, no storage.
pub struct IdentityVerifier {
    decoding_key: DecodingKey,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Unauthenticated(format!("Invalid token: {}", e)))?;
        if token_data.claims.sub.is_empty() {
            return Err(AppError::Unauthenticated(
                "Token carries no subject".to_string(),
            ));
        }
        Ok(VerifiedIdentity {
            subject_id: token_data.claims.sub,
            email: token_data.claims.email.unwrap_or_default(),
            role: token_data.claims.role,
        })
    }

    pub fn is_admin(identity: &VerifiedIdentity) -> bool {
        identity
            .role
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case("admin"))
            .unwrap_or(false)
    }

    /// Boolean admin gate: a malformed credential, a missing role claim or a
    /// verification failure all resolve to "not admin", never to an error,
    /// so admin-only handlers respond with a uniform forbidden.
    pub fn admin_from_bearer(&self, token: &str) -> bool {
        match self.verify(token) {
            Ok(identity) => {
                let admin = Self::is_admin(&identity);
                if !admin {
                    info!(action = "admin_check_denied", subject = %identity.subject_id, role = ?identity.role);
                }
                admin
            }
            Err(e) => {
                warn!(action = "admin_check_failed", error = %e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, role: Option<&str>, expired: bool) -> String {
        let now = Utc::now();
        let exp = if expired {
            now - Duration::hours(1)
        } else {
            now + Duration::hours(1)
        };
        let claims = Claims {
            sub: sub.to_string(),
            email: Some(format!("{}@example.com", sub)),
            role: role.map(|r| r.to_string()),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_ref()),
        )
        .unwrap()
    }

    #[test]
    fn verify_extracts_subject_and_role() {
        let verifier = IdentityVerifier::new("secret");
        let identity = verifier
            .verify(&token("secret", "emp-1", Some("admin"), false))
            .unwrap();
        assert_eq!(identity.subject_id, "emp-1");
        assert!(IdentityVerifier::is_admin(&identity));
    }

    #[test]
    fn verify_rejects_wrong_secret_and_expiry() {
        let verifier = IdentityVerifier::new("secret");
        assert!(matches!(
            verifier.verify(&token("other", "emp-1", None, false)),
            Err(AppError::Unauthenticated(_))
        ));
        assert!(matches!(
            verifier.verify(&token("secret", "emp-1", None, true)),
            Err(AppError::Unauthenticated(_))
        ));
    }

    #[test]
    fn admin_gate_never_errors() {
        let verifier = IdentityVerifier::new("secret");
        assert!(!verifier.admin_from_bearer("not-a-token"));
        assert!(!verifier.admin_from_bearer(&token("other", "emp-1", Some("admin"), false)));
        assert!(!verifier.admin_from_bearer(&token("secret", "emp-1", Some("admin"), true)));
        assert!(!verifier.admin_from_bearer(&token("secret", "emp-1", None, false)));
        assert!(!verifier.admin_from_bearer(&token("secret", "emp-1", Some("manager"), false)));
        assert!(verifier.admin_from_bearer(&token("secret", "emp-1", Some("admin"), false)));
        assert!(verifier.admin_from_bearer(&token("secret", "emp-1", Some("Admin"), false)));
    }
}
