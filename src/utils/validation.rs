use crate::errors::{AppError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];
pub const MAX_EVIDENCE_BYTES: u64 = 50 * 1024 * 1024;

static UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static pattern"));

pub struct Validator;

impl Validator {
    /// Evidence files must carry an accepted extension and fit the 50 MiB
    /// per-file ceiling. Empty files are rejected too.
    pub fn validate_evidence_file(name: &str, size: u64) -> Result<()> {
        let ext = std::path::Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some(e) if ALLOWED_EXTENSIONS.contains(&e) => {}
            _ => {
                return Err(AppError::InvalidUpload(
                    "Only .jpg, .jpeg, .png and .pdf files are accepted".to_string(),
                ))
            }
        }
        if size == 0 {
            return Err(AppError::InvalidUpload("File is empty".to_string()));
        }
        if size > MAX_EVIDENCE_BYTES {
            return Err(AppError::InvalidUpload(
                "File size exceeds the 50MB limit".to_string(),
            ));
        }
        Ok(())
    }

    /// Reduces a client-supplied file name to its base name with any
    /// filesystem-hostile characters replaced.
    pub fn sanitize_file_name(name: &str) -> String {
        let base = std::path::Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload");
        UNSAFE_NAME_CHARS.replace_all(base, "_").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_extensions_case_insensitively() {
        for name in ["id.jpg", "id.JPG", "id.jpeg", "id.png", "id.PDF"] {
            assert!(Validator::validate_evidence_file(name, 1024).is_ok(), "{}", name);
        }
    }

    #[test]
    fn rejects_wrong_type_and_bad_sizes() {
        assert!(matches!(
            Validator::validate_evidence_file("resume.docx", 1024),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(matches!(
            Validator::validate_evidence_file("noext", 1024),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(matches!(
            Validator::validate_evidence_file("id.png", 0),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(matches!(
            Validator::validate_evidence_file("id.png", MAX_EVIDENCE_BYTES + 1),
            Err(AppError::InvalidUpload(_))
        ));
        assert!(Validator::validate_evidence_file("id.png", MAX_EVIDENCE_BYTES).is_ok());
    }

    #[test]
    fn sanitizer_strips_paths_and_odd_characters() {
        assert_eq!(Validator::sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(Validator::sanitize_file_name("my scan (1).pdf"), "my_scan__1_.pdf");
        assert_eq!(Validator::sanitize_file_name("id.png"), "id.png");
    }
}
