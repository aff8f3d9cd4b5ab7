mod common;

use common::identity;
use veriflow_backend::errors::AppError;
use veriflow_backend::services::vault::FileVault;

fn vault() -> (tempfile::TempDir, FileVault) {
    let dir = tempfile::tempdir().unwrap();
    let vault = FileVault::new(dir.path());
    (dir, vault)
}

#[tokio::test]
async fn stores_and_serves_back_to_owner() {
    let (_dir, vault) = vault();
    let stored = vault
        .store("emp-1", b"fake image bytes", "passport scan.jpg")
        .await
        .unwrap();
    assert_eq!(
        stored.url,
        format!("/api/verification/file/emp-1/{}", stored.file_name)
    );
    assert!(stored.file_name.ends_with("passport_scan.jpg"));

    let (bytes, content_type) = vault
        .retrieve(&identity("emp-1", None), "emp-1", &stored.file_name)
        .await
        .unwrap();
    assert_eq!(bytes, b"fake image bytes");
    assert_eq!(content_type, "image/jpeg");
}

#[tokio::test]
async fn admin_may_read_any_subject() {
    let (_dir, vault) = vault();
    let stored = vault.store("emp-1", b"%PDF-", "proof.pdf").await.unwrap();

    let (bytes, content_type) = vault
        .retrieve(&identity("admin-9", Some("admin")), "emp-1", &stored.file_name)
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-");
    assert_eq!(content_type, "application/pdf");
}

#[tokio::test]
async fn non_owner_is_forbidden_regardless_of_existence() {
    let (_dir, vault) = vault();
    let stored = vault.store("emp-1", b"data", "selfie.png").await.unwrap();

    // Existing file, wrong subject.
    assert!(matches!(
        vault
            .retrieve(&identity("emp-2", None), "emp-1", &stored.file_name)
            .await
            .unwrap_err(),
        AppError::Forbidden(_)
    ));
    // Nonexistent file, still Forbidden before any filesystem probe.
    assert!(matches!(
        vault
            .retrieve(&identity("emp-2", None), "emp-1", "nope.png")
            .await
            .unwrap_err(),
        AppError::Forbidden(_)
    ));
    // Owner asking for a missing file gets NotFound.
    assert!(matches!(
        vault
            .retrieve(&identity("emp-1", None), "emp-1", "nope.png")
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
}

#[tokio::test]
async fn rejects_invalid_uploads() {
    let (_dir, vault) = vault();

    assert!(matches!(
        vault.store("emp-1", b"text", "resume.docx").await.unwrap_err(),
        AppError::InvalidUpload(_)
    ));
    assert!(matches!(
        vault.store("emp-1", b"", "id.png").await.unwrap_err(),
        AppError::InvalidUpload(_)
    ));

    let oversize = vec![0u8; (50 * 1024 * 1024) + 1];
    assert!(matches!(
        vault.store("emp-1", &oversize, "id.png").await.unwrap_err(),
        AppError::InvalidUpload(_)
    ));
}

#[tokio::test]
async fn repeated_uploads_get_distinct_handles() {
    let (_dir, vault) = vault();
    let first = vault.store("emp-1", b"one", "id.jpg").await.unwrap();
    let second = vault.store("emp-1", b"two", "id.jpg").await.unwrap();
    assert_ne!(first.file_name, second.file_name);
    assert_ne!(first.url, second.url);

    // Both remain retrievable under their own handles.
    let (bytes, _) = vault
        .retrieve(&identity("emp-1", None), "emp-1", &first.file_name)
        .await
        .unwrap();
    assert_eq!(bytes, b"one");
    let (bytes, _) = vault
        .retrieve(&identity("emp-1", None), "emp-1", &second.file_name)
        .await
        .unwrap();
    assert_eq!(bytes, b"two");
}

#[tokio::test]
async fn path_traversal_never_reaches_the_filesystem() {
    let (_dir, vault) = vault();
    vault.store("emp-1", b"data", "id.jpg").await.unwrap();

    assert!(matches!(
        vault
            .retrieve(&identity("emp-1", None), "emp-1", "..")
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
    // An admin probing with a traversal subject is screened too.
    assert!(matches!(
        vault
            .retrieve(&identity("admin-9", Some("admin")), "..", "id.jpg")
            .await
            .unwrap_err(),
        AppError::NotFound(_)
    ));
}
