//! Validation helpers for ingestion

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::domain::DomainError;

const DOCUMENT_HASH_CHARS: usize = 8;

/// File name component of a path, used as the document identity
pub fn document_name(path: &Path) -> Result<String, DomainError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            DomainError::validation(format!("Path has no usable file name: {}", path.display()))
        })?;

    validate_document_name(name)?;
    Ok(name.to_string())
}

/// Validate a document name
pub fn validate_document_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("Document name cannot be empty"));
    }

    if name.len() > 255 {
        return Err(DomainError::validation(
            "Document name cannot exceed 255 characters",
        ));
    }

    Ok(())
}

/// Vector ID prefix for a document: the sanitized stem plus a short hash of
/// the full name, so names that sanitize alike stay distinct
pub fn document_key(document_name: &str) -> String {
    let stem = Path::new(document_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(document_name);

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let digest = Sha256::digest(document_name.as_bytes());
    format!("{}-{}", sanitized, &hex::encode(digest)[..DOCUMENT_HASH_CHARS])
}

/// Stable vector ID for the chunk at `position`
pub fn vector_id(document_key: &str, position: usize) -> String {
    format!("{}_chunk_{}", document_key, position)
}

/// Lower-case extension of a path, if any
pub fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name() {
        let name = document_name(Path::new("/data/input/Store 42 Lease.pdf")).unwrap();
        assert_eq!(name, "Store 42 Lease.pdf");
    }

    #[test]
    fn test_document_name_rejects_root() {
        assert!(document_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_document_key_is_sanitized() {
        let key = document_key("Store 42 (Main) Lease.pdf");
        assert!(key.starts_with("Store_42__Main__Lease-"));
        assert_eq!(key.len(), "Store_42__Main__Lease-".len() + 8);
        assert!(document_key("lease_v2.final.docx").starts_with("lease_v2.final-"));
        assert!(document_key("Bail-Montréal.md").starts_with("Bail-Montr_al-"));
    }

    #[test]
    fn test_document_key_is_stable() {
        assert_eq!(document_key("Plaza Lease.pdf"), document_key("Plaza Lease.pdf"));
    }

    #[test]
    fn test_document_keys_do_not_collide() {
        assert_ne!(document_key("租约.md"), document_key("合同.md"));
        assert_ne!(document_key("Lease A.pdf"), document_key("Lease_A.pdf"));
        assert_ne!(document_key("lease.pdf"), document_key("lease.docx"));
    }

    #[test]
    fn test_vector_id() {
        assert_eq!(vector_id("lease-0a1b2c3d", 7), "lease-0a1b2c3d_chunk_7");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension(Path::new("a/B.PDF")).as_deref(), Some("pdf"));
        assert_eq!(file_extension(Path::new("README")), None);
    }
}
