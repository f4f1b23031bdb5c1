//! Invoice storage on the local filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use spinandsell_core::error::DomainError;
use spinandsell_core::storage::DocumentStore;

const PROVIDER: &str = "storage";

/// Writes documents into a directory that is served at `public_base_url`.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    dir: PathBuf,
    public_base_url: String,
}

impl FsDocumentStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Document names are flat file names; anything that could escape the
/// directory is refused.
fn validate_name(name: &str) -> Result<(), DomainError> {
    let flat = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\']);
    if flat {
        Ok(())
    } else {
        Err(DomainError::Validation(format!("invalid document name: {name:?}")))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    #[tracing::instrument(skip(self, content), fields(bytes = content.len()))]
    async fn store(
        &self,
        name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<String, DomainError> {
        validate_name(name)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;
        tokio::fs::write(self.dir.join(name), content)
            .await
            .map_err(|e| DomainError::provider(PROVIDER, e.to_string()))?;

        Ok(format!("{}/{name}", self.public_base_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_writes_file_and_returns_public_url() {
        // Arrange
        let tmp = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(tmp.path().join("invoices"), "https://api.test/invoices/");

        // Act
        let url = store
            .store("INV-2026-ABCD1234.html", "text/html", b"<html></html>".to_vec())
            .await
            .unwrap();

        // Assert
        assert_eq!(url, "https://api.test/invoices/INV-2026-ABCD1234.html");
        let written = std::fs::read(tmp.path().join("invoices/INV-2026-ABCD1234.html")).unwrap();
        assert_eq!(written, b"<html></html>");
    }

    #[tokio::test]
    async fn test_store_refuses_names_outside_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FsDocumentStore::new(tmp.path(), "https://api.test/invoices");

        for name in ["../escape.html", "a/b.html", "..", ".hidden", ""] {
            let err = store.store(name, "text/html", Vec::new()).await.unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{name}");
        }
    }
}
