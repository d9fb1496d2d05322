//! Receipt and icon uploads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{LedgerError, ResultLedger, Receipt};

/// Stores an attachment and returns the reference to keep on the document.
///
/// Implementations report failures as [`LedgerError::Upstream`]; the message
/// reaches the caller verbatim.
#[async_trait]
pub trait ReceiptUploader: Send + Sync {
    async fn upload(&self, receipt: &Receipt, folder: &str) -> ResultLedger<String>;

    /// Removes an attachment previously returned by [`upload`](Self::upload).
    ///
    /// Targets that cannot delete keep the file.
    async fn discard(&self, _reference: &str) -> ResultLedger<()> {
        Ok(())
    }
}

/// Rejects every upload. Used when no upload target is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledUploader;

#[async_trait]
impl ReceiptUploader for DisabledUploader {
    async fn upload(&self, _receipt: &Receipt, _folder: &str) -> ResultLedger<String> {
        Err(LedgerError::Upstream(
            "Receipt uploads are not configured".to_string(),
        ))
    }
}

/// Writes attachments below a root directory as `<folder>/<uuid>.<ext>`.
#[derive(Clone, Debug)]
pub struct DirectoryUploader {
    root: PathBuf,
}

impl DirectoryUploader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

fn extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn valid_folder(folder: &str) -> bool {
    !folder.is_empty()
        && folder
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl ReceiptUploader for DirectoryUploader {
    async fn upload(&self, receipt: &Receipt, folder: &str) -> ResultLedger<String> {
        if receipt.data.is_empty() {
            return Err(LedgerError::Upstream(
                "Failed to upload receipt: empty file".to_string(),
            ));
        }
        if !valid_folder(folder) {
            return Err(LedgerError::Upstream(format!(
                "Failed to upload receipt: invalid folder {folder:?}"
            )));
        }

        let name = match extension(&receipt.file_name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let dir = self.root.join(folder);
        let write = async {
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(dir.join(&name), &receipt.data).await
        };
        write
            .await
            .map_err(|err| LedgerError::Upstream(format!("Failed to upload receipt: {err}")))?;

        tracing::debug!("stored {} bytes as {folder}/{name}", receipt.data.len());
        Ok(format!("{folder}/{name}"))
    }

    async fn discard(&self, reference: &str) -> ResultLedger<()> {
        let stored_here = reference.split_once('/').is_some_and(|(folder, name)| {
            valid_folder(folder)
                && !name.is_empty()
                && !name.starts_with('.')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        });
        if !stored_here {
            return Err(LedgerError::Upstream(format!(
                "Failed to remove upload: invalid reference {reference:?}"
            )));
        }

        match tokio::fs::remove_file(self.root.join(reference)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(LedgerError::Upstream(format!(
                "Failed to remove upload: {err}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension("receipt.PNG"), Some("png".to_string()));
        assert_eq!(extension("noext"), None);
        assert_eq!(extension("weird.p/g"), None);
    }

    #[tokio::test]
    async fn writes_file_under_folder() {
        let root = std::env::temp_dir().join(format!("uploads_{}", Uuid::new_v4()));
        let uploader = DirectoryUploader::new(&root);
        let receipt = Receipt {
            file_name: "lunch.jpg".to_string(),
            data: vec![1, 2, 3],
        };

        let reference = uploader.upload(&receipt, "transactions").await.unwrap();
        assert!(reference.starts_with("transactions/"));
        assert!(reference.ends_with(".jpg"));

        let stored = tokio::fs::read(root.join(&reference)).await.unwrap();
        assert_eq!(stored, vec![1, 2, 3]);
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn discard_removes_stored_file() {
        let root = std::env::temp_dir().join(format!("uploads_{}", Uuid::new_v4()));
        let uploader = DirectoryUploader::new(&root);
        let receipt = Receipt {
            file_name: "icon.png".to_string(),
            data: vec![7],
        };

        let reference = uploader.upload(&receipt, "wallets").await.unwrap();
        uploader.discard(&reference).await.unwrap();
        assert!(!root.join(&reference).exists());
        // Already gone is fine.
        uploader.discard(&reference).await.unwrap();

        assert!(uploader.discard("../outside.png").await.is_err());
        assert!(uploader.discard("wallets/../../x").await.is_err());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }

    #[tokio::test]
    async fn rejects_empty_payload() {
        let uploader = DirectoryUploader::new(std::env::temp_dir());
        let receipt = Receipt {
            file_name: "empty.png".to_string(),
            data: Vec::new(),
        };

        let err = uploader.upload(&receipt, "transactions").await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Upstream("Failed to upload receipt: empty file".to_string())
        );
    }
}
