//! The blob storage collaborator for workshop attachments.

use std::io::ErrorKind;
use std::path::PathBuf;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;

use crate::error::AttachmentError;

/// Folder inside the bucket that holds workshop uploads
const UPLOAD_PREFIX: &str = "workshops";

/// A stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Public URL the file can be fetched from
    pub url: String,
    /// Original file name, for display
    pub name: String,
    /// Object path inside the bucket
    pub path: String,
}

pub trait AttachmentStore: Send + Sync {
    fn upload(&self, name: &str, bytes: Vec<u8>)
        -> BoxFuture<'_, Result<Attachment, AttachmentError>>;
}

/// Replace anything outside `[A-Za-z0-9._-]` so the name is a safe path segment
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Buckets as directories under a local root
#[derive(Debug, Clone)]
pub struct LocalBucketStore {
    root: PathBuf,
    bucket: String,
    public_url: String,
}

impl LocalBucketStore {
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, public_url: &str) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn map_io(&self, err: std::io::Error) -> AttachmentError {
        match err.kind() {
            ErrorKind::PermissionDenied => AttachmentError::AccessDenied(self.bucket.clone()),
            _ => AttachmentError::Io(err),
        }
    }

    async fn store(&self, name: &str, bytes: Vec<u8>) -> Result<Attachment, AttachmentError> {
        let display_name = name.trim();
        if display_name.is_empty() {
            return Err(AttachmentError::EmptyName);
        }

        let bucket_dir = self.root.join(&self.bucket);
        match tokio::fs::metadata(&bucket_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(AttachmentError::BucketNotFound(self.bucket.clone())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AttachmentError::BucketNotFound(self.bucket.clone()))
            }
            Err(e) => return Err(self.map_io(e)),
        }

        let folder = bucket_dir.join(UPLOAD_PREFIX);
        tokio::fs::create_dir_all(&folder)
            .await
            .map_err(|e| self.map_io(e))?;

        // Timestamp segment keeps repeated uploads of one file name apart
        let file_name = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_millis(),
            sanitize(display_name)
        );
        tokio::fs::write(folder.join(&file_name), &bytes)
            .await
            .map_err(|e| self.map_io(e))?;

        let path = format!("{UPLOAD_PREFIX}/{file_name}");
        tracing::info!(bucket = %self.bucket, %path, size = bytes.len(), "Stored attachment");

        Ok(Attachment {
            url: format!("{}/{}/{}", self.public_url, self.bucket, path),
            name: display_name.to_string(),
            path,
        })
    }
}

impl AttachmentStore for LocalBucketStore {
    fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
    ) -> BoxFuture<'_, Result<Attachment, AttachmentError>> {
        let name = name.to_string();
        async move { self.store(&name, bytes).await }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("Report (final).pdf"), "Report__final_.pdf");
        assert_eq!(sanitize("../etc/passwd"), ".._etc_passwd");
    }

    #[tokio::test]
    async fn test_upload_into_bucket() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("workshop-attachments")).unwrap();
        let store = LocalBucketStore::new(
            dir.path(),
            "workshop-attachments",
            "http://localhost:3000/storage/",
        );

        let attachment = store.upload("agenda.pdf", b"%PDF".to_vec()).await.unwrap();
        assert_eq!(attachment.name, "agenda.pdf");
        assert!(attachment.path.starts_with("workshops/"));
        assert!(attachment.path.ends_with("_agenda.pdf"));
        assert_eq!(
            attachment.url,
            format!(
                "http://localhost:3000/storage/workshop-attachments/{}",
                attachment.path
            )
        );

        let stored = dir.path().join("workshop-attachments").join(&attachment.path);
        assert_eq!(std::fs::read(stored).unwrap(), b"%PDF");
    }

    #[tokio::test]
    async fn test_missing_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBucketStore::new(dir.path(), "missing", "http://x");
        let err = store.upload("a.pdf", Vec::new()).await.unwrap_err();
        assert!(matches!(err, AttachmentError::BucketNotFound(b) if b == "missing"));
        // Upload aborted: nothing was created
        assert!(!dir.path().join("missing").exists());
    }

    #[tokio::test]
    async fn test_empty_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBucketStore::new(dir.path(), "b", "http://x");
        assert!(matches!(
            store.upload("  ", Vec::new()).await,
            Err(AttachmentError::EmptyName)
        ));
    }
}
