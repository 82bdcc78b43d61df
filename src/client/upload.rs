use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use uuid::Uuid;

/// A spreadsheet picked by the user, held in memory until uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// File name without any directory part.
    pub fn base_name(&self) -> &str {
        self.name
            .rsplit(['/', '\\'])
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("upload.xlsx")
    }

    pub fn content_type(&self) -> &'static str {
        let lower = self.base_name().to_ascii_lowercase();
        if lower.ends_with(".xlsx") {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        } else if lower.ends_with(".xls") {
            "application/vnd.ms-excel"
        } else {
            "application/octet-stream"
        }
    }
}

/// Stores a selected file somewhere the workflow can read it.
#[async_trait]
pub trait FileUploader: Send + Sync {
    /// Upload the file; returns the storage key to hand to the job starter.
    async fn upload(&self, file: &SelectedFile) -> Result<String, UploadError>;
}

/// Uploader for S3-compatible object storage.
pub struct S3Uploader {
    bucket: Box<Bucket>,
}

impl S3Uploader {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, UploadError> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| UploadError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| UploadError::Config(e.to_string()))?;

        Ok(Self { bucket })
    }
}

/// Storage key for a fresh upload: `uploads/{uuid}/{file name}`.
pub fn upload_key(file: &SelectedFile) -> String {
    format!("uploads/{}/{}", Uuid::new_v4(), file.base_name())
}

#[async_trait]
impl FileUploader for S3Uploader {
    async fn upload(&self, file: &SelectedFile) -> Result<String, UploadError> {
        let key = upload_key(file);
        let response = self
            .bucket
            .put_object_with_content_type(&key, &file.bytes, file.content_type())
            .await
            .map_err(UploadError::S3)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(UploadError::Rejected(status));
        }

        tracing::info!(key = %key, bytes = file.bytes.len(), "Uploaded spreadsheet");
        Ok(key)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("Storage rejected the upload with status {0}")]
    Rejected(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_key_uses_base_name() {
        let file = SelectedFile::new("C:\\Users\\me\\Quarterly Report.xlsx", vec![1]);
        let key = upload_key(&file);
        assert!(key.starts_with("uploads/"));
        assert!(key.ends_with("/Quarterly Report.xlsx"));
        assert_eq!(key.split('/').count(), 3);
    }

    #[test]
    fn test_content_type_follows_extension() {
        assert_eq!(
            SelectedFile::new("a.XLSX", vec![]).content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(SelectedFile::new("b.xls", vec![]).content_type(), "application/vnd.ms-excel");
        assert_eq!(SelectedFile::new("c.csv", vec![]).content_type(), "application/octet-stream");
    }
}
