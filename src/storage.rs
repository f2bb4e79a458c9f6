use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::models::UploadPurpose;

/// Extensions accepted for initiative and task documents.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "jpg", "jpeg", "png", "gif"];

/// Extensions accepted for profile pictures.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

impl UploadPurpose {
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            UploadPurpose::Document => DOCUMENT_EXTENSIONS,
            UploadPurpose::ProfilePicture => IMAGE_EXTENSIONS,
        }
    }

    /// Object key prefix; also used to check that a submitted key was issued for this purpose.
    pub fn key_prefix(self) -> &'static str {
        match self {
            UploadPurpose::Document => "documents/",
            UploadPurpose::ProfilePicture => "profile_pics/",
        }
    }
}

/// Lower-cased extension of `filename` if it is on the allow-list for `purpose`.
pub fn allowed_extension(filename: &str, purpose: UploadPurpose) -> Option<String> {
    let extension = Path::new(filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)?
        .to_ascii_lowercase();
    purpose
        .allowed_extensions()
        .contains(&extension.as_str())
        .then_some(extension)
}

/// StorageService
///
/// The object-storage seam. The S3 client backs it in every environment; tests
/// swap in `MockStorageService`.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Called at startup in `Env::Local` only.
    async fn ensure_bucket_exists(&self);

    /// A short-lived URL the client PUTs the file to, constrained to `content_type`.
    async fn get_presigned_upload_url(&self, key: &str, content_type: &str) -> Result<String, String>;

    /// Size in bytes of a stored object. Errors when the object does not exist.
    async fn object_size(&self, key: &str) -> Result<i64, String>;
}

/// S3StorageClient
///
/// AWS SDK client pointed at an S3-compatible endpoint (MinIO locally, Supabase
/// Storage in production). Path-style addressing is required by both.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(endpoint: &str, region: &str, access_key: &str, secret_key: &str, bucket: &str) -> Self {
        let credentials = s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket already exists.
        if let Err(e) = self.client.create_bucket().bucket(&self.bucket_name).send().await {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn get_presigned_upload_url(&self, key: &str, content_type: &str) -> Result<String, String> {
        // Upload URLs live for 10 minutes.
        let presigning = PresigningConfig::expires_in(Duration::from_secs(600)).map_err(|e| e.to_string())?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned_req.uri().to_string())
    }

    async fn object_size(&self, key: &str) -> Result<i64, String> {
        let head = self
            .client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        Ok(head.content_length().unwrap_or(0))
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a client-supplied key cannot traverse
/// outside its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// Deterministic stand-in for tests. Every stored object reports `object_size` bytes.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    pub object_size: i64,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            should_fail: false,
            object_size: 1024,
        }
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            object_size: 0,
        }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(&self, key: &str, _content_type: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }

    async fn object_size(&self, _key: &str) -> Result<i64, String> {
        if self.should_fail {
            return Err("Mock Storage Error: object not found".to_string());
        }
        Ok(self.object_size)
    }
}

pub type StorageState = Arc<dyn StorageService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_accept_office_files_but_pictures_do_not() {
        assert_eq!(allowed_extension("minutes.DOCX", UploadPurpose::Document).as_deref(), Some("docx"));
        assert_eq!(allowed_extension("minutes.docx", UploadPurpose::ProfilePicture), None);
        assert_eq!(allowed_extension("me.png", UploadPurpose::ProfilePicture).as_deref(), Some("png"));
    }

    #[test]
    fn missing_or_unknown_extension_is_rejected() {
        assert_eq!(allowed_extension("README", UploadPurpose::Document), None);
        assert_eq!(allowed_extension("payload.exe", UploadPurpose::Document), None);
    }

    #[test]
    fn sanitize_strips_traversal() {
        assert_eq!(sanitize_key("documents/../../etc/passwd"), "documents/etc/passwd");
        assert_eq!(sanitize_key("/documents/./a.pdf"), "documents/a.pdf");
    }
}
