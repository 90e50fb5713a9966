// src/clients/media.rs

//! Photo transfer: download to a temp file, then hand it to an uploader.

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::clients::{MediaUploader, PhotoCopier};
use crate::error::Result;
use crate::utils::url::url_suffix;

/// `PhotoCopier` that streams the photo to local temp storage first.
pub struct DownloadThenUpload<U> {
    client: Client,
    uploader: U,
}

impl<U: MediaUploader> DownloadThenUpload<U> {
    pub fn new(client: Client, uploader: U) -> Self {
        Self { client, uploader }
    }

    async fn download(&self, url: &str, path: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;
        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok(written)
    }
}

#[async_trait]
impl<U: MediaUploader> PhotoCopier for DownloadThenUpload<U> {
    async fn copy_photo(&self, url: &str) -> Result<String> {
        let suffix = url_suffix(url)?;

        // Removed when dropped, after the upload has finished.
        let temp = tempfile::Builder::new()
            .prefix("kidsync-")
            .suffix(&suffix)
            .tempfile()?;

        let bytes = self.download(url, temp.path()).await?;
        log::debug!("Downloaded {bytes} bytes from {url}");

        let remote = self.uploader.upload_file(temp.path(), &suffix).await?;
        log::debug!("Uploaded photo as {remote}");
        Ok(remote)
    }
}

#[cfg(feature = "s3")]
pub use s3::S3Uploader;

#[cfg(feature = "s3")]
mod s3 {
    use std::path::Path;
    use std::time::SystemTime;

    use async_trait::async_trait;
    use aws_config::{BehaviorVersion, SdkConfig};
    use aws_sdk_s3::Client;
    use aws_sdk_s3::config::{Credentials, Region};
    use aws_sdk_s3::primitives::ByteStream;

    use crate::clients::MediaUploader;
    use crate::error::{AppError, Result};
    use crate::models::UploadConfig;

    const COGNITO: &str = "cognito";

    /// Uploads photos into the bucket Tinybeans reads new entries from.
    pub struct S3Uploader {
        client: Client,
        bucket: String,
    }

    impl S3Uploader {
        pub fn new(client: Client, bucket: impl Into<String>) -> Self {
            Self {
                client,
                bucket: bucket.into(),
            }
        }

        /// Build a client using the guest credentials the web app itself uploads with.
        pub async fn from_config(config: &UploadConfig) -> Result<Self> {
            // The identity pool hands out credentials to unsigned callers.
            let aws = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .no_credentials()
                .load()
                .await;

            let credentials = guest_credentials(&aws, &config.identity_pool).await?;
            let s3_config = aws_sdk_s3::config::Builder::from(&aws)
                .credentials_provider(credentials)
                .build();

            Ok(Self::new(Client::from_conf(s3_config), &config.bucket))
        }
    }

    /// Temporary credentials for a fresh unauthenticated pool identity.
    async fn guest_credentials(aws: &SdkConfig, identity_pool: &str) -> Result<Credentials> {
        let cognito = aws_sdk_cognitoidentity::Client::new(aws);

        let identity = cognito
            .get_id()
            .identity_pool_id(identity_pool)
            .send()
            .await
            .map_err(|e| AppError::remote(COGNITO, e))?;
        let identity_id = identity
            .identity_id()
            .ok_or_else(|| AppError::remote(COGNITO, "no identity id returned"))?;

        let output = cognito
            .get_credentials_for_identity()
            .identity_id(identity_id)
            .send()
            .await
            .map_err(|e| AppError::remote(COGNITO, e))?;
        let issued = output
            .credentials()
            .ok_or_else(|| AppError::remote(COGNITO, "no credentials returned"))?;

        let (Some(access_key), Some(secret_key)) = (issued.access_key_id(), issued.secret_key())
        else {
            return Err(AppError::remote(COGNITO, "incomplete credentials returned"));
        };
        let expires = issued
            .expiration()
            .and_then(|t| SystemTime::try_from(*t).ok());

        log::debug!("Got upload credentials for identity {identity_id}");
        Ok(Credentials::new(
            access_key,
            secret_key,
            issued.session_token().map(str::to_string),
            expires,
            COGNITO,
        ))
    }

    #[async_trait]
    impl MediaUploader for S3Uploader {
        async fn upload_file(&self, path: &Path, suffix: &str) -> Result<String> {
            // The web app names uploads with a fresh v4 UUID plus the file's extension.
            let key = format!("{}{}", uuid::Uuid::new_v4(), suffix);
            let body = ByteStream::from_path(path)
                .await
                .map_err(|e| AppError::remote("s3", e))?;

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .body(body)
                .send()
                .await
                .map_err(|e| AppError::remote("s3", e))?;

            log::info!("Uploaded {} to s3://{}/{}", path.display(), self.bucket, key);
            Ok(key)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    use super::*;
    use crate::error::AppError;

    /// (suffix argument, temp file name, file contents) per upload
    type Uploads = Arc<Mutex<Vec<(String, String, Vec<u8>)>>>;

    #[derive(Default)]
    struct RecordingUploader {
        uploads: Uploads,
    }

    #[async_trait]
    impl MediaUploader for RecordingUploader {
        async fn upload_file(&self, path: &Path, suffix: &str) -> Result<String> {
            let contents = tokio::fs::read(path).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.uploads
                .lock()
                .unwrap()
                .push((suffix.to_string(), name, contents));
            Ok(format!("remote{suffix}"))
        }
    }

    /// Serve `body` once over plain HTTP and return the base URL.
    async fn serve_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await.unwrap();
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(body).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_rejected_extension_fails_before_any_transfer() {
        let uploader = RecordingUploader::default();
        let uploads = Arc::clone(&uploader.uploads);
        let copier = DownloadThenUpload::new(Client::new(), uploader);

        // Nothing listens here; reaching the network would fail differently.
        let err = copier
            .copy_photo("http://127.0.0.1:9/photos/original.gif")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Invariant(_)));
        assert!(uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uploads_downloaded_file_with_suffix() {
        let base = serve_once(b"jpeg bytes").await;
        let uploader = RecordingUploader::default();
        let uploads = Arc::clone(&uploader.uploads);
        let client = Client::builder().no_proxy().build().unwrap();
        let copier = DownloadThenUpload::new(client, uploader);

        let remote = copier
            .copy_photo(&format!("{base}/photos/original.jpeg?sig=abc"))
            .await
            .unwrap();

        let uploads = uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        let (suffix, name, contents) = &uploads[0];
        assert_eq!(remote, format!("remote{suffix}"));
        assert!(name.starts_with("kidsync-"));
        assert!(name.ends_with(suffix.as_str()));
        assert_eq!(suffix, ".jpeg");
        assert_eq!(contents.as_slice(), b"jpeg bytes");
    }
}
