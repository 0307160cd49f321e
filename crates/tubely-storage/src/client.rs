//! S3 client implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::{ByteStream, Length};
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::ObjectStore;

/// Configuration for the S3 client.
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket name
    pub bucket: String,
    /// Region
    pub region: String,
    /// Custom endpoint for S3-compatible stores (path-style addressing)
    pub endpoint_url: Option<String>,
    /// Static access key ID; the default credential chain is used when unset
    pub access_key_id: Option<String>,
    /// Static secret access key
    pub secret_access_key: Option<String>,
}

impl S3Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        Ok(Self {
            bucket: non_empty("S3_BUCKET")
                .ok_or_else(|| StorageError::config_error("S3_BUCKET not set"))?,
            region: non_empty("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: non_empty("S3_ENDPOINT_URL"),
            access_key_id: non_empty("S3_ACCESS_KEY_ID"),
            secret_access_key: non_empty("S3_SECRET_ACCESS_KEY"),
        })
    }

    /// Public URL of an object.
    ///
    /// Path-style `{endpoint}/{bucket}/{key}` with a custom endpoint, the
    /// virtual-hosted AWS form otherwise.
    pub fn object_url(&self, key: &str) -> String {
        match &self.endpoint_url {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket,
                key
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    fn static_credentials(&self) -> StorageResult<Option<Credentials>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Ok(Some(Credentials::new(id, secret, None, None, "tubely"))),
            (None, None) => Ok(None),
            _ => Err(StorageError::config_error(
                "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together",
            )),
        }
    }
}

/// S3 storage client.
#[derive(Clone)]
pub struct S3Client {
    client: Client,
    config: S3Config,
}

impl S3Client {
    /// Create a new S3 client from configuration.
    pub async fn new(config: S3Config) -> StorageResult<Self> {
        let mut builder = match config.static_credentials()? {
            Some(credentials) => Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .credentials_provider(credentials),
            None => {
                let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
                Builder::from(&shared)
            }
        };

        builder = builder.region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(bucket = %config.bucket, region = %config.region, "S3 client configured");

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = S3Config::from_env()?;
        Self::new(config).await
    }

    pub fn bucket(&self) -> &str {
        &self.config.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put(
        &self,
        key: &str,
        body: tokio::fs::File,
        len: u64,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!(key, bytes = len, "Uploading object");

        let body = ByteStream::read_from()
            .file(body)
            .length(Length::Exact(len))
            .build()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!(key, bytes = len, bucket = %self.config.bucket, "Uploaded object");
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        self.config.object_url(key)
    }

    async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("S3 connectivity check failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint_url: Option<&str>) -> S3Config {
        S3Config {
            bucket: "tubely-videos".to_string(),
            region: "us-east-2".to_string(),
            endpoint_url: endpoint_url.map(str::to_string),
            access_key_id: Some("key".to_string()),
            secret_access_key: Some("secret".to_string()),
        }
    }

    #[test]
    fn test_aws_object_url() {
        assert_eq!(
            config(None).object_url("landscape/abc.mp4"),
            "https://tubely-videos.s3.us-east-2.amazonaws.com/landscape/abc.mp4"
        );
    }

    #[test]
    fn test_custom_endpoint_object_url() {
        assert_eq!(
            config(Some("http://localhost:9000/")).object_url("abc.mp4"),
            "http://localhost:9000/tubely-videos/abc.mp4"
        );
    }

    #[test]
    fn test_partial_credentials_rejected() {
        let mut cfg = config(None);
        cfg.secret_access_key = None;
        assert!(matches!(
            cfg.static_credentials(),
            Err(StorageError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_client_uses_config_url() {
        let client = S3Client::new(config(Some("http://localhost:9000"))).await.unwrap();
        assert_eq!(client.bucket(), "tubely-videos");
        assert_eq!(
            client.object_url("portrait/x.mp4"),
            "http://localhost:9000/tubely-videos/portrait/x.mp4"
        );
    }
}
