//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default cap on a single video upload (1 GiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 1 << 30;

/// Cap on a thumbnail upload (10 MiB).
pub const THUMBNAIL_MAX_BYTES: usize = 10 << 20;

/// Allowance for multipart boundaries and part headers around a file.
pub const MULTIPART_ENVELOPE_BYTES: usize = 16 * 1024;

/// Where thumbnails are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStorageMode {
    /// Files under the assets root, served at `/assets`
    Local,
    /// `data:` URLs stored on the record itself
    Inline,
}

impl ThumbnailStorageMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" => Some(Self::Local),
            "inline" => Some(Self::Inline),
            _ => None,
        }
    }
}

/// Which metadata store backs video records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataBackend {
    Firestore,
    Memory,
}

impl MetadataBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "firestore" => Some(Self::Firestore),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size outside the upload routes
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Expected token issuer
    pub jwt_issuer: String,
    /// Public base URL of this server
    pub public_base_url: String,
    /// Directory served at `/assets`
    pub assets_root: PathBuf,
    /// Thumbnail persistence
    pub thumbnail_storage: ThumbnailStorageMode,
    /// Metadata store
    pub metadata_backend: MetadataBackend,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8091,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            jwt_secret: String::new(),
            jwt_issuer: "tubely-access".to_string(),
            public_base_url: "http://localhost:8091".to_string(),
            assets_root: PathBuf::from("assets"),
            thumbnail_storage: ThumbnailStorageMode::Local,
            metadata_backend: MetadataBackend::Firestore,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port,
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            jwt_issuer: std::env::var("JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),
            assets_root: std::env::var("ASSETS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.assets_root),
            thumbnail_storage: std::env::var("THUMBNAIL_STORAGE")
                .ok()
                .and_then(|s| ThumbnailStorageMode::parse(&s))
                .unwrap_or(defaults.thumbnail_storage),
            metadata_backend: std::env::var("METADATA_BACKEND")
                .ok()
                .and_then(|s| MetadataBackend::parse(&s))
                .unwrap_or(defaults.metadata_backend),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.trim().eq_ignore_ascii_case("production")
    }

    /// Public URL prefix of locally stored assets.
    pub fn assets_base_url(&self) -> String {
        format!("{}/assets", self.public_base_url.trim_end_matches('/'))
    }
}

/// Ingestion pipeline configuration.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Largest accepted upload
    pub max_upload_bytes: u64,
    /// Directory for staged uploads
    pub scratch_dir: PathBuf,
    /// Wall-clock limit for one ingestion run
    pub timeout: Duration,
    /// Max concurrent ingestion runs
    pub max_in_flight: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            scratch_dir: std::env::temp_dir().join("tubely"),
            timeout: Duration::from_secs(900),
            max_in_flight: 8,
        }
    }
}

impl IngestConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_upload_bytes: std::env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_upload_bytes),
            scratch_dir: std::env::var("SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            timeout: std::env::var("INGEST_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_in_flight: std::env::var("INGEST_MAX_IN_FLIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_in_flight),
        }
    }
}
