/// Media object storage shared by the content and chat services
///
/// Services depend on the [`ObjectStore`] trait only. An upload that fails is
/// logged and reported as "no media" so a broken bucket never fails a post or
/// message on its own.
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub mod config;
pub mod media;
pub mod operations;

pub use config::S3Config;
pub use media::{MediaInput, MediaUpload};
pub use operations::{S3Error, S3Operations};

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a name derived from `filename`.
    ///
    /// Returns the public URL, or `None` when nothing was stored.
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Option<String>;
}

/// Object store backed by an S3 bucket
#[derive(Clone)]
pub struct S3ObjectStore {
    operations: S3Operations,
}

impl S3ObjectStore {
    /// Credentials come from the default AWS chain; region and addressing
    /// style from `config`.
    pub async fn new(config: S3Config) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style)
            .build();
        let client = Client::from_conf(s3_config);

        info!(bucket = %config.bucket, "S3 object store initialized");
        Self {
            operations: S3Operations::new(Arc::new(client), config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Option<String> {
        let key = self.operations.config().object_key(filename);
        let content_type = config::content_type_for(filename);

        match self.operations.upload_file(&key, bytes, content_type).await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(key = %key, error = %e, "Media upload failed, continuing without media");
                None
            }
        }
    }
}

/// Store used when uploads are switched off; every upload yields no media.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledObjectStore;

#[async_trait]
impl ObjectStore for DisabledObjectStore {
    async fn store(&self, _bytes: Vec<u8>, filename: &str) -> Option<String> {
        warn!(filename = %filename, "Media uploads are disabled, dropping upload");
        None
    }
}

/// Process-local store for tests and `STORAGE_BACKEND=memory` runs.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(url).cloned()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn store(&self, bytes: Vec<u8>, filename: &str) -> Option<String> {
        if bytes.is_empty() {
            return None;
        }
        let url = format!("memory://{}", config::sanitize_filename(filename));
        self.objects.write().await.insert(url.clone(), bytes);
        Some(url)
    }
}
