//! S3-compatible template store using the MinIO client
//!
//! Each template is one object at `{prefix}/{name}` inside a single bucket.
//! There is no manifest: listing relies on the backend's own prefix listing.
//! Works with AWS S3, MinIO, and any S3-compatible object storage.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use minio::s3::{
    client::Client,
    creds::StaticProvider,
    error::{Error, ErrorCode},
    http::BaseUrl,
    segmented_bytes::SegmentedBytes,
    types::{S3Api, ToStream},
};
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use super::{StorageError, StoredTemplate, TemplateStore};

/// Connection parameters for [`S3Store`]
#[derive(Debug, Clone)]
pub struct ObjectStoreSettings {
    /// Host and optional port, e.g. `localhost:9000`. A scheme, if present,
    /// is replaced according to `use_ssl`.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub bucket: String,
    /// Region used to sign requests. Set explicitly so the client never
    /// issues a bucket-location lookup of its own.
    pub region: String,
    /// Key prefix templates live under, without leading or trailing `/`
    pub prefix: String,
    /// Upper bound for every individual backend call
    pub timeout: Duration,
}

impl ObjectStoreSettings {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    fn base_url(&self) -> String {
        let host = self
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, host)
    }
}

/// Template store backed by an S3-compatible bucket
pub struct S3Store {
    client: Client,
    bucket: String,
    prefix: String,
    timeout: Duration,
}

impl S3Store {
    /// Build the store and its client
    ///
    /// Fails immediately if the client cannot be constructed (bad endpoint);
    /// no network traffic happens here.
    pub fn new(settings: &ObjectStoreSettings) -> Result<Self, StorageError> {
        if settings.bucket.is_empty() {
            return Err(StorageError::Unavailable("Bucket name not set".into()));
        }

        let mut base_url = BaseUrl::from_str(&settings.base_url()).map_err(|e| {
            StorageError::Unavailable(format!("Invalid endpoint '{}': {}", settings.endpoint, e))
        })?;
        base_url.region = if settings.region.is_empty() {
            ObjectStoreSettings::DEFAULT_REGION.to_string()
        } else {
            settings.region.clone()
        };

        let creds_provider = StaticProvider::new(&settings.access_key, &settings.secret_key, None);

        let client = Client::new(
            base_url,
            Some(Box::new(creds_provider)),
            None, // No custom CA certificate
            None, // Verify certificates
        )
        .map_err(|e| StorageError::Unavailable(format!("Failed to create S3 client: {}", e)))?;

        info!(
            endpoint = %settings.endpoint,
            bucket = %settings.bucket,
            prefix = %settings.prefix,
            use_ssl = settings.use_ssl,
            "S3 template store configured"
        );

        Ok(Self {
            client,
            bucket: settings.bucket.clone(),
            prefix: settings.prefix.trim_matches('/').to_string(),
            timeout: settings.timeout,
        })
    }

    /// Ensure bucket exists (create if it doesn't)
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        let response = self
            .bounded("bucket_exists", self.client.bucket_exists(&self.bucket).send())
            .await?
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to check bucket '{}': {}", self.bucket, e))
            })?;

        if response.exists {
            return Ok(());
        }

        self.bounded("create_bucket", self.client.create_bucket(&self.bucket).send())
            .await?
            .map_err(|e| {
                StorageError::Unavailable(format!(
                    "Failed to create bucket '{}': {}",
                    self.bucket, e
                ))
            })?;

        info!(bucket = %self.bucket, "Created template bucket");
        Ok(())
    }

    /// Object key for a template name
    pub fn object_key(&self, name: &str) -> String {
        object_key(&self.prefix, name)
    }

    /// Prefix used to scope listing to this store's templates
    fn list_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}/", self.prefix)
        }
    }

    /// Run a backend call with the configured timeout
    ///
    /// The inner future is dropped on timeout; the remote side may still
    /// complete the request.
    async fn bounded<F, T>(&self, operation: &str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StorageError::Timeout {
                operation: operation.to_string(),
                timeout: self.timeout,
            })
    }
}

fn object_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Validate S3 key format
fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.len() > 1024 {
        return Err(StorageError::InvalidKey(
            "Key must be between 1 and 1024 characters".into(),
        ));
    }

    if key.starts_with('/') || key.ends_with('/') {
        return Err(StorageError::InvalidKey(
            "Key cannot start or end with '/'".into(),
        ));
    }

    Ok(())
}

/// Only an S3 `NoSuchKey` reply means the object is absent. Transport
/// failures and every other error code are backend errors.
fn is_not_found(err: &Error) -> bool {
    matches!(err, Error::S3Error(resp) if resp.code == ErrorCode::NoSuchKey)
}

#[async_trait]
impl TemplateStore for S3Store {
    async fn get_by_name(&self, name: &str) -> Result<Option<String>, StorageError> {
        let key = self.object_key(name);
        validate_key(&key)?;

        let response = match self
            .bounded("get_object", self.client.get_object(&self.bucket, &key).send())
            .await?
        {
            Ok(response) => response,
            Err(e) if is_not_found(&e) => {
                debug!(key = %key, "Template object not found");
                return Ok(None);
            }
            Err(e) => {
                return Err(StorageError::Unavailable(format!(
                    "Failed to get object '{}': {}",
                    key, e
                )));
            }
        };

        let content = self
            .bounded("read_object", response.content.to_segmented_bytes())
            .await?
            .map_err(|e| {
                StorageError::Unavailable(format!("Failed to read object '{}' content: {}", key, e))
            })?;

        String::from_utf8(content.to_bytes().to_vec())
            .map(Some)
            .map_err(|_| StorageError::InvalidUtf8(name.to_string()))
    }

    async fn get_all(&self) -> Result<Vec<StoredTemplate>, StorageError> {
        let prefix = self.list_prefix();

        let listing = async {
            let mut names = Vec::new();
            let mut stream = self
                .client
                .list_objects(&self.bucket)
                .prefix(Some(prefix.clone()))
                .recursive(true)
                .to_stream()
                .await;

            while let Some(result) = stream.next().await {
                let response = result.map_err(|e| {
                    StorageError::Unavailable(format!(
                        "Failed to list objects with prefix '{}': {}",
                        prefix, e
                    ))
                })?;

                for entry in response.contents {
                    if let Some(name) = name_from_key(&prefix, &entry.name) {
                        names.push(StoredTemplate::name_only(name));
                    }
                }
            }

            Ok::<_, StorageError>(names)
        };

        self.bounded("list_objects", listing).await?
    }

    async fn add(&self, name: &str, content: &str) -> Result<(), StorageError> {
        let key = self.object_key(name);
        validate_key(&key)?;

        let bytes = SegmentedBytes::from(Bytes::from(content.as_bytes().to_vec()));

        self.bounded(
            "put_object",
            self.client.put_object(&self.bucket, &key, bytes).send(),
        )
        .await?
        .map_err(|e| StorageError::Unavailable(format!("Failed to put object '{}': {}", key, e)))?;

        debug!(key = %key, bytes = content.len(), "Stored template object");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "object-store"
    }
}

/// Strip the listing prefix off a key, skipping directory markers
fn name_from_key(list_prefix: &str, key: &str) -> Option<String> {
    let name = key.strip_prefix(list_prefix)?;
    if name.is_empty() || name.ends_with('/') {
        return None;
    }
    Some(name.to_string())
}
