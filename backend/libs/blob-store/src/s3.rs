/// S3-backed object store
///
/// Works against AWS S3 and S3-compatible servers. For MinIO set an endpoint
/// and path-style addressing.
use crate::config::S3Config;
use crate::{ObjectStore, StoreError, StoreResult};
use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, info};

#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from explicit configuration, falling back to the
    /// default AWS credential chain when no keys are given.
    pub async fn new(config: &S3Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "blob_store_static",
            );
            loader = loader.credentials_provider(credentials);
        }

        let sdk_config = loader.load().await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "S3 object store initialized"
        );

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

fn backend_error<E: std::error::Error>(action: &str, bucket: &str, key: &str, err: E) -> StoreError {
    StoreError::Backend(format!(
        "{action} {bucket}/{key}: {}",
        DisplayErrorContext(&err)
    ))
}

// Some S3-compatible servers answer HEAD without a modeled error body.
fn looks_like_not_found(message: &str) -> bool {
    message.contains("NotFound") || message.contains("NoSuchKey") || message.contains("404")
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn exists(&self, bucket: &str, key: &str) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()) == Some(true) {
                    return Ok(false);
                }
                let message = DisplayErrorContext(&err).to_string();
                if looks_like_not_found(&message) || message.contains("NoSuchBucket") {
                    Ok(false)
                } else {
                    Err(StoreError::Backend(format!(
                        "head {bucket}/{key}: {message}"
                    )))
                }
            }
        }
    }

    async fn put(&self, bucket: &str, key: &str, data: Bytes) -> StoreResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|err| {
                let message = DisplayErrorContext(&err).to_string();
                if message.contains("NoSuchBucket") {
                    StoreError::BucketNotFound(bucket.to_string())
                } else {
                    StoreError::Backend(format!("put {bucket}/{key}: {message}"))
                }
            })?;

        debug!(bucket = %bucket, key = %key, size, "Object put");
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> StoreResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| {
                if err.as_service_error().map(|e| e.is_no_such_key()) == Some(true) {
                    return StoreError::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    };
                }
                let message = DisplayErrorContext(&err).to_string();
                if message.contains("NoSuchBucket") {
                    StoreError::BucketNotFound(bucket.to_string())
                } else {
                    StoreError::Backend(format!("get {bucket}/{key}: {message}"))
                }
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|err| backend_error("read body of", bucket, key, err))?;

        Ok(body.into_bytes())
    }

    async fn ensure_bucket(&self, bucket: &str) -> StoreResult<()> {
        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            return Ok(());
        }

        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(bucket = %bucket, "Bucket created");
                Ok(())
            }
            Err(err) => match err.as_service_error() {
                Some(e) if e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists() => {
                    debug!(bucket = %bucket, "Bucket created concurrently");
                    Ok(())
                }
                _ => Err(StoreError::Backend(format!(
                    "create bucket {bucket}: {}",
                    DisplayErrorContext(&err)
                ))),
            },
        }
    }
}
