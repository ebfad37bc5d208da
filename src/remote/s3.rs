use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::DateTime as SdkDateTime;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};

use super::{assemble_listing, Entry, ObjectMetadata, RemoteClient, DELIMITER};

/// Local MinIO-style endpoint used with `--mock`
pub const MOCK_ENDPOINT: &str = "http://localhost:9000";
const MOCK_REGION: &str = "ap-northeast-1";
const MOCK_ACCESS_KEY: &str = "access_key";
const MOCK_SECRET_KEY: &str = "secret_key";

/// S3 implementation of the remote hierarchy
#[derive(Debug, Clone)]
pub struct S3Client {
    client: Client,
}

impl S3Client {
    /// Client configured from the standard AWS provider chain (env, profile, IMDS).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self {
            client: Client::new(&config),
        }
    }

    /// Client for the local mock endpoint with throwaway credentials.
    pub fn mock() -> Self {
        let credentials = Credentials::new(MOCK_ACCESS_KEY, MOCK_SECRET_KEY, None, None, "s3nav-mock");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(MOCK_REGION))
            .endpoint_url(MOCK_ENDPOINT)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();
        Self {
            client: Client::from_conf(config),
        }
    }

    pub async fn connect(mock: bool) -> Self {
        if mock {
            tracing::info!("Using mock endpoint {}", MOCK_ENDPOINT);
            Self::mock()
        } else {
            Self::from_env().await
        }
    }
}

fn sdk_error<E, R>(op: &str, err: SdkError<E, R>) -> Error
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::TimeoutError(_) => Error::canceled(format!("{op}: {detail}")),
        _ => Error::transport(format!("{op}: {detail}")),
    }
}

fn to_chrono(ts: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}

#[async_trait]
impl RemoteClient for S3Client {
    async fn list_containers(&self) -> Result<Vec<Entry>> {
        let out = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| sdk_error("ListBuckets", e))?;

        Ok(out
            .buckets()
            .iter()
            .filter_map(|b| {
                Some(Entry::Container {
                    name: b.name()?.to_string(),
                    created_at: b.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn list_entries(&self, container: &str, prefix: &str) -> Result<Vec<Entry>> {
        let out = self
            .client
            .list_objects_v2()
            .bucket(container)
            .delimiter(DELIMITER)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| sdk_error("ListObjectsV2", e))?;

        if out.is_truncated().unwrap_or(false) {
            tracing::debug!("Listing of {}/{} truncated", container, prefix);
        }

        let groups = out
            .common_prefixes()
            .iter()
            .filter_map(|p| p.prefix().map(str::to_string))
            .collect::<Vec<_>>();
        let leaves = out
            .contents()
            .iter()
            .filter_map(|o| {
                Some(Entry::Leaf {
                    key: o.key()?.to_string(),
                    modified_at: o.last_modified().and_then(to_chrono),
                    size: o.size().unwrap_or(0).max(0) as u64,
                })
            })
            .collect::<Vec<_>>();

        Ok(assemble_listing(prefix, groups, leaves))
    }

    async fn fetch_object(
        &self,
        container: &str,
        key: &str,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let mut out = self
            .client
            .get_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("GetObject", e))?;

        let mut written = 0u64;
        while let Some(chunk) = out
            .body
            .try_next()
            .await
            .map_err(|e| Error::transport(format!("GetObject body: {e}")))?
        {
            dest.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dest.flush().await?;

        tracing::info!("Fetched s3://{}/{} ({} bytes)", container, key, written);
        Ok(written)
    }

    async fn get_metadata(&self, container: &str, key: &str) -> Result<ObjectMetadata> {
        let out = self
            .client
            .head_object()
            .bucket(container)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("HeadObject", e))?;

        Ok(ObjectMetadata {
            key: key.to_string(),
            size: out.content_length().unwrap_or(0).max(0) as u64,
            last_modified: out.last_modified().and_then(to_chrono),
            content_type: out.content_type().map(str::to_string),
            etag: out.e_tag().map(str::to_string),
            storage_class: out.storage_class().map(|s| s.as_str().to_string()),
            user_metadata: out
                .metadata()
                .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default(),
        })
    }
}
