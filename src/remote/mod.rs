mod entry;
mod s3;

pub use entry::{Entry, ObjectMetadata};
pub use s3::{S3Client, MOCK_ENDPOINT};

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::{Error, Result};

/// Path delimiter used to group keys into virtual directories
pub const DELIMITER: &str = "/";

/// Default deadline for a single remote call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only view of a hierarchical object store.
///
/// Implementations do not apply deadlines themselves; callers wrap every
/// call with [`guarded`].
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Top-level listing, one `Entry::Container` per bucket.
    async fn list_containers(&self) -> Result<Vec<Entry>>;

    /// One delimited level under `prefix`: a leading `UpDir`, then groups,
    /// then leaves.
    async fn list_entries(&self, container: &str, prefix: &str) -> Result<Vec<Entry>>;

    /// Stream the full object body into `dest`, returning bytes written.
    async fn fetch_object(
        &self,
        container: &str,
        key: &str,
        dest: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64>;

    async fn get_metadata(&self, container: &str, key: &str) -> Result<ObjectMetadata>;
}

/// Run a remote call under a deadline. Expiry maps to `Error::Canceled`;
/// the future is dropped and nothing is retried.
pub async fn guarded<T, F>(timeout: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("{} canceled after {:?}", what, timeout);
            Err(Error::canceled(format!("{what} exceeded {timeout:?}")))
        }
    }
}

/// Assemble a delimited listing the way every client reports it.
pub(crate) fn assemble_listing(
    prefix: &str,
    common_prefixes: impl IntoIterator<Item = String>,
    leaves: impl IntoIterator<Item = Entry>,
) -> Vec<Entry> {
    let mut entries = vec![Entry::UpDir];
    entries.extend(
        common_prefixes
            .into_iter()
            .map(|prefix| Entry::Group { prefix }),
    );
    // Zero-byte "folder" markers show up as an object named after the prefix.
    entries.extend(leaves.into_iter().filter(|e| e.name() != prefix));
    entries
}


#[cfg(test)]
mod tests {
    use super::testing::{group, leaf};
    use super::*;

    #[test]
    fn test_listing_starts_with_updir() {
        let entries = assemble_listing(
            "",
            vec!["logs/".to_string()],
            vec![leaf("readme.txt", 42)],
        );
        assert_eq!(entries, vec![Entry::UpDir, group("logs/"), leaf("readme.txt", 42)]);
    }

    #[test]
    fn test_listing_drops_folder_marker() {
        let entries = assemble_listing(
            "logs/",
            Vec::new(),
            vec![leaf("logs/", 0), leaf("logs/app.log", 7)],
        );
        assert_eq!(entries, vec![Entry::UpDir, leaf("logs/app.log", 7)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guarded_times_out() {
        let err = guarded(Duration::from_secs(30), "list", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(err.is_canceled());
    }

    #[tokio::test]
    async fn test_guarded_passes_through_errors() {
        let err = guarded::<(), _>(Duration::from_secs(30), "list", async {
            Err(Error::transport("boom"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
