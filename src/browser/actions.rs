use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{Error, Result};
use crate::remote::{guarded, Entry};

use super::routing::Action;
use super::view::{s3_uri, StatusLine};
use super::Browser;

/// Downloaded file waiting for the terminal to be released
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub path: PathBuf,
    pub source: String,
}

impl Browser {
    /// Run `action` on `entry`. Only objects are valid targets; navigation
    /// state is never touched.
    pub(super) async fn run_action(&mut self, action: Action, entry: &Entry) -> Result<()> {
        let Entry::Leaf { key, .. } = entry else {
            return Err(Error::invalid_entry(format!(
                "cannot {} a {}",
                action.label(),
                entry.kind_label()
            )));
        };
        let container = self.require_container()?;
        let source = s3_uri(&container, key);

        match action {
            Action::Download => {
                let dir = self.options.download_dir.clone();
                self.fetch_to(&dir, &container, key, entry.file_name())
                    .await?;
                self.status = StatusLine::info(format!("download complete. {source}"));
            }
            Action::Open => {
                let dir = self.scratch_dir().await?;
                let path = self
                    .fetch_to(&dir, &container, key, entry.file_name())
                    .await?;
                self.launcher.open(&path).await?;
                self.status = StatusLine::info(format!("open. {source}"));
            }
            Action::Edit => {
                let dir = self.scratch_dir().await?;
                let path = self
                    .fetch_to(&dir, &container, key, entry.file_name())
                    .await?;
                self.status = StatusLine::info(format!("editing {source}"));
                self.pending_edit = Some(PendingEdit { path, source });
            }
        }
        Ok(())
    }

    /// Stream an object into `dir/file_name`. A fetch that fails after the
    /// file was created leaves the partial file in place.
    async fn fetch_to(
        &self,
        dir: &Path,
        container: &str,
        key: &str,
        file_name: &str,
    ) -> Result<PathBuf> {
        let path = dir.join(file_name);
        let mut file = fs::File::create(&path).await.map_err(|e| {
            tracing::error!("failed to create {}: {}", path.display(), e);
            e
        })?;

        match guarded(
            self.options.timeout,
            "GetObject",
            self.remote.fetch_object(container, key, &mut file),
        )
        .await
        {
            Ok(n) => {
                file.sync_all().await?;
                tracing::info!("Downloaded {} bytes to {}", n, path.display());
                Ok(path)
            }
            Err(e) => {
                tracing::warn!(
                    "fetch of {} failed, partial file left at {}",
                    s3_uri(container, key),
                    path.display()
                );
                Err(e)
            }
        }
    }

    /// Fresh directory so concurrent temp files never collide.
    async fn scratch_dir(&self) -> Result<PathBuf> {
        let dir = self
            .options
            .scratch_root
            .join(format!("s3nav-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Take the queued editor hand-off, if any.
    pub fn take_pending_edit(&mut self) -> Option<PendingEdit> {
        self.pending_edit.take()
    }

    /// Record the editor outcome once the terminal is back.
    pub fn finish_edit(&mut self, edit: PendingEdit, result: Result<()>) {
        match result {
            Ok(()) => self.status = StatusLine::info(format!("edit. {}", edit.source)),
            Err(e) => self.report(&e),
        }
    }
}
