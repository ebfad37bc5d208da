use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

const FALLBACK_EDITOR: &str = "vi";

/// Hands downloaded files to programs outside the TUI
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Open with the platform's default viewer.
    async fn open(&self, path: &Path) -> Result<()>;

    /// Run an editor in the foreground. The caller must release the terminal first.
    async fn edit(&self, path: &Path) -> Result<()>;
}

/// Launcher backed by the `open` crate and `$VISUAL` / `$EDITOR`
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    editor: Option<String>,
}

impl SystemLauncher {
    pub fn new(editor: Option<String>) -> Self {
        Self { editor }
    }

    /// Editor command line: configured, then `$VISUAL`, `$EDITOR`, then `vi`.
    pub fn editor_command(&self) -> String {
        pick_editor([
            self.editor.clone(),
            std::env::var("VISUAL").ok(),
            std::env::var("EDITOR").ok(),
        ])
    }
}

/// First non-blank candidate, else the fallback editor.
fn pick_editor(candidates: impl IntoIterator<Item = Option<String>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|e| !e.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_EDITOR.to_string())
}

#[async_trait]
impl Launcher for SystemLauncher {
    async fn open(&self, path: &Path) -> Result<()> {
        let target: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || open::that(&target))
            .await
            .map_err(|e| Error::launch(format!("viewer task failed: {e}")))?
            .map_err(|e| Error::launch(format!("failed to open {}: {e}", path.display())))
    }

    async fn edit(&self, path: &Path) -> Result<()> {
        let editor = self.editor_command();
        // Allow "code --wait" style commands
        let mut parts = editor.split_whitespace();
        let program = parts.next().unwrap_or(FALLBACK_EDITOR);

        tracing::info!("Launching editor {} for {}", editor, path.display());
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .await
            .map_err(|e| Error::launch(format!("failed to start {program}: {e}")))?;

        if !status.success() {
            return Err(Error::launch(format!("{editor} exited with {status}")));
        }
        Ok(())
    }
}
