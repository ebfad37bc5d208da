use std::sync::Arc;

use crate::browser::{Browser, BrowserOptions, SystemLauncher};
use crate::cli::Args;
use crate::config::ConfigFile;
use crate::error::Result;
use crate::remote::S3Client;

/// Bootstrap a session and hand it to the TUI.
pub async fn run_cli(args: Args) -> Result<()> {
    let cfg = ConfigFile::load().await?.unwrap_or_default();

    let remote = S3Client::connect(args.mock).await;
    let launcher = SystemLauncher::new(cfg.editor().map(str::to_string));
    let options = BrowserOptions {
        timeout: cfg.timeout(),
        download_dir: std::env::current_dir()?,
        ..Default::default()
    };
    tracing::info!(
        "Starting s3nav {} (mock: {}, timeout: {:?})",
        crate::VERSION,
        args.mock,
        options.timeout
    );

    let browser = Browser::bootstrap(Arc::new(remote), Arc::new(launcher), options).await?;

    let mut app = crate::ui::App::new(browser, cfg.key_bindings());
    app.run().await
}
