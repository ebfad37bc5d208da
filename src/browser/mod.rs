//! Interaction state machine over the navigation tree.

mod actions;
mod launcher;
mod routing;
mod view;

pub use actions::PendingEdit;
pub use launcher::{Launcher, SystemLauncher};
pub use routing::{route, Action, Command, Input, ModeKind};
pub use view::{format_time, s3_uri, DetailPanel, MenuState, Overlay, StatusLine, View};

#[cfg(test)]
pub(crate) use launcher::testing as launcher_testing;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::remote::{guarded, Entry, RemoteClient, DEFAULT_TIMEOUT};
use crate::tree::{NavTree, NodeId};

/// Current interaction mode with its payload
#[derive(Debug, Clone)]
pub enum Mode {
    List,
    Menu(MenuState),
    Detail(DetailPanel),
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::List => ModeKind::List,
            Mode::Menu(_) => ModeKind::Menu,
            Mode::Detail(_) => ModeKind::Detail,
        }
    }
}

/// Tunables for a browsing session
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub timeout: Duration,
    /// Destination for downloads
    pub download_dir: PathBuf,
    /// Parent of the per-action scratch directories used by open/edit
    pub scratch_root: PathBuf,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            download_dir: PathBuf::from("."),
            scratch_root: std::env::temp_dir(),
        }
    }
}

/// One browsing session: tree cache, mode and status
pub struct Browser {
    tree: NavTree,
    current: NodeId,
    container: Option<String>,
    mode: Mode,
    status: StatusLine,
    breadcrumb: String,
    pending_edit: Option<PendingEdit>,
    should_quit: bool,

    remote: Arc<dyn RemoteClient>,
    launcher: Arc<dyn Launcher>,
    options: BrowserOptions,
}

impl Browser {
    /// Fetch the container listing and build the session. Fails if the
    /// listing cannot be fetched, since there is nothing to navigate.
    pub async fn bootstrap(
        remote: Arc<dyn RemoteClient>,
        launcher: Arc<dyn Launcher>,
        options: BrowserOptions,
    ) -> Result<Self> {
        let containers = guarded(options.timeout, "ListBuckets", remote.list_containers()).await?;
        tracing::info!("Loaded {} buckets", containers.len());

        let tree = NavTree::new(containers);
        let current = tree.root();
        let mut browser = Self {
            tree,
            current,
            container: None,
            mode: Mode::List,
            status: StatusLine::default(),
            breadcrumb: String::new(),
            pending_edit: None,
            should_quit: false,
            remote,
            launcher,
            options,
        };
        browser.update_breadcrumb();
        Ok(browser)
    }

    /// Route an input through the current mode and apply it.
    pub async fn handle(&mut self, input: Input) {
        let command = route(self.mode.kind(), input);
        self.apply(command).await;
    }

    /// Apply a routed command. Failures end up on the status line.
    pub async fn apply(&mut self, command: Command) {
        let result = match command {
            Command::MoveCursor(delta) => {
                self.tree.move_cursor(self.current, delta);
                Ok(())
            }
            Command::Activate => self.activate().await,
            Command::Ascend => self.ascend(),
            Command::Reload => self.reload().await,
            Command::OpenMenu => self.open_menu(),
            Command::OpenDetail => self.open_detail().await,
            Command::Run(action) => match self.tree.selected(self.current).cloned() {
                Some(entry) => self.run_action(action, &entry).await,
                None => Err(Error::invalid_entry("nothing selected")),
            },
            Command::MenuMove(delta) => {
                if let Mode::Menu(menu) = &mut self.mode {
                    menu.step(delta);
                }
                Ok(())
            }
            Command::MenuRun => match std::mem::replace(&mut self.mode, Mode::List) {
                Mode::Menu(menu) => {
                    let (action, target) = menu.into_parts();
                    self.run_action(action, &target).await
                }
                other => {
                    self.mode = other;
                    Ok(())
                }
            },
            Command::Scroll(delta) => {
                if let Mode::Detail(panel) = &mut self.mode {
                    panel.scroll(delta);
                }
                Ok(())
            }
            Command::Close => {
                self.mode = Mode::List;
                Ok(())
            }
            Command::Quit => {
                tracing::info!("Quit requested");
                self.should_quit = true;
                Ok(())
            }
            Command::Ignore => Ok(()),
        };

        if let Err(e) = result {
            self.report(&e);
        }
        self.update_breadcrumb();
    }

    fn report(&mut self, err: &Error) {
        match err {
            Error::InvalidEntry(_) => tracing::debug!("{}", err),
            Error::Io(_) => tracing::error!("{}", err),
            _ => tracing::warn!("{}", err),
        }
        self.status = StatusLine::error(err.to_string());
    }

    async fn activate(&mut self) -> Result<()> {
        let Some(entry) = self.tree.selected(self.current).cloned() else {
            return Ok(());
        };

        match entry {
            Entry::Container { name, .. } => {
                self.descend(&name, &name, "").await?;
                self.container = Some(name);
                Ok(())
            }
            Entry::Group { prefix } => {
                let container = self.require_container()?;
                self.descend(&prefix, &container, &prefix).await
            }
            Entry::UpDir => self.ascend(),
            // Objects are not descendable
            Entry::Leaf { .. } => Ok(()),
        }
    }

    /// Move into `key`, fetching `container`/`prefix` only on a cache miss.
    async fn descend(&mut self, key: &str, container: &str, prefix: &str) -> Result<()> {
        if let Some(child) = self.tree.descend_into(self.current, key) {
            self.current = child;
            tracing::debug!("Move next (cached). child:{}", key);
            return Ok(());
        }

        let entries = guarded(
            self.options.timeout,
            "ListObjects",
            self.remote.list_entries(container, prefix),
        )
        .await?;
        let parent = self.current;
        self.current = self.tree.attach(parent, key, entries);
        tracing::debug!(
            "Load next. parent:{}, child:{}",
            self.tree.node(parent).key(),
            key
        );
        Ok(())
    }

    fn ascend(&mut self) -> Result<()> {
        if self.tree.is_root(self.current) {
            return Ok(());
        }
        self.current = self.tree.ascend(self.current)?;
        tracing::debug!("Load prev. node:{}", self.tree.node(self.current).key());
        Ok(())
    }

    async fn reload(&mut self) -> Result<()> {
        let fresh = if self.tree.is_root(self.current) {
            guarded(
                self.options.timeout,
                "ListBuckets",
                self.remote.list_containers(),
            )
            .await?
        } else {
            let container = self.require_container()?;
            let prefix = if self.tree.is_container_root(self.current) {
                String::new()
            } else {
                self.tree.node(self.current).key().to_string()
            };
            guarded(
                self.options.timeout,
                "ListObjects",
                self.remote.list_entries(&container, &prefix),
            )
            .await?
        };

        self.tree.refresh(self.current, fresh);
        self.status = StatusLine::info(format!("reloaded {}", self.breadcrumb));
        Ok(())
    }

    fn open_menu(&mut self) -> Result<()> {
        let Some(entry) = self.tree.selected(self.current) else {
            return Err(Error::invalid_entry("nothing selected"));
        };
        self.mode = Mode::Menu(MenuState::new(entry.clone()));
        Ok(())
    }

    async fn open_detail(&mut self) -> Result<()> {
        let Some(entry) = self.tree.selected(self.current).cloned() else {
            return Err(Error::invalid_entry("nothing selected"));
        };

        let panel = match &entry {
            Entry::Leaf { key, .. } => {
                let container = self.require_container()?;
                let meta = guarded(
                    self.options.timeout,
                    "HeadObject",
                    self.remote.get_metadata(&container, key),
                )
                .await?;
                DetailPanel::from_metadata(&container, &meta)
            }
            Entry::Container { name, created_at } => DetailPanel::for_container(name, *created_at),
            Entry::Group { prefix } => DetailPanel::for_group(&self.require_container()?, prefix),
            Entry::UpDir => return Err(Error::invalid_entry("no details for \"..\"")),
        };

        self.mode = Mode::Detail(panel);
        Ok(())
    }

    fn require_container(&self) -> Result<String> {
        self.container
            .clone()
            .ok_or_else(|| Error::invalid_entry("no bucket selected"))
    }

    /// Prefix stripped from entry names in the current listing
    fn list_prefix(&self) -> &str {
        if self.tree.is_root(self.current) || self.tree.is_container_root(self.current) {
            ""
        } else {
            self.tree.node(self.current).key()
        }
    }

    fn update_breadcrumb(&mut self) {
        self.breadcrumb = match (&self.container, self.tree.is_root(self.current)) {
            (Some(container), false) => s3_uri(container, self.list_prefix()),
            _ => "s3://".to_string(),
        };
    }

    /// Snapshot handed to the compositor
    pub fn view(&self) -> View<'_> {
        let node = self.tree.node(self.current);
        let overlay = match &self.mode {
            Mode::List => Overlay::None,
            Mode::Menu(menu) => Overlay::Menu(menu),
            Mode::Detail(panel) => Overlay::Detail(panel),
        };
        View {
            breadcrumb: &self.breadcrumb,
            prefix: self.list_prefix(),
            entries: node.entries(),
            cursor: node.cursor(),
            overlay,
            status: &self.status,
        }
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn tree(&self) -> &NavTree {
        &self.tree
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn launcher(&self) -> Arc<dyn Launcher> {
        Arc::clone(&self.launcher)
    }
}

#[cfg(test)]
mod tests {
    use super::launcher_testing::RecordingLauncher;
    use super::*;
    use crate::remote::testing::{group, leaf, Call, MemoryClient};

    fn alpha_client() -> MemoryClient {
        MemoryClient::new(&["alpha", "beta"])
            .with_listing(
                "alpha",
                "",
                vec![Entry::UpDir, group("logs/"), leaf("readme.txt", 42)],
            )
            .with_listing("alpha", "logs/", vec![Entry::UpDir, leaf("logs/app.log", 7)])
            .with_object("alpha", "readme.txt", b"hello")
    }

    fn options(dir: &std::path::Path) -> BrowserOptions {
        BrowserOptions {
            timeout: Duration::from_secs(5),
            download_dir: dir.join("downloads"),
            scratch_root: dir.join("scratch"),
        }
    }

    async fn browser_with(client: Arc<MemoryClient>, dir: &std::path::Path) -> Browser {
        std::fs::create_dir_all(dir.join("downloads")).unwrap();
        Browser::bootstrap(client, Arc::new(RecordingLauncher::default()), options(dir))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_bootstrap_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let client = MemoryClient::new(&["alpha"]).failing();
        let result = Browser::bootstrap(
            Arc::new(client),
            Arc::new(RecordingLauncher::default()),
            options(dir.path()),
        )
        .await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_descend_and_ascend() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        let root = browser.current();

        browser.handle(Input::Activate).await;
        assert_eq!(browser.container(), Some("alpha"));
        assert!(browser.tree().is_container_root(browser.current()));
        assert_eq!(browser.view().breadcrumb, "s3://alpha/");

        browser.handle(Input::Down).await;
        browser.handle(Input::Activate).await;
        assert_eq!(browser.view().breadcrumb, "s3://alpha/logs/");
        assert_eq!(browser.view().prefix, "logs/");

        browser.handle(Input::Activate).await; // cursor on ".."
        assert!(browser.tree().is_container_root(browser.current()));

        browser.handle(Input::Back).await;
        assert_eq!(browser.current(), root);
        assert_eq!(browser.view().breadcrumb, "s3://");

        // Guarded at root
        browser.handle(Input::Back).await;
        assert_eq!(browser.current(), root);
        assert!(!browser.status().is_error());
    }

    #[tokio::test]
    async fn test_revisit_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;

        browser.handle(Input::Activate).await;
        let alpha = browser.current();
        browser.handle(Input::Down).await;
        browser.handle(Input::Down).await;
        browser.handle(Input::Back).await;
        let listings = client.listing_count();

        browser.handle(Input::Activate).await;
        assert_eq!(browser.current(), alpha);
        assert_eq!(client.listing_count(), listings);
        assert_eq!(browser.view().cursor, 2);
    }

    #[tokio::test]
    async fn test_failed_descend_attaches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        let root = browser.current();

        browser.handle(Input::Down).await; // beta has no listing
        browser.handle(Input::Activate).await;

        assert_eq!(browser.current(), root);
        assert_eq!(browser.tree().len(), 1);
        assert!(browser.status().is_error());
        assert!(browser.tree().descend_into(root, "beta").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_descend_timeout_attaches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        let root = browser.current();
        client.stall_listings(true);

        browser.handle(Input::Activate).await;

        assert_eq!(browser.current(), root);
        assert_eq!(browser.tree().len(), 1);
        assert!(browser.tree().descend_into(root, "alpha").is_none());
        assert_eq!(browser.container(), None);
        assert!(browser.status().is_error());
        assert!(browser.status().text().contains("canceled"));
        assert_eq!(browser.view().breadcrumb, "s3://");

        // Nothing was cached, so the next attempt fetches again
        client.stall_listings(false);
        let listings = client.listing_count();
        browser.handle(Input::Activate).await;
        assert_eq!(client.listing_count(), listings + 1);
        assert_eq!(browser.container(), Some("alpha"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_timeout_keeps_listing() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;
        browser.apply(Command::MoveCursor(2)).await;
        let node = browser.current();
        let before = browser.view().entries.to_vec();
        client.stall_listings(true);

        browser.handle(Input::Reload).await;

        assert_eq!(browser.current(), node);
        assert_eq!(browser.view().entries, &before[..]);
        assert_eq!(browser.view().cursor, 2);
        assert!(browser.status().is_error());
        assert!(browser.status().text().contains("canceled"));
        assert!(!browser.status().text().starts_with("reloaded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_root_reload_timeout_keeps_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Down).await;
        client.stall_listings(true);

        browser.handle(Input::Reload).await;

        assert_eq!(browser.view().entries.len(), 2);
        assert_eq!(browser.view().cursor, 1);
        assert!(browser.status().text().contains("canceled"));
    }

    #[tokio::test]
    async fn test_activate_on_leaf_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;
        browser.apply(Command::MoveCursor(2)).await;
        let node = browser.current();
        let calls = client.calls().len();

        browser.handle(Input::Activate).await;
        assert_eq!(browser.current(), node);
        assert_eq!(client.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_reload_refetches_scope() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;

        browser.handle(Input::Reload).await;
        browser.handle(Input::Activate).await;
        browser.handle(Input::Reload).await;
        browser.handle(Input::Down).await;
        browser.handle(Input::Activate).await;
        browser.handle(Input::Reload).await;

        assert_eq!(
            client.calls(),
            vec![
                Call::ListContainers,
                Call::ListContainers,
                Call::ListEntries("alpha".into(), "".into()),
                Call::ListEntries("alpha".into(), "".into()),
                Call::ListEntries("alpha".into(), "logs/".into()),
                Call::ListEntries("alpha".into(), "logs/".into()),
            ]
        );
        assert!(browser.status().text().starts_with("reloaded"));
    }

    #[tokio::test]
    async fn test_menu_cancel_restores_list() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;
        browser.handle(Input::Down).await;
        let node = browser.current();
        let cursor = browser.view().cursor;

        browser.handle(Input::Menu).await;
        assert_eq!(browser.mode_kind(), ModeKind::Menu);
        browser.handle(Input::Down).await;
        browser.handle(Input::Down).await;
        assert!(matches!(browser.view().overlay, Overlay::Menu(m) if m.action() == Action::Edit));
        browser.handle(Input::Cancel).await;

        assert_eq!(browser.mode_kind(), ModeKind::List);
        assert_eq!(browser.current(), node);
        assert_eq!(browser.view().cursor, cursor);
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_menu_runs_against_captured_entry() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;
        browser.apply(Command::MoveCursor(2)).await;

        browser.handle(Input::Menu).await;
        browser.handle(Input::Activate).await;

        assert_eq!(browser.mode_kind(), ModeKind::List);
        assert_eq!(client.fetch_count(), 1);
        assert!(dir.path().join("downloads/readme.txt").exists());
    }

    #[tokio::test]
    async fn test_menu_returns_to_list_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;
        browser.handle(Input::Down).await; // logs/

        browser.handle(Input::Menu).await;
        browser.handle(Input::Activate).await;

        assert_eq!(browser.mode_kind(), ModeKind::List);
        assert!(browser.status().is_error());
        assert_eq!(client.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_detail_for_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;
        browser.apply(Command::MoveCursor(2)).await;

        browser.handle(Input::Detail).await;
        let Mode::Detail(panel) = browser.mode() else {
            panic!("expected detail mode");
        };
        assert_eq!(panel.title(), "readme.txt");
        assert!(panel
            .rows()
            .iter()
            .any(|(k, v)| k == "Size" && v == "5 bytes"));

        browser.handle(Input::Down).await;
        browser.handle(Input::Download).await; // ignored in detail mode
        assert_eq!(client.fetch_count(), 0);

        browser.handle(Input::Cancel).await;
        assert_eq!(browser.mode_kind(), ModeKind::List);
        assert_eq!(browser.view().cursor, 2);
    }

    #[tokio::test]
    async fn test_detail_for_bucket_is_local() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        let calls = client.calls().len();

        browser.handle(Input::Detail).await;
        assert_eq!(browser.mode_kind(), ModeKind::Detail);
        assert_eq!(client.calls().len(), calls);
    }

    #[tokio::test]
    async fn test_detail_rejects_updir() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client.clone(), dir.path()).await;
        browser.handle(Input::Activate).await;

        browser.handle(Input::Detail).await;
        assert_eq!(browser.mode_kind(), ModeKind::List);
        assert!(browser.status().is_error());
    }

    #[tokio::test]
    async fn test_quit_sets_flag() {
        let dir = tempfile::tempdir().unwrap();
        let client = Arc::new(alpha_client());
        let mut browser = browser_with(client, dir.path()).await;
        assert!(!browser.should_quit());
        browser.handle(Input::Quit).await;
        assert!(browser.should_quit());
    }
}
