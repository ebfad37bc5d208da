use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event as CrosstermEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::browser::{Browser, Command, PendingEdit};
use crate::config::KeyBindings;
use crate::error::Result;

use super::terminal::{Suspended, Tui};

/// How long the process may linger after the loop exits before it is
/// forced down.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Main TUI application
pub struct App {
    browser: Browser,
    keys: KeyBindings,
    interrupted: Arc<AtomicBool>,
}

impl App {
    pub fn new(browser: Browser, keys: KeyBindings) -> Self {
        Self {
            browser,
            keys,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        self.watch_interrupt();

        // Setup terminal
        enable_raw_mode()?;
        let mut terminal = rollback_on_error(setup_terminal, || {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
        })?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        arm_exit_watchdog(SHUTDOWN_GRACE);
        result
    }

    /// Raw mode swallows Ctrl+C as a key; a signal sent from outside still
    /// lands here and is picked up on the next tick.
    fn watch_interrupt(&self) {
        let flag = Arc::clone(&self.interrupted);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received");
                flag.store(true, Ordering::SeqCst);
            }
        });
    }

    async fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        let tick_rate = Duration::from_millis(250);
        let hints = self.keys.hints();

        loop {
            terminal.draw(|f| super::render::draw(f, &self.browser.view(), &hints))?;

            if event::poll(tick_rate)? {
                match event::read()? {
                    CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        let mode = self.browser.mode_kind();
                        if let Some(input) = self.keys.resolve(mode, key.code, key.modifiers) {
                            self.browser.handle(input).await;
                        }
                    }
                    CrosstermEvent::Resize(_, _) => {
                        // Next draw picks up the new size
                    }
                    _ => {}
                }
            }

            if let Some(edit) = self.browser.take_pending_edit() {
                let result = self.perform_edit(terminal, &edit).await;
                self.browser.finish_edit(edit, result);
            }

            if self.interrupted.load(Ordering::SeqCst) {
                self.browser.apply(Command::Quit).await;
            }

            if self.browser.should_quit() {
                break;
            }
        }

        Ok(())
    }

    async fn perform_edit(&self, terminal: &mut Tui, edit: &PendingEdit) -> Result<()> {
        let launcher = self.browser.launcher();
        let _suspended = Suspended::new(terminal)?;
        tracing::info!("Handing terminal to editor for {}", edit.source);
        launcher.edit(&edit.path).await
    }
}

fn setup_terminal() -> Result<Tui> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;
    Ok(terminal)
}

/// Run `setup`, calling `rollback` if it fails.
fn rollback_on_error<T>(setup: impl FnOnce() -> Result<T>, rollback: impl FnOnce()) -> Result<T> {
    setup().inspect_err(|e| {
        tracing::error!("Terminal setup failed: {}", e);
        rollback();
    })
}

/// Force the process down if something keeps it alive past `grace`.
fn arm_exit_watchdog(grace: Duration) {
    std::thread::spawn(move || {
        std::thread::sleep(grace);
        tracing::error!("Shutdown took longer than {:?}, forcing exit", grace);
        std::process::exit(1);
    });
}
