use std::io;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::error::Result;

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// A terminal that can be handed to a foreground child and taken back
pub trait Suspendable {
    fn release(&mut self) -> Result<()>;
    fn resume(&mut self) -> Result<()>;
}

impl Suspendable for Tui {
    fn release(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.backend_mut(), LeaveAlternateScreen)?;
        self.show_cursor()?;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.backend_mut(), EnterAlternateScreen)?;
        self.clear()?;
        Ok(())
    }
}

/// Terminal handed to a foreground child process. The alternate screen and
/// raw mode come back when the guard drops, including when `new` fails
/// halfway through releasing.
pub struct Suspended<'a, T: Suspendable> {
    terminal: &'a mut T,
}

impl<'a, T: Suspendable> Suspended<'a, T> {
    pub fn new(terminal: &'a mut T) -> Result<Self> {
        let mut guard = Self { terminal };
        guard.terminal.release()?;
        Ok(guard)
    }
}

impl<T: Suspendable> Drop for Suspended<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.terminal.resume() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
    }
}
