use std::io::{self, Stdout};
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};

use crate::error::AppError;

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

fn terminal_error(context: &str, source: io::Error) -> AppError {
    AppError::IoContext {
        context: context.to_string(),
        source,
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// Raw mode + alternate screen for as long as it lives.
pub struct TuiTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TuiTerminal {
    pub fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| terminal_error("failed to enable raw mode", e))?;

        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, Hide) {
            restore_terminal();
            return Err(terminal_error("failed to enter alternate screen", e));
        }

        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(e) => {
                restore_terminal();
                Err(terminal_error("failed to initialize terminal", e))
            }
        }
    }

    pub fn draw<F>(&mut self, render: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Frame<'_>),
    {
        self.terminal
            .draw(render)
            .map(|_| ())
            .map_err(|e| terminal_error("failed to draw frame", e))
    }
}

impl Drop for TuiTerminal {
    fn drop(&mut self) {
        restore_terminal();
    }
}

/// Restores the terminal before the previous panic hook prints, and puts
/// that hook back on drop.
pub struct PanicRestoreHookGuard {
    previous: Arc<PanicHook>,
}

impl PanicRestoreHookGuard {
    pub fn install() -> Self {
        let previous: Arc<PanicHook> = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            restore_terminal();
            chained(info);
        }));
        Self { previous }
    }
}

impl Drop for PanicRestoreHookGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let previous = Arc::clone(&self.previous);
        panic::set_hook(Box::new(move |info| previous(info)));
    }
}
