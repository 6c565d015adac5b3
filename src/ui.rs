use anyhow::{Context, Result};
use console::Style;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    style::{Color, Stylize},
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen},
    QueueableCommand,
};
use std::io::{self, Stdout, Write};

use crate::render::{Line, Tone};

/// Owns the terminal for the lifetime of the wizard: raw mode, alternate
/// screen, hidden cursor. Restored on drop, including during unwinding.
pub struct TerminalUi {
    out: Stdout,
    restored: bool,
}

impl TerminalUi {
    pub fn enter() -> Result<Self> {
        let mut out = io::stdout();
        enable_raw_mode().context("enable raw mode")?;
        out.queue(EnterAlternateScreen)?
            .queue(Hide)?
            .flush()
            .context("enter alternate screen")?;
        Ok(Self {
            out,
            restored: false,
        })
    }

    /// Repaint the whole screen from `lines`, clipped to the terminal size.
    pub fn draw(&mut self, lines: &[Line]) -> Result<()> {
        let (width, height) = terminal::size().unwrap_or((80, 24));
        self.out.queue(Clear(ClearType::All))?;

        for (row, line) in lines.iter().take(height.saturating_sub(1) as usize).enumerate() {
            let text: String = line.text.chars().take(width.saturating_sub(2) as usize).collect();
            self.out.queue(MoveTo(1, row as u16 + 1))?;
            let styled = match line.tone {
                Tone::Title => text.bold().cyan(),
                Tone::Normal => text.white(),
                Tone::Selected => text.bold().with(Color::Magenta),
                Tone::Muted => text.dark_grey(),
                Tone::Success => text.bold().green(),
                Tone::Error => text.bold().red(),
            };
            write!(self.out, "{styled}")?;
        }
        self.out.flush().context("flush frame")?;
        Ok(())
    }

    /// Cleanly restore cursor and terminal state.
    pub fn close(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        self.out.queue(Show)?.queue(LeaveAlternateScreen)?.flush()?;
        disable_raw_mode().context("disable raw mode")?;
        Ok(())
    }
}

impl Drop for TerminalUi {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

/// Final one-line report, printed on the normal screen.
pub fn print_summary(line: &str, success: bool) {
    let style = if success {
        Style::new().green().bold()
    } else {
        Style::new().red().bold()
    };
    println!("{}", style.apply_to(line));
}
