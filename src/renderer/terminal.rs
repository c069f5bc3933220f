use std::io::{self, Write};

use crate::renderer::Renderer;

const CLEAR_AND_HOME: &str = "\x1b[2J\x1b[H";

/// Paints the overlay text onto a terminal, in place when `clear_screen` is set.
pub struct TerminalRenderer<W: Write> {
    out: W,
    clear_screen: bool,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout(clear_screen: bool) -> Self {
        Self::new(io::stdout(), clear_screen)
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn display(&mut self, text: &str) -> anyhow::Result<()> {
        if self.clear_screen {
            self.out.write_all(CLEAR_AND_HOME.as_bytes())?;
        }
        writeln!(self.out, "{}", text)?;
        self.out.flush()?;
        Ok(())
    }
}
