pub mod formatter;
pub mod terminal;

pub use terminal::TerminalRenderer;

/// A surface that shows the formatted overlay text, repainted every tick.
pub trait Renderer {
    fn display(&mut self, text: &str) -> anyhow::Result<()>;
}
