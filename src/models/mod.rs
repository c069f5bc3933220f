use std::fmt;

pub(crate) mod gpu;
pub(crate) mod process;
pub(crate) mod system;

pub use gpu::{GpuAdapter, GpuInfo};
pub use process::{ProcessReadings, ProcessSample, ProcessTarget};
pub use system::{SystemReadings, SystemSample};

/// What the overlay tracks. Decided once at startup, never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    SystemWide,
    FocusedWindow,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::SystemWide => write!(f, "system-wide"),
            Mode::FocusedWindow => write!(f, "focused-window"),
        }
    }
}

/// The latest reading handed to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    System(SystemSample),
    Process(ProcessSample),
}
