use thiserror::Error;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(target_os = "windows"))]
mod x11;

#[cfg(target_os = "windows")]
pub use self::windows::Win32Inspector as NativeInspector;
#[cfg(not(target_os = "windows"))]
pub use self::x11::XpropInspector as NativeInspector;

/// The user-active top-level window and the process that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundWindow {
    pub handle: u64,
    pub title: String,
    pub pid: u32,
}

#[derive(Debug, Error)]
pub enum WindowError {
    /// Nothing has focus right now, e.g. during a lock screen or desktop switch.
    #[error("no foreground window")]
    NotFound,

    #[error("foreground window query failed: {0}")]
    Query(String),
}

/// Platform capability for foreground window introspection.
#[allow(async_fn_in_trait)]
pub trait WindowInspector {
    async fn resolve_active(&mut self) -> Result<ForegroundWindow, WindowError>;
}

pub fn native_inspector() -> NativeInspector {
    NativeInspector::new()
}
