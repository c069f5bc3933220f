use windows_sys::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId,
};

use super::{ForegroundWindow, WindowError, WindowInspector};

#[derive(Debug, Default)]
pub struct Win32Inspector;

impl Win32Inspector {
    pub fn new() -> Self {
        Self
    }
}

impl WindowInspector for Win32Inspector {
    async fn resolve_active(&mut self) -> Result<ForegroundWindow, WindowError> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.is_null() {
                return Err(WindowError::NotFound);
            }

            let length = GetWindowTextLengthW(hwnd).max(0) as usize;
            let mut buffer = vec![0u16; length + 1];
            let copied = GetWindowTextW(hwnd, buffer.as_mut_ptr(), buffer.len() as i32);
            let title = String::from_utf16_lossy(&buffer[..copied.max(0) as usize]);

            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, &mut pid);
            if pid == 0 {
                return Err(WindowError::NotFound);
            }

            Ok(ForegroundWindow {
                handle: hwnd as usize as u64,
                title,
                pid,
            })
        }
    }
}
