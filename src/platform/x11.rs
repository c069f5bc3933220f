use std::sync::OnceLock;
use std::time::Instant;

use log::debug;
use regex::Regex;
use tokio::process::Command;

use super::{ForegroundWindow, WindowError, WindowInspector};

/// Resolves the active window on X11 desktops through `xprop` and the EWMH
/// root properties.
#[derive(Debug, Default)]
pub struct XpropInspector;

impl XpropInspector {
    pub fn new() -> Self {
        Self
    }
}

impl WindowInspector for XpropInspector {
    async fn resolve_active(&mut self) -> Result<ForegroundWindow, WindowError> {
        let start = Instant::now();

        let root = xprop(&["-root", "_NET_ACTIVE_WINDOW"]).await?;
        let handle = parse_active_window(&root).ok_or(WindowError::NotFound)?;

        let id = format!("{:#x}", handle);
        let props = xprop(&["-id", id.as_str(), "_NET_WM_PID", "_NET_WM_NAME", "WM_NAME"]).await?;
        let (title, pid) = parse_window_properties(&props);

        debug!("resolve_active took: {} ms", start.elapsed().as_millis());

        // Windows without _NET_WM_PID cannot be attributed to a process.
        let pid = pid.ok_or(WindowError::NotFound)?;
        Ok(ForegroundWindow {
            handle,
            title: title.unwrap_or_default(),
            pid,
        })
    }
}

async fn xprop(args: &[&str]) -> Result<String, WindowError> {
    let output = Command::new("xprop")
        .args(args)
        .output()
        .await
        .map_err(|e| WindowError::Query(format!("failed to run xprop: {}", e)))?;

    if !output.status.success() {
        return Err(WindowError::Query(format!(
            "xprop exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn window_id_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"window id # (0x[0-9a-fA-F]+)").ok())
        .as_ref()
}

/// `_NET_ACTIVE_WINDOW(WINDOW): window id # 0x4a00007`. A zero id means
/// nothing has focus.
fn parse_active_window(output: &str) -> Option<u64> {
    let captures = window_id_regex()?.captures(output)?;
    let id = u64::from_str_radix(captures[1].trim_start_matches("0x"), 16).ok()?;
    (id != 0).then_some(id)
}

fn parse_window_properties(output: &str) -> (Option<String>, Option<u32>) {
    let mut net_name = None;
    let mut wm_name = None;
    let mut pid = None;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(" = ") else {
            continue;
        };
        if key.starts_with("_NET_WM_PID(") {
            pid = value.trim().parse().ok();
        } else if key.starts_with("_NET_WM_NAME(") {
            net_name = Some(unquote(value));
        } else if key.starts_with("WM_NAME(") {
            wm_name = Some(unquote(value));
        }
    }

    (net_name.or(wm_name), pid)
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    inner.replace("\\\"", "\"").replace("\\\\", "\\")
}
