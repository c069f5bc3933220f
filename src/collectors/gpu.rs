use anyhow::{bail, Context, Result};
use log::{debug, log};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Instant;
use tokio::process::Command;
use walkdir::WalkDir;

use crate::collectors::GpuQuery;
use crate::models::{GpuAdapter, GpuInfo};
use crate::utils::repeat::RepeatedFailure;
use crate::utils::sysfs::{get_file_line, link_name, read_number_from_file};

/// Enumerates display adapters.
///
/// Queries have no timeout. A hung driver or management query stalls the
/// tick it runs in.
#[cfg_attr(target_os = "windows", allow(dead_code))]
pub struct GpuInfoProvider {
    sysfs_root: PathBuf,
    kernel_release: String,
    failures: RepeatedFailure<()>,
}

impl Default for GpuInfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuInfoProvider {
    pub fn new() -> Self {
        Self::with_sysfs_root("/sys")
    }

    pub fn with_sysfs_root<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            sysfs_root: root.into(),
            kernel_release: sysinfo::System::kernel_version().unwrap_or_else(|| "unknown".to_string()),
            failures: RepeatedFailure::default(),
        }
    }

    #[cfg(target_os = "windows")]
    async fn enumerate(&self) -> Result<Vec<GpuAdapter>> {
        let output = Command::new("powershell")
            .args([
                "-NoProfile",
                "-Command",
                "Get-CimInstance -ClassName Win32_VideoController | Select-Object Name, DriverVersion, Status, CurrentRefreshRate | ConvertTo-Json -Compress",
            ])
            .output()
            .await
            .context("Failed to run PowerShell")?;

        if !output.status.success() {
            bail!(
                "PowerShell exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        parse_video_controllers(&String::from_utf8_lossy(&output.stdout))
    }

    #[cfg(not(target_os = "windows"))]
    async fn enumerate(&self) -> Result<Vec<GpuAdapter>> {
        let mut adapters = scan_drm(&self.sysfs_root, &self.kernel_release)?;
        if !adapters.is_empty() {
            let refresh_rate = current_refresh_rate().await;
            for adapter in &mut adapters {
                adapter.refresh_rate_hz = refresh_rate;
            }
        }
        Ok(adapters)
    }
}

impl GpuQuery for GpuInfoProvider {
    async fn query(&mut self) -> GpuInfo {
        let start = Instant::now();
        let result = match self.enumerate().await {
            Ok(adapters) => {
                self.failures.clear();
                GpuInfo::Adapters(adapters)
            }
            Err(e) => {
                log!(self.failures.level(()), "GPU enumeration failed: {:#}", e);
                GpuInfo::Unavailable(format!("{:#}", e))
            }
        };
        debug!("GPU query took: {} ms", start.elapsed().as_millis());
        result
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VideoController {
    name: Option<String>,
    driver_version: Option<String>,
    status: Option<String>,
    current_refresh_rate: Option<u32>,
}

/// `ConvertTo-Json` emits a bare object for a single adapter.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<VideoController>),
    One(VideoController),
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
fn parse_video_controllers(json: &str) -> Result<Vec<GpuAdapter>> {
    let json = json.trim();
    if json.is_empty() {
        return Ok(Vec::new());
    }

    let controllers = match serde_json::from_str::<OneOrMany>(json)
        .context("Failed to parse Win32_VideoController output")?
    {
        OneOrMany::Many(controllers) => controllers,
        OneOrMany::One(controller) => vec![controller],
    };

    let fallback = GpuAdapter::default();
    Ok(controllers
        .into_iter()
        .map(|c| GpuAdapter {
            name: c.name.unwrap_or_else(|| fallback.name.clone()),
            driver_version: c.driver_version.unwrap_or_else(|| fallback.driver_version.clone()),
            status: c.status.unwrap_or_else(|| fallback.status.clone()),
            refresh_rate_hz: c.current_refresh_rate.unwrap_or(0),
        })
        .collect())
}

/// DRM adapters under `<root>/class/drm`, one per `cardN` entry.
#[cfg_attr(target_os = "windows", allow(dead_code))]
fn scan_drm(sysfs_root: &Path, kernel_release: &str) -> Result<Vec<GpuAdapter>> {
    let drm = sysfs_root.join("class").join("drm");
    if !drm.is_dir() {
        bail!("{} not present", drm.display());
    }

    let mut adapters = Vec::new();
    for entry in WalkDir::new(&drm)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {}", drm.display()))?;
        let name = entry.file_name().to_string_lossy();
        if !is_card(&name) {
            continue;
        }
        adapters.push(read_adapter(
            &entry.path().join("device"),
            &sysfs_root.join("module"),
            kernel_release,
        ));
    }
    Ok(adapters)
}

/// `card0` but not connectors like `card0-HDMI-A-1`.
fn is_card(name: &str) -> bool {
    name.strip_prefix("card")
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

fn read_adapter(device: &Path, modules: &Path, kernel_release: &str) -> GpuAdapter {
    let vendor = read_number_from_file(&device.join("vendor"));
    let product = read_number_from_file(&device.join("device"));
    let driver = link_name(&device.join("driver"));

    let name = match (vendor, product) {
        (Some(vendor), Some(product)) => format!(
            "{} [{:04x}:{:04x}]",
            vendor_name(vendor).unwrap_or("Unknown vendor"),
            vendor,
            product
        ),
        _ => driver.clone().unwrap_or_else(|| GpuAdapter::default().name),
    };

    // In-tree drivers carry no module version of their own.
    let driver_version = match driver.as_deref() {
        Some(driver) => get_file_line(&modules.join(driver).join("version"), 32)
            .map(|version| format!("{} {}", driver, version))
            .unwrap_or_else(|| format!("{} {}", driver, kernel_release)),
        None => GpuAdapter::default().driver_version,
    };

    let status = match read_number_from_file(&device.join("enable")) {
        Some(0) => "Disabled",
        Some(_) => "OK",
        None if driver.is_some() => "OK",
        None => "Unknown",
    };

    GpuAdapter {
        name,
        driver_version,
        status: status.to_string(),
        refresh_rate_hz: 0,
    }
}

fn vendor_name(id: u32) -> Option<&'static str> {
    match id {
        0x10de => Some("NVIDIA"),
        0x1002 => Some("AMD"),
        0x8086 => Some("Intel"),
        0x1af4 => Some("Virtio"),
        0x15ad => Some("VMware"),
        0x1234 => Some("QEMU"),
        _ => None,
    }
}

#[cfg_attr(target_os = "windows", allow(dead_code))]
async fn current_refresh_rate() -> u32 {
    let start = Instant::now();
    let output = Command::new("xrandr").arg("--current").output().await;
    debug!("xrandr command execution took: {} ms", start.elapsed().as_millis());

    match output {
        Ok(output) if output.status.success() => {
            parse_active_refresh_rate(&String::from_utf8_lossy(&output.stdout)).unwrap_or(0)
        }
        Ok(output) => {
            debug!("xrandr exited with {}", output.status);
            0
        }
        Err(e) => {
            debug!("xrandr unavailable: {}", e);
            0
        }
    }
}

fn active_rate_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\*").ok())
        .as_ref()
}

/// The rate marked `*` in `xrandr` mode listings, e.g. `1920x1080 60.00*+`.
fn parse_active_refresh_rate(output: &str) -> Option<u32> {
    let captures = active_rate_regex()?.captures(output)?;
    let rate: f32 = captures[1].parse().ok()?;
    Some(rate.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_video_controllers_array() {
        let json = r#"[{"Name":"Generic GPU","DriverVersion":"1.0.0","Status":"OK","CurrentRefreshRate":60},
                       {"Name":"Virtual Display","DriverVersion":"2.1","Status":"Degraded","CurrentRefreshRate":null}]"#;
        let adapters = parse_video_controllers(json).unwrap();
        assert_eq!(adapters.len(), 2);
        assert_eq!(
            adapters[0],
            GpuAdapter {
                name: "Generic GPU".to_string(),
                driver_version: "1.0.0".to_string(),
                status: "OK".to_string(),
                refresh_rate_hz: 60,
            }
        );
        assert_eq!(adapters[1].status, "Degraded");
        assert_eq!(adapters[1].refresh_rate_hz, 0);
    }

    #[test]
    fn test_parse_video_controllers_single_object() {
        let json = r#"{"Name":"Generic GPU","DriverVersion":"1.0.0","Status":"OK","CurrentRefreshRate":144}"#;
        let adapters = parse_video_controllers(json).unwrap();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].refresh_rate_hz, 144);
    }

    #[test]
    fn test_parse_video_controllers_empty_and_invalid() {
        assert!(parse_video_controllers("  \r\n").unwrap().is_empty());
        assert!(parse_video_controllers("Get-CimInstance : Access denied").is_err());
    }

    #[test]
    fn test_parse_active_refresh_rate() {
        let output = "Screen 0: minimum 320 x 200, current 2560 x 1440\n\
                      DP-1 connected primary 2560x1440+0+0\n   \
                      2560x1440     59.95 +  143.91*\n   \
                      1920x1080     60.00    50.00\n";
        assert_eq!(parse_active_refresh_rate(output), Some(144));
        assert_eq!(parse_active_refresh_rate("Can't open display"), None);
    }

    #[test]
    fn test_is_card() {
        assert!(is_card("card0"));
        assert!(is_card("card12"));
        assert!(!is_card("card0-HDMI-A-1"));
        assert!(!is_card("renderD128"));
        assert!(!is_card("card"));
    }

    fn fake_sysfs() -> TempDir {
        let root = TempDir::new().unwrap();
        let device = root.path().join("class/drm/card0/device");
        fs::create_dir_all(&device).unwrap();
        fs::create_dir_all(root.path().join("class/drm/card0-DP-1")).unwrap();
        fs::write(device.join("vendor"), "0x10de\n").unwrap();
        fs::write(device.join("device"), "0x2531\n").unwrap();
        fs::write(device.join("enable"), "1\n").unwrap();

        let module = root.path().join("module/nvidia");
        fs::create_dir_all(&module).unwrap();
        fs::write(module.join("version"), "550.54.14\n").unwrap();
        root
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_drm() {
        let root = fake_sysfs();
        let driver = root.path().join("bus/pci/drivers/nvidia");
        fs::create_dir_all(&driver).unwrap();
        std::os::unix::fs::symlink(&driver, root.path().join("class/drm/card0/device/driver"))
            .unwrap();

        let adapters = scan_drm(root.path(), "6.8.0").unwrap();
        assert_eq!(
            adapters,
            vec![GpuAdapter {
                name: "NVIDIA [10de:2531]".to_string(),
                driver_version: "nvidia 550.54.14".to_string(),
                status: "OK".to_string(),
                refresh_rate_hz: 0,
            }]
        );
    }

    #[test]
    fn test_scan_drm_without_driver() {
        let root = fake_sysfs();
        fs::write(root.path().join("class/drm/card0/device/enable"), "0\n").unwrap();

        let adapters = scan_drm(root.path(), "6.8.0").unwrap();
        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].status, "Disabled");
        assert_eq!(adapters[0].driver_version, "unknown");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_drm_bound_driver_without_enable() {
        let root = fake_sysfs();
        let device = root.path().join("class/drm/card0/device");
        fs::remove_file(device.join("enable")).unwrap();
        let driver = root.path().join("bus/pci/drivers/i915");
        fs::create_dir_all(&driver).unwrap();
        std::os::unix::fs::symlink(&driver, device.join("driver")).unwrap();

        let adapters = scan_drm(root.path(), "6.8.0").unwrap();
        assert_eq!(adapters[0].status, "OK");
        // In-tree driver: no module version, so the kernel release stands in.
        assert_eq!(adapters[0].driver_version, "i915 6.8.0");
    }

    #[test]
    fn test_scan_drm_without_driver_or_enable() {
        let root = fake_sysfs();
        fs::remove_file(root.path().join("class/drm/card0/device/enable")).unwrap();

        let adapters = scan_drm(root.path(), "6.8.0").unwrap();
        assert_eq!(adapters[0].status, "Unknown");
    }

    #[test]
    fn test_scan_drm_missing_root() {
        let root = TempDir::new().unwrap();
        assert!(scan_drm(root.path(), "6.8.0").is_err());
    }

    #[cfg(not(target_os = "windows"))]
    #[tokio::test]
    async fn test_query_failure_is_single_diagnostic() {
        let root = TempDir::new().unwrap();
        let mut provider = GpuInfoProvider::with_sysfs_root(root.path());
        match provider.query().await {
            GpuInfo::Unavailable(message) => {
                assert!(message.contains("class/drm"));
                assert_eq!(message.lines().count(), 1);
            }
            other => panic!("expected a diagnostic, got {:?}", other),
        }
    }

    #[cfg(not(target_os = "windows"))]
    #[tokio::test]
    async fn test_repeated_query_failure_is_remembered() {
        let root = TempDir::new().unwrap();
        let mut provider = GpuInfoProvider::with_sysfs_root(root.path());
        provider.query().await;
        provider.query().await;
        assert_eq!(provider.failures.level(()), log::Level::Debug);

        fs::create_dir_all(root.path().join("class/drm")).unwrap();
        assert!(matches!(provider.query().await, GpuInfo::Adapters(_)));
        assert_eq!(provider.failures.level(()), log::Level::Warn);
    }
}
