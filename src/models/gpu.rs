#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuAdapter {
    pub name: String,
    pub driver_version: String,
    pub status: String,
    pub refresh_rate_hz: u32,
}

impl Default for GpuAdapter {
    fn default() -> Self {
        Self {
            name: String::from("Unknown"),
            driver_version: String::from("unknown"),
            status: String::from("Unknown"),
            refresh_rate_hz: 0,
        }
    }
}

/// Result of a display adapter enumeration.
///
/// Enumeration is a decoration, so a failed query is carried as a diagnostic
/// instead of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuInfo {
    Adapters(Vec<GpuAdapter>),
    Unavailable(String),
}

impl Default for GpuInfo {
    fn default() -> Self {
        GpuInfo::Adapters(Vec::new())
    }
}
