use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Read a single-value sysfs attribute, trimmed of its trailing newline.
pub fn get_file_line(file: &Path, capacity: usize) -> Option<String> {
    let mut reader = String::with_capacity(capacity);
    let mut f = File::open(file).ok()?;
    f.read_to_string(&mut reader).ok()?;
    reader.truncate(reader.trim_end().len());
    Some(reader)
}

/// Designed for small integer attributes such as `enable` or the PCI
/// `vendor`/`device` ids. Hex values with a `0x` prefix are accepted.
pub fn read_number_from_file(file: &Path) -> Option<u32> {
    let mut reader = [0u8; 32];
    let mut f = File::open(file).ok()?;
    let n = f.read(&mut reader).ok()?;
    // parse and trim would complain about `\0`.
    let number = std::str::from_utf8(&reader[..n]).ok()?;
    let number = number.trim_matches(|c: char| c.is_whitespace() || c == '\0');
    match number.strip_prefix("0x").or_else(|| number.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => number.parse().ok(),
    }
}

/// Final path component of a symlink target, e.g. the driver name behind
/// `device/driver`.
pub fn link_name(link: &Path) -> Option<String> {
    let target = fs::read_link(link).ok()?;
    target
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
}
