use log::{debug, error, info};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::time::Instant;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System as SysInfo};
use systemstat::{BlockDeviceStats, Platform, System};

use crate::collectors::rate_mb_per_sec;

const SECTOR_SIZE: u64 = 512;
const SYS_BLOCK: &str = "/sys/block";

/// Disk read/write rate counter.
///
/// Every call to [`DiskCounter::rates`] reports the bytes moved since the
/// previous call, so the first reading after [`DiskCounter::open`] only
/// covers the short gap since opening.
pub struct DiskCounter {
    backend: Backend,
    last_read_at: Instant,
}

enum Backend {
    /// Whole-disk sector counters, where the OS exposes them.
    Block {
        stat: System,
        allowed: Vec<String>,
        totals: (u64, u64),
    },
    /// Sum of per-process I/O since the previous refresh.
    Processes { sys: SysInfo },
}

impl DiskCounter {
    pub fn open(allowed: &[String]) -> Self {
        let stat = System::new();
        let backend = match stat.block_device_statistics() {
            Ok(stats) => {
                let totals = sector_totals(&stats, allowed, Path::new(SYS_BLOCK));
                debug!("Counting block devices, initial totals {:?}", totals);
                Backend::Block {
                    stat,
                    allowed: allowed.to_vec(),
                    totals,
                }
            }
            Err(x) => {
                info!("Block statistics unavailable ({}), summing per-process I/O", x);
                let mut sys = SysInfo::new();
                refresh_process_io(&mut sys);
                Backend::Processes { sys }
            }
        };

        Self {
            backend,
            last_read_at: Instant::now(),
        }
    }

    /// Read and write rates in MiB/s since the previous call.
    pub fn rates(&mut self) -> (f32, f32) {
        let start = Instant::now();
        let elapsed = start.duration_since(self.last_read_at);
        self.last_read_at = start;

        let (read_bytes, write_bytes) = match &mut self.backend {
            Backend::Block {
                stat,
                allowed,
                totals,
            } => match read_totals(stat, allowed) {
                Ok(current) => {
                    let delta = (
                        current.0.saturating_sub(totals.0),
                        current.1.saturating_sub(totals.1),
                    );
                    *totals = current;
                    delta
                }
                Err(x) => {
                    error!("Block statistics error: {}", x);
                    (0, 0)
                }
            },
            Backend::Processes { sys } => {
                refresh_process_io(sys);
                sys.processes().values().fold((0u64, 0u64), |(read, write), process| {
                    let usage = process.disk_usage();
                    (
                        read.saturating_add(usage.read_bytes),
                        write.saturating_add(usage.written_bytes),
                    )
                })
            }
        };

        let result = (
            rate_mb_per_sec(read_bytes, elapsed),
            rate_mb_per_sec(write_bytes, elapsed),
        );
        debug!("disk rates took: {} ms", start.elapsed().as_millis());
        result
    }
}

fn refresh_process_io(sys: &mut SysInfo) {
    sys.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::nothing().with_disk_usage(),
    );
}

fn read_totals(stat: &System, allowed: &[String]) -> io::Result<(u64, u64)> {
    let stats = stat.block_device_statistics()?;
    Ok(sector_totals(&stats, allowed, Path::new(SYS_BLOCK)))
}

/// Total bytes read and written across the counted devices.
fn sector_totals(
    stats: &BTreeMap<String, BlockDeviceStats>,
    allowed: &[String],
    sys_block: &Path,
) -> (u64, u64) {
    let mut read_sectors = 0u64;
    let mut write_sectors = 0u64;

    for block in stats.values() {
        if counts_device(&block.name, allowed, sys_block) {
            read_sectors = read_sectors.saturating_add(block.read_sectors as u64);
            write_sectors = write_sectors.saturating_add(block.write_sectors as u64);
        }
    }

    (
        read_sectors.saturating_mul(SECTOR_SIZE),
        write_sectors.saturating_mul(SECTOR_SIZE),
    )
}

/// An explicit allow-list wins. Otherwise only whole physical disks count:
/// partitions are absent from `/sys/block`, and virtual devices (loop, ram,
/// zram, dm) have no `device` link there.
fn counts_device(name: &str, allowed: &[String], sys_block: &Path) -> bool {
    if !allowed.is_empty() {
        return allowed.iter().any(|a| a == name);
    }
    sys_block.join(name).join("device").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_sys_block() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sda").join("device")).unwrap();
        fs::create_dir_all(dir.path().join("nvme0n1").join("device")).unwrap();
        fs::create_dir_all(dir.path().join("loop0")).unwrap();
        dir
    }

    #[test]
    fn test_counts_physical_disks_only() {
        let dir = fake_sys_block();
        assert!(counts_device("sda", &[], dir.path()));
        assert!(counts_device("nvme0n1", &[], dir.path()));
        assert!(!counts_device("sda1", &[], dir.path()));
        assert!(!counts_device("loop0", &[], dir.path()));
    }

    #[test]
    fn test_allow_list_overrides_detection() {
        let dir = fake_sys_block();
        let allowed = vec!["loop0".to_string()];
        assert!(counts_device("loop0", &allowed, dir.path()));
        assert!(!counts_device("sda", &allowed, dir.path()));
    }

    #[test]
    fn test_rates_are_non_negative() {
        let mut counter = DiskCounter::open(&[]);
        let (read, write) = counter.rates();
        assert!(read >= 0.0);
        assert!(write >= 0.0);
    }
}
