//! Report types and the collectors that fill them.
//!
//! All sizes are bytes. Network rates are bytes per second.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sysinfo::{Disks, Networks, System};

use dockhand_core::error::AppError;
use dockhand_core::result::AppResult;

/// One logical CPU.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuCore {
    pub name: String,
    pub brand: String,
    pub vendor_id: String,
    pub frequency_mhz: u64,
    pub usage_percent: f32,
}

/// Answer of `Stats.Cpu`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CpuReport {
    /// Mean usage over all cores.
    pub usage_percent: f32,
    pub cores: Vec<CpuCore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub available: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// Answer of `Stats.Memory`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryReport {
    pub memory: MemoryUsage,
    pub swap: SwapUsage,
}

/// Answer of `Stats.Load`: 1, 5 and 15 minute load averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

/// Answer of `Stats.Host`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostReport {
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    /// Seconds since boot.
    pub uptime: u64,
    /// Boot time as a Unix timestamp.
    pub boot_time: u64,
}

/// Throughput of one network device, an entry of `Stats.Net`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetRate {
    pub device: String,
    pub tx_rate: u64,
    pub rx_rate: u64,
}

/// Argument of `Stats.DiskSpace`. No mounts means `/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiskSpaceArgs {
    #[serde(default)]
    pub mounts: Vec<String>,
}

/// Usage of the filesystem holding `mount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub mount: String,
    pub size: u64,
    pub used: u64,
}

/// Answer of `Stats.DiskSpace`, one result per requested mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiskSpaceReport {
    pub results: Vec<DiskUsage>,
}

/// A mounted filesystem as seen by [`usage_for`].
#[derive(Debug, Clone)]
pub struct MountedDisk {
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

/// Samples CPU usage over the shortest interval sysinfo can measure.
pub async fn cpu() -> CpuReport {
    let mut sys = System::new();
    sys.refresh_cpu_all();
    tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
    sys.refresh_cpu_all();

    let cores: Vec<CpuCore> = sys
        .cpus()
        .iter()
        .map(|cpu| CpuCore {
            name: cpu.name().to_string(),
            brand: cpu.brand().to_string(),
            vendor_id: cpu.vendor_id().to_string(),
            frequency_mhz: cpu.frequency(),
            usage_percent: cpu.cpu_usage(),
        })
        .collect();

    let usage_percent = if cores.is_empty() {
        0.0
    } else {
        cores.iter().map(|c| c.usage_percent).sum::<f32>() / cores.len() as f32
    };

    CpuReport {
        usage_percent,
        cores,
    }
}

pub fn memory() -> MemoryReport {
    let mut sys = System::new();
    sys.refresh_memory();

    MemoryReport {
        memory: MemoryUsage {
            total: sys.total_memory(),
            used: sys.used_memory(),
            free: sys.free_memory(),
            available: sys.available_memory(),
        },
        swap: SwapUsage {
            total: sys.total_swap(),
            used: sys.used_swap(),
            free: sys.free_swap(),
        },
    }
}

pub fn load() -> LoadReport {
    let avg = System::load_average();
    LoadReport {
        load1: avg.one,
        load5: avg.five,
        load15: avg.fifteen,
    }
}

pub fn host() -> HostReport {
    HostReport {
        hostname: System::host_name(),
        os: System::name(),
        os_version: System::os_version(),
        kernel_version: System::kernel_version(),
        uptime: System::uptime(),
        boot_time: System::boot_time(),
    }
}

/// Measures per-device throughput over `interval`.
pub async fn net(interval: Duration) -> Vec<NetRate> {
    let before = net_counters();
    tokio::time::sleep(interval).await;
    let after = net_counters();
    net_rates(&before, &after, interval)
}

/// Device → (bytes sent, bytes received) since boot.
fn net_counters() -> HashMap<String, (u64, u64)> {
    let networks = Networks::new_with_refreshed_list();
    networks
        .list()
        .iter()
        .map(|(name, data)| {
            (
                name.clone(),
                (data.total_transmitted(), data.total_received()),
            )
        })
        .collect()
}

/// Per-second rates between two counter snapshots, sorted by device.
///
/// Devices missing from either snapshot are skipped; a counter that went
/// backwards counts as zero.
pub fn net_rates(
    before: &HashMap<String, (u64, u64)>,
    after: &HashMap<String, (u64, u64)>,
    interval: Duration,
) -> Vec<NetRate> {
    let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX).max(1);
    let per_second = |delta: u64| delta.saturating_mul(1000) / millis;

    let mut rates: Vec<NetRate> = after
        .iter()
        .filter_map(|(device, &(tx, rx))| {
            let &(tx0, rx0) = before.get(device)?;
            Some(NetRate {
                device: device.clone(),
                tx_rate: per_second(tx.saturating_sub(tx0)),
                rx_rate: per_second(rx.saturating_sub(rx0)),
            })
        })
        .collect();
    rates.sort_by(|a, b| a.device.cmp(&b.device));
    rates
}

/// Usage of the filesystems holding each requested mount.
pub fn disk_space(args: DiskSpaceArgs) -> AppResult<DiskSpaceReport> {
    let disks = Disks::new_with_refreshed_list();
    let mounted: Vec<MountedDisk> = disks
        .list()
        .iter()
        .map(|disk| MountedDisk {
            mount_point: disk.mount_point().to_path_buf(),
            total: disk.total_space(),
            available: disk.available_space(),
        })
        .collect();

    let mounts = if args.mounts.is_empty() {
        vec!["/".to_string()]
    } else {
        args.mounts
    };

    let results = mounts
        .iter()
        .map(|mount| usage_for(mount, &mounted))
        .collect::<AppResult<Vec<_>>>()?;
    Ok(DiskSpaceReport { results })
}

/// Usage of the filesystem with the deepest mount point containing `mount`.
pub fn usage_for(mount: &str, disks: &[MountedDisk]) -> AppResult<DiskUsage> {
    let path = Path::new(mount);
    if !path.is_absolute() {
        return Err(AppError::validation(format!(
            "Mount '{mount}' must be an absolute path"
        )));
    }

    let disk = disks
        .iter()
        .filter(|d| path.starts_with(&d.mount_point))
        .max_by_key(|d| d.mount_point.components().count())
        .ok_or_else(|| AppError::not_found(format!("No mounted filesystem holds '{mount}'")))?;

    Ok(DiskUsage {
        mount: mount.to_string(),
        size: disk.total,
        used: disk.total.saturating_sub(disk.available),
    })
}
