use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::{Components, Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    pub manufacturer: String,
    pub brand: String,
    pub cores: usize,
    /// GHz
    pub speed: f64,
    pub usage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    /// Used share of total, two decimals
    pub percentage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsStats {
    pub platform: String,
    pub distro: String,
    pub release: String,
    pub arch: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskStats {
    pub fs: String,
    #[serde(rename = "type")]
    pub fs_type: String,
    pub mount: String,
    pub size: u64,
    pub used: u64,
    pub available: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub iface: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Point-in-time snapshot of the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostStats {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub os: OsStats,
    pub disk: Vec<DiskStats>,
    pub network: Vec<NetworkStats>,
}

impl HostStats {
    pub async fn collect() -> Result<Self> {
        sample(Self::read).await
    }

    fn read(sys: &System) -> Self {
        let cpus = sys.cpus();
        let first = cpus.first();
        let cpu = CpuStats {
            manufacturer: first.map(|c| c.vendor_id().to_string()).unwrap_or_default(),
            brand: first.map(|c| c.brand().trim().to_string()).unwrap_or_default(),
            cores: sys.physical_core_count().unwrap_or(cpus.len()),
            speed: first.map(|c| c.frequency() as f64 / 1000.0).unwrap_or_default(),
            usage: sys.global_cpu_info().cpu_usage(),
        };

        let memory = MemoryStats {
            total: sys.total_memory(),
            free: sys.free_memory(),
            used: sys.used_memory(),
            percentage: percentage_string(sys.used_memory(), sys.total_memory()),
        };

        let os = OsStats {
            platform: std::env::consts::OS.to_string(),
            distro: System::name().unwrap_or_else(|| "unknown".to_string()),
            release: System::os_version()
                .or_else(System::kernel_version)
                .unwrap_or_else(|| "unknown".to_string()),
            arch: System::cpu_arch().unwrap_or_else(|| std::env::consts::ARCH.to_string()),
        };

        let disks = Disks::new_with_refreshed_list();
        let disk = disks
            .list()
            .iter()
            .map(|d| {
                let size = d.total_space();
                let available = d.available_space();
                let used = size.saturating_sub(available);
                DiskStats {
                    fs: d.name().to_string_lossy().to_string(),
                    fs_type: d.file_system().to_string_lossy().to_string(),
                    mount: d.mount_point().to_string_lossy().to_string(),
                    size,
                    used,
                    available,
                    percentage: percentage(used, size),
                }
            })
            .collect();

        let networks = Networks::new_with_refreshed_list();
        let mut network: Vec<NetworkStats> = networks
            .iter()
            .map(|(name, data)| NetworkStats {
                iface: name.clone(),
                rx_bytes: data.total_received(),
                tx_bytes: data.total_transmitted(),
            })
            .collect();
        network.sort_by(|a, b| a.iface.cmp(&b.iface));

        Self {
            timestamp: Utc::now(),
            cpu,
            memory,
            os,
            disk,
            network,
        }
    }

    /// `df`-style table of the disks, used as optimizer input.
    pub fn disk_report(&self) -> String {
        let mut report = String::from("Filesystem Type Size Used Avail Use% Mounted on\n");
        for d in &self.disk {
            report.push_str(&format!(
                "{} {} {} {} {} {:.0}% {}\n",
                d.fs,
                d.fs_type,
                human_bytes(d.size),
                human_bytes(d.used),
                human_bytes(d.available),
                d.percentage,
                d.mount
            ));
        }
        report
    }
}

/// Compact gauge readings for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub cpu: u32,
    pub memory: u32,
    pub gpu: Option<u32>,
    pub cpu_temp: Option<u32>,
    pub gpu_temp: Option<u32>,
}

impl StatsSummary {
    pub async fn collect() -> Result<Self> {
        sample(Self::read).await
    }

    fn read(sys: &System) -> Self {
        let components = Components::new_with_refreshed_list();

        let cpu_temp = components
            .iter()
            .filter(|c| {
                let label = c.label().to_lowercase();
                label.contains("cpu") || label.contains("core") || label.contains("package")
            })
            .map(|c| c.temperature())
            .filter(|t| t.is_finite() && *t > 0.0)
            .reduce(f32::max);

        Self::from_readings(
            sys.global_cpu_info().cpu_usage(),
            sys.used_memory(),
            sys.total_memory(),
            cpu_temp,
        )
    }

    /// No GPU sensor is read; those gauges stay empty.
    pub fn from_readings(cpu_usage: f32, used_memory: u64, total_memory: u64, cpu_temp: Option<f32>) -> Self {
        Self {
            cpu: cpu_usage.clamp(0.0, 100.0).round() as u32,
            memory: percentage(used_memory, total_memory).round() as u32,
            gpu: None,
            cpu_temp: cpu_temp.map(|t| t.round() as u32),
            gpu_temp: None,
        }
    }
}

/// CPU usage needs two refreshes at least the minimum interval apart. The
/// second refresh and `read` touch the filesystem, so they run on the
/// blocking pool.
async fn sample<T, F>(read: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&System) -> T + Send + 'static,
{
    let mut sys = System::new();
    sys.refresh_cpu();
    tokio::time::sleep(MINIMUM_CPU_UPDATE_INTERVAL).await;

    let reading = tokio::task::spawn_blocking(move || {
        sys.refresh_cpu();
        sys.refresh_memory();
        read(&sys)
    })
    .await?;
    Ok(reading)
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

fn percentage_string(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", part as f64 / total as f64 * 100.0)
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", bytes, UNITS[0])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_string_has_two_decimals() {
        assert_eq!(percentage_string(1, 3), "33.33");
        assert_eq!(percentage_string(0, 0), "0.00");
        assert_eq!(percentage_string(8, 8), "100.00");
    }

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_summary_from_readings() {
        let summary = StatsSummary::from_readings(42.6, 3, 4, Some(55.4));

        assert_eq!(summary.cpu, 43);
        assert_eq!(summary.memory, 75);
        assert_eq!(summary.cpu_temp, Some(55));
        assert!(summary.gpu.is_none());
        assert!(summary.gpu_temp.is_none());
    }

    #[test]
    fn test_summary_serializes_null_gpu() {
        let value = serde_json::to_value(StatsSummary::from_readings(10.0, 1, 2, None)).unwrap();
        assert!(value["gpu"].is_null());
        assert!(value["cpuTemp"].is_null());
        assert_eq!(value["memory"], 50);
    }

    #[test]
    fn test_human_bytes() {
        assert_eq!(human_bytes(512), "512B");
        assert_eq!(human_bytes(1536), "1.5K");
        assert_eq!(human_bytes(10 * 1024 * 1024 * 1024), "10.0G");
    }

    #[tokio::test]
    async fn test_collect_snapshot() {
        let stats = HostStats::collect().await.unwrap();

        assert!(stats.memory.total > 0);
        assert!(stats.memory.used <= stats.memory.total);
        assert!(!stats.os.platform.is_empty());

        let value = serde_json::to_value(&stats).unwrap();
        assert!(value["cpu"]["cores"].is_number());
        assert!(value["memory"]["percentage"].is_string());
        assert!(value["disk"].is_array());
    }

    #[tokio::test]
    async fn test_collect_summary() {
        let summary = StatsSummary::collect().await.unwrap();

        assert!(summary.cpu <= 100);
        assert!(summary.memory <= 100);
        assert!(summary.gpu.is_none());
    }

    #[test]
    fn test_disk_report_lists_mounts() {
        let stats = HostStats {
            timestamp: Utc::now(),
            cpu: CpuStats {
                manufacturer: "GenuineIntel".to_string(),
                brand: "Intel".to_string(),
                cores: 4,
                speed: 3.2,
                usage: 12.0,
            },
            memory: MemoryStats {
                total: 8,
                free: 4,
                used: 4,
                percentage: "50.00".to_string(),
            },
            os: OsStats {
                platform: "linux".to_string(),
                distro: "Debian".to_string(),
                release: "12".to_string(),
                arch: "x86_64".to_string(),
            },
            disk: vec![DiskStats {
                fs: "/dev/sda1".to_string(),
                fs_type: "ext4".to_string(),
                mount: "/".to_string(),
                size: 100 * 1024 * 1024 * 1024,
                used: 80 * 1024 * 1024 * 1024,
                available: 20 * 1024 * 1024 * 1024,
                percentage: 80.0,
            }],
            network: vec![],
        };

        let report = stats.disk_report();
        assert!(report.starts_with("Filesystem"));
        assert!(report.contains("/dev/sda1 ext4 100.0G 80.0G 20.0G 80% /"));
    }
}
