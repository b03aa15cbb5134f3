use serde::{Deserialize, Serialize};
use sysinfo::{Disks, Networks, System};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub timestamp: i64,
    pub platform: String,
    pub arch: String,
    pub hostname: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub uptime: u64,
    pub cpus: usize,
    pub load_avg: [f64; 3],
    pub total_memory: u64,
    pub free_memory: u64,
    pub used_memory: u64,
    pub disks: Vec<DiskInfo>,
    pub battery_percent: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskInfo {
    pub name: String,
    pub mount_point: String,
    pub total_space: u64,
    pub available_space: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_usage: f32,
    pub memory: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceInfo {
    pub name: String,
    pub mac_address: String,
    pub total_received: u64,
    pub total_transmitted: u64,
}

impl EnvironmentSnapshot {
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn capture() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let load = System::load_average();
        let disks = Disks::new_with_refreshed_list()
            .iter()
            .map(|disk| DiskInfo {
                name: disk.name().to_string_lossy().to_string(),
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                total_space: disk.total_space(),
                available_space: disk.available_space(),
            })
            .collect();

        Self {
            timestamp: chrono::Utc::now().timestamp(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname: System::host_name(),
            os_version: System::long_os_version(),
            kernel_version: System::kernel_version(),
            uptime: System::uptime(),
            cpus: sys.cpus().len(),
            load_avg: [load.one, load.five, load.fifteen],
            total_memory: sys.total_memory(),
            free_memory: sys.free_memory(),
            used_memory: sys.used_memory(),
            disks,
            battery_percent: Self::read_battery_percent(),
        }
    }

    fn read_battery_percent() -> Option<u8> {
        #[cfg(target_os = "linux")]
        {
            std::fs::read_to_string("/sys/class/power_supply/BAT0/capacity")
                .ok()
                .and_then(|s| s.trim().parse().ok())
        }
        #[cfg(not(target_os = "linux"))]
        {
            None
        }
    }

    pub fn to_concise_string(&self) -> String {
        format!(
            "Host: {}\nPlatform: {} ({})\nMemory: {}/{} MB\nCPUs: {}\nUptime: {}s",
            self.hostname.as_deref().unwrap_or("unknown"),
            self.platform,
            self.arch,
            self.used_memory / 1024 / 1024,
            self.total_memory / 1024 / 1024,
            self.cpus,
            self.uptime,
        )
    }
}

impl ProcessInfo {
    /// Blocking; call from `spawn_blocking` inside async code.
    pub fn list() -> Vec<Self> {
        let mut sys = System::new_all();
        sys.refresh_all();

        let mut processes: Vec<Self> = sys
            .processes()
            .iter()
            .map(|(pid, process)| ProcessInfo {
                pid: pid.as_u32(),
                name: process.name().to_string(),
                cpu_usage: process.cpu_usage(),
                memory: process.memory(),
            })
            .collect();
        processes.sort_by_key(|p| p.pid);
        processes
    }
}

impl InterfaceInfo {
    pub fn list() -> Vec<Self> {
        let networks = Networks::new_with_refreshed_list();
        let mut interfaces: Vec<Self> = networks
            .iter()
            .map(|(name, data)| InterfaceInfo {
                name: name.clone(),
                mac_address: data.mac_address().to_string(),
                total_received: data.total_received(),
                total_transmitted: data.total_transmitted(),
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        interfaces
    }
}
