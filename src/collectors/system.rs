use crate::collectors::network::{locate_active, probe_active_ip, resolve_host_ip};
use crate::collectors::Snapshot;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use sysinfo::{Disks, Networks, System};
use tracing::debug;

pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

pub struct Sampler {
    system: System,
    networks: Networks,
    disks: Disks,
    probe_target: SocketAddr,
    disk_mount: PathBuf,
    public_ip: Option<String>,
}

impl Sampler {
    pub fn new(probe_target: SocketAddr, disk_mount: impl Into<PathBuf>) -> Self {
        Self {
            system: System::new(),
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            probe_target,
            disk_mount: disk_mount.into(),
            public_ip: None,
        }
    }

    /// Latest public address lookup, carried into every following snapshot.
    pub fn record_public_ip(&mut self, public_ip: Option<String>) {
        self.public_ip = public_ip;
    }

    /// Takes a full snapshot. Blocks for [`CPU_SAMPLE_WINDOW`] while CPU usage is measured.
    pub fn sample(&mut self) -> Snapshot {
        let host_name = System::host_name().unwrap_or_default();
        let resolved_ip = resolve_host_ip(&host_name)
            .map(|ip| ip.to_string())
            .unwrap_or_default();

        self.networks.refresh_list();
        let interfaces: Vec<(String, Vec<IpAddr>)> = self
            .networks
            .iter()
            .map(|(name, data)| {
                (
                    name.to_string(),
                    data.ip_networks().iter().map(|n| n.addr).collect(),
                )
            })
            .collect();
        let (active_ip, active_interface) =
            locate_active(probe_active_ip(self.probe_target), &resolved_ip, &interfaces);

        let (network_sent_bytes, network_recv_bytes) =
            self.networks.iter().fold((0_u64, 0_u64), |acc, (_, data)| {
                (
                    acc.0.saturating_add(data.total_transmitted()),
                    acc.1.saturating_add(data.total_received()),
                )
            });

        let uptime = uptime_since(System::boot_time(), SystemTime::now());

        self.system.refresh_memory();
        let available_ram_bytes = self.system.available_memory();

        self.disks.refresh_list();
        let available_disk_bytes = primary_disk_available(
            self.disks
                .list()
                .iter()
                .map(|d| (d.mount_point(), d.available_space())),
            &self.disk_mount,
        );

        let cpu_usage_percent = self.measure_cpu();

        debug!(
            host = %host_name,
            active_ip = %active_ip,
            active_interface = ?active_interface,
            uptime_secs = uptime.as_secs(),
            "снимок метрик собран"
        );

        Snapshot {
            host_name,
            resolved_ip,
            active_ip,
            active_interface,
            uptime,
            available_ram_bytes,
            available_disk_bytes,
            cpu_usage_percent,
            network_sent_bytes,
            network_recv_bytes,
            public_ip: self.public_ip.clone(),
        }
    }

    fn measure_cpu(&mut self) -> f64 {
        self.system.refresh_cpu_usage();
        std::thread::sleep(CPU_SAMPLE_WINDOW.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
        self.system.refresh_cpu_usage();
        self.system.global_cpu_usage() as f64
    }
}

/// Wall-clock time since boot, in whole seconds. Saturates at zero if the clock moved backwards.
pub fn uptime_since(boot_time_unix: u64, now: SystemTime) -> Duration {
    let now_unix = now
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Duration::from_secs(now_unix.saturating_sub(boot_time_unix))
}

/// Free bytes on `mount`; falls back to the first listed volume, then to 0.
pub fn primary_disk_available<'a>(
    disks: impl IntoIterator<Item = (&'a Path, u64)>,
    mount: &Path,
) -> u64 {
    let mut first = None;
    for (mount_point, available) in disks {
        if mount_point == mount {
            return available;
        }
        first.get_or_insert(available);
    }
    if first.is_none() {
        debug!(mount = %mount.display(), "не найдено ни одного тома");
    }
    first.unwrap_or(0)
}
