pub mod network;
pub mod public_ip;
pub mod system;

use std::time::Duration;

/// One immutable capture of the host metrics, taken once per tick.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Snapshot {
    pub host_name: String,
    pub resolved_ip: String,
    pub active_ip: String,
    pub active_interface: Option<String>,
    pub uptime: Duration,
    pub available_ram_bytes: u64,
    pub available_disk_bytes: u64,
    pub cpu_usage_percent: f64,
    pub network_sent_bytes: u64,
    pub network_recv_bytes: u64,
    pub public_ip: Option<String>,
}
