use crate::collectors::Snapshot;
use std::time::Duration;

pub const PC_NAME: &str = "PC Name";
pub const IP_ADDRESS: &str = "IP Address";
pub const ACTIVE_INTERFACE: &str = "Active Interface";
pub const UPTIME: &str = "Uptime";
pub const AVAILABLE_RAM: &str = "Available RAM";
pub const DISK_SPACE: &str = "Disk Space";
pub const CPU_USAGE: &str = "CPU Usage";
pub const NETWORK_SENT: &str = "Network Sent";
pub const NETWORK_RECEIVED: &str = "Network Received";
pub const PUBLIC_IP: &str = "Public IP";

/// One display line, e.g. `label = "Uptime"`, `line = "Uptime: 1 day, 1:01:01"`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RenderedMetric {
    pub label: &'static str,
    pub line: String,
}

impl RenderedMetric {
    /// The line with its label prefix removed: everything after the first `": "`.
    pub fn value(&self) -> &str {
        match self.line.split_once(": ") {
            Some((_, rest)) => rest,
            None => &self.line,
        }
    }
}

/// Formatted metrics in display order.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize)]
pub struct RenderedMetrics {
    entries: Vec<RenderedMetric>,
}

impl RenderedMetrics {
    pub fn iter(&self) -> impl Iterator<Item = &RenderedMetric> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_clipboard_text(&self) -> String {
        self.entries
            .iter()
            .map(|e| e.line.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn push(&mut self, label: &'static str, line: String) {
        self.entries.push(RenderedMetric { label, line });
    }
}

pub fn present(snapshot: &Snapshot) -> RenderedMetrics {
    let mut out = RenderedMetrics {
        entries: Vec::with_capacity(10),
    };

    out.push(PC_NAME, format!("{PC_NAME}: {}", snapshot.host_name));
    out.push(IP_ADDRESS, format!("{IP_ADDRESS}: {}", snapshot.resolved_ip));
    out.push(
        ACTIVE_INTERFACE,
        format_active_interface(snapshot.active_interface.as_deref(), &snapshot.active_ip),
    );
    out.push(UPTIME, format!("{UPTIME}: {}", format_uptime(snapshot.uptime)));
    out.push(
        AVAILABLE_RAM,
        format!("{AVAILABLE_RAM}: {}", format_gb(snapshot.available_ram_bytes)),
    );
    out.push(
        DISK_SPACE,
        format!("{DISK_SPACE}: {}", format_gb(snapshot.available_disk_bytes)),
    );
    out.push(
        CPU_USAGE,
        format!("{CPU_USAGE}: {:.1} %", snapshot.cpu_usage_percent),
    );
    out.push(
        NETWORK_SENT,
        format!("{NETWORK_SENT}: {}", format_mb(snapshot.network_sent_bytes)),
    );
    out.push(
        NETWORK_RECEIVED,
        format!("{NETWORK_RECEIVED}: {}", format_mb(snapshot.network_recv_bytes)),
    );
    if let Some(public_ip) = &snapshot.public_ip {
        out.push(PUBLIC_IP, format!("{PUBLIC_IP}: {public_ip}"));
    }

    out
}

/// `eth0 (192.168.1.5)` when the interface is known, otherwise a distinct `Active Interface IP:` line.
pub fn format_active_interface(iface: Option<&str>, active_ip: &str) -> String {
    match iface {
        Some(name) => format!("{ACTIVE_INTERFACE}: {name} ({active_ip})"),
        None => format!("{ACTIVE_INTERFACE} IP: {active_ip}"),
    }
}

/// `H:MM:SS`, prefixed with `N day, ` / `N days, ` past 24 hours.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let mins = (total % 3600) / 60;
    let secs = total % 60;

    let clock = format!("{hours}:{mins:02}:{secs:02}");
    match days {
        0 => clock,
        1 => format!("1 day, {clock}"),
        n => format!("{n} days, {clock}"),
    }
}

pub fn bytes_to_gb(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0 / 1024.0 / 1024.0)
}

pub fn bytes_to_mb(bytes: u64) -> f64 {
    round2(bytes as f64 / 1024.0 / 1024.0)
}

pub fn format_gb(bytes: u64) -> String {
    format!("{:.2} GB", bytes_to_gb(bytes))
}

pub fn format_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes_to_mb(bytes))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
