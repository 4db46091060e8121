use crate::collectors::Snapshot;
use crate::config::AlertsConfig;
use crate::present::bytes_to_gb;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LowResourceAlert {
    pub available_ram_bytes: u64,
    pub available_disk_bytes: u64,
}

impl fmt::Display for LowResourceAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Low resources detected:\nRAM: {:.2} GB\nDisk: {:.2} GB",
            bytes_to_gb(self.available_ram_bytes),
            bytes_to_gb(self.available_disk_bytes)
        )
    }
}

pub fn evaluate_low_resources(
    snapshot: &Snapshot,
    cfg: &AlertsConfig,
) -> Option<LowResourceAlert> {
    if !cfg.enabled {
        return None;
    }

    let ram_low = snapshot.available_ram_bytes < cfg.ram_threshold_bytes;
    let disk_low = snapshot.available_disk_bytes < cfg.disk_threshold_bytes;
    if !(ram_low || disk_low) {
        return None;
    }

    Some(LowResourceAlert {
        available_ram_bytes: snapshot.available_ram_bytes,
        available_disk_bytes: snapshot.available_disk_bytes,
    })
}

/// Optional rate limit between alerts. A zero cooldown lets every tick through.
#[derive(Debug, Clone, Default)]
pub struct AlertGate {
    cooldown_secs: u64,
    last_sent_unix: Option<i64>,
}

impl AlertGate {
    pub fn new(cooldown_secs: u64) -> Self {
        Self {
            cooldown_secs,
            last_sent_unix: None,
        }
    }

    pub fn should_emit(&mut self, now_unix: i64) -> bool {
        if let Some(last) = self.last_sent_unix {
            if now_unix.saturating_sub(last) < self.cooldown_secs as i64 {
                return false;
            }
        }
        self.last_sent_unix = Some(now_unix);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GIB;
    use crate::present::tests::snapshot;

    fn with_resources(ram: u64, disk: u64) -> Snapshot {
        Snapshot {
            available_ram_bytes: ram,
            available_disk_bytes: disk,
            ..snapshot()
        }
    }

    #[test]
    fn low_ram_fires() {
        let cfg = AlertsConfig::default();
        let alert = evaluate_low_resources(&with_resources(GIB / 2, 10 * GIB), &cfg)
            .expect("RAM ниже порога");
        assert_eq!(alert.available_ram_bytes, GIB / 2);
        assert_eq!(alert.available_disk_bytes, 10 * GIB);
    }

    #[test]
    fn healthy_resources_do_not_fire() {
        let cfg = AlertsConfig::default();
        assert_eq!(
            evaluate_low_resources(&with_resources(2 * GIB, 10 * GIB), &cfg),
            None
        );
    }

    #[test]
    fn low_disk_fires_and_thresholds_are_strict() {
        let cfg = AlertsConfig::default();
        assert!(evaluate_low_resources(&with_resources(2 * GIB, 5 * GIB - 1), &cfg).is_some());
        assert!(evaluate_low_resources(&with_resources(GIB, 5 * GIB), &cfg).is_none());
    }

    #[test]
    fn disabled_alerts_never_fire() {
        let cfg = AlertsConfig {
            enabled: false,
            ..AlertsConfig::default()
        };
        assert!(evaluate_low_resources(&with_resources(0, 0), &cfg).is_none());
    }

    #[test]
    fn zero_cooldown_fires_every_tick() {
        let mut gate = AlertGate::new(0);
        assert!((0..5).all(|tick| gate.should_emit(tick * 5)));
    }

    #[test]
    fn cooldown_suppresses_until_elapsed() {
        let mut gate = AlertGate::new(60);
        assert!(gate.should_emit(100));
        assert!(!gate.should_emit(105));
        assert!(!gate.should_emit(159));
        assert!(gate.should_emit(160));
    }

    #[test]
    fn message_lists_both_values() {
        let alert = LowResourceAlert {
            available_ram_bytes: GIB / 2,
            available_disk_bytes: 10 * GIB,
        };
        assert_eq!(
            alert.to_string(),
            "Low resources detected:\nRAM: 0.50 GB\nDisk: 10.00 GB"
        );
    }
}
