use crate::alerts::{evaluate_low_resources, AlertGate, LowResourceAlert};
use crate::collectors::Snapshot;
use crate::config::AlertsConfig;
use crate::present::{present, RenderedMetrics};

/// Everything user actions may read between ticks.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub started_at_unix: i64,
    pub last_collect_timestamp_seconds: i64,
    pub tick_count: u64,
    pub rendered: RenderedMetrics,
    pub last_alert: Option<LowResourceAlert>,
    alert_gate: AlertGate,
}

impl State {
    pub fn new(now_unix: i64, alerts: &AlertsConfig) -> Self {
        Self {
            started_at_unix: now_unix,
            alert_gate: AlertGate::new(alerts.cooldown_secs),
            ..Self::default()
        }
    }

    /// Replaces the rendering with one built from `snapshot` and returns the alert to deliver, if any.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &Snapshot,
        alerts: &AlertsConfig,
        now_unix: i64,
    ) -> Option<LowResourceAlert> {
        self.rendered = present(snapshot);
        self.last_collect_timestamp_seconds = now_unix;
        self.tick_count = self.tick_count.saturating_add(1);

        let alert = evaluate_low_resources(snapshot, alerts)
            .filter(|_| self.alert_gate.should_emit(now_unix));
        if alert.is_some() {
            self.last_alert = alert;
        }
        alert
    }

    pub fn has_data(&self) -> bool {
        !self.rendered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GIB;
    use crate::present::tests::snapshot;

    fn low_ram() -> Snapshot {
        Snapshot {
            available_ram_bytes: GIB / 2,
            available_disk_bytes: 10 * GIB,
            ..snapshot()
        }
    }

    #[test]
    fn new_state_has_nothing_to_export() {
        let state = State::new(100, &AlertsConfig::default());
        assert!(!state.has_data());
        assert_eq!(state.started_at_unix, 100);
        assert_eq!(state.tick_count, 0);
    }

    #[test]
    fn tick_replaces_whole_rendering() {
        let cfg = AlertsConfig::default();
        let mut state = State::new(0, &cfg);

        state.apply_snapshot(&snapshot(), &cfg, 5);
        let first = state.rendered.clone();

        let mut next = snapshot();
        next.host_name = "renamed".to_string();
        next.uptime += std::time::Duration::from_secs(5);
        state.apply_snapshot(&next, &cfg, 10);

        assert_ne!(state.rendered, first);
        assert_eq!(state.rendered, present(&next));
        assert_eq!(state.last_collect_timestamp_seconds, 10);
        assert_eq!(state.tick_count, 2);
    }

    #[test]
    fn alert_fires_on_every_tick_by_default() {
        let cfg = AlertsConfig::default();
        let mut state = State::new(0, &cfg);
        for tick in 0..4 {
            let alert = state.apply_snapshot(&low_ram(), &cfg, tick * 5);
            assert!(alert.is_some(), "tick {tick}");
        }
        assert_eq!(
            state.last_alert.map(|a| a.available_ram_bytes),
            Some(GIB / 2)
        );
    }

    #[test]
    fn cooldown_rate_limits_alerts() {
        let cfg = AlertsConfig {
            cooldown_secs: 12,
            ..AlertsConfig::default()
        };
        let mut state = State::new(0, &cfg);
        let fired: Vec<bool> = (0..5)
            .map(|tick| state.apply_snapshot(&low_ram(), &cfg, tick * 5).is_some())
            .collect();
        assert_eq!(fired, vec![true, false, false, true, false]);
    }

    #[test]
    fn healthy_tick_keeps_previous_alert_for_display() {
        let cfg = AlertsConfig::default();
        let mut state = State::new(0, &cfg);
        state.apply_snapshot(&low_ram(), &cfg, 0);
        assert!(state.apply_snapshot(&snapshot(), &cfg, 5).is_none());
        assert!(state.last_alert.is_some());
    }
}
