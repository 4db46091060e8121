mod alerts;
mod collectors;
mod config;
mod console;
mod export;
mod present;
mod state;

use clap::Parser;
use collectors::public_ip::lookup_public_ip;
use collectors::system::Sampler;
use config::Config;
use reqwest::Client;
use state::State;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hostwatch")]
#[command(version)]
struct Cli {
    /// YAML config; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<String>,
    #[arg(long)]
    print_default_config: bool,
    /// Take a single sample, print it and exit.
    #[arg(long)]
    once: bool,
    #[arg(long, requires = "once")]
    json: bool,
    #[arg(long, requires = "once", value_name = "PATH")]
    export: Option<String>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let cfg = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(error = %err, "не удалось загрузить конфигурацию");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    let probe_target = match cfg.probe_addr() {
        Ok(addr) => addr,
        Err(err) => {
            error!(error = %err, "некорректный probe_target");
            std::process::exit(1);
        }
    };

    let client = Client::builder()
        .user_agent("hostwatch/0.1.0")
        .build()
        .unwrap_or_else(|_| Client::new());
    let mut sampler = Sampler::new(probe_target, cfg.disk_mount.clone());

    if cli.once {
        if cfg.public_ip.enabled {
            let ip = lookup_public_ip(&client, &cfg.public_ip).await;
            sampler.record_public_ip(Some(ip));
        }
        let snapshot = tokio::task::block_in_place(|| sampler.sample());
        if let Err(err) = run_once(&cli, &cfg, &snapshot) {
            error!(error = %err, "однократный запуск завершился с ошибкой");
            std::process::exit(1);
        }
        return;
    }

    info!(
        interval_secs = cfg.interval_secs,
        probe_target = %probe_target,
        disk_mount = %cfg.disk_mount,
        public_ip = cfg.public_ip.enabled,
        "запуск hostwatch"
    );

    let shared_state = Arc::new(RwLock::new(State::new(now_unix(), &cfg.alerts)));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (alert_tx, alert_rx) = mpsc::channel(16);

    let console_task = {
        let state = shared_state.clone();
        let shutdown_tx = shutdown_tx.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(console::run(state, alert_rx, shutdown_tx, shutdown))
    };

    let collector_task = {
        let cfg = cfg.clone();
        let shared_state = shared_state.clone();
        let mut shutdown = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_public_ip_unix: Option<i64> = None;

            loop {
                tokio::select! {
                    _ = shutdown.changed() => {
                        info!("получен сигнал остановки цикла сбора");
                        break;
                    }
                    _ = ticker.tick() => {
                        let now = now_unix();
                        if cfg.public_ip.enabled
                            && public_ip_due(last_public_ip_unix, now, cfg.public_ip.refresh_secs)
                        {
                            let ip = lookup_public_ip(&client, &cfg.public_ip).await;
                            sampler.record_public_ip(Some(ip));
                            last_public_ip_unix = Some(now);
                        }

                        let snapshot = tokio::task::block_in_place(|| sampler.sample());
                        let now = now_unix();
                        let alert = {
                            let mut guard = shared_state.write().await;
                            guard.apply_snapshot(&snapshot, &cfg.alerts, now)
                        };

                        info!(
                            at = %humantime::format_rfc3339_seconds(SystemTime::now()),
                            cpu_usage_percent = snapshot.cpu_usage_percent,
                            available_ram_bytes = snapshot.available_ram_bytes,
                            available_disk_bytes = snapshot.available_disk_bytes,
                            "метрики обновлены"
                        );

                        if let Some(alert) = alert {
                            warn!(
                                available_ram_bytes = alert.available_ram_bytes,
                                available_disk_bytes = alert.available_disk_bytes,
                                "мало свободных ресурсов"
                            );
                            if alert_tx.send(alert).await.is_err() {
                                warn!("получатель предупреждений закрыт");
                            }
                        }
                    }
                }
            }
        })
    };

    let mut shutdown = shutdown_rx.clone();
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                error!(error = %err, "не удалось дождаться Ctrl+C");
            }
            info!("получен Ctrl+C, выполняется остановка");
        }
        _ = shutdown.changed() => {}
    }

    let _ = shutdown_tx.send(true);

    let _ = collector_task.await;
    let _ = console_task.await;
}

fn run_once(
    cli: &Cli,
    cfg: &Config,
    snapshot: &collectors::Snapshot,
) -> Result<(), Box<dyn std::error::Error>> {
    let rendered = present::present(snapshot);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
    } else {
        println!("{}", rendered.to_clipboard_text());
    }

    if let Some(alert) = alerts::evaluate_low_resources(snapshot, &cfg.alerts) {
        eprintln!("⚠ {alert}");
    }

    if let Some(path) = &cli.export {
        export::write_csv(path, &rendered)?;
        info!(path = %path, "снимок экспортирован в CSV");
    }
    Ok(())
}

fn public_ip_due(last_lookup_unix: Option<i64>, now_unix: i64, refresh_secs: u64) -> bool {
    match last_lookup_unix {
        Some(last) => now_unix.saturating_sub(last) >= refresh_secs as i64,
        None => true,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_ip_lookup_runs_first_then_on_refresh() {
        assert!(public_ip_due(None, 0, 300));
        assert!(!public_ip_due(Some(100), 399, 300));
        assert!(public_ip_due(Some(100), 400, 300));
    }

    #[test]
    fn cli_flags_parse() {
        let cli = Cli::try_parse_from(["hostwatch", "--once", "--export", "out.csv"])
            .expect("разбор аргументов");
        assert!(cli.once);
        assert_eq!(cli.export.as_deref(), Some("out.csv"));
        assert!(Cli::try_parse_from(["hostwatch", "--json"]).is_err());
    }
}
