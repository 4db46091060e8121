use crate::alerts::LowResourceAlert;
use crate::export::{write_csv, ExportError};
use crate::state::State;
use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Copy,
    Export(String),
    Show,
    Help,
    Quit,
}

impl Action {
    pub fn from_command(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let (first, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((first, rest)) => (first, rest.trim()),
            None => (trimmed, ""),
        };
        match first.to_lowercase().as_str() {
            "copy" | "c" => Some(Self::Copy),
            "export" | "e" => Some(Self::Export(rest.to_string())),
            "show" | "s" => Some(Self::Show),
            "help" | "h" | "?" => Some(Self::Help),
            "quit" | "exit" | "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Terminal front end: prints alerts as they arrive and serves copy/export
/// requests from the last rendering.
pub async fn run(
    state: Arc<RwLock<State>>,
    mut alerts: mpsc::Receiver<LowResourceAlert>,
    shutdown_tx: watch::Sender<bool>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut commands = spawn_stdin_reader();
    let mut stdin_open = true;
    println!("{}", help_text());

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            alert = alerts.recv() => {
                match alert {
                    Some(alert) => eprintln!("⚠ {alert}"),
                    None => break,
                }
            }
            line = commands.recv(), if stdin_open => {
                let Some(text) = line else {
                    stdin_open = false;
                    continue;
                };
                if text.trim().is_empty() {
                    continue;
                }
                let Some(action) = Action::from_command(&text) else {
                    println!("неизвестная команда: {}", text.trim());
                    continue;
                };
                if action == Action::Quit {
                    info!("получена команда quit, выполняется остановка");
                    let _ = shutdown_tx.send(true);
                    break;
                }
                let reply = handle_action(&action, &state).await;
                println!("{reply}");
            }
        }
    }
}

/// Reads stdin on a detached thread so a pending read never holds up runtime shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    let spawned = std::thread::Builder::new()
        .name("hostwatch-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(text) => {
                        if tx.blocking_send(text).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "ошибка чтения stdin, ввод команд отключён");
                        break;
                    }
                }
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "не удалось запустить поток чтения stdin");
    }
    rx
}

pub async fn handle_action(action: &Action, state: &Arc<RwLock<State>>) -> String {
    match action {
        Action::Copy => {
            let guard = state.read().await;
            if !guard.has_data() {
                return ExportError::NothingRendered.to_string();
            }
            guard.rendered.to_clipboard_text()
        }
        Action::Export(path) => {
            let rendered = state.read().await.rendered.clone();
            match write_csv(path, &rendered) {
                Ok(()) => {
                    info!(path = %path, "снимок экспортирован в CSV");
                    format!("сохранено: {path}")
                }
                Err(err) => {
                    warn!(path = %path, error = %err, "экспорт CSV не удался");
                    format!("ошибка экспорта: {err}")
                }
            }
        }
        Action::Show => format_status(&*state.read().await),
        Action::Help => help_text(),
        Action::Quit => String::new(),
    }
}

fn format_status(state: &State) -> String {
    if !state.has_data() {
        return "Последнее обновление: н/д".to_string();
    }
    let mut out = format!(
        "Последнее обновление: {} (тик #{}, запущен {})\n",
        format_unix(state.last_collect_timestamp_seconds),
        state.tick_count,
        format_unix(state.started_at_unix)
    );
    out.push_str(&state.rendered.to_clipboard_text());
    if let Some(alert) = &state.last_alert {
        out.push_str("\n\nПоследнее предупреждение:\n");
        out.push_str(&alert.to_string());
    }
    out
}

fn help_text() -> String {
    [
        "Команды:",
        "  copy            вывести метрики в виде текста для буфера обмена",
        "  export <path>   сохранить последний снимок в CSV",
        "  show            показать метрики и время обновления",
        "  help            эта справка",
        "  quit            остановить hostwatch",
    ]
    .join("\n")
}

fn format_unix(ts: i64) -> String {
    let st = UNIX_EPOCH + Duration::from_secs(ts.max(0) as u64);
    humantime::format_rfc3339_seconds(st).to_string()
}
