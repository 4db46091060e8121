use crate::present::RenderedMetrics;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CSV_HEADER: [&str; 2] = ["Metric", "Value"];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("путь для экспорта не указан")]
    EmptyPath,
    #[error("метрики ещё не собраны, экспортировать нечего")]
    NothingRendered,
    #[error("не удалось записать CSV в {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// `Metric,Value` header, then one row per metric in display order. Rows end with CRLF.
pub fn to_csv(metrics: &RenderedMetrics) -> Vec<u8> {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER[0], CSV_HEADER[1]);
    for metric in metrics.iter() {
        push_row(&mut out, metric.label, metric.value());
    }
    out.into_bytes()
}

/// Writes the CSV next to `path` first and renames it into place, so a failed
/// export never leaves a truncated file behind.
pub fn write_csv(path: impl AsRef<Path>, metrics: &RenderedMetrics) -> Result<(), ExportError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(ExportError::EmptyPath);
    }
    if metrics.is_empty() {
        return Err(ExportError::NothingRendered);
    }

    let tmp = temp_path_for(path);
    let result = write_then_rename(&tmp, path, &to_csv(metrics));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result.map_err(|source| ExportError::Write {
        path: path.display().to_string(),
        source,
    })
}

fn write_then_rename(tmp: &Path, dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, dest)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "export.csv".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}

fn push_row(out: &mut String, metric: &str, value: &str) {
    push_field(out, metric);
    out.push(',');
    push_field(out, value);
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}
