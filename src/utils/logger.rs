use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// File sink settings. Size rotation and retention pruning happen once, when
/// the logger starts; the file can exceed `max_file_size_mb` during a long run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Console level when RUST_LOG is unset
    pub level: Option<String>,
    /// Debug-level log file; None disables the file sink
    pub file: Option<String>,
    pub max_file_size_mb: Option<u64>,
    pub retention_days: Option<u64>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            file: Some("output/agent.log".to_string()),
            max_file_size_mb: Some(1),
            retention_days: Some(7),
        }
    }
}

impl LoggingConfig {
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_size_mb.unwrap_or(1) * 1024 * 1024
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.unwrap_or(7) * 24 * 60 * 60)
    }
}

/// 初始化主控台與檔案日誌；檔案開啟失敗時只保留主控台
pub fn init_logger(verbose: bool, config: &LoggingConfig) {
    let console_level = config
        .level
        .clone()
        .unwrap_or_else(|| if verbose { "debug".to_string() } else { "info".to_string() });
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("recon_triage={},warn", console_level)));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .with_filter(console_filter);

    let mut file_error = None;
    let file_layer = config.file.as_deref().and_then(|path| {
        match open_log_file(Path::new(path), config.max_file_bytes(), config.retention()) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("recon_triage=debug,info")),
            ),
            Err(e) => {
                file_error = Some(format!("{}: {}", path, e));
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    if let Some(error) = file_error {
        tracing::warn!("⚠️ File logging disabled, cannot open {}", error);
    }
    tracing::debug!("Logging initialized");
}

fn open_log_file(path: &Path, max_bytes: u64, retention: Duration) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    rotate_log_file(path, max_bytes)?;
    prune_rotated_logs(path, retention)?;

    OpenOptions::new().create(true).append(true).open(path)
}

/// Renames `path` with a timestamp suffix once it reaches `max_bytes`.
pub fn rotate_log_file(path: &Path, max_bytes: u64) -> std::io::Result<Option<PathBuf>> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    if size < max_bytes {
        return Ok(None);
    }

    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S%.3f");
    let rotated = PathBuf::from(format!("{}.{}", path.display(), stamp));
    fs::rename(path, &rotated)?;
    Ok(Some(rotated))
}

/// Deletes rotated siblings (`<name>.<suffix>`) last modified before the retention window.
pub fn prune_rotated_logs(path: &Path, retention: Duration) -> std::io::Result<usize> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(0);
    };
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let prefix = format!("{}.", name);
    let cutoff = SystemTime::now()
        .checked_sub(retention)
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let mut removed = 0;
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let is_rotated = file_name
            .to_str()
            .map(|n| n.starts_with(&prefix))
            .unwrap_or(false);
        if !is_rotated {
            continue;
        }
        if entry.metadata()?.modified()? < cutoff {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rotate_small_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("agent.log");
        fs::write(&log, b"short").unwrap();

        assert!(rotate_log_file(&log, 1024).unwrap().is_none());
        assert!(log.exists());
        assert!(rotate_log_file(&dir.path().join("absent.log"), 1).unwrap().is_none());
    }

    #[test]
    fn test_rotate_large_file() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("agent.log");
        fs::write(&log, vec![b'x'; 64]).unwrap();

        let rotated = rotate_log_file(&log, 32).unwrap().unwrap();
        assert!(!log.exists());
        assert!(rotated.exists());
        assert!(rotated
            .file_name()
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("agent.log."));
    }

    #[test]
    fn test_prune_respects_retention() {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("agent.log");
        fs::write(dir.path().join("agent.log.old"), b"old").unwrap();
        fs::write(dir.path().join("other.log.old"), b"keep").unwrap();

        // Nothing is older than a day yet
        assert_eq!(prune_rotated_logs(&log, Duration::from_secs(86_400)).unwrap(), 0);

        // Zero retention removes every rotated sibling but leaves unrelated files
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(prune_rotated_logs(&log, Duration::ZERO).unwrap(), 1);
        assert!(dir.path().join("other.log.old").exists());
    }
}
