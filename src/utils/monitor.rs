#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct StageStats {
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub since_start: Duration,
    pub since_last_stage: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
    last_stage: Instant,
}

/// 記錄每個階段的耗時與記憶體用量
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let now = Instant::now();
        // 取不到 PID 時只記錄耗時
        let pid = if enabled {
            sysinfo::get_current_pid().ok()
        } else {
            None
        };

        let state = enabled.then(|| {
            Mutex::new(MonitorState {
                system: System::new(),
                peak_memory_mb: 0,
                last_stage: now,
            })
        });

        Self {
            state,
            pid,
            start_time: now,
        }
    }

    pub fn stage_stats(&self) -> Option<StageStats> {
        let mut state = self.state.as_ref()?.lock().ok()?;

        let memory_usage_mb = match self.pid {
            Some(pid) => {
                state.system.refresh_processes_specifics(
                    ProcessesToUpdate::Some(&[pid]),
                    true,
                    ProcessRefreshKind::nothing().with_memory(),
                );
                state
                    .system
                    .process(pid)
                    .map(|p| p.memory() / 1024 / 1024)
                    .unwrap_or(0)
            }
            None => 0,
        };

        state.peak_memory_mb = state.peak_memory_mb.max(memory_usage_mb);
        let since_last_stage = state.last_stage.elapsed();
        state.last_stage = Instant::now();

        Some(StageStats {
            memory_usage_mb,
            peak_memory_mb: state.peak_memory_mb,
            since_start: self.start_time.elapsed(),
            since_last_stage,
        })
    }

    pub fn log_stats(&self, stage: &str) {
        if let Some(stats) = self.stage_stats() {
            tracing::info!(
                "📊 {} - Memory: {}MB, Peak: {}MB, Stage time: {:?}, Total: {:?}",
                stage,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.since_last_stage,
                stats.since_start
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.stage_stats() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.since_start,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _stage: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
