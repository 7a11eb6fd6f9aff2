use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

#[cfg(feature = "cli")]
use std::sync::atomic::{AtomicU64, Ordering};
#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, RefreshKind, System};

/// 記錄操作耗時，成功與失敗都會輸出
pub async fn timed<T, E, Fut>(operation: &str, fut: Fut) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let start = Instant::now();
    let result = fut.await;
    let elapsed = start.elapsed().as_secs_f64();
    match &result {
        Ok(_) => tracing::info!("{} completed in {:.3}s", operation, elapsed),
        Err(e) => tracing::error!("{} failed after {:.3}s: {}", operation, elapsed, e),
    }
    result
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct ProcessStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub stk_requests: u64,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    peak_memory: Mutex<u64>,
    stk_requests: AtomicU64,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let system = if enabled {
            let mut system = System::new_with_specifics(RefreshKind::everything());
            system.refresh_all();
            system
        } else {
            System::new()
        };

        Self {
            system: Mutex::new(system),
            pid: sysinfo::get_current_pid().ok(),
            peak_memory: Mutex::new(0),
            stk_requests: AtomicU64::new(0),
            enabled,
        }
    }

    pub fn get_stats(&self) -> Option<ProcessStats> {
        if !self.enabled {
            return None;
        }

        let mut system = self.system.lock().ok()?;
        system.refresh_all();

        let process = system.process(self.pid?)?;
        let memory_mb = process.memory() / 1024 / 1024;

        let mut peak = self.peak_memory.lock().ok()?;
        if memory_mb > *peak {
            *peak = memory_mb;
        }

        Some(ProcessStats {
            cpu_usage: process.cpu_usage(),
            memory_usage_mb: memory_mb,
            peak_memory_mb: *peak,
            stk_requests: self.stk_requests.load(Ordering::Relaxed),
        })
    }

    /// 每個 STK 請求結束後呼叫一次
    pub fn log_stats(&self, request: &str) {
        if !self.enabled {
            return;
        }
        self.stk_requests.fetch_add(1, Ordering::Relaxed);
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, STK requests: {}",
                request,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.stk_requests
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 環境提供空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _request: &str) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
