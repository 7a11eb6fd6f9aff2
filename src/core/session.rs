use crate::adapters::connect::ConnectRoot;
use crate::adapters::launcher::{self, LaunchedApplication};
use crate::config::StkConfig;
use crate::domain::model::{Capabilities, StkMode};
use crate::domain::ports::StkRoot;
use crate::utils::error::{Result, StkError};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

pub const STK_UNAVAILABLE: &str = "STK is not available on this system.";
pub const ROOT_UNAVAILABLE: &str = "STK Root not available. Initialize via server lifespan.";

/// 連線生命週期：uninitialized → ready → closed；啟動失敗時為 unavailable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Ready,
    Unavailable(String),
    Closed,
}

pub type EngineGuard<'a> = MutexGuard<'a, Box<dyn StkRoot>>;

/// STK 連線狀態。根節點由序列化鎖持有，不取得鎖就無法呼叫引擎。
pub struct ConnectionState {
    mode: StkMode,
    capabilities: Capabilities,
    root: Option<Mutex<Box<dyn StkRoot>>>,
    lifecycle: RwLock<Lifecycle>,
}

impl ConnectionState {
    pub fn uninitialized(mode: StkMode) -> Self {
        Self {
            mode,
            capabilities: Capabilities::default(),
            root: None,
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
        }
    }

    pub fn ready(mode: StkMode, root: Box<dyn StkRoot>, capabilities: Capabilities) -> Self {
        Self {
            mode,
            capabilities,
            root: Some(Mutex::new(root)),
            lifecycle: RwLock::new(Lifecycle::Ready),
        }
    }

    pub fn unavailable(mode: StkMode, reason: impl Into<String>) -> Self {
        Self {
            mode,
            capabilities: Capabilities::default(),
            root: None,
            lifecycle: RwLock::new(Lifecycle::Unavailable(reason.into())),
        }
    }

    pub fn mode(&self) -> StkMode {
        self.mode
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
            .read()
            .map(|l| l.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    pub fn is_ready(&self) -> bool {
        self.root.is_some() && self.lifecycle() == Lifecycle::Ready
    }

    /// 取得序列化鎖；連線不可用時回傳統一的 unavailable 錯誤
    pub async fn lock(&self) -> Result<EngineGuard<'_>> {
        match self.lifecycle() {
            Lifecycle::Ready => {}
            Lifecycle::Unavailable(_) => return Err(StkError::unavailable(STK_UNAVAILABLE)),
            Lifecycle::Uninitialized | Lifecycle::Closed => {
                return Err(StkError::unavailable(ROOT_UNAVAILABLE))
            }
        }
        match &self.root {
            Some(root) => Ok(root.lock().await),
            None => Err(StkError::unavailable(ROOT_UNAVAILABLE)),
        }
    }

    fn set_lifecycle(&self, next: Lifecycle) {
        match self.lifecycle.write() {
            Ok(mut guard) => *guard = next,
            Err(e) => *e.into_inner() = next,
        }
    }
}

/// 伺服器程序範圍內的 STK 生命週期管理
pub struct StkLifespan {
    state: Arc<ConnectionState>,
    app: Option<LaunchedApplication>,
}

impl StkLifespan {
    /// 依模式接上或啟動 STK；任何失敗都不會中止伺服器，只會標記為 unavailable
    pub async fn start(mode: StkMode, config: &StkConfig) -> Self {
        tracing::info!("MCP Server Startup: Initializing STK in '{}' mode...", mode);

        let mut app = None;
        let state = match connect(mode, config, &mut app).await {
            Ok(root) => Self::prepare(mode, Box::new(root)).await,
            Err(e @ StkError::Unavailable(_)) => {
                tracing::warn!(
                    "STK is not available. MCP server will run without STK functionality: {}",
                    e
                );
                ConnectionState::unavailable(mode, e.to_string())
            }
            Err(e) => {
                tracing::error!("❌ Failed to initialize STK in {} mode: {}", mode, e);
                tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
                ConnectionState::unavailable(mode, e.to_string())
            }
        };

        Self {
            state: Arc::new(state),
            app,
        }
    }

    /// 使用已建立的根節點（測試或自訂 adapter）
    pub async fn with_root(mode: StkMode, root: Box<dyn StkRoot>) -> Self {
        Self {
            state: Arc::new(Self::prepare(mode, root).await),
            app: None,
        }
    }

    async fn prepare(mode: StkMode, mut root: Box<dyn StkRoot>) -> ConnectionState {
        // 關閉既有場景，從乾淨狀態開始
        match root.current_scenario().await {
            Ok(Some(scenario)) => {
                tracing::info!("Closing existing scenario '{}'...", scenario.name);
                if let Err(e) = root.close_scenario().await {
                    tracing::warn!("Could not close existing scenario: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not query current scenario: {}", e),
        }

        let capabilities = root.probe_capabilities().await;
        tracing::info!(
            "✅ STK initialized in '{}' mode (two-body propagator: {})",
            mode,
            capabilities.two_body_propagator
        );
        ConnectionState::ready(mode, root, capabilities)
    }

    pub fn state(&self) -> Arc<ConnectionState> {
        self.state.clone()
    }

    /// 關閉連線；只有本程序啟動的應用程式才會被結束
    pub async fn shutdown(self) {
        tracing::info!(
            "MCP Server Shutdown: Cleaning up STK ({} mode)...",
            self.state.mode()
        );

        if let Some(root) = &self.state.root {
            let mut root = root.lock().await;
            if let Err(e) = root.close().await {
                tracing::warn!("Error closing STK connection: {}", e);
            }
        }
        if self.state.root.is_some() {
            self.state.set_lifecycle(Lifecycle::Closed);
        }

        if let Some(app) = self.app {
            let executable = app.executable().to_string();
            match app.close().await {
                Ok(()) => tracing::info!("STK application '{}' closed", executable),
                Err(e) => tracing::warn!("Error closing STK application '{}': {}", executable, e),
            }
        }

        tracing::info!("STK cleanup complete");
    }
}

async fn connect(
    mode: StkMode,
    config: &StkConfig,
    app: &mut Option<LaunchedApplication>,
) -> Result<ConnectRoot> {
    let address = config.connect_address();
    let timeout = Duration::from_secs(config.startup_timeout_secs);

    match mode {
        StkMode::Desktop => {
            tracing::info!("Attempting to attach to existing STK instance at {}...", address);
            match launcher::attach(&address).await {
                Ok(root) => {
                    tracing::info!("Successfully attached to existing STK instance");
                    Ok(root)
                }
                Err(e) => {
                    tracing::info!("Could not attach ({}). Launching new STK instance...", e);
                    *app = Some(LaunchedApplication::spawn(&config.desktop_executable, &[])?);
                    launcher::wait_for_connect(&address, timeout).await
                }
            }
        }
        StkMode::Engine => {
            tracing::info!("Starting new STK Engine instance...");
            *app = Some(LaunchedApplication::spawn(
                &config.engine_executable,
                &config.engine_args,
            )?);
            launcher::wait_for_connect(&address, timeout).await
        }
    }
}
