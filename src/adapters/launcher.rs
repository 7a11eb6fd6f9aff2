use crate::adapters::connect::ConnectRoot;
use crate::utils::error::{Result, StkError};
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// 由本程序啟動的 STK 應用程式，關閉時一併結束
pub struct LaunchedApplication {
    executable: String,
    child: Child,
}

impl LaunchedApplication {
    pub fn spawn(executable: &str, args: &[String]) -> Result<Self> {
        tracing::info!("🚀 Launching {} {}", executable, args.join(" "));
        let child = Command::new(executable)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => StkError::unavailable(format!(
                    "STK is not available on this system ({}: {})",
                    executable, e
                )),
                _ => StkError::Startup {
                    message: format!("failed to launch {}: {}", executable, e),
                },
            })?;

        Ok(Self {
            executable: executable.to_string(),
            child,
        })
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub async fn close(mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.start_kill()?;
            self.child.wait().await?;
        }
        Ok(())
    }
}

/// 嘗試連上已在執行中的 STK
pub async fn attach(address: &str) -> Result<ConnectRoot> {
    ConnectRoot::connect(address).await
}

/// 反覆嘗試連線直到成功或逾時（等待剛啟動的應用程式開放 Connect 埠）
pub async fn wait_for_connect(address: &str, timeout: Duration) -> Result<ConnectRoot> {
    let deadline = Instant::now() + timeout;
    loop {
        match ConnectRoot::connect(address).await {
            Ok(root) => return Ok(root),
            Err(e) if Instant::now() < deadline => {
                tracing::debug!("Connect port {} not ready yet: {}", address, e);
                tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
            }
            Err(e) => {
                return Err(StkError::Startup {
                    message: format!(
                        "STK Connect port {} did not become ready within {:?}: {}",
                        address, timeout, e
                    ),
                })
            }
        }
    }
}
