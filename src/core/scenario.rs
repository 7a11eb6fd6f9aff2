use crate::domain::model::{OperationResult, ScenarioInfo};
use crate::domain::ports::StkRoot;
use crate::utils::error::{Result, StkError};
use crate::utils::time::utcg_after_hours;
use crate::utils::validation::validate_utcg;

#[derive(Debug, Clone)]
pub struct ScenarioRequest {
    pub name: String,
    pub start_time: String,
    pub duration_hours: f64,
}

/// 關閉目前場景並建立新場景，時間區間為 [start, start + duration]。
/// 任何步驟失敗都回傳失敗結果而不是錯誤。
pub async fn setup_scenario(
    root: &mut dyn StkRoot,
    request: &ScenarioRequest,
) -> OperationResult<ScenarioInfo> {
    match configure(root, request).await {
        Ok(scenario) => OperationResult::ok(
            format!(
                "Successfully created and configured scenario: '{}'",
                request.name
            ),
            scenario,
        ),
        Err(e) => {
            let message = format!("Error setting up scenario '{}': {}", request.name, e);
            tracing::error!("{}", message);
            OperationResult::failed(message)
        }
    }
}

/// 計算場景結束時間；起始時間無法解析或時長超出日期範圍時回傳驗證錯誤
pub fn scenario_stop_time(request: &ScenarioRequest) -> Result<String> {
    validate_utcg("start_time", &request.start_time)?;
    utcg_after_hours(&request.start_time, request.duration_hours).ok_or_else(|| {
        StkError::validation(
            "duration_hours",
            request.duration_hours,
            "puts the scenario stop time out of range",
        )
    })
}

async fn configure(root: &mut dyn StkRoot, request: &ScenarioRequest) -> Result<ScenarioInfo> {
    // 先算好結束時間，失敗時不動到目前的場景
    let stop = scenario_stop_time(request)?;

    if let Some(current) = root.current_scenario().await? {
        tracing::info!("Closing existing scenario: {}", current.name);
        root.close_scenario().await?;
    }

    tracing::info!("Creating new scenario: {}", request.name);
    root.new_scenario(&request.name).await?;
    let scenario = root
        .current_scenario()
        .await?
        .ok_or_else(|| StkError::engine("Failed to create or get the new scenario object."))?;

    tracing::info!(
        "Setting scenario time: Start='{}', Duration='+{} hours'",
        request.start_time,
        request.duration_hours
    );
    root.set_time_period(&request.start_time, &stop).await?;
    root.rewind().await?;

    raise_windows(root).await;

    Ok(ScenarioInfo {
        name: scenario.name,
        start: request.start_time.clone(),
        stop,
    })
}

// 桌面版才有視窗，Engine 模式下失敗屬正常
async fn raise_windows(root: &mut dyn StkRoot) {
    for command in ["Application / Raise", "Application / Maximize"] {
        if let Err(e) = root.execute_command(command).await {
            tracing::warn!("Could not execute maximize commands: {}", e);
            return;
        }
    }
}
