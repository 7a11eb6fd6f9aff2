use crate::domain::model::{LocationKind, OperationResult, ScenarioInfo, StkObject};
use crate::domain::ports::StkRoot;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct LocationRequest {
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub kind: String,
}

/// 建立或更新地面位置（facility / place）。經緯度範圍由協定層檢查。
pub async fn create_location(
    root: Option<&mut dyn StkRoot>,
    scenario: Option<&ScenarioInfo>,
    request: &LocationRequest,
) -> OperationResult<StkObject> {
    let (Some(root), Some(_)) = (root, scenario) else {
        return OperationResult::failed("STK Root/Scenario is not available.");
    };

    let Some(kind) = LocationKind::parse(&request.kind) else {
        return OperationResult::failed("Invalid kind. Use 'facility' or 'place'.");
    };

    match upsert(root, kind, request).await {
        Ok((object, created)) => {
            let action = if created { "created" } else { "updated" };
            OperationResult::ok(
                format!("Successfully {} {}: '{}'", action, kind.as_str(), request.name),
                object,
            )
        }
        Err(e) => {
            tracing::error!("Error creating {} '{}': {}", kind.as_str(), request.name, e);
            OperationResult::failed(format!(
                "Error creating {} '{}': {}",
                kind.as_str(),
                request.name,
                e
            ))
        }
    }
}

async fn upsert(
    root: &mut dyn StkRoot,
    kind: LocationKind,
    request: &LocationRequest,
) -> Result<(StkObject, bool)> {
    let class = kind.class();
    let (object, created) = if root.contains(class, &request.name).await? {
        let path = format!("*/{}/{}", class, request.name);
        (root.object_from_path(&path).await?, false)
    } else {
        (root.new_object(class, &request.name).await?, true)
    };

    if let Err(e) = root
        .assign_geodetic(
            &object,
            request.latitude_deg,
            request.longitude_deg,
            request.altitude_km,
        )
        .await
    {
        // 舊版介面不支援時改用文字指令
        tracing::debug!("Geodetic assignment failed ({}); falling back to SetPosition", e);
        let command = format!(
            "SetPosition */{}/{} Geodetic {} {} {} km",
            class, request.name, request.latitude_deg, request.longitude_deg, request.altitude_km
        );
        root.execute_command(&command).await?;
    }

    Ok((object, created))
}
