//! MCP tools：場景、衛星與地面位置的建立。
//! 工具一律回傳文字；參數錯誤在取得 STK 鎖之前就回報。

use crate::config::StkConfig;
use crate::core::location::{create_location, LocationRequest};
use crate::core::satellite::{create_satellite, SatelliteRequest};
use crate::core::scenario::{scenario_stop_time, setup_scenario, ScenarioRequest};
use crate::core::session::ConnectionState;
use crate::mcp::protocol::JsonRpcError;
use crate::utils::error::{Result as StkResult, StkError};
use crate::utils::validation::{
    validate_at_least, validate_object_name, validate_positive, validate_range,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// 工具執行結果：Ok 為成功訊息，Err 為回報給呼叫端的錯誤文字
pub type ToolOutput = std::result::Result<String, String>;

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "setup_scenario",
            description: "Creates/Configures an STK Scenario. Closes any existing scenario first.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "scenario_name": {
                        "type": "string",
                        "description": "Name for the new scenario."
                    },
                    "start_time": {
                        "type": "string",
                        "description": "Scenario start time in STK UTCG format, e.g. '20 Jan 2020 17:00:00.000'."
                    },
                    "duration_hours": {
                        "type": "number",
                        "description": "Scenario duration in hours (> 0)."
                    }
                }
            }),
        },
        ToolDefinition {
            name: "create_satellite",
            description: "Creates/modifies an STK satellite using Apogee/Perigee altitudes, RAAN, and Inclination. Assumes a scenario is already open.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Desired name for the satellite." },
                    "apogee_alt_km": { "type": "number", "description": "Apogee altitude (km)." },
                    "perigee_alt_km": { "type": "number", "description": "Perigee altitude (km)." },
                    "raan_deg": { "type": "number", "description": "RAAN (degrees, 0-360)." },
                    "inclination_deg": { "type": "number", "description": "Inclination (degrees, 0-180)." }
                },
                "required": ["name", "apogee_alt_km", "perigee_alt_km", "raan_deg", "inclination_deg"]
            }),
        },
        ToolDefinition {
            name: "create_location",
            description: "Create or update a ground location (facility or place) in the active scenario.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Object name (e.g., \"Boulder\")." },
                    "latitude_deg": { "type": "number", "description": "Geodetic latitude in degrees [-90, 90]." },
                    "longitude_deg": { "type": "number", "description": "Geodetic longitude in degrees [-180, 180]." },
                    "altitude_km": { "type": "number", "description": "Altitude above mean sea level in kilometers.", "default": 0.0 },
                    "kind": { "type": "string", "enum": ["facility", "place"], "default": "facility" }
                },
                "required": ["name", "latitude_deg", "longitude_deg"]
            }),
        },
    ]
}

#[derive(Debug, Default, Deserialize)]
struct SetupScenarioArgs {
    scenario_name: Option<String>,
    start_time: Option<String>,
    duration_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CreateSatelliteArgs {
    name: String,
    apogee_alt_km: f64,
    perigee_alt_km: f64,
    raan_deg: f64,
    inclination_deg: f64,
}

#[derive(Debug, Deserialize)]
struct CreateLocationArgs {
    name: String,
    latitude_deg: f64,
    longitude_deg: f64,
    #[serde(default)]
    altitude_km: f64,
    #[serde(default = "default_kind")]
    kind: String,
}

fn default_kind() -> String {
    "facility".to_string()
}

fn parse_args<T: for<'de> Deserialize<'de>>(name: &str, args: Value) -> Result<T, JsonRpcError> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args)
        .map_err(|e| JsonRpcError::invalid_params(format!("Invalid arguments for '{}': {}", name, e)))
}

/// 依名稱分派工具；未知工具或參數格式錯誤時回傳 JSON-RPC 錯誤
pub async fn call_tool(
    state: &ConnectionState,
    config: &StkConfig,
    name: &str,
    args: Value,
) -> Result<ToolOutput, JsonRpcError> {
    tracing::info!("MCP Tool: {}", name);
    let output = match name {
        "setup_scenario" => setup_scenario_tool(state, config, parse_args(name, args)?).await,
        "create_satellite" => create_satellite_tool(state, config, parse_args(name, args)?).await,
        "create_location" => create_location_tool(state, parse_args(name, args)?).await,
        other => {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown tool: {}",
                other
            )))
        }
    };
    if let Err(message) = &output {
        tracing::warn!("Tool '{}' returned an error: {}", name, message);
    }
    Ok(output)
}

fn error_text(error: StkError) -> String {
    format!("Error: {}", error)
}

// 驗證失敗時改用工具固定的錯誤文字
fn or_message(check: StkResult<()>, message: &str) -> Result<(), String> {
    check.map_err(|e| {
        tracing::debug!("{}", e);
        message.to_string()
    })
}

async fn setup_scenario_tool(
    state: &ConnectionState,
    config: &StkConfig,
    args: SetupScenarioArgs,
) -> ToolOutput {
    let request = ScenarioRequest {
        name: args
            .scenario_name
            .unwrap_or_else(|| config.default_scenario_name.clone()),
        start_time: args
            .start_time
            .unwrap_or_else(|| config.default_start_time.clone()),
        duration_hours: args.duration_hours.unwrap_or(config.default_duration_hours),
    };

    if request.name.trim().is_empty() {
        return Err("Error: scenario_name must be a non-empty string.".to_string());
    }
    validate_object_name("scenario_name", &request.name).map_err(error_text)?;
    or_message(
        validate_positive("duration_hours", request.duration_hours),
        "Error: duration_hours must be positive.",
    )?;
    scenario_stop_time(&request).map_err(error_text)?;

    let mut root = state.lock().await.map_err(error_text)?;
    let result = setup_scenario(&mut **root, &request).await;
    if result.success {
        Ok(result.message)
    } else {
        Err(result.message)
    }
}

async fn create_satellite_tool(
    state: &ConnectionState,
    config: &StkConfig,
    args: CreateSatelliteArgs,
) -> ToolOutput {
    validate_object_name("name", &args.name).map_err(error_text)?;
    if args.apogee_alt_km < args.perigee_alt_km {
        return Err("Error: apogee_alt_km cannot be less than perigee_alt_km.".to_string());
    }
    or_message(
        validate_range("inclination_deg", args.inclination_deg, 0.0, 180.0),
        "Error: inclination_deg must be within [0, 180] degrees.",
    )?;
    // RAAN 兩端都接受
    or_message(
        validate_range("raan_deg", args.raan_deg, 0.0, 360.0),
        "Error: raan_deg must be within [0, 360] degrees.",
    )?;
    or_message(
        validate_at_least("perigee_alt_km", args.perigee_alt_km, -0.5)
            .and(validate_at_least("apogee_alt_km", args.apogee_alt_km, -0.5)),
        "Error: perigee/apogee altitudes must be >= -0.5 km.",
    )?;

    let mut root = state.lock().await.map_err(error_text)?;

    let scenario = match root.current_scenario().await {
        Ok(Some(scenario)) => scenario,
        Ok(None) => {
            return Err(
                "Error: No active scenario found in STK. Use 'setup_scenario' tool first."
                    .to_string(),
            )
        }
        Err(e) => {
            return Err(format!(
                "Error accessing current scenario: {}. Use 'setup_scenario' tool first.",
                e
            ))
        }
    };
    tracing::info!("Operating within scenario: {}", scenario.name);

    let request = SatelliteRequest {
        name: args.name,
        apogee_alt_km: args.apogee_alt_km,
        perigee_alt_km: args.perigee_alt_km,
        raan_deg: args.raan_deg,
        inclination_deg: args.inclination_deg,
    };

    match create_satellite(
        &mut **root,
        state.capabilities(),
        &scenario,
        &request,
        config.earth_radius_km,
    )
    .await
    {
        Ok(result) if result.success => Ok(result.message),
        Ok(result) => Err(result.message),
        Err(e @ StkError::Validation { .. }) => Err(format!(
            "Configuration Error for satellite '{}': {}",
            request.name, e
        )),
        Err(e) => Err(format!("Error creating satellite '{}': {}", request.name, e)),
    }
}

async fn create_location_tool(state: &ConnectionState, args: CreateLocationArgs) -> ToolOutput {
    validate_object_name("name", &args.name).map_err(error_text)?;
    or_message(
        validate_range("latitude_deg", args.latitude_deg, -90.0, 90.0),
        "Error: latitude_deg must be within [-90, 90] degrees.",
    )?;
    or_message(
        validate_range("longitude_deg", args.longitude_deg, -180.0, 180.0),
        "Error: longitude_deg must be within [-180, 180] degrees.",
    )?;
    or_message(
        validate_at_least("altitude_km", args.altitude_km, -0.5),
        "Error: altitude_km must be >= -0.5 km.",
    )?;

    let mut root = state.lock().await.map_err(error_text)?;

    let scenario = match root.current_scenario().await {
        Ok(Some(scenario)) => scenario,
        Ok(None) => return Err("Error: No active scenario found. Use 'setup_scenario' first.".to_string()),
        Err(e) => return Err(format!("Error: Could not access current scenario: {}", e)),
    };

    let request = LocationRequest {
        name: args.name,
        latitude_deg: args.latitude_deg,
        longitude_deg: args.longitude_deg,
        altitude_km: args.altitude_km,
        kind: args.kind,
    };
    let result = create_location(Some(&mut **root), Some(&scenario), &request).await;
    if result.success {
        Ok(result.message)
    } else {
        Err(result.message)
    }
}
