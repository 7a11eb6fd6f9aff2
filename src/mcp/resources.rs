//! MCP resources：物件列表、access、LLA 星曆與健康狀態。
//! 回傳 JSON；失敗時回傳 resource 錯誤（health 除外）。

use crate::config::StkConfig;
use crate::core::analysis::{compute_access_intervals, lla_ephemeris};
use crate::core::objects::{list_objects, ObjectFilter};
use crate::core::session::ConnectionState;
use crate::domain::model::HealthReport;
use crate::mcp::protocol::JsonRpcError;
use crate::utils::retry::RetryPolicy;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use url::Url;

pub const OBJECTS_URI: &str = "resource://stk/objects";
pub const HEALTH_URI: &str = "resource://stk/health";
pub const JSON_MIME: &str = "application/json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDefinition {
    pub uri: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    pub uri_template: &'static str,
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub mime_type: &'static str,
}

pub fn resource_definitions() -> Vec<ResourceDefinition> {
    vec![
        ResourceDefinition {
            uri: OBJECTS_URI,
            name: "STK Scenario Objects",
            title: "List STK Objects",
            description: "List all objects in the active STK scenario with their name and type. Returns JSON: [{name, type}, ...].",
            mime_type: JSON_MIME,
        },
        ResourceDefinition {
            uri: HEALTH_URI,
            name: "STK Health",
            title: "STK Server Health",
            description: "Report basic STK state: mode, current scenario, and object counts.",
            mime_type: JSON_MIME,
        },
    ]
}

pub fn resource_templates() -> Vec<ResourceTemplate> {
    vec![
        ResourceTemplate {
            uri_template: "resource://stk/objects/{object_type}",
            name: "STK Scenario Objects (Filtered)",
            title: "List STK Objects by Type",
            description: "List scenario objects filtered by type (e.g., satellite, facility, place, sensor). Returns JSON: [{name, type}, ...].",
            mime_type: JSON_MIME,
        },
        ResourceTemplate {
            uri_template: "resource://stk/analysis/access/{object1}/{object2}",
            name: "STK Access",
            title: "Compute Access Intervals",
            description: "Compute access intervals between two objects. Provide paths like 'Satellite/SatA' and 'Facility/FacB' (with or without leading '*/').",
            mime_type: JSON_MIME,
        },
        ResourceTemplate {
            uri_template: "resource://stk/reports/lla/{satellite}",
            name: "STK LLA Ephemeris",
            title: "Satellite LLA Ephemeris",
            description: "Return satellite LLA ephemeris over the scenario interval. Provide path like 'Satellite/SatA' (with or without leading '*/'). Optional query: ?step_sec=60.",
            mime_type: JSON_MIME,
        },
    ]
}

/// 解析後的 resource 位址
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceRoute {
    Objects(Option<String>),
    Access { from: String, to: String },
    Lla { satellite: String, step_sec: Option<f64> },
    Health,
}

impl ResourceRoute {
    pub fn parse(uri: &str) -> Result<Self, JsonRpcError> {
        let url = Url::parse(uri)
            .map_err(|e| JsonRpcError::invalid_params(format!("Invalid resource URI '{}': {}", uri, e)))?;
        if url.scheme() != "resource" || url.host_str() != Some("stk") {
            return Err(unknown(uri));
        }

        let segments = url
            .path()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|d| d.into_owned())
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid encoding in '{}': {}", uri, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        match segments.as_slice() {
            ["objects"] => Ok(Self::Objects(None)),
            ["objects", object_type] => Ok(Self::Objects(Some(object_type.to_string()))),
            ["health"] => Ok(Self::Health),
            ["analysis", "access", rest @ ..] => {
                let (from, to) = split_access_paths(rest).ok_or_else(|| {
                    JsonRpcError::invalid_params(format!(
                        "Access resource needs two object paths: {}",
                        uri
                    ))
                })?;
                Ok(Self::Access { from, to })
            }
            ["reports", "lla", rest @ ..] if !rest.is_empty() => {
                let step_sec = url
                    .query_pairs()
                    .find(|(key, _)| key == "step_sec")
                    .map(|(_, value)| {
                        value
                            .parse::<f64>()
                            .ok()
                            .filter(|v| *v > 0.0)
                            .ok_or_else(|| {
                                JsonRpcError::invalid_params(format!(
                                    "step_sec must be a positive number, got '{}'",
                                    value
                                ))
                            })
                    })
                    .transpose()?;
                Ok(Self::Lla {
                    satellite: rest.join("/"),
                    step_sec,
                })
            }
            _ => Err(unknown(uri)),
        }
    }
}

fn unknown(uri: &str) -> JsonRpcError {
    JsonRpcError::resource(format!("Unknown resource: {}", uri))
}

/// 兩段（可含編碼後的 '/'）直接配對；更多段時對半切
fn split_access_paths(segments: &[&str]) -> Option<(String, String)> {
    if segments.len() < 2 || segments.len() % 2 != 0 {
        return None;
    }
    let (from, to) = segments.split_at(segments.len() / 2);
    Some((from.join("/"), to.join("/")))
}

/// 讀取 resource，回傳 MCP `resources/read` 的結果
pub async fn read_resource(
    state: &ConnectionState,
    config: &StkConfig,
    uri: &str,
) -> Result<Value, JsonRpcError> {
    let route = ResourceRoute::parse(uri)?;
    tracing::debug!("Reading resource {:?}", route);

    let body = match route {
        ResourceRoute::Health => to_json(&health(state).await)?,
        ResourceRoute::Objects(object_type) => {
            let filter = ObjectFilter::parse(object_type.as_deref());
            let mut root = state.lock().await.map_err(resource_error)?;
            let objects = list_objects(&mut **root, &filter, &retry_policy(config))
                .await
                .map_err(resource_error)?;
            to_json(&objects)?
        }
        ResourceRoute::Access { from, to } => {
            let mut root = state.lock().await.map_err(resource_error)?;
            let report = compute_access_intervals(&mut **root, &from, &to)
                .await
                .map_err(resource_error)?;
            to_json(&report)?
        }
        ResourceRoute::Lla {
            satellite,
            step_sec,
        } => {
            let step_sec = step_sec.unwrap_or(config.lla_step_sec);
            let mut root = state.lock().await.map_err(resource_error)?;
            let report = lla_ephemeris(&mut **root, &satellite, step_sec)
                .await
                .map_err(resource_error)?;
            to_json(&report)?
        }
    };

    let text = serde_json::to_string(&body)
        .map_err(|e| JsonRpcError::new(crate::mcp::protocol::INTERNAL_ERROR, e.to_string()))?;
    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": JSON_MIME,
            "text": text,
        }]
    }))
}

/// 不會失敗：STK 不可用或沒有場景時回傳空的統計
pub async fn health(state: &ConnectionState) -> HealthReport {
    let mut report = HealthReport {
        mode: Some(state.mode().as_str().to_string()),
        scenario: None,
        counts: BTreeMap::new(),
    };

    let Ok(mut root) = state.lock().await else {
        return report;
    };

    report.scenario = match root.current_scenario().await {
        Ok(scenario) => scenario.map(|s| s.name),
        Err(_) => None,
    };
    if report.scenario.is_none() {
        return report;
    }

    // 健康檢查持有全域鎖，列舉指令失敗時不重試
    if let Ok(objects) = list_objects(&mut **root, &ObjectFilter::All, &RetryPolicy::immediate(1)).await {
        for object in objects.into_iter().filter(|o| !o.object_type.is_empty()) {
            *report.counts.entry(object.object_type).or_insert(0) += 1;
        }
    }
    report
}

fn retry_policy(config: &StkConfig) -> RetryPolicy {
    RetryPolicy::with_attempts(config.command_retry_attempts)
}

fn resource_error(error: crate::utils::error::StkError) -> JsonRpcError {
    JsonRpcError::resource(error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(crate::mcp::protocol::INTERNAL_ERROR, e.to_string()))
}
