#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{Result, StkError};
use crate::utils::validation::{
    validate_non_empty_string, validate_port, validate_positive, validate_utcg, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

pub const ENV_PREFIX: &str = "STK_MCP_";

/// 伺服器與 STK 連線設定。優先順序：預設值 < TOML 檔 < STK_MCP_* 環境變數 < CLI 參數
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StkConfig {
    pub earth_radius_km: f64,

    pub default_scenario_name: String,
    pub default_start_time: String,
    pub default_duration_hours: f64,

    pub default_host: String,
    pub default_port: u16,

    pub log_level: String,
    pub log_format: String,

    pub connect_host: String,
    pub connect_port: u16,
    pub desktop_executable: String,
    pub engine_executable: String,
    pub engine_args: Vec<String>,
    pub startup_timeout_secs: u64,

    pub lla_step_sec: f64,
    pub command_retry_attempts: u32,
}

impl Default for StkConfig {
    fn default() -> Self {
        Self {
            earth_radius_km: 6378.137,
            default_scenario_name: "MCP_STK_Scenario".to_string(),
            default_start_time: "20 Jan 2020 17:00:00.000".to_string(),
            default_duration_hours: 48.0,
            default_host: "127.0.0.1".to_string(),
            default_port: 8765,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            connect_host: "127.0.0.1".to_string(),
            connect_port: 5001,
            desktop_executable: "AgUiApplication".to_string(),
            engine_executable: "stkruntime".to_string(),
            engine_args: vec!["--noGraphics".to_string()],
            startup_timeout_secs: 60,
            lla_step_sec: 60.0,
            command_retry_attempts: 3,
        }
    }
}

impl StkConfig {
    /// 預設值加上目前程序的環境變數
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        let mut config = Self::default();
        config.apply_env(&vars)?;
        Ok(config)
    }

    /// 以 STK_MCP_* 變數覆蓋目前的設定值
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        let get = |key: &str| -> Option<String> {
            vars.get(&format!("{}{}", ENV_PREFIX, key))
                .map(|v| v.trim().to_string())
        };

        if let Some(v) = get("EARTH_RADIUS_KM") {
            self.earth_radius_km = parse_env("EARTH_RADIUS_KM", &v)?;
        }
        if let Some(v) = get("DEFAULT_SCENARIO_NAME") {
            self.default_scenario_name = v;
        }
        if let Some(v) = get("DEFAULT_START_TIME") {
            self.default_start_time = v;
        }
        if let Some(v) = get("DEFAULT_DURATION_HOURS") {
            self.default_duration_hours = parse_env("DEFAULT_DURATION_HOURS", &v)?;
        }
        if let Some(v) = get("DEFAULT_HOST") {
            self.default_host = v;
        }
        if let Some(v) = get("DEFAULT_PORT") {
            self.default_port = parse_env("DEFAULT_PORT", &v)?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("LOG_FORMAT") {
            self.log_format = v;
        }
        if let Some(v) = get("CONNECT_HOST") {
            self.connect_host = v;
        }
        if let Some(v) = get("CONNECT_PORT") {
            self.connect_port = parse_env("CONNECT_PORT", &v)?;
        }
        if let Some(v) = get("DESKTOP_EXECUTABLE") {
            self.desktop_executable = v;
        }
        if let Some(v) = get("ENGINE_EXECUTABLE") {
            self.engine_executable = v;
        }
        if let Some(v) = get("ENGINE_ARGS") {
            self.engine_args = v.split_whitespace().map(str::to_string).collect();
        }
        if let Some(v) = get("STARTUP_TIMEOUT_SECS") {
            self.startup_timeout_secs = parse_env("STARTUP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("LLA_STEP_SEC") {
            self.lla_step_sec = parse_env("LLA_STEP_SEC", &v)?;
        }
        if let Some(v) = get("COMMAND_RETRY_ATTEMPTS") {
            self.command_retry_attempts = parse_env("COMMAND_RETRY_ATTEMPTS", &v)?;
        }

        Ok(())
    }

    pub fn connect_address(&self) -> String {
        format!("{}:{}", self.connect_host, self.connect_port)
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| {
        StkError::config(format!("{}{}='{}' is invalid: {}", ENV_PREFIX, key, value, e))
    })
}

impl Validate for StkConfig {
    fn validate(&self) -> Result<()> {
        validate_positive("earth_radius_km", self.earth_radius_km)?;
        validate_non_empty_string("default_scenario_name", &self.default_scenario_name)?;
        validate_utcg("default_start_time", &self.default_start_time)?;
        validate_positive("default_duration_hours", self.default_duration_hours)?;
        validate_non_empty_string("default_host", &self.default_host)?;
        validate_port("default_port", self.default_port)?;
        validate_non_empty_string("connect_host", &self.connect_host)?;
        validate_port("connect_port", self.connect_port)?;
        validate_positive("lla_step_sec", self.lla_step_sec)?;

        if self.command_retry_attempts == 0 {
            return Err(StkError::validation(
                "command_retry_attempts",
                0,
                "must be at least 1",
            ));
        }

        Ok(())
    }
}
