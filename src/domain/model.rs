use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// STK 執行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StkMode {
    Desktop,
    Engine,
}

impl StkMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Engine => "engine",
        }
    }

    /// Windows 預設接上桌面版，其他平台只能用 Engine
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::Desktop
        } else {
            Self::Engine
        }
    }

    pub fn is_supported_on_this_platform(&self) -> bool {
        match self {
            Self::Desktop => cfg!(windows),
            Self::Engine => true,
        }
    }
}

impl fmt::Display for StkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StkMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "engine" => Ok(Self::Engine),
            other => Err(format!(
                "unknown STK mode '{}'; expected 'desktop' or 'engine'",
                other
            )),
        }
    }
}

/// STK 物件類別（Connect 路徑中的類別名稱）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectClass {
    Satellite,
    Facility,
    Place,
    Aircraft,
    Ship,
    GroundVehicle,
    Missile,
    LaunchVehicle,
    Submarine,
    AreaTarget,
    LineTarget,
    Sensor,
}

impl ObjectClass {
    pub const TOP_LEVEL: [ObjectClass; 11] = [
        ObjectClass::Satellite,
        ObjectClass::Facility,
        ObjectClass::Place,
        ObjectClass::Aircraft,
        ObjectClass::Ship,
        ObjectClass::GroundVehicle,
        ObjectClass::Missile,
        ObjectClass::LaunchVehicle,
        ObjectClass::Submarine,
        ObjectClass::AreaTarget,
        ObjectClass::LineTarget,
    ];

    pub const SENSOR_HOSTS: [ObjectClass; 8] = [
        ObjectClass::Satellite,
        ObjectClass::Facility,
        ObjectClass::Aircraft,
        ObjectClass::Ship,
        ObjectClass::GroundVehicle,
        ObjectClass::Missile,
        ObjectClass::LaunchVehicle,
        ObjectClass::Submarine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Satellite => "Satellite",
            Self::Facility => "Facility",
            Self::Place => "Place",
            Self::Aircraft => "Aircraft",
            Self::Ship => "Ship",
            Self::GroundVehicle => "GroundVehicle",
            Self::Missile => "Missile",
            Self::LaunchVehicle => "LaunchVehicle",
            Self::Submarine => "Submarine",
            Self::AreaTarget => "AreaTarget",
            Self::LineTarget => "LineTarget",
            Self::Sensor => "Sensor",
        }
    }

    pub fn from_class_name(name: &str) -> Option<Self> {
        Self::TOP_LEVEL
            .iter()
            .chain(std::iter::once(&Self::Sensor))
            .find(|class| class.as_str().eq_ignore_ascii_case(name))
            .copied()
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 地面位置種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationKind {
    Facility,
    Place,
}

impl LocationKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "facility" => Some(Self::Facility),
            "place" => Some(Self::Place),
            _ => None,
        }
    }

    pub fn class(&self) -> ObjectClass {
        match self {
            Self::Facility => ObjectClass::Facility,
            Self::Place => ObjectClass::Place,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facility => "facility",
            Self::Place => "place",
        }
    }
}

/// STK 場景內物件的參照，只保存路徑
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkObject {
    pub path: String,
    pub class: Option<ObjectClass>,
    pub name: String,
}

impl StkObject {
    pub fn new(class: ObjectClass, name: &str) -> Self {
        Self {
            path: format!("*/{}/{}", class, name),
            class: Some(class),
            name: name.to_string(),
        }
    }

    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty() && *s != "*").collect();
        let name = segments.last().copied().unwrap_or_default().to_string();
        let class = segments
            .len()
            .checked_sub(2)
            .and_then(|i| ObjectClass::from_class_name(segments[i]));
        Self {
            path: path.to_string(),
            class,
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagatorType {
    TwoBody,
}

impl PropagatorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoBody => "TwoBody",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateFrame {
    J2000,
}

impl CoordinateFrame {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::J2000 => "J2000",
        }
    }
}

/// 六個經典軌道根數（距離 km，角度 deg）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassicalElements {
    pub frame: CoordinateFrame,
    pub semi_major_axis_km: f64,
    pub eccentricity: f64,
    pub inclination_deg: f64,
    pub arg_of_perigee_deg: f64,
    pub raan_deg: f64,
    pub true_anomaly_deg: f64,
}

/// 引擎回報的可用能力，啟動時探測一次
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub two_body_propagator: bool,
    pub classical_state: bool,
}

impl Capabilities {
    pub fn full() -> Self {
        Self {
            two_body_propagator: true,
            classical_state: true,
        }
    }
}

/// 成功旗標、訊息與可選的結果
#[derive(Debug, Clone)]
pub struct OperationResult<T> {
    pub success: bool,
    pub message: String,
    pub result: Option<T>,
}

impl<T> OperationResult<T> {
    pub fn ok(message: impl Into<String>, result: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            result: Some(result),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            result: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub object_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessInterval {
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessReport {
    pub from: String,
    pub to: String,
    pub intervals: Vec<AccessInterval>,
}

/// Data provider 回傳的四組平行陣列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LlaDataSets {
    pub time: Vec<String>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub alt: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlaRecord {
    pub time: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_km: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlaReport {
    pub satellite: String,
    pub step_sec: f64,
    pub records: Vec<LlaRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub mode: Option<String>,
    pub scenario: Option<String>,
    pub counts: BTreeMap<String, usize>,
}
