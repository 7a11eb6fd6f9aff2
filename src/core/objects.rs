use crate::domain::model::{ObjectClass, ObjectRecord};
use crate::domain::ports::StkRoot;
use crate::utils::error::{Result, StkError};
use crate::utils::retry::RetryPolicy;
use std::collections::BTreeSet;

/// 物件列舉的類別篩選
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectFilter {
    All,
    Classes(BTreeSet<ObjectClass>),
    /// 無法辨識的篩選字串，列舉結果為空
    Unrecognized(String),
}

impl ObjectFilter {
    /// 不分大小寫，接受單複數與別名；空字串視為不篩選
    pub fn parse(filter: Option<&str>) -> Self {
        let normalized = filter.unwrap_or_default().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Self::All;
        }

        use ObjectClass::*;
        let classes: &[ObjectClass] = match normalized.as_str() {
            "sat" | "satellite" | "satellites" => &[Satellite],
            "facility" | "facilities" => &[Facility],
            "place" | "places" => &[Place],
            "location" | "locations" => &[Facility, Place],
            "sensor" | "sensors" => &[Sensor],
            "aircraft" => &[Aircraft],
            "ship" | "ships" => &[Ship],
            "groundvehicle" | "groundvehicles" => &[GroundVehicle],
            "missile" | "missiles" => &[Missile],
            "launchvehicle" | "launchvehicles" => &[LaunchVehicle],
            "submarine" | "submarines" => &[Submarine],
            "areatarget" | "areatargets" => &[AreaTarget],
            "linetarget" | "linetargets" => &[LineTarget],
            _ => return Self::Unrecognized(normalized),
        };
        Self::Classes(classes.iter().copied().collect())
    }

    pub fn includes(&self, class: ObjectClass) -> bool {
        match self {
            Self::All => true,
            Self::Classes(classes) => classes.contains(&class),
            Self::Unrecognized(_) => false,
        }
    }
}

/// 解析 AllInstanceNames 的輸出，回傳 (類別, 名稱)。
/// 路徑取最後兩個非空的 '/' 片段；看起來像表頭的行會略過。
/// 路徑以空白切分，直接在 STK 內建立、名稱含空白的物件會被拆成多筆。
pub fn parse_instance_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_ascii_lowercase();
        if lower.contains("number") && (lower.contains("object") || lower.contains("instance")) {
            continue;
        }

        // 名稱不含空白，一行可以有多個路徑
        for token in line.split_whitespace() {
            let parts: Vec<&str> = token.split('/').filter(|p| !p.is_empty()).collect();
            match parts.as_slice() {
                [.., class, name] => out.push((class.to_string(), name.to_string())),
                _ => out.push((String::new(), token.to_string())),
            }
        }
    }
    out
}

/// 列出目前場景中的物件。需要有效場景；個別指令失敗時略過該類別。
pub async fn list_objects(
    root: &mut dyn StkRoot,
    filter: &ObjectFilter,
    policy: &RetryPolicy,
) -> Result<Vec<ObjectRecord>> {
    match root.current_scenario().await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Err(StkError::engine(
                "Could not access current scenario: No active scenario found.",
            ))
        }
        Err(e) => {
            return Err(StkError::engine(format!(
                "Could not access current scenario: {}",
                e
            )))
        }
    }

    let mut records = Vec::new();

    for class in ObjectClass::TOP_LEVEL {
        if !filter.includes(class) {
            continue;
        }
        let command = format!("AllInstanceNames */{}", class);
        collect(root, &command, class, policy, &mut records).await;
    }

    if filter.includes(ObjectClass::Sensor) {
        for parent in ObjectClass::SENSOR_HOSTS {
            let command = format!("AllInstanceNames */{}/*/Sensor", parent);
            collect(root, &command, ObjectClass::Sensor, policy, &mut records).await;
        }
    }

    Ok(records)
}

async fn collect(
    root: &mut dyn StkRoot,
    command: &str,
    class: ObjectClass,
    policy: &RetryPolicy,
    records: &mut Vec<ObjectRecord>,
) {
    let lines = exec_lines(root, command, policy).await;
    records.extend(
        parse_instance_lines(&lines)
            .into_iter()
            .map(|(_, name)| ObjectRecord {
                name,
                object_type: class.as_str().to_string(),
            }),
    );
}

/// 執行文字指令並重試；全部失敗時回傳空結果
async fn exec_lines(root: &mut dyn StkRoot, command: &str, policy: &RetryPolicy) -> Vec<String> {
    let mut backoff = policy.backoff();
    loop {
        match root.execute_command(command).await {
            Ok(lines) => return lines,
            Err(e) => {
                if !backoff.retry_after(&e).await {
                    tracing::debug!(
                        "'{}' failed after {} attempt(s): {}",
                        command,
                        backoff.attempts(),
                        e
                    );
                    return Vec::new();
                }
            }
        }
    }
}
