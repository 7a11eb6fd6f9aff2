use crate::domain::model::{AccessReport, LlaRecord, LlaReport};
use crate::domain::ports::StkRoot;
use crate::utils::error::{Result, StkError};
use crate::utils::monitor::timed;

/// 轉成引擎的絕對路徑：已有 `*/` 不變，`/X` → `*/X`，其餘補上 `*/`
pub fn normalize_path(path: &str) -> Result<String> {
    let path = path.trim();
    if path.is_empty() {
        return Err(StkError::validation(
            "object_path",
            path,
            "Object path must be non-empty.",
        ));
    }
    if path.starts_with("*/") {
        Ok(path.to_string())
    } else if path.starts_with('/') {
        Ok(format!("*{}", path))
    } else {
        Ok(format!("*/{}", path))
    }
}

/// 計算兩物件間的 access 區間，依引擎回報順序原樣回傳
pub async fn compute_access_intervals(
    root: &mut dyn StkRoot,
    from_path: &str,
    to_path: &str,
) -> Result<AccessReport> {
    let from = normalize_path(from_path)?;
    let to = normalize_path(to_path)?;

    timed("compute_access_intervals", async {
        let from_obj = root.object_from_path(&from).await?;
        let to_obj = root.object_from_path(&to).await?;
        let intervals = root.compute_access(&from_obj, &to_obj).await?;
        Ok(AccessReport {
            from,
            to,
            intervals,
        })
    })
    .await
}

/// 依場景時間區間取樣衛星的 LLA 星曆
pub async fn lla_ephemeris(
    root: &mut dyn StkRoot,
    satellite_path: &str,
    step_sec: f64,
) -> Result<LlaReport> {
    let path = normalize_path(satellite_path)?;

    timed("lla_ephemeris", async {
        let satellite = root.object_from_path(&path).await?;
        let scenario = root
            .current_scenario()
            .await?
            .ok_or_else(|| StkError::engine("No active scenario."))?;

        let data = root
            .lla_elements(&satellite, &scenario.start, &scenario.stop, step_sec)
            .await?;

        // 四組陣列視為等長，不做重採樣
        let records = data
            .time
            .into_iter()
            .zip(data.lat)
            .zip(data.lon)
            .zip(data.alt)
            .map(|(((time, lat_deg), lon_deg), alt_km)| LlaRecord {
                time,
                lat_deg,
                lon_deg,
                alt_km,
            })
            .collect();

        Ok(LlaReport {
            satellite: path,
            step_sec,
            records,
        })
    })
    .await
}
