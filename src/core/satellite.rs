use crate::domain::model::{
    Capabilities, ClassicalElements, CoordinateFrame, ObjectClass, OperationResult,
    PropagatorType, ScenarioInfo, StkObject,
};
use crate::domain::ports::StkRoot;
use crate::utils::error::{Result, StkError};
use crate::utils::monitor::timed;

#[derive(Debug, Clone)]
pub struct SatelliteRequest {
    pub name: String,
    pub apogee_alt_km: f64,
    pub perigee_alt_km: f64,
    pub raan_deg: f64,
    pub inclination_deg: f64,
}

/// 由遠地點/近地點高度推得半長軸與離心率。分母為 0 時離心率為 0。
pub fn semi_major_axis_and_eccentricity(
    apogee_alt_km: f64,
    perigee_alt_km: f64,
    earth_radius_km: f64,
) -> (f64, f64) {
    let radius_apogee = apogee_alt_km + earth_radius_km;
    let radius_perigee = perigee_alt_km + earth_radius_km;
    let denominator = radius_apogee + radius_perigee;
    let semi_major_axis = denominator / 2.0;
    let eccentricity = if denominator == 0.0 {
        0.0
    } else {
        (radius_apogee - radius_perigee) / denominator
    };
    (semi_major_axis, eccentricity)
}

/// J2000 經典根數；近地點幅角與真近點角固定為 0（軌道從近地點開始）
pub fn classical_elements(request: &SatelliteRequest, earth_radius_km: f64) -> ClassicalElements {
    let (semi_major_axis_km, eccentricity) = semi_major_axis_and_eccentricity(
        request.apogee_alt_km,
        request.perigee_alt_km,
        earth_radius_km,
    );
    ClassicalElements {
        frame: CoordinateFrame::J2000,
        semi_major_axis_km,
        eccentricity,
        inclination_deg: request.inclination_deg,
        arg_of_perigee_deg: 0.0,
        raan_deg: request.raan_deg,
        true_anomaly_deg: 0.0,
    }
}

/// 建立或更新衛星並以 TwoBody 傳播。
/// 驗證錯誤在任何引擎呼叫之前回傳；缺少 TwoBody 能力時回傳 Unavailable。
pub async fn create_satellite(
    root: &mut dyn StkRoot,
    capabilities: Capabilities,
    scenario: &ScenarioInfo,
    request: &SatelliteRequest,
    earth_radius_km: f64,
) -> Result<OperationResult<StkObject>> {
    if request.apogee_alt_km < request.perigee_alt_km {
        return Err(StkError::validation(
            "apogee_alt_km",
            request.apogee_alt_km,
            "Apogee altitude cannot be less than Perigee altitude.",
        ));
    }
    if !capabilities.two_body_propagator || !capabilities.classical_state {
        return Err(StkError::unavailable(
            "Two-body propagator or classical orbit state is not supported by this STK instance.",
        ));
    }

    let elements = classical_elements(request, earth_radius_km);
    tracing::debug!(
        "Calculated Semi-Major Axis (a): {:.3} km, Eccentricity (e): {:.6}",
        elements.semi_major_axis_km,
        elements.eccentricity
    );

    timed("create_satellite", async {
        tracing::info!(
            "Configuring satellite '{}' in scenario '{}'",
            request.name,
            scenario.name
        );

        let satellite = if root.contains(ObjectClass::Satellite, &request.name).await? {
            tracing::info!("Satellite '{}' already exists. Getting reference.", request.name);
            root.object_from_path(&format!("*/Satellite/{}", request.name))
                .await?
        } else {
            tracing::info!("Creating new Satellite object: {}", request.name);
            root.new_object(ObjectClass::Satellite, &request.name).await?
        };

        root.set_propagator(&satellite, PropagatorType::TwoBody).await?;
        root.assign_classical(&satellite, &elements).await?;
        tracing::info!("Propagating orbit...");
        root.propagate(&satellite).await?;

        Ok(OperationResult::ok(
            format!(
                "Successfully created/configured satellite: '{}'",
                satellite.name
            ),
            satellite,
        ))
    })
    .await
}
