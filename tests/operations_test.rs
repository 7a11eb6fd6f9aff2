mod common;

use common::FakeStk;
use stk_mcp::core::analysis::{compute_access_intervals, lla_ephemeris};
use stk_mcp::core::location::{create_location, LocationRequest};
use stk_mcp::core::objects::{list_objects, ObjectFilter};
use stk_mcp::core::satellite::{create_satellite, SatelliteRequest};
use stk_mcp::core::scenario::{setup_scenario, ScenarioRequest};
use stk_mcp::domain::model::{Capabilities, ObjectClass, ScenarioInfo};
use stk_mcp::utils::retry::RetryPolicy;
use stk_mcp::{StkError, StkRoot};
use tokio_test::assert_ok;

const EARTH_RADIUS_KM: f64 = 6378.137;

fn scenario() -> ScenarioInfo {
    ScenarioInfo {
        name: "Demo".to_string(),
        start: "20 Jan 2020 17:00:00.000".to_string(),
        stop: "22 Jan 2020 17:00:00.000".to_string(),
    }
}

fn satellite(name: &str, apogee: f64, perigee: f64) -> SatelliteRequest {
    SatelliteRequest {
        name: name.to_string(),
        apogee_alt_km: apogee,
        perigee_alt_km: perigee,
        raan_deg: 0.0,
        inclination_deg: 28.5,
    }
}

fn facility(name: &str) -> LocationRequest {
    LocationRequest {
        name: name.to_string(),
        latitude_deg: 40.015,
        longitude_deg: -105.27,
        altitude_km: 1.6,
        kind: "Facility".to_string(),
    }
}

#[tokio::test]
async fn test_setup_scenario_replaces_open_scenario() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake.with_scenario("Old");

    let request = ScenarioRequest {
        name: "Mission".to_string(),
        start_time: "20 Jan 2020 17:00:00.000".to_string(),
        duration_hours: 48.0,
    };
    let result = setup_scenario(&mut fake, &request).await;

    assert!(result.success, "{}", result.message);
    assert_eq!(
        result.message,
        "Successfully created and configured scenario: 'Mission'"
    );
    let info = result.result.unwrap();
    assert_eq!(info.stop, "22 Jan 2020 17:00:00.000");

    let calls = handle.calls();
    assert_eq!(calls[0], "current_scenario");
    assert_eq!(calls[1], "close_scenario");
    assert_eq!(calls[2], "new_scenario Mission");
    assert!(calls.contains(&"set_time_period 20 Jan 2020 17:00:00.000 | 22 Jan 2020 17:00:00.000".to_string()));
    assert!(calls.contains(&"rewind".to_string()));
    assert!(calls.contains(&"execute Application / Raise".to_string()));
}

#[tokio::test]
async fn test_setup_scenario_reports_bad_start_time() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake.with_scenario("Old");
    let request = ScenarioRequest {
        name: "Mission".to_string(),
        start_time: "yesterday".to_string(),
        duration_hours: 1.0,
    };

    let result = setup_scenario(&mut fake, &request).await;
    assert!(!result.success);
    assert!(result.message.starts_with("Error setting up scenario 'Mission':"));
    assert!(result.message.contains("'start_time'"));
    // the open scenario is left alone
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn test_setup_scenario_rejects_unrepresentable_duration() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake.with_scenario("Old");
    let request = ScenarioRequest {
        name: "New".to_string(),
        start_time: "20 Jan 2020 17:00:00.000".to_string(),
        duration_hours: 1e300,
    };

    let result = setup_scenario(&mut fake, &request).await;
    assert!(!result.success);
    assert!(result.message.contains("'duration_hours'"));
    assert!(!result.message.contains("start_time"));
    assert_eq!(handle.call_count(), 0);
    assert_eq!(
        assert_ok!(fake.current_scenario().await).map(|s| s.name),
        Some("Old".to_string())
    );
}

#[tokio::test]
async fn test_apogee_below_perigee_fails_before_engine_call() {
    let (mut fake, handle) = FakeStk::new();

    let err = create_satellite(
        &mut fake,
        Capabilities::full(),
        &scenario(),
        &satellite("Bad", 400.0, 500.0),
        EARTH_RADIUS_KM,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StkError::Validation { .. }));
    assert!(err
        .to_string()
        .contains("Apogee altitude cannot be less than Perigee altitude."));
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn test_missing_two_body_capability_is_unavailable() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake.with_capabilities(Capabilities {
        two_body_propagator: false,
        classical_state: true,
    });

    let err = create_satellite(
        &mut fake,
        Capabilities {
            two_body_propagator: false,
            classical_state: true,
        },
        &scenario(),
        &satellite("Sat", 500.0, 500.0),
        EARTH_RADIUS_KM,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StkError::Unavailable(_)));
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn test_geostationary_satellite_is_circular() {
    let (mut fake, handle) = FakeStk::new();

    let result = create_satellite(
        &mut fake,
        Capabilities::full(),
        &scenario(),
        &satellite("GEO", 35786.0, 35786.0),
        EARTH_RADIUS_KM,
    )
    .await
    .unwrap();

    assert!(result.success);
    assert_eq!(result.message, "Successfully created/configured satellite: 'GEO'");
    let calls = handle.calls();
    assert!(calls.iter().any(|c| c.starts_with("assign_classical */Satellite/GEO J2000 a=42164.137 e=0.000000")));
}

#[tokio::test]
async fn test_leo_satellite_sequence() {
    let (mut fake, handle) = FakeStk::new();

    assert_ok!(
        create_satellite(
            &mut fake,
            Capabilities::full(),
            &scenario(),
            &satellite("LEO", 550.0, 500.0),
            EARTH_RADIUS_KM,
        )
        .await
    );

    assert_eq!(
        handle.calls(),
        vec![
            "contains Satellite/LEO".to_string(),
            "new_object Satellite/LEO".to_string(),
            "set_propagator */Satellite/LEO TwoBody".to_string(),
            "assign_classical */Satellite/LEO J2000 a=6903.137 e=0.003622 i=28.5 w=0 raan=0 ta=0"
                .to_string(),
            "propagate */Satellite/LEO".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_existing_satellite_is_reused() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake.with_object(ObjectClass::Satellite, "LEO");

    let result = create_satellite(
        &mut fake,
        Capabilities::full(),
        &scenario(),
        &satellite("LEO", 550.0, 500.0),
        EARTH_RADIUS_KM,
    )
    .await
    .unwrap();

    assert!(result.success);
    let calls = handle.calls();
    assert!(calls.contains(&"object_from_path */Satellite/LEO".to_string()));
    assert!(!calls.iter().any(|c| c.starts_with("new_object")));
}

#[tokio::test]
async fn test_location_upsert_is_idempotent() {
    let (mut fake, _) = FakeStk::new();
    let info = scenario();

    let first = create_location(Some(&mut fake), Some(&info), &facility("Boulder")).await;
    assert!(first.success);
    assert_eq!(first.message, "Successfully created facility: 'Boulder'");

    let second = create_location(Some(&mut fake), Some(&info), &facility("Boulder")).await;
    assert!(second.success);
    assert_eq!(second.message, "Successfully updated facility: 'Boulder'");

    let objects = list_objects(&mut fake, &ObjectFilter::All, &RetryPolicy::immediate(1)).await;
    // fake has no scenario loaded, enumeration needs one
    assert!(objects.is_err());

    let (fake, _) = FakeStk::new();
    let mut fake = fake.with_scenario("Demo");
    for _ in 0..2 {
        create_location(Some(&mut fake), Some(&info), &facility("Boulder")).await;
    }
    let objects = list_objects(&mut fake, &ObjectFilter::All, &RetryPolicy::immediate(1))
        .await
        .unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].object_type, "Facility");
}

#[tokio::test]
async fn test_location_without_root_or_scenario() {
    let result = create_location(None, Some(&scenario()), &facility("Boulder")).await;
    assert!(!result.success);
    assert_eq!(result.message, "STK Root/Scenario is not available.");

    let (mut fake, handle) = FakeStk::new();
    let result = create_location(Some(&mut fake), None, &facility("Boulder")).await;
    assert!(!result.success);
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn test_location_rejects_unknown_kind() {
    let (mut fake, handle) = FakeStk::new();
    let mut request = facility("Paris");
    request.kind = "city".to_string();

    let result = create_location(Some(&mut fake), Some(&scenario()), &request).await;
    assert!(!result.success);
    assert_eq!(result.message, "Invalid kind. Use 'facility' or 'place'.");
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn test_location_falls_back_to_set_position_command() {
    let (mut fake, handle) = FakeStk::new();
    fake.fail_geodetic = true;
    let mut request = facility("Summit");
    request.kind = "place".to_string();

    let result = create_location(Some(&mut fake), Some(&scenario()), &request).await;
    assert!(result.success, "{}", result.message);
    assert_eq!(result.message, "Successfully created place: 'Summit'");
    assert!(handle
        .calls()
        .contains(&"execute SetPosition */Place/Summit Geodetic 40.015 -105.27 1.6 km".to_string()));
}

#[tokio::test]
async fn test_sensor_filter_returns_only_sensors() {
    let (fake, _) = FakeStk::new();
    let mut fake = fake
        .with_scenario("Demo")
        .with_object(ObjectClass::Satellite, "SatA")
        .with_object(ObjectClass::Facility, "Boulder")
        .with_sensor(ObjectClass::Facility, "Boulder", "Dish")
        .with_sensor(ObjectClass::Satellite, "SatA", "Camera");

    let policy = RetryPolicy::immediate(1);
    let sensors = list_objects(&mut fake, &ObjectFilter::parse(Some("sensors")), &policy)
        .await
        .unwrap();
    assert_eq!(sensors.len(), 2);
    assert!(sensors.iter().all(|o| o.object_type == "Sensor"));

    let everything = list_objects(&mut fake, &ObjectFilter::All, &policy)
        .await
        .unwrap();
    assert_eq!(everything.len(), 4);
    assert_eq!(everything[0].name, "SatA");
    assert_eq!(everything[0].object_type, "Satellite");
}

#[tokio::test]
async fn test_unrecognized_filter_returns_empty() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake
        .with_scenario("Demo")
        .with_object(ObjectClass::Satellite, "SatA");

    let objects = list_objects(
        &mut fake,
        &ObjectFilter::parse(Some("starships")),
        &RetryPolicy::immediate(1),
    )
    .await
    .unwrap();
    assert!(objects.is_empty());
    assert!(!handle.calls().iter().any(|c| c.starts_with("execute")));
}

#[tokio::test]
async fn test_enumeration_retries_then_degrades() {
    struct Flaky {
        failures: usize,
    }

    #[async_trait::async_trait]
    impl StkRoot for Flaky {
        async fn probe_capabilities(&mut self) -> Capabilities {
            Capabilities::full()
        }
        async fn current_scenario(&mut self) -> stk_mcp::Result<Option<ScenarioInfo>> {
            Ok(Some(scenario()))
        }
        async fn close_scenario(&mut self) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn new_scenario(&mut self, _: &str) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn set_time_period(&mut self, _: &str, _: &str) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn rewind(&mut self) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn contains(&mut self, _: ObjectClass, _: &str) -> stk_mcp::Result<bool> {
            Ok(false)
        }
        async fn new_object(
            &mut self,
            class: ObjectClass,
            name: &str,
        ) -> stk_mcp::Result<stk_mcp::domain::model::StkObject> {
            Ok(stk_mcp::domain::model::StkObject::new(class, name))
        }
        async fn object_from_path(
            &mut self,
            path: &str,
        ) -> stk_mcp::Result<stk_mcp::domain::model::StkObject> {
            Ok(stk_mcp::domain::model::StkObject::from_path(path))
        }
        async fn assign_geodetic(
            &mut self,
            _: &stk_mcp::domain::model::StkObject,
            _: f64,
            _: f64,
            _: f64,
        ) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn set_propagator(
            &mut self,
            _: &stk_mcp::domain::model::StkObject,
            _: stk_mcp::domain::model::PropagatorType,
        ) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn assign_classical(
            &mut self,
            _: &stk_mcp::domain::model::StkObject,
            _: &stk_mcp::domain::model::ClassicalElements,
        ) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn propagate(&mut self, _: &stk_mcp::domain::model::StkObject) -> stk_mcp::Result<()> {
            Ok(())
        }
        async fn compute_access(
            &mut self,
            _: &stk_mcp::domain::model::StkObject,
            _: &stk_mcp::domain::model::StkObject,
        ) -> stk_mcp::Result<Vec<stk_mcp::domain::model::AccessInterval>> {
            Ok(vec![])
        }
        async fn lla_elements(
            &mut self,
            _: &stk_mcp::domain::model::StkObject,
            _: &str,
            _: &str,
            _: f64,
        ) -> stk_mcp::Result<stk_mcp::domain::model::LlaDataSets> {
            Ok(Default::default())
        }
        async fn execute_command(&mut self, command: &str) -> stk_mcp::Result<Vec<String>> {
            if command == "AllInstanceNames */Satellite" {
                if self.failures < 2 {
                    self.failures += 1;
                    return Err(StkError::engine("busy"));
                }
                return Ok(vec!["/Scenario/Demo/Satellite/SatA".to_string()]);
            }
            Err(StkError::engine("NACK"))
        }
    }

    let mut flaky = Flaky { failures: 0 };
    let objects = list_objects(
        &mut flaky,
        &ObjectFilter::parse(Some("satellites")),
        &RetryPolicy::immediate(3),
    )
    .await
    .unwrap();
    assert_eq!(flaky.failures, 2);
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].name, "SatA");

    // every other class fails each attempt and contributes nothing
    let objects = list_objects(&mut flaky, &ObjectFilter::All, &RetryPolicy::immediate(2))
        .await
        .unwrap();
    assert_eq!(objects.len(), 1);
}

#[tokio::test]
async fn test_access_report_keeps_engine_intervals() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake
        .with_object(ObjectClass::Satellite, "SatA")
        .with_object(ObjectClass::Facility, "Boulder");

    let report = compute_access_intervals(&mut fake, "Satellite/SatA", "/Facility/Boulder")
        .await
        .unwrap();
    assert_eq!(report.from, "*/Satellite/SatA");
    assert_eq!(report.to, "*/Facility/Boulder");
    assert_eq!(report.intervals.len(), 2);
    assert_eq!(report.intervals[1].stop, "20 Jan 2020 19:52:30.000");
    assert!(handle
        .calls()
        .contains(&"compute_access */Satellite/SatA */Facility/Boulder".to_string()));
}

#[tokio::test]
async fn test_access_with_empty_path_is_validation_error() {
    let (mut fake, handle) = FakeStk::new();
    let err = compute_access_intervals(&mut fake, "", "Facility/Boulder")
        .await
        .unwrap_err();
    assert!(matches!(err, StkError::Validation { .. }));
    assert_eq!(handle.call_count(), 0);
}

#[tokio::test]
async fn test_lla_ephemeris_zips_samples_over_scenario_window() {
    let (fake, handle) = FakeStk::new();
    let mut fake = fake
        .with_scenario("Demo")
        .with_object(ObjectClass::Satellite, "SatA");

    let report = lla_ephemeris(&mut fake, "Satellite/SatA", 60.0).await.unwrap();
    assert_eq!(report.satellite, "*/Satellite/SatA");
    assert_eq!(report.step_sec, 60.0);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[1].lat_deg, 3.5);
    assert_eq!(report.records[1].alt_km, 500.4);
    assert!(handle.calls().contains(
        &"lla_elements */Satellite/SatA 20 Jan 2020 17:00:00.000 | 22 Jan 2020 17:00:00.000 step=60"
            .to_string()
    ));
}

#[tokio::test]
async fn test_lla_without_scenario_fails() {
    let (fake, _) = FakeStk::new();
    let mut fake = fake.with_object(ObjectClass::Satellite, "SatA");

    let err = lla_ephemeris(&mut fake, "Satellite/SatA", 60.0)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("No active scenario."));
}
