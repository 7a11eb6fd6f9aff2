#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stk_mcp::domain::model::{
    AccessInterval, Capabilities, ClassicalElements, LlaDataSets, ObjectClass, PropagatorType,
    ScenarioInfo, StkObject,
};
use stk_mcp::{Result, StkError, StkRoot};

/// Shared view into a `FakeStk` after it has been boxed into the session.
#[derive(Clone, Default)]
pub struct FakeHandle {
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl FakeHandle {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// In-memory stand-in for the STK object model.
pub struct FakeStk {
    handle: FakeHandle,
    capabilities: Capabilities,
    scenario: Option<ScenarioInfo>,
    objects: BTreeSet<(ObjectClass, String)>,
    sensors: Vec<(ObjectClass, String, String)>,
    pub fail_geodetic: bool,
    pub fail_commands: bool,
    pub call_delay: Duration,
}

impl FakeStk {
    pub fn new() -> (Self, FakeHandle) {
        let handle = FakeHandle::default();
        let fake = Self {
            handle: handle.clone(),
            capabilities: Capabilities::full(),
            scenario: None,
            objects: BTreeSet::new(),
            sensors: Vec::new(),
            fail_geodetic: false,
            fail_commands: false,
            call_delay: Duration::ZERO,
        };
        (fake, handle)
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_scenario(mut self, name: &str) -> Self {
        self.scenario = Some(ScenarioInfo {
            name: name.to_string(),
            start: "20 Jan 2020 17:00:00.000".to_string(),
            stop: "22 Jan 2020 17:00:00.000".to_string(),
        });
        self
    }

    pub fn with_object(mut self, class: ObjectClass, name: &str) -> Self {
        self.objects.insert((class, name.to_string()));
        self
    }

    pub fn with_sensor(mut self, parent: ObjectClass, parent_name: &str, name: &str) -> Self {
        self.sensors
            .push((parent, parent_name.to_string(), name.to_string()));
        self
    }

    pub fn with_call_delay(mut self, delay: Duration) -> Self {
        self.call_delay = delay;
        self
    }

    async fn record(&self, call: String) {
        let now = self.handle.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.handle.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.handle.calls.lock().unwrap().push(call);
        if self.call_delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.call_delay).await;
        }
        self.handle.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn instance_lines(&self, command: &str) -> Option<Vec<String>> {
        let target = command.strip_prefix("AllInstanceNames */")?;
        if let Some(parent) = target.strip_suffix("/*/Sensor") {
            let paths: Vec<String> = self
                .sensors
                .iter()
                .filter(|(class, _, _)| class.as_str() == parent)
                .map(|(class, host, name)| format!("/Scenario/Fake/{}/{}/Sensor/{}", class, host, name))
                .collect();
            return Some(if paths.is_empty() { vec![] } else { vec![paths.join(" ")] });
        }
        let paths: Vec<String> = self
            .objects
            .iter()
            .filter(|(class, _)| class.as_str() == target)
            .map(|(class, name)| format!("/Scenario/Fake/{}/{}", class, name))
            .collect();
        Some(if paths.is_empty() { vec![] } else { vec![paths.join(" ")] })
    }
}

#[async_trait]
impl StkRoot for FakeStk {
    async fn probe_capabilities(&mut self) -> Capabilities {
        self.record("probe_capabilities".to_string()).await;
        self.capabilities
    }

    async fn current_scenario(&mut self) -> Result<Option<ScenarioInfo>> {
        self.record("current_scenario".to_string()).await;
        Ok(self.scenario.clone())
    }

    async fn close_scenario(&mut self) -> Result<()> {
        self.record("close_scenario".to_string()).await;
        self.scenario = None;
        self.objects.clear();
        self.sensors.clear();
        Ok(())
    }

    async fn new_scenario(&mut self, name: &str) -> Result<()> {
        self.record(format!("new_scenario {}", name)).await;
        self.scenario = Some(ScenarioInfo {
            name: name.to_string(),
            start: String::new(),
            stop: String::new(),
        });
        Ok(())
    }

    async fn set_time_period(&mut self, start: &str, stop: &str) -> Result<()> {
        self.record(format!("set_time_period {} | {}", start, stop)).await;
        if let Some(scenario) = self.scenario.as_mut() {
            scenario.start = start.to_string();
            scenario.stop = stop.to_string();
        }
        Ok(())
    }

    async fn rewind(&mut self) -> Result<()> {
        self.record("rewind".to_string()).await;
        Ok(())
    }

    async fn contains(&mut self, class: ObjectClass, name: &str) -> Result<bool> {
        self.record(format!("contains {}/{}", class, name)).await;
        Ok(self.objects.contains(&(class, name.to_string())))
    }

    async fn new_object(&mut self, class: ObjectClass, name: &str) -> Result<StkObject> {
        self.record(format!("new_object {}/{}", class, name)).await;
        self.objects.insert((class, name.to_string()));
        Ok(StkObject::new(class, name))
    }

    async fn object_from_path(&mut self, path: &str) -> Result<StkObject> {
        self.record(format!("object_from_path {}", path)).await;
        let object = StkObject::from_path(path);
        match object.class {
            Some(class) if self.objects.contains(&(class, object.name.clone())) => Ok(object),
            _ => Err(StkError::engine(format!("Object {} does not exist", path))),
        }
    }

    async fn assign_geodetic(
        &mut self,
        object: &StkObject,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_km: f64,
    ) -> Result<()> {
        self.record(format!(
            "assign_geodetic {} {} {} {}",
            object.path, latitude_deg, longitude_deg, altitude_km
        ))
        .await;
        if self.fail_geodetic {
            return Err(StkError::engine("AssignGeodetic is not supported"));
        }
        Ok(())
    }

    async fn set_propagator(
        &mut self,
        satellite: &StkObject,
        propagator: PropagatorType,
    ) -> Result<()> {
        self.record(format!("set_propagator {} {}", satellite.path, propagator.as_str()))
            .await;
        Ok(())
    }

    async fn assign_classical(
        &mut self,
        satellite: &StkObject,
        elements: &ClassicalElements,
    ) -> Result<()> {
        self.record(format!(
            "assign_classical {} {} a={:.3} e={:.6} i={} w={} raan={} ta={}",
            satellite.path,
            elements.frame.as_str(),
            elements.semi_major_axis_km,
            elements.eccentricity,
            elements.inclination_deg,
            elements.arg_of_perigee_deg,
            elements.raan_deg,
            elements.true_anomaly_deg
        ))
        .await;
        Ok(())
    }

    async fn propagate(&mut self, satellite: &StkObject) -> Result<()> {
        self.record(format!("propagate {}", satellite.path)).await;
        Ok(())
    }

    async fn compute_access(
        &mut self,
        from: &StkObject,
        to: &StkObject,
    ) -> Result<Vec<AccessInterval>> {
        self.record(format!("compute_access {} {}", from.path, to.path))
            .await;
        Ok(vec![
            AccessInterval {
                start: "20 Jan 2020 18:00:00.000".to_string(),
                stop: "20 Jan 2020 18:10:00.000".to_string(),
            },
            AccessInterval {
                start: "20 Jan 2020 19:40:00.000".to_string(),
                stop: "20 Jan 2020 19:52:30.000".to_string(),
            },
        ])
    }

    async fn lla_elements(
        &mut self,
        satellite: &StkObject,
        start: &str,
        stop: &str,
        step_sec: f64,
    ) -> Result<LlaDataSets> {
        self.record(format!(
            "lla_elements {} {} | {} step={}",
            satellite.path, start, stop, step_sec
        ))
        .await;
        Ok(LlaDataSets {
            time: vec![
                "20 Jan 2020 17:00:00.000".to_string(),
                "20 Jan 2020 17:01:00.000".to_string(),
            ],
            lat: vec![0.0, 3.5],
            lon: vec![-100.0, -98.2],
            alt: vec![500.0, 500.4],
        })
    }

    async fn execute_command(&mut self, command: &str) -> Result<Vec<String>> {
        self.record(format!("execute {}", command)).await;
        if self.fail_commands {
            return Err(StkError::engine(format!("NACK: {}", command)));
        }
        if let Some(lines) = self.instance_lines(command) {
            return Ok(lines);
        }
        if command.starts_with("Application /") || command.starts_with("SetPosition ") {
            return Ok(vec![]);
        }
        Err(StkError::engine(format!("NACK: {}", command)))
    }
}
