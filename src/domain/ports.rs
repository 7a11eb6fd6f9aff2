use crate::domain::model::{
    AccessInterval, Capabilities, ClassicalElements, LlaDataSets, ObjectClass, PropagatorType,
    ScenarioInfo, StkObject,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// STK 物件模型根節點。所有方法都必須在序列化鎖內呼叫。
#[async_trait]
pub trait StkRoot: Send {
    /// 探測引擎支援哪些特化介面（例如 TwoBody 傳播器）
    async fn probe_capabilities(&mut self) -> Capabilities;

    async fn current_scenario(&mut self) -> Result<Option<ScenarioInfo>>;
    async fn close_scenario(&mut self) -> Result<()>;
    async fn new_scenario(&mut self, name: &str) -> Result<()>;
    async fn set_time_period(&mut self, start: &str, stop: &str) -> Result<()>;
    async fn rewind(&mut self) -> Result<()>;

    async fn contains(&mut self, class: ObjectClass, name: &str) -> Result<bool>;
    async fn new_object(&mut self, class: ObjectClass, name: &str) -> Result<StkObject>;
    async fn object_from_path(&mut self, path: &str) -> Result<StkObject>;

    async fn assign_geodetic(
        &mut self,
        object: &StkObject,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_km: f64,
    ) -> Result<()>;

    async fn set_propagator(&mut self, satellite: &StkObject, propagator: PropagatorType)
        -> Result<()>;
    async fn assign_classical(
        &mut self,
        satellite: &StkObject,
        elements: &ClassicalElements,
    ) -> Result<()>;
    async fn propagate(&mut self, satellite: &StkObject) -> Result<()>;

    async fn compute_access(
        &mut self,
        from: &StkObject,
        to: &StkObject,
    ) -> Result<Vec<AccessInterval>>;

    /// 固定座標系 LLA 取樣（Time/Lat/Lon/Alt）
    async fn lla_elements(
        &mut self,
        satellite: &StkObject,
        start: &str,
        stop: &str,
        step_sec: f64,
    ) -> Result<LlaDataSets>;

    /// 直接送出文字指令，回傳結果行
    async fn execute_command(&mut self, command: &str) -> Result<Vec<String>>;

    /// 關閉與引擎的連線
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
