//! STK Connect adapter.
//!
//! Connect is STK's text command channel. Each command is one line; STK answers
//! `ACK` or `NACK`, and data-returning commands are followed by framed messages:
//! a 40-byte header whose last token is the payload length, then the payload.
//! `*_RM` commands return a count message first, then that many data messages.

use crate::domain::model::{
    AccessInterval, Capabilities, ClassicalElements, LlaDataSets, ObjectClass, PropagatorType,
    ScenarioInfo, StkObject,
};
use crate::domain::ports::StkRoot;
use crate::utils::error::{Result, StkError};
use crate::utils::time::parse_utcg;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

pub const HEADER_LEN: usize = 40;

// 會回傳單一訊息的指令
const SINGLE_REPLY_COMMANDS: [&str; 6] = [
    "AllInstanceNames",
    "CheckScenario",
    "DoesObjExist",
    "GetTimePeriod",
    "GetAnalysisTimePeriod",
    "GetSTKVersion",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    AckOnly,
    Single,
    Multi,
}

impl ReplyShape {
    pub fn for_command(command: &str) -> Self {
        let verb = command.split_whitespace().next().unwrap_or_default();
        if verb.to_ascii_uppercase().ends_with("_RM") {
            Self::Multi
        } else if SINGLE_REPLY_COMMANDS
            .iter()
            .any(|c| c.eq_ignore_ascii_case(verb))
        {
            Self::Single
        } else {
            Self::AckOnly
        }
    }
}

/// 單一 Connect TCP 連線
pub struct ConnectClient {
    stream: TcpStream,
}

impl ConnectClient {
    pub async fn connect(address: &str) -> Result<Self> {
        let stream = TcpStream::connect(address).await?;
        stream.set_nodelay(true)?;
        Ok(Self { stream })
    }

    pub async fn send(&mut self, command: &str) -> Result<Vec<String>> {
        tracing::debug!("Connect >> {}", command);
        self.stream
            .write_all(format!("{}\n", command).as_bytes())
            .await?;
        self.read_ack(command).await?;

        let payloads = match ReplyShape::for_command(command) {
            ReplyShape::AckOnly => Vec::new(),
            ReplyShape::Single => vec![self.read_message().await?],
            ReplyShape::Multi => {
                let count_payload = self.read_message().await?;
                let count: usize = count_payload.trim().parse().map_err(|_| StkError::Protocol {
                    message: format!(
                        "expected message count for '{}', got '{}'",
                        command,
                        count_payload.trim()
                    ),
                })?;
                let mut payloads = Vec::with_capacity(count);
                for _ in 0..count {
                    payloads.push(self.read_message().await?);
                }
                payloads
            }
        };

        Ok(payloads
            .iter()
            .flat_map(|p| p.lines())
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn read_ack(&mut self, command: &str) -> Result<()> {
        let mut ack = [0u8; 3];
        self.stream.read_exact(&mut ack).await?;
        match &ack {
            b"ACK" => Ok(()),
            b"NAC" => {
                let mut rest = [0u8; 1];
                self.stream.read_exact(&mut rest).await?;
                Err(StkError::engine(format!("NACK received for '{}'", command)))
            }
            other => Err(StkError::Protocol {
                message: format!(
                    "unexpected acknowledgement '{}' for '{}'",
                    String::from_utf8_lossy(other),
                    command
                ),
            }),
        }
    }

    async fn read_message(&mut self) -> Result<String> {
        let mut header = [0u8; HEADER_LEN];
        self.stream.read_exact(&mut header).await?;
        let length = parse_header_length(&String::from_utf8_lossy(&header))?;

        let mut payload = vec![0u8; length];
        self.stream.read_exact(&mut payload).await?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

pub fn parse_header_length(header: &str) -> Result<usize> {
    header
        .split_whitespace()
        .last()
        .and_then(|token| token.parse::<usize>().ok())
        .ok_or_else(|| StkError::Protocol {
            message: format!("malformed Connect header '{}'", header.trim()),
        })
}

fn quoted_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]*)""#).expect("valid quoted pattern"))
}

/// 取出一行中所有雙引號內的值；沒有引號時以逗號切分
pub fn quoted_values(line: &str) -> Vec<String> {
    let quoted: Vec<String> = quoted_pattern()
        .captures_iter(line)
        .map(|caps| caps[1].trim().to_string())
        .collect();
    if !quoted.is_empty() {
        return quoted;
    }
    line.split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// 以 csv 解析報表行（欄位以逗號分隔，可能帶引號）
pub fn report_rows(lines: &[String]) -> Vec<Vec<String>> {
    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(joined.as_bytes());

    reader
        .records()
        .filter_map(|record| record.ok())
        .map(|record| record.iter().map(str::to_string).collect())
        .collect()
}

/// Access 報表的資料列："1, <start>, <stop>, <duration>"
pub fn parse_access_rows(lines: &[String]) -> Vec<AccessInterval> {
    report_rows(lines)
        .into_iter()
        .filter(|row| {
            row.len() >= 3 && row[0].parse::<u32>().is_ok() && parse_utcg(&row[1]).is_some()
        })
        .map(|row| AccessInterval {
            start: row[1].clone(),
            stop: row[2].clone(),
        })
        .collect()
}

/// LLA 報表的資料列："<time>, <lat>, <lon>, <alt>"
pub fn parse_lla_rows(lines: &[String]) -> LlaDataSets {
    let mut data = LlaDataSets::default();
    for row in report_rows(lines) {
        if row.len() < 4 {
            continue;
        }
        let parsed = (
            row[1].parse::<f64>(),
            row[2].parse::<f64>(),
            row[3].parse::<f64>(),
        );
        if let (Ok(lat), Ok(lon), Ok(alt)) = parsed {
            data.time.push(row[0].clone());
            data.lat.push(lat);
            data.lon.push(lon);
            data.alt.push(alt);
        }
    }
    data
}

/// 經由 Connect 操作 STK 的物件模型根節點
pub struct ConnectRoot {
    client: ConnectClient,
    propagators: HashMap<String, PropagatorType>,
}

impl ConnectRoot {
    pub async fn connect(address: &str) -> Result<Self> {
        let client = ConnectClient::connect(address).await?;
        let mut root = Self {
            client,
            propagators: HashMap::new(),
        };
        root.client.send("ConControl / VerboseOff").await?;
        root.client.send("SetUnits / km").await?;
        Ok(root)
    }

    async fn single_line(&mut self, command: &str) -> Result<String> {
        Ok(self
            .client
            .send(command)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default())
    }

    async fn time_period(&mut self) -> Result<(String, String)> {
        let line = self.single_line("GetTimePeriod *").await?;
        let mut values = quoted_values(&line).into_iter();
        match (values.next(), values.next()) {
            (Some(start), Some(stop)) => Ok((start, stop)),
            _ => Err(StkError::engine(format!(
                "could not read scenario time period from '{}'",
                line
            ))),
        }
    }

    async fn exists(&mut self, path: &str) -> Result<bool> {
        let reply = self
            .single_line(&format!("DoesObjExist / {}", path))
            .await?;
        Ok(reply.trim() == "1")
    }
}

#[async_trait]
impl StkRoot for ConnectRoot {
    async fn probe_capabilities(&mut self) -> Capabilities {
        match self.client.send("GetSTKVersion /").await {
            Ok(lines) => {
                tracing::info!(
                    "Connected to STK {}",
                    lines.first().map(String::as_str).unwrap_or("(unknown version)")
                );
                Capabilities::full()
            }
            Err(e) => {
                tracing::warn!("STK capability probe failed: {}", e);
                Capabilities::default()
            }
        }
    }

    async fn current_scenario(&mut self) -> Result<Option<ScenarioInfo>> {
        let loaded = self.single_line("CheckScenario /").await?;
        if loaded.trim() != "1" {
            return Ok(None);
        }

        let names = self.client.send("AllInstanceNames /").await?;
        let name = names
            .iter()
            .flat_map(|line| line.split_whitespace())
            .find_map(|path| {
                let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
                segments
                    .iter()
                    .position(|s| *s == "Scenario")
                    .and_then(|i| segments.get(i + 1))
                    .map(|s| s.to_string())
            });

        let Some(name) = name else {
            return Ok(None);
        };
        let (start, stop) = self.time_period().await?;
        Ok(Some(ScenarioInfo { name, start, stop }))
    }

    async fn close_scenario(&mut self) -> Result<()> {
        self.propagators.clear();
        self.client.send("Unload / *").await.map(|_| ())
    }

    async fn new_scenario(&mut self, name: &str) -> Result<()> {
        self.client
            .send(&format!("New / Scenario {}", name))
            .await
            .map(|_| ())
    }

    async fn set_time_period(&mut self, start: &str, stop: &str) -> Result<()> {
        self.client
            .send(&format!("SetAnalysisTimePeriod * \"{}\" \"{}\"", start, stop))
            .await
            .map(|_| ())
    }

    async fn rewind(&mut self) -> Result<()> {
        self.client.send("Animate * Reset").await.map(|_| ())
    }

    async fn contains(&mut self, class: ObjectClass, name: &str) -> Result<bool> {
        self.exists(&format!("*/{}/{}", class, name)).await
    }

    async fn new_object(&mut self, class: ObjectClass, name: &str) -> Result<StkObject> {
        self.client
            .send(&format!("New / */{} {}", class, name))
            .await?;
        Ok(StkObject::new(class, name))
    }

    async fn object_from_path(&mut self, path: &str) -> Result<StkObject> {
        if !self.exists(path).await? {
            return Err(StkError::engine(format!("object '{}' not found", path)));
        }
        Ok(StkObject::from_path(path))
    }

    async fn assign_geodetic(
        &mut self,
        object: &StkObject,
        latitude_deg: f64,
        longitude_deg: f64,
        altitude_km: f64,
    ) -> Result<()> {
        self.client
            .send(&format!(
                "SetPosition {} Geodetic {} {} {}",
                object.path, latitude_deg, longitude_deg, altitude_km
            ))
            .await
            .map(|_| ())
    }

    async fn set_propagator(
        &mut self,
        satellite: &StkObject,
        propagator: PropagatorType,
    ) -> Result<()> {
        // Connect 沒有單獨設定傳播器的指令，於 SetState 時一併送出
        self.propagators.insert(satellite.path.clone(), propagator);
        Ok(())
    }

    async fn assign_classical(
        &mut self,
        satellite: &StkObject,
        elements: &ClassicalElements,
    ) -> Result<()> {
        let propagator = self
            .propagators
            .get(&satellite.path)
            .copied()
            .ok_or_else(|| {
                StkError::engine(format!("no propagator configured for '{}'", satellite.path))
            })?;
        let (start, stop) = self.time_period().await?;

        let command = format!(
            "SetState {} Classical {} \"{}\" \"{}\" 60 {} \"{}\" {} {} {} {} {} {}",
            satellite.path,
            propagator.as_str(),
            start,
            stop,
            elements.frame.as_str(),
            start,
            elements.semi_major_axis_km,
            elements.eccentricity,
            elements.inclination_deg,
            elements.arg_of_perigee_deg,
            elements.raan_deg,
            elements.true_anomaly_deg,
        );
        self.client.send(&command).await.map(|_| ())
    }

    async fn propagate(&mut self, satellite: &StkObject) -> Result<()> {
        let (start, stop) = self.time_period().await?;
        self.client
            .send(&format!(
                "Propagate {} \"{}\" \"{}\"",
                satellite.path, start, stop
            ))
            .await
            .map(|_| ())
    }

    async fn compute_access(
        &mut self,
        from: &StkObject,
        to: &StkObject,
    ) -> Result<Vec<AccessInterval>> {
        self.client
            .send(&format!("Access {} {}", from.path, to.path))
            .await?;
        let lines = self
            .client
            .send(&format!(
                "Report_RM {} Style \"Access\" AccessObject {}",
                from.path, to.path
            ))
            .await?;
        Ok(parse_access_rows(&lines))
    }

    async fn lla_elements(
        &mut self,
        satellite: &StkObject,
        start: &str,
        stop: &str,
        step_sec: f64,
    ) -> Result<LlaDataSets> {
        let lines = self
            .client
            .send(&format!(
                "Report_RM {} Style \"LLA Position\" TimePeriod \"{}\" \"{}\" TimeStep {}",
                satellite.path, start, stop, step_sec
            ))
            .await?;
        Ok(parse_lla_rows(&lines))
    }

    async fn execute_command(&mut self, command: &str) -> Result<Vec<String>> {
        self.client.send(command).await
    }

    async fn close(&mut self) -> Result<()> {
        self.client.shutdown().await
    }
}
