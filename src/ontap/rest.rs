//! ONTAP REST API client.
//!
//! Each [`RestConnector::connect`] call builds a new `reqwest::Client`, so every
//! collector talks to the array over its own connection.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use super::{
    ClusterIdentity, Connector, DiskInfo, OntapApi, OntapError, PerfCounter, VolumeAggrMap,
    VolumeInfo,
};

/// Upper bound on records requested from list endpoints.
const MAX_LIST_RECORDS: usize = 10_000;

const DISK_COUNTER_TABLE: &str = "disk";
const VOLUME_COUNTER_TABLE: &str = "volume";
const AGGR_COUNTER_TABLE: &str = "aggregate";

/// Connection settings resolved at startup.
#[derive(Clone)]
pub struct RestSettings {
    pub host: String,
    pub username: String,
    pub password: String,
    pub use_ssl: bool,
    pub tls_insecure: bool,
    pub debug: bool,
    pub request_timeout: Duration,
}

impl fmt::Debug for RestSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSettings")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"********")
            .field("use_ssl", &self.use_ssl)
            .field("tls_insecure", &self.tls_insecure)
            .field("debug", &self.debug)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl RestSettings {
    fn base_url(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            return self.host.trim_end_matches('/').to_string();
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.host.trim_end_matches('/'))
    }
}

/// Connector for a live cluster.
#[derive(Debug, Clone)]
pub struct RestConnector {
    settings: RestSettings,
}

impl RestConnector {
    pub fn new(settings: RestSettings) -> Self {
        Self { settings }
    }
}

impl Connector for RestConnector {
    fn connect(&self) -> Result<Box<dyn OntapApi>, OntapError> {
        let http = Client::builder()
            .danger_accept_invalid_certs(self.settings.tls_insecure)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(|e| OntapError::Client(e.to_string()))?;

        Ok(Box::new(RestClient {
            http,
            base_url: self.settings.base_url(),
            username: self.settings.username.clone(),
            password: self.settings.password.clone(),
            debug: self.settings.debug,
        }))
    }
}

struct RestClient {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    debug: bool,
}

// ---- response shapes ----

#[derive(Deserialize)]
struct Records<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

#[derive(Deserialize)]
struct ClusterRecord {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct DiskRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    container_type: String,
}

#[derive(Deserialize, Default)]
struct NamedRef {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SnapshotSpace {
    used_percent: Option<serde_json::Value>,
    reserve_percent: Option<serde_json::Value>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct VolumeSpace {
    size: Option<serde_json::Value>,
    used: Option<serde_json::Value>,
    available: Option<serde_json::Value>,
    snapshot: SnapshotSpace,
}

#[derive(Deserialize)]
struct VolumeRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    aggregates: Vec<NamedRef>,
    #[serde(default)]
    space: VolumeSpace,
}

impl VolumeRecord {
    fn aggr_name(&self) -> String {
        self.aggregates
            .first()
            .map(|a| a.name.clone())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct CounterProperty {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct CounterValue {
    name: String,
    #[serde(default)]
    value: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct CounterRow {
    #[serde(default)]
    id: String,
    #[serde(default)]
    properties: Vec<CounterProperty>,
    #[serde(default)]
    counters: Vec<CounterValue>,
}

impl CounterRow {
    fn object_name(&self) -> String {
        self.properties
            .iter()
            .find(|p| p.name == "name")
            .map(|p| raw_string(&p.value))
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Keeps numbers and strings as their textual form; everything else is empty.
fn raw_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn opt_raw_string(value: &Option<serde_json::Value>) -> String {
    value.as_ref().map(raw_string).unwrap_or_default()
}

impl From<DiskRecord> for DiskInfo {
    fn from(record: DiskRecord) -> Self {
        DiskInfo {
            online: !matches!(record.state.as_str(), "broken" | "removed" | "maintenance"),
            spare: record.container_type == "spare",
            prefailed: record.state == "copy",
            name: record.name,
        }
    }
}

impl From<VolumeRecord> for VolumeInfo {
    fn from(record: VolumeRecord) -> Self {
        VolumeInfo {
            aggr: record.aggr_name(),
            size_total: opt_raw_string(&record.space.size),
            size_used: opt_raw_string(&record.space.used),
            size_free: opt_raw_string(&record.space.available),
            snap_percent_used: opt_raw_string(&record.space.snapshot.used_percent),
            snap_percent_reserve: opt_raw_string(&record.space.snapshot.reserve_percent),
            state: record.state,
            name: record.name,
        }
    }
}

fn flatten_rows(rows: Vec<CounterRow>) -> Vec<PerfCounter> {
    let mut out = Vec::new();
    for row in rows {
        let object_name = row.object_name();
        for counter in row.counters {
            // Array counters (histograms) have no scalar value
            let Some(value) = counter.value.as_ref() else {
                continue;
            };
            out.push(PerfCounter {
                object_name: object_name.clone(),
                counter: counter.name,
                value: raw_string(value),
            });
        }
    }
    out
}

impl RestClient {
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OntapError> {
        let url = format!("{}{}", self.base_url, path);
        if self.debug {
            debug!("GET {}", url);
        }

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| OntapError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(OntapError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| OntapError::Http {
            url: url.clone(),
            source,
        })?;
        if self.debug {
            debug!("Response from {} ({} bytes): {}", url, body.len(), body);
        }

        serde_json::from_str(&body).map_err(|e| OntapError::Decode {
            url,
            message: e.to_string(),
        })
    }

    async fn counter_rows(&self, table: &str) -> Result<Vec<PerfCounter>, OntapError> {
        let path = format!(
            "/api/cluster/counter/tables/{}/rows?fields=properties,counters&max_records={}",
            table, MAX_LIST_RECORDS
        );
        let rows: Records<CounterRow> = self.get(&path).await?;
        Ok(flatten_rows(rows.records))
    }
}

#[async_trait]
impl OntapApi for RestClient {
    async fn cluster_identity(&self) -> Result<ClusterIdentity, OntapError> {
        let record: ClusterRecord = self.get("/api/cluster?fields=name").await?;
        Ok(ClusterIdentity {
            cluster_name: record.name,
        })
    }

    async fn disk_perf(&self) -> Result<Vec<PerfCounter>, OntapError> {
        self.counter_rows(DISK_COUNTER_TABLE).await
    }

    async fn disk_info(&self) -> Result<Vec<DiskInfo>, OntapError> {
        let path = format!(
            "/api/storage/disks?fields=name,state,container_type&max_records={}",
            MAX_LIST_RECORDS
        );
        let disks: Records<DiskRecord> = self.get(&path).await?;
        Ok(disks.records.into_iter().map(DiskInfo::from).collect())
    }

    async fn volume_to_aggr_map(&self) -> Result<VolumeAggrMap, OntapError> {
        let path = format!(
            "/api/storage/volumes?fields=name,aggregates.name&max_records={}",
            MAX_LIST_RECORDS
        );
        let volumes: Records<VolumeRecord> = self.get(&path).await?;
        Ok(volumes
            .records
            .into_iter()
            .map(|v| {
                let aggr = v.aggr_name();
                (v.name, aggr)
            })
            .collect())
    }

    async fn volume_perf(&self) -> Result<Vec<PerfCounter>, OntapError> {
        self.counter_rows(VOLUME_COUNTER_TABLE).await
    }

    async fn volume_info(&self, max_records: usize) -> Result<Vec<VolumeInfo>, OntapError> {
        let path = format!(
            "/api/storage/volumes?fields=name,state,aggregates.name,space.size,space.used,\
             space.available,space.snapshot.used_percent,space.snapshot.reserve_percent\
             &max_records={}",
            max_records
        );
        let volumes: Records<VolumeRecord> = self.get(&path).await?;
        Ok(volumes.records.into_iter().map(VolumeInfo::from).collect())
    }

    async fn aggr_perf(&self) -> Result<Vec<PerfCounter>, OntapError> {
        self.counter_rows(AGGR_COUNTER_TABLE).await
    }
}
