//! File-backed ONTAP backend.
//!
//! Serves canned responses from a JSON or YAML document so the exporter can be
//! run and tested without a cluster. Individual endpoints can be marked as
//! failing to exercise the error paths.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    ClusterIdentity, Connector, DiskInfo, OntapApi, OntapError, PerfCounter, VolumeAggrMap,
    VolumeInfo,
};

/// Backend call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    ClusterIdentity,
    DiskPerf,
    DiskInfo,
    VolumeToAggrMap,
    VolumePerf,
    VolumeInfo,
    AggrPerf,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::ClusterIdentity => "cluster identity",
            Endpoint::DiskPerf => "disk performance",
            Endpoint::DiskInfo => "disk info",
            Endpoint::VolumeToAggrMap => "volume to aggregate map",
            Endpoint::VolumePerf => "volume performance",
            Endpoint::VolumeInfo => "volume info",
            Endpoint::AggrPerf => "aggregate performance",
        };
        f.write_str(name)
    }
}

/// Canned backend contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixtureData {
    pub cluster_name: String,
    pub disk_perf: Vec<PerfCounter>,
    pub disk_info: Vec<DiskInfo>,
    pub volume_aggr: Vec<(String, String)>,
    pub volume_perf: Vec<PerfCounter>,
    pub volume_info: Vec<VolumeInfo>,
    pub aggr_perf: Vec<PerfCounter>,
    /// Endpoints that return an error instead of data.
    pub failing: Vec<Endpoint>,
}

impl FixtureData {
    /// Loads fixture data from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self, OntapError> {
        debug!("Loading test data from: {}", path.display());

        let fixture_err = |message: String| OntapError::Fixture {
            path: path.display().to_string(),
            message,
        };

        let content = fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let data: FixtureData = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| fixture_err(e.to_string()))?,
            _ => serde_yaml::from_str(&content).map_err(|e| fixture_err(e.to_string()))?,
        };

        info!(
            "Loaded test data for cluster '{}' from {}",
            data.cluster_name,
            path.display()
        );
        Ok(data)
    }

    /// Marks `endpoint` as failing.
    pub fn failing(mut self, endpoint: Endpoint) -> Self {
        self.failing.push(endpoint);
        self
    }

    fn check(&self, endpoint: Endpoint) -> Result<(), OntapError> {
        if self.failing.contains(&endpoint) {
            Err(OntapError::Unavailable(endpoint))
        } else {
            Ok(())
        }
    }
}

/// Connector handing out clients over shared fixture data.
#[derive(Clone)]
pub struct FixtureConnector {
    data: Arc<FixtureData>,
    connections: Arc<AtomicUsize>,
}

impl FixtureConnector {
    pub fn new(data: FixtureData) -> Self {
        Self {
            data: Arc::new(data),
            connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, OntapError> {
        FixtureData::load(path).map(Self::new)
    }

    /// Number of clients opened so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

impl Connector for FixtureConnector {
    fn connect(&self) -> Result<Box<dyn OntapApi>, OntapError> {
        self.connections.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(FixtureClient {
            data: Arc::clone(&self.data),
        }))
    }
}

struct FixtureClient {
    data: Arc<FixtureData>,
}

#[async_trait]
impl OntapApi for FixtureClient {
    async fn cluster_identity(&self) -> Result<ClusterIdentity, OntapError> {
        self.data.check(Endpoint::ClusterIdentity)?;
        Ok(ClusterIdentity {
            cluster_name: self.data.cluster_name.clone(),
        })
    }

    async fn disk_perf(&self) -> Result<Vec<PerfCounter>, OntapError> {
        self.data.check(Endpoint::DiskPerf)?;
        Ok(self.data.disk_perf.clone())
    }

    async fn disk_info(&self) -> Result<Vec<DiskInfo>, OntapError> {
        self.data.check(Endpoint::DiskInfo)?;
        Ok(self.data.disk_info.clone())
    }

    async fn volume_to_aggr_map(&self) -> Result<VolumeAggrMap, OntapError> {
        self.data.check(Endpoint::VolumeToAggrMap)?;
        Ok(self.data.volume_aggr.iter().cloned().collect())
    }

    async fn volume_perf(&self) -> Result<Vec<PerfCounter>, OntapError> {
        self.data.check(Endpoint::VolumePerf)?;
        Ok(self.data.volume_perf.clone())
    }

    async fn volume_info(&self, max_records: usize) -> Result<Vec<VolumeInfo>, OntapError> {
        self.data.check(Endpoint::VolumeInfo)?;
        Ok(self.data.volume_info.iter().take(max_records).cloned().collect())
    }

    async fn aggr_perf(&self) -> Result<Vec<PerfCounter>, OntapError> {
        self.data.check(Endpoint::AggrPerf)?;
        Ok(self.data.aggr_perf.clone())
    }
}
