//! ONTAP management API capability.
//!
//! The collectors only see the [`OntapApi`] trait and obtain a fresh client for
//! every unit of work through a [`Connector`]. Two backends are provided:
//! - [`rest::RestConnector`]: HTTPS REST client for a live cluster
//! - [`fixture::FixtureConnector`]: canned data from a file or memory

pub mod fixture;
pub mod rest;

use ahash::AHashMap as HashMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use fixture::{Endpoint, FixtureConnector, FixtureData};
pub use rest::RestConnector;

/// Volume name to owning aggregate name.
pub type VolumeAggrMap = HashMap<String, String>;

/// Errors returned by backend calls.
#[derive(Debug, thiserror::Error)]
pub enum OntapError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Failed to load test data from {path}: {message}")]
    Fixture { path: String, message: String },

    #[error("{0} unavailable")]
    Unavailable(Endpoint),
}

/// Cluster-level identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterIdentity {
    pub cluster_name: String,
}

/// One performance counter reading for one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerfCounter {
    pub object_name: String,
    pub counter: String,
    pub value: String,
}

impl PerfCounter {
    pub fn new(object_name: &str, counter: &str, value: &str) -> Self {
        Self {
            object_name: object_name.to_string(),
            counter: counter.to_string(),
            value: value.to_string(),
        }
    }
}

/// Disk state record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskInfo {
    pub name: String,
    pub online: bool,
    pub spare: bool,
    pub prefailed: bool,
}

/// Volume state and space record. Numeric fields are kept as reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeInfo {
    pub name: String,
    pub aggr: String,
    pub state: String,
    pub size_total: String,
    pub size_used: String,
    pub size_free: String,
    pub snap_percent_used: String,
    pub snap_percent_reserve: String,
}

/// Read-only operations the exporter needs from the array.
#[async_trait]
pub trait OntapApi: Send + Sync {
    async fn cluster_identity(&self) -> Result<ClusterIdentity, OntapError>;

    async fn disk_perf(&self) -> Result<Vec<PerfCounter>, OntapError>;

    async fn disk_info(&self) -> Result<Vec<DiskInfo>, OntapError>;

    async fn volume_to_aggr_map(&self) -> Result<VolumeAggrMap, OntapError>;

    async fn volume_perf(&self) -> Result<Vec<PerfCounter>, OntapError>;

    /// Fetches at most `max_records` volumes.
    async fn volume_info(&self, max_records: usize) -> Result<Vec<VolumeInfo>, OntapError>;

    async fn aggr_perf(&self) -> Result<Vec<PerfCounter>, OntapError>;
}

/// Opens independent backend clients.
///
/// Every call returns a new client; nothing is pooled or shared between
/// collectors.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn OntapApi>, OntapError>;
}
