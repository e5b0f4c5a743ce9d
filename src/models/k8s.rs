// Normalized per-kind records that make up a cluster snapshot.
// Field names are the keys the assistant sees in the prompt.
use serde::Serialize;
use std::collections::BTreeMap;

/// Where a context points. Credentials never appear here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KubeContext {
    pub name: String,
    pub cluster: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// API server URL of the cluster the context points at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
}

/// One entry of the core API discovery document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResourceRecord {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeploymentRecord {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    /// Container image names with the tag stripped, one per container.
    #[serde(rename = "type")]
    pub image_types: Vec<String>,
    #[serde(rename = "port")]
    pub ports: Vec<i32>,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PodRecord {
    pub name: String,
    pub namespace: String,
    pub containers: Vec<String>,
    pub status: String,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub name: String,
    /// Type of the last reported condition.
    pub status: String,
    /// Status of the `Ready` condition.
    pub ready: String,
    pub addresses: Vec<String>,
    pub roles: String,
    pub age: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicaSetRecord {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub available_replicas: i32,
    pub ready_replicas: i32,
    pub age: String,
    pub labels: BTreeMap<String, String>,
    pub selector: BTreeMap<String, String>,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistentVolumeRecord {
    pub name: String,
    pub status: String,
    pub capacity: String,
    pub storage_class: String,
    pub reclaim_policy: String,
    pub access_modes: Vec<String>,
    pub volume_mode: String,
    pub claim: String,
    pub age: String,
}

/// Name-only record for kinds whose contents are not exposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamespacedName {
    pub name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HpaRecord {
    pub name: String,
    pub namespace: String,
    pub min_replicas: i32,
    pub max_replicas: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CronJobRecord {
    pub name: String,
    pub namespace: String,
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceQuotaRecord {
    pub name: String,
    pub namespace: String,
    pub hard: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub name: String,
    pub namespace: String,
    pub message: String,
    pub reason: String,
    #[serde(rename = "type")]
    pub event_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrdRecord {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatefulSetRecord {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngressRecord {
    pub name: String,
    pub namespace: String,
    pub host: String,
}
