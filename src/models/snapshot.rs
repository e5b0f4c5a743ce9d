use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::k8s::*;

/// Every kind of object captured in a snapshot, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ResourceKind {
    #[serde(rename = "cluster_info")]
    ApiResources,
    #[serde(rename = "deployments")]
    Deployments,
    #[serde(rename = "pods")]
    Pods,
    #[serde(rename = "nodes")]
    Nodes,
    #[serde(rename = "replicasets")]
    ReplicaSets,
    #[serde(rename = "pvs")]
    PersistentVolumes,
    #[serde(rename = "secrets")]
    Secrets,
    #[serde(rename = "hpas")]
    Autoscalers,
    #[serde(rename = "configmaps")]
    ConfigMaps,
    #[serde(rename = "cronjobs")]
    CronJobs,
    #[serde(rename = "resource_quotas")]
    ResourceQuotas,
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "network_policies")]
    NetworkPolicies,
    #[serde(rename = "crds")]
    CustomResourceDefinitions,
    #[serde(rename = "statefulsets")]
    StatefulSets,
    #[serde(rename = "ingresses")]
    Ingresses,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 16] = [
        ResourceKind::ApiResources,
        ResourceKind::Deployments,
        ResourceKind::Pods,
        ResourceKind::Nodes,
        ResourceKind::ReplicaSets,
        ResourceKind::PersistentVolumes,
        ResourceKind::Secrets,
        ResourceKind::Autoscalers,
        ResourceKind::ConfigMaps,
        ResourceKind::CronJobs,
        ResourceKind::ResourceQuotas,
        ResourceKind::Events,
        ResourceKind::NetworkPolicies,
        ResourceKind::CustomResourceDefinitions,
        ResourceKind::StatefulSets,
        ResourceKind::Ingresses,
    ];

    /// Snapshot key, also accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::ApiResources => "cluster_info",
            ResourceKind::Deployments => "deployments",
            ResourceKind::Pods => "pods",
            ResourceKind::Nodes => "nodes",
            ResourceKind::ReplicaSets => "replicasets",
            ResourceKind::PersistentVolumes => "pvs",
            ResourceKind::Secrets => "secrets",
            ResourceKind::Autoscalers => "hpas",
            ResourceKind::ConfigMaps => "configmaps",
            ResourceKind::CronJobs => "cronjobs",
            ResourceKind::ResourceQuotas => "resource_quotas",
            ResourceKind::Events => "events",
            ResourceKind::NetworkPolicies => "network_policies",
            ResourceKind::CustomResourceDefinitions => "crds",
            ResourceKind::StatefulSets => "statefulsets",
            ResourceKind::Ingresses => "ingresses",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized records of one kind. Serializes as a bare array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResourceRecords {
    ApiResources(Vec<ApiResourceRecord>),
    Deployments(Vec<DeploymentRecord>),
    Pods(Vec<PodRecord>),
    Nodes(Vec<NodeRecord>),
    ReplicaSets(Vec<ReplicaSetRecord>),
    PersistentVolumes(Vec<PersistentVolumeRecord>),
    Secrets(Vec<NamespacedName>),
    Autoscalers(Vec<HpaRecord>),
    ConfigMaps(Vec<NamespacedName>),
    CronJobs(Vec<CronJobRecord>),
    ResourceQuotas(Vec<ResourceQuotaRecord>),
    Events(Vec<EventRecord>),
    NetworkPolicies(Vec<NamespacedName>),
    CustomResourceDefinitions(Vec<CrdRecord>),
    StatefulSets(Vec<StatefulSetRecord>),
    Ingresses(Vec<IngressRecord>),
}

impl ResourceRecords {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRecords::ApiResources(_) => ResourceKind::ApiResources,
            ResourceRecords::Deployments(_) => ResourceKind::Deployments,
            ResourceRecords::Pods(_) => ResourceKind::Pods,
            ResourceRecords::Nodes(_) => ResourceKind::Nodes,
            ResourceRecords::ReplicaSets(_) => ResourceKind::ReplicaSets,
            ResourceRecords::PersistentVolumes(_) => ResourceKind::PersistentVolumes,
            ResourceRecords::Secrets(_) => ResourceKind::Secrets,
            ResourceRecords::Autoscalers(_) => ResourceKind::Autoscalers,
            ResourceRecords::ConfigMaps(_) => ResourceKind::ConfigMaps,
            ResourceRecords::CronJobs(_) => ResourceKind::CronJobs,
            ResourceRecords::ResourceQuotas(_) => ResourceKind::ResourceQuotas,
            ResourceRecords::Events(_) => ResourceKind::Events,
            ResourceRecords::NetworkPolicies(_) => ResourceKind::NetworkPolicies,
            ResourceRecords::CustomResourceDefinitions(_) => {
                ResourceKind::CustomResourceDefinitions
            }
            ResourceRecords::StatefulSets(_) => ResourceKind::StatefulSets,
            ResourceRecords::Ingresses(_) => ResourceKind::Ingresses,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ResourceRecords::ApiResources(v) => v.len(),
            ResourceRecords::Deployments(v) => v.len(),
            ResourceRecords::Pods(v) => v.len(),
            ResourceRecords::Nodes(v) => v.len(),
            ResourceRecords::ReplicaSets(v) => v.len(),
            ResourceRecords::PersistentVolumes(v) => v.len(),
            ResourceRecords::Secrets(v)
            | ResourceRecords::ConfigMaps(v)
            | ResourceRecords::NetworkPolicies(v) => v.len(),
            ResourceRecords::Autoscalers(v) => v.len(),
            ResourceRecords::CronJobs(v) => v.len(),
            ResourceRecords::ResourceQuotas(v) => v.len(),
            ResourceRecords::Events(v) => v.len(),
            ResourceRecords::CustomResourceDefinitions(v) => v.len(),
            ResourceRecords::StatefulSets(v) => v.len(),
            ResourceRecords::Ingresses(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Point-in-time, read-only view of the cluster handed to the assistant.
///
/// Each kind appears either under its own key (possibly as an empty array)
/// or in `fetch_errors`, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSnapshot {
    pub current_context: String,
    pub all_contexts: Vec<String>,
    /// Cluster, API server and default namespace behind `current_context`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_context: Option<KubeContext>,
    #[serde(flatten)]
    pub resources: BTreeMap<ResourceKind, ResourceRecords>,
    #[serde(rename = "fetch_errors", skip_serializing_if = "BTreeMap::is_empty")]
    pub fetch_errors: BTreeMap<ResourceKind, String>,
}

impl ClusterSnapshot {
    pub fn new(current_context: String, all_contexts: Vec<String>) -> Self {
        Self {
            current_context,
            all_contexts,
            active_context: None,
            resources: BTreeMap::new(),
            fetch_errors: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, records: ResourceRecords) {
        let kind = records.kind();
        self.fetch_errors.remove(&kind);
        self.resources.insert(kind, records);
    }

    pub fn record_failure(&mut self, kind: ResourceKind, cause: String) {
        self.resources.remove(&kind);
        self.fetch_errors.insert(kind, cause);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ResourceRecords> {
        self.resources.get(&kind)
    }

    pub fn failure(&self, kind: ResourceKind) -> Option<&str> {
        self.fetch_errors.get(&kind).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pod(name: &str) -> PodRecord {
        PodRecord {
            name: name.to_string(),
            namespace: "default".to_string(),
            containers: vec!["app".to_string()],
            status: "Running".to_string(),
            age: "1m".to_string(),
        }
    }

    #[test]
    fn kind_keys_round_trip_through_parse() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::parse("widgets"), None);
    }

    #[test]
    fn serializes_kinds_as_top_level_arrays() {
        let mut snapshot = ClusterSnapshot::new("dev".into(), vec!["dev".into(), "prod".into()]);
        snapshot.insert(ResourceRecords::Pods(vec![pod("web-1")]));
        snapshot.insert(ResourceRecords::Nodes(vec![]));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["currentContext"], "dev");
        assert_eq!(json["allContexts"], serde_json::json!(["dev", "prod"]));
        assert_eq!(json["pods"][0]["name"], "web-1");
        assert_eq!(json["nodes"], serde_json::json!([]));
        assert!(json.get("fetch_errors").is_none());
    }

    #[test]
    fn active_context_describes_cluster_without_credentials() {
        let mut snapshot = ClusterSnapshot::new("dev".into(), vec!["dev".into()]);
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("activeContext").is_none());

        snapshot.active_context = Some(KubeContext {
            name: "dev".into(),
            cluster: "dev-cluster".into(),
            user: "dev-user".into(),
            namespace: Some("apps".into()),
            server_url: Some("https://dev.example:6443".into()),
        });
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json["activeContext"],
            serde_json::json!({
                "name": "dev",
                "cluster": "dev-cluster",
                "user": "dev-user",
                "namespace": "apps",
                "serverUrl": "https://dev.example:6443"
            })
        );
    }

    #[test]
    fn failure_replaces_records_for_that_kind() {
        let mut snapshot = ClusterSnapshot::new("dev".into(), vec![]);
        snapshot.insert(ResourceRecords::Pods(vec![pod("web-1")]));
        snapshot.record_failure(ResourceKind::Pods, "forbidden".into());

        assert!(snapshot.get(ResourceKind::Pods).is_none());
        assert_eq!(snapshot.failure(ResourceKind::Pods), Some("forbidden"));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json.get("pods").is_none());
        assert_eq!(json["fetch_errors"]["pods"], "forbidden");
    }

    #[test]
    fn deployment_fields_use_prompt_names() {
        let record = DeploymentRecord {
            name: "api".into(),
            namespace: "default".into(),
            replicas: 2,
            image_types: vec!["nginx".into()],
            ports: vec![80],
            age: "3d".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], serde_json::json!(["nginx"]));
        assert_eq!(json["port"], serde_json::json!([80]));
    }
}
