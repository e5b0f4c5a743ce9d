// One fetcher per resource kind: list everything, normalize each object.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::CronJob;
use k8s_openapi::api::core::v1::{
    ConfigMap, Event, Node, PersistentVolume, Pod, ResourceQuota, Secret,
};
use k8s_openapi::api::networking::v1::{Ingress, NetworkPolicy};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, ObjectMeta};
use kube::Resource;
use serde::de::DeserializeOwned;

use super::control_plane::ControlPlane;
use crate::error::FetchError;
use crate::models::k8s::*;
use crate::models::snapshot::{ResourceKind, ResourceRecords};
use crate::normalize::{age_of, extract_roles, image_type, name_of, namespace_of, UNKNOWN};

const NOT_AVAILABLE: &str = "N/A";
const UNBOUND: &str = "Unbound";
const NO_OWNER: &str = "None";
const DEFAULT_VOLUME_MODE: &str = "Filesystem";

/// Lists and normalizes every object of `kind`.
///
/// `now` is the capture time shared by the whole snapshot.
pub async fn fetch<C: ControlPlane>(
    plane: &C,
    kind: ResourceKind,
    now: DateTime<Utc>,
) -> Result<ResourceRecords, FetchError> {
    let records = match kind {
        ResourceKind::ApiResources => {
            let resources = plane
                .api_resources()
                .await
                .map_err(|e| FetchError::new(kind, e))?;
            ResourceRecords::ApiResources(resources.iter().map(api_resource_record).collect())
        }
        ResourceKind::Deployments => ResourceRecords::Deployments(
            list::<_, Deployment>(plane, kind)
                .await?
                .iter()
                .map(|d| deployment_record(d, now))
                .collect(),
        ),
        ResourceKind::Pods => ResourceRecords::Pods(
            list::<_, Pod>(plane, kind)
                .await?
                .iter()
                .map(|p| pod_record(p, now))
                .collect(),
        ),
        ResourceKind::Nodes => ResourceRecords::Nodes(
            list::<_, Node>(plane, kind)
                .await?
                .iter()
                .map(|n| node_record(n, now))
                .collect(),
        ),
        ResourceKind::ReplicaSets => ResourceRecords::ReplicaSets(
            list::<_, ReplicaSet>(plane, kind)
                .await?
                .iter()
                .map(|rs| replica_set_record(rs, now))
                .collect(),
        ),
        ResourceKind::PersistentVolumes => ResourceRecords::PersistentVolumes(
            list::<_, PersistentVolume>(plane, kind)
                .await?
                .iter()
                .map(|pv| persistent_volume_record(pv, now))
                .collect(),
        ),
        ResourceKind::Secrets => ResourceRecords::Secrets(
            list::<_, Secret>(plane, kind)
                .await?
                .iter()
                .map(|s| namespaced_name(&s.metadata))
                .collect(),
        ),
        ResourceKind::Autoscalers => ResourceRecords::Autoscalers(
            list::<_, HorizontalPodAutoscaler>(plane, kind)
                .await?
                .iter()
                .map(hpa_record)
                .collect(),
        ),
        ResourceKind::ConfigMaps => ResourceRecords::ConfigMaps(
            list::<_, ConfigMap>(plane, kind)
                .await?
                .iter()
                .map(|cm| namespaced_name(&cm.metadata))
                .collect(),
        ),
        ResourceKind::CronJobs => ResourceRecords::CronJobs(
            list::<_, CronJob>(plane, kind)
                .await?
                .iter()
                .map(cron_job_record)
                .collect(),
        ),
        ResourceKind::ResourceQuotas => ResourceRecords::ResourceQuotas(
            list::<_, ResourceQuota>(plane, kind)
                .await?
                .iter()
                .map(resource_quota_record)
                .collect(),
        ),
        ResourceKind::Events => ResourceRecords::Events(
            list::<_, Event>(plane, kind)
                .await?
                .iter()
                .map(event_record)
                .collect(),
        ),
        ResourceKind::NetworkPolicies => ResourceRecords::NetworkPolicies(
            list::<_, NetworkPolicy>(plane, kind)
                .await?
                .iter()
                .map(|np| namespaced_name(&np.metadata))
                .collect(),
        ),
        ResourceKind::CustomResourceDefinitions => ResourceRecords::CustomResourceDefinitions(
            list::<_, CustomResourceDefinition>(plane, kind)
                .await?
                .iter()
                .map(|crd| CrdRecord {
                    name: name_of(&crd.metadata),
                })
                .collect(),
        ),
        ResourceKind::StatefulSets => ResourceRecords::StatefulSets(
            list::<_, StatefulSet>(plane, kind)
                .await?
                .iter()
                .map(stateful_set_record)
                .collect(),
        ),
        ResourceKind::Ingresses => ResourceRecords::Ingresses(
            list::<_, Ingress>(plane, kind)
                .await?
                .iter()
                .map(ingress_record)
                .collect(),
        ),
    };

    Ok(records)
}

async fn list<C, K>(plane: &C, kind: ResourceKind) -> Result<Vec<K>, FetchError>
where
    C: ControlPlane,
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    plane
        .list_all::<K>()
        .await
        .map_err(|e| FetchError::new(kind, e))
}

// ── normalizers ───────────────────────────────────────────────────────────────

fn api_resource_record(resource: &APIResource) -> ApiResourceRecord {
    ApiResourceRecord {
        name: resource.name.clone(),
        kind: resource.kind.clone(),
    }
}

fn namespaced_name(meta: &ObjectMeta) -> NamespacedName {
    NamespacedName {
        name: name_of(meta),
        namespace: namespace_of(meta),
    }
}

fn or_unknown(value: Option<&String>) -> String {
    value.cloned().unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn deployment_record(dep: &Deployment, now: DateTime<Utc>) -> DeploymentRecord {
    let spec = dep.spec.as_ref();
    let containers = spec
        .and_then(|s| s.template.spec.as_ref())
        .map(|p| p.containers.as_slice())
        .unwrap_or_default();

    DeploymentRecord {
        name: name_of(&dep.metadata),
        namespace: namespace_of(&dep.metadata),
        replicas: spec.and_then(|s| s.replicas).unwrap_or(0),
        image_types: containers
            .iter()
            .map(|c| image_type(c.image.as_deref().unwrap_or_default()).to_string())
            .collect(),
        ports: containers
            .iter()
            .filter_map(|c| c.ports.as_ref())
            .flatten()
            .map(|p| p.container_port)
            .collect(),
        age: age_of(&dep.metadata, now),
    }
}

pub fn pod_record(pod: &Pod, now: DateTime<Utc>) -> PodRecord {
    PodRecord {
        name: name_of(&pod.metadata),
        namespace: namespace_of(&pod.metadata),
        containers: pod
            .spec
            .iter()
            .flat_map(|s| s.containers.iter().map(|c| c.name.clone()))
            .collect(),
        status: or_unknown(pod.status.as_ref().and_then(|s| s.phase.as_ref())),
        age: age_of(&pod.metadata, now),
    }
}

/// `status` keeps the type of the last reported condition, which is what the
/// assistant has always been shown. `ready` carries the `Ready` condition.
pub fn node_record(node: &Node, now: DateTime<Utc>) -> NodeRecord {
    let status = node.status.as_ref();
    let conditions = status
        .and_then(|s| s.conditions.as_deref())
        .unwrap_or_default();

    NodeRecord {
        name: name_of(&node.metadata),
        status: or_unknown(conditions.last().map(|c| &c.type_)),
        ready: or_unknown(
            conditions
                .iter()
                .find(|c| c.type_ == "Ready")
                .map(|c| &c.status),
        ),
        addresses: status
            .and_then(|s| s.addresses.as_ref())
            .map(|addrs| addrs.iter().map(|a| a.address.clone()).collect())
            .unwrap_or_default(),
        roles: extract_roles(&node.metadata.labels.clone().unwrap_or_default()),
        age: age_of(&node.metadata, now),
        version: or_unknown(
            status
                .and_then(|s| s.node_info.as_ref())
                .map(|info| &info.kubelet_version),
        ),
    }
}

pub fn replica_set_record(rs: &ReplicaSet, now: DateTime<Utc>) -> ReplicaSetRecord {
    let spec = rs.spec.as_ref();
    let status = rs.status.as_ref();

    ReplicaSetRecord {
        name: name_of(&rs.metadata),
        namespace: namespace_of(&rs.metadata),
        replicas: spec.and_then(|s| s.replicas).unwrap_or(0),
        available_replicas: status.and_then(|s| s.available_replicas).unwrap_or(0),
        ready_replicas: status.and_then(|s| s.ready_replicas).unwrap_or(0),
        age: age_of(&rs.metadata, now),
        labels: rs.metadata.labels.clone().unwrap_or_default(),
        selector: spec
            .and_then(|s| s.selector.match_labels.clone())
            .unwrap_or_default(),
        owner: rs
            .metadata
            .owner_references
            .as_ref()
            .and_then(|refs| refs.first())
            .map(|owner| owner.name.clone())
            .unwrap_or_else(|| NO_OWNER.to_string()),
    }
}

pub fn persistent_volume_record(pv: &PersistentVolume, now: DateTime<Utc>) -> PersistentVolumeRecord {
    let spec = pv.spec.as_ref();

    PersistentVolumeRecord {
        name: name_of(&pv.metadata),
        status: or_unknown(pv.status.as_ref().and_then(|s| s.phase.as_ref())),
        capacity: or_unknown(
            spec.and_then(|s| s.capacity.as_ref())
                .and_then(|c| c.get("storage"))
                .map(|q| &q.0),
        ),
        storage_class: spec
            .and_then(|s| s.storage_class_name.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        reclaim_policy: or_unknown(spec.and_then(|s| s.persistent_volume_reclaim_policy.as_ref())),
        access_modes: spec.and_then(|s| s.access_modes.clone()).unwrap_or_default(),
        volume_mode: spec
            .and_then(|s| s.volume_mode.clone())
            .unwrap_or_else(|| DEFAULT_VOLUME_MODE.to_string()),
        claim: spec
            .and_then(|s| s.claim_ref.as_ref())
            .map(|claim| claim.name.clone().unwrap_or_default())
            .unwrap_or_else(|| UNBOUND.to_string()),
        age: age_of(&pv.metadata, now),
    }
}

pub fn hpa_record(hpa: &HorizontalPodAutoscaler) -> HpaRecord {
    let spec = hpa.spec.as_ref();
    HpaRecord {
        name: name_of(&hpa.metadata),
        namespace: namespace_of(&hpa.metadata),
        min_replicas: spec.and_then(|s| s.min_replicas).unwrap_or(0),
        max_replicas: spec.map(|s| s.max_replicas).unwrap_or(0),
    }
}

pub fn cron_job_record(cronjob: &CronJob) -> CronJobRecord {
    CronJobRecord {
        name: name_of(&cronjob.metadata),
        namespace: namespace_of(&cronjob.metadata),
        schedule: or_unknown(cronjob.spec.as_ref().map(|s| &s.schedule)),
    }
}

pub fn resource_quota_record(rq: &ResourceQuota) -> ResourceQuotaRecord {
    ResourceQuotaRecord {
        name: name_of(&rq.metadata),
        namespace: namespace_of(&rq.metadata),
        hard: rq
            .spec
            .as_ref()
            .and_then(|s| s.hard.as_ref())
            .map(|hard| hard.iter().map(|(k, q)| (k.clone(), q.0.clone())).collect())
            .unwrap_or_default(),
    }
}

pub fn event_record(event: &Event) -> EventRecord {
    EventRecord {
        name: name_of(&event.metadata),
        namespace: namespace_of(&event.metadata),
        message: event.message.clone().unwrap_or_default(),
        reason: or_unknown(event.reason.as_ref()),
        event_type: or_unknown(event.type_.as_ref()),
    }
}

pub fn stateful_set_record(ss: &StatefulSet) -> StatefulSetRecord {
    StatefulSetRecord {
        name: name_of(&ss.metadata),
        namespace: namespace_of(&ss.metadata),
        replicas: ss.spec.as_ref().and_then(|s| s.replicas).unwrap_or(0),
    }
}

/// Host of the first rule; "N/A" without rules or for a host-less first rule.
pub fn ingress_record(ingress: &Ingress) -> IngressRecord {
    IngressRecord {
        name: name_of(&ingress.metadata),
        namespace: namespace_of(&ingress.metadata),
        host: ingress
            .spec
            .as_ref()
            .and_then(|s| s.rules.as_ref())
            .and_then(|rules| rules.first())
            .and_then(|rule| rule.host.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
    }
}
