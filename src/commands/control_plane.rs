// Read-only access to the cluster API.
use std::fmt::Debug;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::api::{Api, ListParams};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;

use crate::error::ClientError;

/// Default page size when listing; the server may return fewer.
pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// The two capabilities snapshot assembly needs from a cluster.
#[async_trait]
pub trait ControlPlane: Send + Sync + 'static {
    /// Lists every object of `K` across all namespaces.
    async fn list_all<K>(&self) -> Result<Vec<K>, ClientError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static;

    /// Resources served by the core `v1` API group.
    async fn api_resources(&self) -> Result<Vec<APIResource>, ClientError>;
}

/// [`ControlPlane`] backed by a live `kube::Client`.
#[derive(Clone)]
pub struct KubeControlPlane {
    client: Client,
    page_size: u32,
}

impl KubeControlPlane {
    pub fn new(client: Client, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }
}

#[async_trait]
impl ControlPlane for KubeControlPlane {
    async fn list_all<K>(&self) -> Result<Vec<K>, ClientError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let mut items = Vec::new();
        let mut params = ListParams::default().limit(self.page_size);

        // Follow continue tokens until the server reports the list is complete.
        loop {
            let page = api.list(&params).await?;
            items.extend(page.items);
            match page.metadata.continue_.filter(|token| !token.is_empty()) {
                Some(token) => params = params.continue_token(&token),
                None => break,
            }
        }

        log::debug!("listed {} {}", items.len(), K::kind(&()));
        Ok(items)
    }

    async fn api_resources(&self) -> Result<Vec<APIResource>, ClientError> {
        let list = self.client.list_core_api_resources("v1").await?;
        Ok(list.resources)
    }
}
