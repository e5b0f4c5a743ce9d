// Test doubles shared by the command modules.
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::ai::{CompletionProvider, Prompt};
use super::control_plane::ControlPlane;
use super::kubeconfig::{ClusterContexts, ContextSource};
use crate::error::{ClientError, ContextError, ProviderError};
use crate::models::k8s::KubeContext;

const API_RESOURCES: &str = "APIResource";

/// Serves canned objects per Kubernetes kind; unknown kinds list as empty.
#[derive(Clone, Default)]
pub struct FakeControlPlane {
    objects: Arc<HashMap<String, Result<Vec<Value>, String>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, kind: &str, entry: Result<Vec<Value>, String>) -> Self {
        Arc::make_mut(&mut self.objects).insert(kind.to_string(), entry);
        self
    }

    pub fn with<K: Resource<DynamicType = ()>>(self, objects: Vec<Value>) -> Self {
        let kind = K::kind(&()).to_string();
        self.set(&kind, Ok(objects))
    }

    pub fn failing<K: Resource<DynamicType = ()>>(self, cause: &str) -> Self {
        let kind = K::kind(&()).to_string();
        self.set(&kind, Err(cause.to_string()))
    }

    pub fn with_api_resources(self, resources: Vec<Value>) -> Self {
        self.set(API_RESOURCES, Ok(resources))
    }

    pub fn failing_api_resources(self, cause: &str) -> Self {
        self.set(API_RESOURCES, Err(cause.to_string()))
    }

    /// Number of listing calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn take<T: DeserializeOwned>(&self, kind: &str) -> Result<Vec<T>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.objects.get(kind) {
            None => Ok(Vec::new()),
            Some(Err(cause)) => Err(ClientError::Unavailable(cause.clone())),
            Some(Ok(values)) => values
                .iter()
                .map(|v| serde_json::from_value(v.clone()).map_err(ClientError::from))
                .collect(),
        }
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn list_all<K>(&self) -> Result<Vec<K>, ClientError>
    where
        K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    {
        self.take(&K::kind(&()))
    }

    async fn api_resources(&self) -> Result<Vec<APIResource>, ClientError> {
        self.take(API_RESOURCES)
    }
}

/// Fixed context list, or a fixed failure. Remembers which thread read it.
#[derive(Default)]
pub struct FakeContexts {
    contexts: Option<ClusterContexts>,
    read_on: Mutex<Option<ThreadId>>,
}

impl FakeContexts {
    pub fn single(name: &str) -> Self {
        Self {
            contexts: Some(ClusterContexts {
                current: name.to_string(),
                contexts: vec![KubeContext {
                    name: name.to_string(),
                    cluster: format!("{name}-cluster"),
                    user: format!("{name}-user"),
                    namespace: Some("default".to_string()),
                    server_url: Some(format!("https://{name}.example:6443")),
                }],
            }),
            read_on: Mutex::new(None),
        }
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Thread of the most recent `contexts()` call.
    pub fn read_on(&self) -> Option<ThreadId> {
        *self.read_on.lock().unwrap()
    }
}

impl ContextSource for FakeContexts {
    fn contexts(&self) -> Result<ClusterContexts, ContextError> {
        *self.read_on.lock().unwrap() = Some(std::thread::current().id());
        self.contexts.clone().ok_or(ContextError::NotFound)
    }
}

/// Records every prompt and replies with a canned answer or error.
#[derive(Default)]
pub struct FakeProvider {
    pub answer: Option<String>,
    pub prompts: Mutex<Vec<Prompt>>,
}

impl FakeProvider {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.answer.clone().ok_or(ProviderError::Status {
            status: 429,
            body: "rate limited".to_string(),
        })
    }
}

/// Answers only after `delay`; flips `dropped` when the pending call is dropped.
pub struct SlowProvider {
    pub delay: Duration,
    pub dropped: Arc<AtomicBool>,
}

impl SlowProvider {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            dropped: Arc::new(AtomicBool::new(false)),
        }
    }
}

struct DropFlag {
    flag: Arc<AtomicBool>,
    finished: bool,
}

impl Drop for DropFlag {
    fn drop(&mut self) {
        if !self.finished {
            self.flag.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl CompletionProvider for SlowProvider {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, ProviderError> {
        let mut guard = DropFlag {
            flag: Arc::clone(&self.dropped),
            finished: false,
        };
        tokio::time::sleep(self.delay).await;
        guard.finished = true;
        Ok("too late".to_string())
    }
}
