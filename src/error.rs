use thiserror::Error;

use crate::models::snapshot::ResourceKind;

/// Failure talking to the control plane for one listing call.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// A single resource kind could not be listed.
#[derive(Debug, Error)]
#[error("failed to list {kind}: {source}")]
pub struct FetchError {
    pub kind: ResourceKind,
    #[source]
    pub source: ClientError,
}

impl FetchError {
    pub fn new(kind: ResourceKind, source: impl Into<ClientError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

/// The configured-contexts source could not be read.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("no kubeconfig found")]
    NotFound,
    #[error("kubeconfig has no current context")]
    NoCurrentContext,
    #[error("context {0} is not defined in kubeconfig")]
    UnknownContext(String),
    #[error("failed to read kubeconfig: {0}")]
    Read(#[from] kube::config::KubeconfigError),
    #[error("failed to build cluster client: {0}")]
    Client(String),
}

/// Snapshot assembly aborted because a critical read failed.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("cluster context unavailable: {0}")]
    Context(#[from] ContextError),
    #[error("critical resource unavailable: {0}")]
    Critical(FetchError),
    #[error("fetch task did not complete: {0}")]
    Task(String),
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("completion request timed out")]
    Timeout,
    #[error("completion provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
    #[error("completion provider returned an empty answer")]
    Empty,
}

impl ProviderError {
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Request-level failure of "answer a question about the cluster".
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid question: {0}")]
    Validation(String),
    #[error("cluster data unavailable: {0}")]
    ClusterUnavailable(#[from] SnapshotError),
    #[error("assistant unavailable: {0}")]
    AssistantUnavailable(#[from] ProviderError),
}

/// Startup configuration that cannot be turned into a working service.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not set")]
    MissingApiKey(&'static str),
}
