// "Answer a question about the current cluster state."
use std::sync::Arc;

use chrono::Utc;

use super::ai::CompletionProvider;
use super::assistant::{self, DEFAULT_MAX_CONTEXT_CHARS};
use super::control_plane::ControlPlane;
use super::kubeconfig::ContextSource;
use super::query_log::QueryLog;
use super::snapshot::{self, SnapshotConfig};
use crate::error::QueryError;

#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub snapshot: SnapshotConfig,
    /// Cap on the serialized snapshot embedded in the prompt.
    pub max_context_chars: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            snapshot: SnapshotConfig::default(),
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

/// Everything one request needs. Holds no per-request state.
pub struct Assistant<C> {
    plane: C,
    contexts: Arc<dyn ContextSource>,
    provider: Arc<dyn CompletionProvider>,
    config: AssistantConfig,
    query_log: Option<QueryLog>,
}

impl<C: ControlPlane + Clone> Assistant<C> {
    pub fn new(
        plane: C,
        contexts: Arc<dyn ContextSource>,
        provider: Arc<dyn CompletionProvider>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            plane,
            contexts,
            provider,
            config,
            query_log: None,
        }
    }

    pub fn with_query_log(mut self, query_log: QueryLog) -> Self {
        self.query_log = Some(query_log);
        self
    }

    /// Takes a fresh snapshot and asks the provider about it.
    ///
    /// A blank question is rejected before the cluster is touched.
    pub async fn ask(&self, question: &str) -> Result<String, QueryError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(QueryError::Validation("query must not be empty".to_string()));
        }

        log::info!("query: {question:?}");
        let snapshot =
            snapshot::assemble(&self.plane, Arc::clone(&self.contexts), &self.config.snapshot)
                .await?;
        let answer = assistant::answer(
            self.provider.as_ref(),
            &snapshot,
            question,
            self.config.max_context_chars,
        )
        .await?;

        if let Some(query_log) = &self.query_log {
            query_log.record(Utc::now(), question, &answer).await;
        }
        Ok(answer)
    }
}
