// Turns a snapshot plus a question into a bounded prompt and asks the provider.
use serde::Serialize;

use super::ai::{CompletionProvider, Prompt};
use crate::error::{ProviderError, QueryError, SnapshotError};
use crate::models::snapshot::ClusterSnapshot;

/// Answer the model must give when the snapshot does not cover the question.
pub const FALLBACK_ANSWER: &str = "I don't have that information.";

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 60_000;

const TRUNCATION_MARKER: &str = "\n... (cluster data truncated)";

fn system_instruction() -> String {
    format!(
        "You are an expert Kubernetes assistant. Answer the user's question using only \
         the cluster data supplied in the message. Do not guess or use outside knowledge \
         about this cluster. If the question is not about Kubernetes or cannot be answered \
         from the supplied data, respond with exactly: \"{FALLBACK_ANSWER}\""
    )
}

/// Serializes the snapshot, cut to at most `max_chars` characters.
fn cluster_data<T: Serialize>(snapshot: &T, max_chars: usize) -> Result<String, SnapshotError> {
    let data = serde_json::to_string_pretty(snapshot)?;

    if data.chars().count() <= max_chars {
        return Ok(data);
    }

    let keep = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let mut cut: String = data.chars().take(keep).collect();
    cut.push_str(TRUNCATION_MARKER);
    log::warn!(
        "assistant: cluster data truncated from {} to {} characters",
        data.chars().count(),
        cut.chars().count()
    );
    Ok(cut)
}

pub fn build_prompt(
    snapshot: &ClusterSnapshot,
    question: &str,
    max_chars: usize,
) -> Result<Prompt, SnapshotError> {
    let user = format!(
        "Here is the current state of the Kubernetes cluster:\n\n{}\n\nQuestion: {}",
        cluster_data(snapshot, max_chars)?,
        question.trim()
    );
    Ok(Prompt {
        system: system_instruction(),
        user,
    })
}

/// Asks `provider` about `snapshot`; the answer comes back trimmed.
///
/// A snapshot that cannot be encoded never reaches the provider. Provider
/// failures propagate, and an empty answer is a failure rather than a default.
pub async fn answer(
    provider: &dyn CompletionProvider,
    snapshot: &ClusterSnapshot,
    question: &str,
    max_chars: usize,
) -> Result<String, QueryError> {
    let prompt = build_prompt(snapshot, question, max_chars)?;
    let answer = provider.complete(&prompt).await?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(ProviderError::Empty.into());
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::FakeProvider;
    use crate::models::k8s::PodRecord;
    use crate::models::snapshot::ResourceRecords;

    fn snapshot() -> ClusterSnapshot {
        let mut snapshot = ClusterSnapshot::new("dev".into(), vec!["dev".into()]);
        snapshot.insert(ResourceRecords::Pods(vec![PodRecord {
            name: "web-1".into(),
            namespace: "default".into(),
            containers: vec!["app".into()],
            status: "Running".into(),
            age: "4m2s".into(),
        }]));
        snapshot
    }

    #[tokio::test]
    async fn prompt_embeds_snapshot_and_answer_is_trimmed() {
        let provider = FakeProvider::answering("  There is 1 pod: web-1.\n");
        let answer = answer(
            &provider,
            &snapshot(),
            "how many pods are there?",
            DEFAULT_MAX_CONTEXT_CHARS,
        )
        .await
        .unwrap();

        assert_eq!(answer, "There is 1 pod: web-1.");
        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("web-1"));
        assert!(prompts[0].user.contains("\"default\""));
        assert!(prompts[0].user.ends_with("Question: how many pods are there?"));
        assert!(prompts[0].system.contains(FALLBACK_ANSWER));
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let provider = FakeProvider::failing();
        let err = answer(&provider, &snapshot(), "anything?", DEFAULT_MAX_CONTEXT_CHARS)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::AssistantUnavailable(ProviderError::Status { status: 429, .. })
        ));
    }

    #[tokio::test]
    async fn blank_answer_is_an_error() {
        let provider = FakeProvider::answering("   \n");
        let err = answer(&provider, &snapshot(), "anything?", DEFAULT_MAX_CONTEXT_CHARS)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::AssistantUnavailable(ProviderError::Empty)
        ));
    }

    #[test]
    fn oversized_snapshot_is_truncated() {
        let prompt = build_prompt(&snapshot(), "q", 40).unwrap();
        let data = prompt
            .user
            .split("\n\nQuestion:")
            .next()
            .unwrap()
            .trim_start_matches("Here is the current state of the Kubernetes cluster:\n\n");
        assert_eq!(data.chars().count(), 40);
        assert!(data.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn unencodable_data_is_an_error_not_an_empty_object() {
        // JSON object keys must be strings.
        let data = std::collections::BTreeMap::from([((1, 2), "pair")]);
        let err = cluster_data(&data, DEFAULT_MAX_CONTEXT_CHARS).unwrap_err();
        assert!(matches!(err, SnapshotError::Encode(_)));
    }
}
