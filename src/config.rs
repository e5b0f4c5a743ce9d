use std::collections::BTreeSet;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::commands::ai::{CompletionSettings, ANTHROPIC_BASE_URL, OPENAI_BASE_URL};
use crate::commands::assistant::DEFAULT_MAX_CONTEXT_CHARS;
use crate::commands::control_plane::DEFAULT_PAGE_SIZE;
use crate::commands::query::AssistantConfig;
use crate::commands::snapshot::SnapshotConfig;
use crate::error::ConfigError;
use crate::models::snapshot::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    Openai,
    Anthropic,
}

impl ProviderKind {
    fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Openai => "gpt-4o",
            ProviderKind::Anthropic => "claude-sonnet-4-6",
        }
    }

    fn api_key_env(self) -> &'static str {
        match self {
            ProviderKind::Openai => "OPENAI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::Openai => OPENAI_BASE_URL,
            ProviderKind::Anthropic => ANTHROPIC_BASE_URL,
        }
    }
}

/// Answer natural-language questions about the current Kubernetes cluster.
#[derive(Clone, Parser)]
#[command(name = "kube-ask", version, about)]
pub struct Config {
    /// Address to serve `POST /query` on
    #[arg(long, env = "KUBE_ASK_LISTEN", default_value = "127.0.0.1:8000")]
    pub listen: SocketAddr,

    /// Kubeconfig context to query (defaults to the current context)
    #[arg(long, env = "KUBE_ASK_CONTEXT")]
    pub context: Option<String>,

    /// Directory whose files are merged as kubeconfigs instead of ~/.kube
    #[arg(long, env = "KUBE_ASK_KUBECONFIG_DIR")]
    pub kubeconfig_dir: Option<PathBuf>,

    /// Completion provider
    #[arg(long, env = "KUBE_ASK_PROVIDER", value_enum, default_value_t = ProviderKind::Openai)]
    pub provider: ProviderKind,

    /// Model name (provider default when unset)
    #[arg(long, env = "KUBE_ASK_MODEL")]
    pub model: Option<String>,

    /// Provider API base URL (provider default when unset)
    #[arg(long, env = "KUBE_ASK_BASE_URL")]
    pub base_url: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    /// Upper bound on generated answer length, in tokens
    #[arg(long, env = "KUBE_ASK_MAX_TOKENS", default_value_t = 512)]
    pub max_tokens: u32,

    /// Sampling temperature; low values keep answers factual
    #[arg(long, env = "KUBE_ASK_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// Seconds to wait for the provider
    #[arg(long, env = "KUBE_ASK_PROVIDER_TIMEOUT", default_value_t = 60)]
    pub provider_timeout_secs: u64,

    /// Seconds a whole request may take before it is cancelled
    #[arg(long, env = "KUBE_ASK_REQUEST_TIMEOUT", default_value_t = 120)]
    pub request_timeout_secs: u64,

    /// Resource kinds whose listing failure fails the request (e.g. nodes,pods)
    #[arg(long, env = "KUBE_ASK_CRITICAL_KINDS", value_delimiter = ',', value_parser = parse_kind)]
    pub critical_kinds: Vec<ResourceKind>,

    /// Listings allowed in flight at once
    #[arg(long, env = "KUBE_ASK_MAX_CONCURRENCY", default_value_t = ResourceKind::ALL.len())]
    pub max_concurrency: usize,

    /// Objects requested per page when listing
    #[arg(long, env = "KUBE_ASK_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Cap on cluster data characters embedded in the prompt
    #[arg(long, env = "KUBE_ASK_MAX_CONTEXT_CHARS", default_value_t = DEFAULT_MAX_CONTEXT_CHARS)]
    pub max_context_chars: usize,

    /// File that answered questions are appended to
    #[arg(long, env = "KUBE_ASK_QUERY_LOG", default_value = "agent.log")]
    pub query_log: PathBuf,

    /// Do not write the query log
    #[arg(long)]
    pub no_query_log: bool,
}

fn redacted(key: &Option<String>) -> Option<&'static str> {
    key.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("context", &self.context)
            .field("kubeconfig_dir", &self.kubeconfig_dir)
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("openai_api_key", &redacted(&self.openai_api_key))
            .field("anthropic_api_key", &redacted(&self.anthropic_api_key))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("critical_kinds", &self.critical_kinds)
            .field("max_concurrency", &self.max_concurrency)
            .field("page_size", &self.page_size)
            .field("max_context_chars", &self.max_context_chars)
            .field("query_log", &self.query_log)
            .field("no_query_log", &self.no_query_log)
            .finish()
    }
}

fn parse_kind(value: &str) -> Result<ResourceKind, String> {
    ResourceKind::parse(value.trim()).ok_or_else(|| {
        let known: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown resource kind `{value}` (expected one of {})", known.join(", "))
    })
}

impl Config {
    pub fn api_key(&self) -> Option<&str> {
        match self.provider {
            ProviderKind::Openai => self.openai_api_key.as_deref(),
            ProviderKind::Anthropic => self.anthropic_api_key.as_deref(),
        }
        .filter(|key| !key.is_empty())
    }

    pub fn completion_settings(&self) -> Result<CompletionSettings, ConfigError> {
        let api_key = self
            .api_key()
            .ok_or(ConfigError::MissingApiKey(self.provider.api_key_env()))?;

        Ok(CompletionSettings {
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.provider.default_model().to_string()),
            api_key: api_key.to_string(),
            base_url: self
                .base_url
                .clone()
                .unwrap_or_else(|| self.provider.default_base_url().to_string()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.provider_timeout_secs),
        })
    }

    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            snapshot: SnapshotConfig {
                critical_kinds: self.critical_kinds.iter().copied().collect::<BTreeSet<_>>(),
                max_concurrency: self.max_concurrency,
            },
            max_context_chars: self.max_context_chars,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["kube-ask"];
        argv.extend_from_slice(args);
        Config::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["--openai-api-key", "sk-test"]);
        assert_eq!(config.listen.to_string(), "127.0.0.1:8000");
        assert_eq!(config.provider, ProviderKind::Openai);
        assert!(config.critical_kinds.is_empty());

        let settings = config.completion_settings().unwrap();
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.base_url, OPENAI_BASE_URL);
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.max_tokens, 512);

        let assistant = config.assistant_config();
        assert_eq!(assistant.snapshot.max_concurrency, ResourceKind::ALL.len());
        assert_eq!(assistant.max_context_chars, DEFAULT_MAX_CONTEXT_CHARS);
    }

    #[test]
    fn critical_kinds_parse_from_snapshot_keys() {
        let config = parse(&["--critical-kinds", "nodes,crds"]);
        assert_eq!(
            config.critical_kinds,
            vec![ResourceKind::Nodes, ResourceKind::CustomResourceDefinitions]
        );
        assert!(Config::try_parse_from(["kube-ask", "--critical-kinds", "widgets"]).is_err());
    }

    #[test]
    fn missing_key_for_selected_provider_is_reported() {
        let config = parse(&[
            "--provider",
            "anthropic",
            "--openai-api-key",
            "sk-test",
            "--anthropic-api-key",
            "",
        ]);
        let err = config.completion_settings().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey("ANTHROPIC_API_KEY")));
        assert_eq!(err.to_string(), "ANTHROPIC_API_KEY not set");
    }

    #[test]
    fn debug_output_hides_api_keys() {
        let config = parse(&[
            "--openai-api-key",
            "sk-openai-secret",
            "--anthropic-api-key",
            "sk-ant-secret",
        ]);
        let printed = format!("{config:?}");
        assert!(!printed.contains("sk-openai-secret"));
        assert!(!printed.contains("sk-ant-secret"));
        assert!(printed.contains("<redacted>"));
        assert!(printed.contains("127.0.0.1:8000"));
    }
}
