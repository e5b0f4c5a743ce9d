use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use kube_ask::commands::ai::{AnthropicProvider, CompletionProvider, OpenAiProvider};
use kube_ask::commands::control_plane::KubeControlPlane;
use kube_ask::commands::kubeconfig::KubeconfigContexts;
use kube_ask::commands::query::Assistant;
use kube_ask::commands::query_log::QueryLog;
use kube_ask::config::{Config, ProviderKind};
use kube_ask::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();

    let settings = config.completion_settings()?;
    log::info!("provider: {:?} ({})", config.provider, settings.model);
    let provider: Arc<dyn CompletionProvider> = match config.provider {
        ProviderKind::Openai => Arc::new(OpenAiProvider::new(settings)?),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(settings)?),
    };

    // The client is bound to one cluster for the life of the process, so the
    // reported context is pinned to it as well.
    let contexts = KubeconfigContexts::new(config.kubeconfig_dir.clone())
        .pinned_to(config.context.clone())
        .pin_current()
        .context("failed to read kubeconfig")?;
    let client = contexts
        .client()
        .await
        .context("failed to connect to the cluster")?;
    let plane = KubeControlPlane::new(client, config.page_size);

    let mut assistant = Assistant::new(
        plane,
        Arc::new(contexts),
        provider,
        config.assistant_config(),
    );
    if !config.no_query_log {
        log::info!("query log: {}", config.query_log.display());
        assistant = assistant.with_query_log(QueryLog::new(config.query_log.clone()));
    }

    server::run(Arc::new(assistant), config.listen, config.request_timeout()).await?;
    Ok(())
}
