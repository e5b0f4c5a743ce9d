use std::collections::HashMap;
use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig};

use crate::error::ContextError;
use crate::models::k8s::KubeContext;

/// The configured contexts and which one is active.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterContexts {
    pub current: String,
    pub contexts: Vec<KubeContext>,
}

impl ClusterContexts {
    pub fn names(&self) -> Vec<String> {
        self.contexts.iter().map(|c| c.name.clone()).collect()
    }

    pub fn active(&self) -> Option<&KubeContext> {
        self.contexts.iter().find(|c| c.name == self.current)
    }
}

/// Anything that can list configured contexts and identify the active one.
/// Reads may block on the filesystem, so callers run them off the async workers.
pub trait ContextSource: Send + Sync {
    fn contexts(&self) -> Result<ClusterContexts, ContextError>;
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// Merges `extra` into `base` by extending clusters, auth_infos, and contexts.
/// `base.current_context` wins; `extra.current_context` is used only if base has none.
fn merge_kubeconfig(mut base: Kubeconfig, extra: Kubeconfig) -> Kubeconfig {
    base.clusters.extend(extra.clusters);
    base.auth_infos.extend(extra.auth_infos);
    base.contexts.extend(extra.contexts);
    if base.current_context.is_none() {
        base.current_context = extra.current_context;
    }
    base
}

/// Returns all regular, non-hidden files in `dir`, sorted alphabetically.
/// Skips subdirectories and any file whose name begins with '.'.
fn scan_kube_dir(dir: &Path) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("kubeconfig: cannot read directory {}: {e}", dir.display());
            return paths;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();

        // cache/, http-cache/, etc.
        if path.is_dir() {
            continue;
        }

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') {
            continue;
        }

        paths.push(path);
    }

    paths.sort();
    paths
}

/// Tries to load each path as a kubeconfig and merges all that succeed.
fn load_from_paths(paths: &[PathBuf]) -> Option<Kubeconfig> {
    let mut merged: Option<Kubeconfig> = None;

    for path in paths {
        match Kubeconfig::read_from(path) {
            Ok(cfg) => {
                log::debug!(
                    "kubeconfig: ok ({} context(s)) - {}",
                    cfg.contexts.len(),
                    path.display()
                );
                merged = Some(match merged.take() {
                    None => cfg,
                    Some(base) => merge_kubeconfig(base, cfg),
                });
            }
            Err(e) => {
                // Not every file under ~/.kube is a kubeconfig.
                log::debug!("kubeconfig: skip (parse error: {e}) - {}", path.display());
            }
        }
    }

    merged
}

/// Flattens a merged kubeconfig into context summaries.
/// `pinned` overrides the file's current-context and must name a known context.
fn summarize(kubeconfig: &Kubeconfig, pinned: Option<&str>) -> Result<ClusterContexts, ContextError> {
    let current = match pinned {
        Some(name) if kubeconfig.contexts.iter().any(|c| c.name == name) => name.to_string(),
        Some(name) => return Err(ContextError::UnknownContext(name.to_string())),
        None => kubeconfig
            .current_context
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or(ContextError::NoCurrentContext)?,
    };

    let cluster_servers: HashMap<&str, &str> = kubeconfig
        .clusters
        .iter()
        .filter_map(|nc| {
            let server = nc.cluster.as_ref()?.server.as_deref()?;
            Some((nc.name.as_str(), server))
        })
        .collect();

    let contexts = kubeconfig
        .contexts
        .iter()
        .filter_map(|named| {
            let ctx = named.context.as_ref()?;
            Some(KubeContext {
                name: named.name.clone(),
                cluster: ctx.cluster.clone(),
                user: ctx.user.clone().unwrap_or_default(),
                namespace: ctx.namespace.clone(),
                server_url: cluster_servers.get(ctx.cluster.as_str()).map(|s| s.to_string()),
            })
        })
        .collect();

    Ok(ClusterContexts { current, contexts })
}

// ── source ────────────────────────────────────────────────────────────────────

/// Reads contexts from kubeconfig files on every call.
///
/// Resolution order:
/// 1. An explicitly configured directory is scanned like `~/.kube`.
/// 2. If `KUBECONFIG` is set, `Kubeconfig::read()` merges every listed file
///    with the same semantics as kubectl.
/// 3. Otherwise every regular file in `~/.kube` is parsed and the valid ones
///    are merged, so a config dropped next to `config` is picked up too.
#[derive(Debug, Clone, Default)]
pub struct KubeconfigContexts {
    dir: Option<PathBuf>,
    pinned: Option<String>,
}

impl KubeconfigContexts {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir, pinned: None }
    }

    /// Reports `context` as the active one instead of the file's current-context.
    pub fn pinned_to(mut self, context: Option<String>) -> Self {
        self.pinned = context;
        self
    }

    pub fn load(&self) -> Result<Kubeconfig, ContextError> {
        if let Some(dir) = &self.dir {
            return load_from_paths(&scan_kube_dir(dir)).ok_or(ContextError::NotFound);
        }

        let kube_env = std::env::var("KUBECONFIG").unwrap_or_default();
        if !kube_env.is_empty() {
            let cfg = Kubeconfig::read()?;
            log::debug!("kubeconfig: KUBECONFIG merged {} context(s)", cfg.contexts.len());
            return Ok(cfg);
        }

        let kube_dir = dirs::home_dir()
            .map(|h| h.join(".kube"))
            .ok_or(ContextError::NotFound)?;
        load_from_paths(&scan_kube_dir(&kube_dir)).ok_or(ContextError::NotFound)
    }

    /// Pins the context that is active right now, so later reads keep
    /// reporting the cluster a client built from this source talks to even
    /// if the kubeconfig's current-context changes on disk.
    pub fn pin_current(self) -> Result<Self, ContextError> {
        let current = summarize(&self.load()?, self.pinned.as_deref())?.current;
        log::info!("kubeconfig: using context {current}");
        Ok(self.pinned_to(Some(current)))
    }

    /// Builds a client from the same merged kubeconfig the contexts come from.
    pub async fn client(&self) -> Result<kube::Client, ContextError> {
        let kubeconfig = self.load()?;
        let options = KubeConfigOptions {
            context: self.pinned.clone(),
            ..Default::default()
        };
        let config = kube::Config::from_custom_kubeconfig(kubeconfig, &options).await?;
        kube::Client::try_from(config)
            .map_err(|e| ContextError::Client(e.to_string()))
    }
}

impl ContextSource for KubeconfigContexts {
    fn contexts(&self) -> Result<ClusterContexts, ContextError> {
        summarize(&self.load()?, self.pinned.as_deref())
    }
}
