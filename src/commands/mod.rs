pub mod ai;
pub mod assistant;
pub mod control_plane;
pub mod kubeconfig;
pub mod query;
pub mod query_log;
pub mod resources;
pub mod snapshot;

#[cfg(test)]
pub(crate) mod testing;
