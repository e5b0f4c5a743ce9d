pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod server;

pub use commands::query::{Assistant, AssistantConfig};
pub use error::QueryError;
pub use models::snapshot::{ClusterSnapshot, ResourceKind, ResourceRecords};
