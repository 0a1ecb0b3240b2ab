pub mod cache;
pub mod config;
pub mod dashboard;
pub mod metrics_server;
pub mod observability;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod server;
pub mod sources;
pub mod transform;

pub use dashboard::Dashboard;
pub use pipeline::{Pipeline, Snapshot};
