mod config;
mod directory;
mod repository;
mod service_provider;
mod telemetry;

pub use config::{build_config, BackupConfig};
pub use service_provider::ServiceProvider;
pub use telemetry::initialize_telemetry;
