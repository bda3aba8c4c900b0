pub mod cli;
pub mod config;
pub mod env;
pub mod errors;
pub mod priority;

pub use config::DeployConfig;
pub use env::{
    generate_environment_object, EnvComposer, EnvProvider, EnvironmentEntry, FileManifest,
    ManifestSource, ProcessEnv,
};
pub use errors::{DeployError, Result};
pub use priority::{get_priority, parse_rules, ListenerRule};
