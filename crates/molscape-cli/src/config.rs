//! Layered configuration for the `derive` command: library defaults, an optional
//! TOML file, `--set` overrides and dedicated flags.

mod builder;
mod file;
mod models;

pub use builder::build_config;
pub use models::AppConfig;
