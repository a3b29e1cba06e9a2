use molscape::engine::config::GeometryConfig;
use molscape::workflows::derive::Representation;
use std::path::PathBuf;

/// Fully resolved settings for one `derive` invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub model_index: usize,
    pub representation: Representation,
    pub pretty: bool,
    pub geometry: GeometryConfig,
}
