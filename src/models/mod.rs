pub mod config;
pub mod options;

pub use config::{AppConfig, DispatcherConfig, ExportConfig, PreviewConfig, ServerConfig};
pub use options::{AccentDto, ColorDto, RenderOptionsDto};
