pub mod config;
pub mod context;
pub mod error;

pub use config::{
    AppConfig, AuthMode, ConfigError, DatabaseConfig, LlmConfig, PromptConfig, ServerConfig,
};
pub use context::PromptContext;
pub use error::CoreError;
