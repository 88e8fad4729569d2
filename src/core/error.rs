use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmberError {
    #[error("Entity not found or invalid: {0:?}")]
    EntityInvalid(crate::core::types::EntityId),

    #[error("Script not found: {0}")]
    ScriptNotFound(String),

    #[error("Invalid blueprint in '{source_name}': {message}")]
    InvalidBlueprint { source_name: String, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EmberError>;
