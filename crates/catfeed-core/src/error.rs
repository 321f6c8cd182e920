use thiserror::Error;

/// Errors raised while loading configuration. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read field mapping file {path}: {source}")]
    MappingFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse field mapping file: {0}")]
    MappingFileParse(#[source] serde_yaml::Error),

    #[error("invalid field mapping: {0}")]
    Validation(String),
}
