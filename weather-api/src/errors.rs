use store::StoreError;
use thiserror::Error;

/// Result type alias for model operations
pub type Result<T, E = ModelError> = std::result::Result<T, E>;

/// Errors returned by the city, temperature, forecast and webhook managers.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The referenced entity does not exist, or its version is stale
    #[error("document(s) not found")]
    NotFound,

    #[error("document already exists")]
    AlreadyExists,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ModelError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ModelError::NotFound,
            StoreError::DuplicateKey { .. } => ModelError::AlreadyExists,
            other => ModelError::Store(other),
        }
    }
}

/// Errors that stop the API process
#[derive(Error, Debug)]
pub enum WeatherApiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] crate::config::ValidationError),

    #[error("failed to initialize models: {0}")]
    Model(#[from] ModelError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_translation() {
        assert!(matches!(
            ModelError::from(StoreError::NotFound),
            ModelError::NotFound
        ));
        assert!(matches!(
            ModelError::from(StoreError::DuplicateKey {
                collection: "cities".into(),
                fields: vec!["name".into()],
            }),
            ModelError::AlreadyExists
        ));
        assert!(matches!(
            ModelError::from(StoreError::Backend("disk full".into())),
            ModelError::Store(StoreError::Backend(_))
        ));
    }
}
