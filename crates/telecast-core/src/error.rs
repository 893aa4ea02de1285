use thiserror::Error;

/// Failures surfaced by the remote catalog / video-platform client.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Transport-level failure: connect error, timeout, non-2xx status.
    #[error("network failure: {0}")]
    Network(String),

    /// The endpoint answered, but the body is not what the schema promises.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Missing or rejected platform API key.
    #[error("platform auth failure: {0}")]
    Auth(String),
}

impl CatalogError {
    /// Map a reqwest error onto the taxonomy.
    ///
    /// Status errors 401/403 mean the platform rejected our key; decode
    /// errors mean the body violated the schema; everything else is
    /// transport.
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return CatalogError::Auth(err.to_string());
            }
        }
        if err.is_decode() {
            return CatalogError::MalformedResponse(err.to_string());
        }
        CatalogError::Network(err.to_string())
    }
}

/// Failures surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The operation referenced a channel that is not in the unified set.
    #[error("channel {0:?} is not in the registry")]
    InvalidReference(String),
}
