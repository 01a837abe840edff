use thiserror::Error;

/// Error type for graph engine operations.
#[derive(Debug, Error)]
pub enum GraphEngineError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("graph not initialized: {0}")]
    NotInitialized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("approximation budget exceeded: {0}")]
    ApproximationBudgetExceeded(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("edge source error: {0}")]
    Source(String),
}

impl GraphEngineError {
    pub fn configuration<T: Into<String>>(msg: T) -> Self {
        GraphEngineError::Configuration(msg.into())
    }

    pub fn not_initialized<T: Into<String>>(msg: T) -> Self {
        GraphEngineError::NotInitialized(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        GraphEngineError::NotFound(msg.into())
    }

    pub fn budget_exceeded<T: Into<String>>(msg: T) -> Self {
        GraphEngineError::ApproximationBudgetExceeded(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        GraphEngineError::InvalidInput(msg.into())
    }

    pub fn edge_source<T: Into<String>>(msg: T) -> Self {
        GraphEngineError::Source(msg.into())
    }

    /// True for errors that describe the request rather than engine state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GraphEngineError::Configuration(_)
                | GraphEngineError::NotFound(_)
                | GraphEngineError::InvalidInput(_)
        )
    }
}
