use thiserror::Error;

/// Failures raised while wiring the storage tiers and the runtime.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("primary store error: {message}")]
    Database { message: String },
    #[error("mirror store error: {message}")]
    Mirror { message: String },
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn mirror(message: impl Into<String>) -> Self {
        Self::Mirror {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
