use thiserror::Error;

use crate::grid::UnitState;

pub type GridResult<T> = Result<T, GridError>;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid {axis} range: {reason}")]
    InvalidRange { axis: String, reason: String },

    #[error("solar geometry failed at [{latitude}, {longitude}, {height}]: {reason}")]
    GeometryComputation {
        latitude: f64,
        longitude: f64,
        height: f64,
        reason: String,
    },

    #[error("unsupported magnetic model '{0}' (expected 'igrf' or 'dipole')")]
    UnsupportedModel(String),

    #[error("provider '{provider}' unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("{operation} not allowed in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: UnitState,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl GridError {
    pub fn invalid_range(axis: impl Into<String>, reason: impl Into<String>) -> Self {
        GridError::InvalidRange {
            axis: axis.into(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        GridError::ProviderUnavailable {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Only provider outages are worth retrying; range and model errors are final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GridError::ProviderUnavailable { .. })
    }
}
