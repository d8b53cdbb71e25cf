//! Error types.
//!
//! - `EstimateError`: typed failures of the input adapter and the estimator.
//! - `AppError`: what the binary reports (message + process exit code).

use thiserror::Error;

/// Failure of a parse or estimation call.
///
/// Every variant is terminal for the request that produced it; the same input
/// always reproduces the same error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// Malformed or mismatched input. `field` names the offending input.
    #[error("invalid {field}: {message}")]
    InputFormat { field: String, message: String },

    /// Fewer than three time points (no residual degrees of freedom).
    #[error("insufficient data: at least 3 time points are required, got {n}")]
    InsufficientData { n: usize },

    /// All time points identical, so the slope is undefined.
    #[error("degenerate input: time points have zero variance")]
    DegenerateInput,
}

impl EstimateError {
    pub fn input_format(field: impl Into<String>, message: impl Into<String>) -> Self {
        EstimateError::InputFormat {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        let exit_code = match err {
            EstimateError::InputFormat { .. } => 2,
            EstimateError::InsufficientData { .. } | EstimateError::DegenerateInput => 3,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_errors_map_to_exit_codes() {
        let err: AppError = EstimateError::input_format("limit", "must be within [0, 100]").into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.to_string(), "invalid limit: must be within [0, 100]");

        let err: AppError = EstimateError::InsufficientData { n: 2 }.into();
        assert_eq!(err.exit_code(), 3);

        let err: AppError = EstimateError::DegenerateInput.into();
        assert_eq!(err.exit_code(), 3);
    }
}
