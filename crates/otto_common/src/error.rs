//! Error types for Otto.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OttoError {
    /// Caller sent something malformed. Never retried.
    #[error("{0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Persistence or runtime failure, propagated as-is.
    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] anyhow::Error),
}

impl OttoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        OttoError::Validation(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        OttoError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// HTTP status this error maps to at the transport edge.
    pub fn status_code(&self) -> u16 {
        match self {
            OttoError::Validation(_) => 400,
            OttoError::NotFound { .. } => 404,
            OttoError::Infrastructure(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(OttoError::validation("too short").status_code(), 400);
        assert_eq!(OttoError::not_found("case", "abc").status_code(), 404);
        let infra = OttoError::Infrastructure(anyhow::anyhow!("db gone"));
        assert_eq!(infra.status_code(), 500);
    }

    #[test]
    fn test_not_found_message() {
        let err = OttoError::not_found("case", "c-123");
        assert_eq!(err.to_string(), "case 'c-123' not found");
    }
}
