use std::fmt;

/// User-facing failures. None of these are fatal; the IPC layer turns each
/// into an `ok: false` envelope and leaves state unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    Validation(String),
    NotFound(String),
    MalformedData(String),
    AuthFailed(String),
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_failed",
            DomainError::NotFound(_) => "not_found",
            DomainError::MalformedData(_) => "malformed_data",
            DomainError::AuthFailed(_) => "auth_failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            DomainError::Validation(m)
            | DomainError::NotFound(m)
            | DomainError::MalformedData(m)
            | DomainError::AuthFailed(m) => m,
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for DomainError {}
