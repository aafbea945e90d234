//! Shared error type across verity crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Caller is not the registry authority.
    Unauthorized,
    /// Null identity supplied.
    InvalidIdentity,
    /// Reserved zero selector supplied.
    InvalidSelector,
    /// Identity already present in the target category.
    AlreadyRegistered,
    /// Identity absent from every category.
    NotRegistered,
    /// Mutation attempted from inside a read-only module call.
    StaticCallViolation,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::InvalidIdentity => "INVALID_IDENTITY",
            ClientCode::InvalidSelector => "INVALID_SELECTOR",
            ClientCode::AlreadyRegistered => "ALREADY_REGISTERED",
            ClientCode::NotRegistered => "NOT_REGISTERED",
            ClientCode::StaticCallViolation => "STATIC_CALL_VIOLATION",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VerityError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum VerityError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("caller {0} is not the registry authority")]
    Unauthorized(String),
    #[error("module identity must not be the null address")]
    InvalidIdentity,
    #[error("selector must not be the reserved zero selector")]
    InvalidSelector,
    #[error("module {0} is already registered in this category")]
    AlreadyRegistered(String),
    #[error("module {0} is not registered")]
    NotRegistered(String),
    #[error("state mutation attempted inside a static call")]
    StaticCallViolation,
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl VerityError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VerityError::BadRequest(_) => ClientCode::BadRequest,
            VerityError::Unauthorized(_) => ClientCode::Unauthorized,
            VerityError::InvalidIdentity => ClientCode::InvalidIdentity,
            VerityError::InvalidSelector => ClientCode::InvalidSelector,
            VerityError::AlreadyRegistered(_) => ClientCode::AlreadyRegistered,
            VerityError::NotRegistered(_) => ClientCode::NotRegistered,
            VerityError::StaticCallViolation => ClientCode::StaticCallViolation,
            VerityError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            VerityError::Internal(_) => ClientCode::Internal,
        }
    }
}
