//! Error types for quill operations.
//!
//! Every failure carries a structured [`ErrorCode`] so callers (the REST
//! layer in particular) can map it onto a response without string matching.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for quill operations.
pub type QuillResult<T> = Result<T, QuillError>;

/// Main error type for all quill operations.
#[derive(Error, Debug)]
pub enum QuillError {
    /// A provider credential is missing or was rejected.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Content entry or version group not found.
    #[error("Not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        entity_id: Option<String>,
    },

    /// Text generation failed or returned nothing.
    #[error("LLM error: {message}")]
    Llm {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Trends upstream failed.
    #[error("Trends error: {message}")]
    Trends {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Database operation failed.
    #[error("Database error: {message}")]
    Database {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (AUTH_xxx)
    AuthMissingCredentials,
    AuthInvalidKey,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValMissingField,
    ValInvalidFormat,
    ValUnsupportedPlatform,

    // Content (CNT_xxx)
    CntNotFound,
    CntGroupNotFound,

    // LLM (LLM_xxx)
    LlmConnectionFailed,
    LlmGenerationFailed,
    LlmEmptyResponse,

    // Trends (TRD_xxx)
    TrdUnavailable,

    // Database (DB_xxx)
    DbConnectionFailed,
    DbOperationFailed,
    DbVersionConflict,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthMissingCredentials => "AUTH_001",
            ErrorCode::AuthInvalidKey => "AUTH_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValMissingField => "VAL_002",
            ErrorCode::ValInvalidFormat => "VAL_003",
            ErrorCode::ValUnsupportedPlatform => "VAL_004",
            ErrorCode::CntNotFound => "CNT_001",
            ErrorCode::CntGroupNotFound => "CNT_002",
            ErrorCode::LlmConnectionFailed => "LLM_001",
            ErrorCode::LlmGenerationFailed => "LLM_002",
            ErrorCode::LlmEmptyResponse => "LLM_003",
            ErrorCode::TrdUnavailable => "TRD_001",
            ErrorCode::DbConnectionFailed => "DB_001",
            ErrorCode::DbOperationFailed => "DB_002",
            ErrorCode::DbVersionConflict => "DB_003",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl QuillError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error with suggestion.
    pub fn validation_with_suggestion(
        message: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidFormat,
            details: HashMap::new(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a validation error for a missing required field.
    pub fn missing_field(field: &str) -> Self {
        let mut details = HashMap::new();
        details.insert("field".to_string(), field.to_string());
        Self::Validation {
            message: format!("Field '{}' is required", field),
            code: ErrorCode::ValMissingField,
            details,
            suggestion: None,
        }
    }

    /// Create a validation error for a platform the publisher cannot handle.
    pub fn unsupported_platform(platform: impl Into<String>) -> Self {
        Self::Validation {
            message: format!("Unsupported platform: {}", platform.into()),
            code: ErrorCode::ValUnsupportedPlatform,
            details: HashMap::new(),
            suggestion: Some("Use twitter, linkedin or threads".to_string()),
        }
    }

    /// Create a not found error for a content entry id.
    pub fn not_found(content_id: impl ToString) -> Self {
        let id = content_id.to_string();
        Self::NotFound {
            message: format!("Content with id '{}' not found", id),
            code: ErrorCode::CntNotFound,
            entity_id: Some(id),
        }
    }

    /// Create a not found error for an empty `(title, platform)` group.
    pub fn group_not_found(title: &str, platform: &str) -> Self {
        Self::NotFound {
            message: format!(
                "No content versions for title '{}' on platform '{}'",
                title, platform
            ),
            code: ErrorCode::CntGroupNotFound,
            entity_id: None,
        }
    }

    /// Create an error for a generation request without any credential.
    pub fn missing_credential() -> Self {
        Self::Authentication {
            message: "No API key provided".to_string(),
            code: ErrorCode::AuthMissingCredentials,
            source: None,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: ErrorCode::AuthInvalidKey,
            source: None,
        }
    }

    /// Create an LLM error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmGenerationFailed,
            source: None,
        }
    }

    /// Create an LLM error for a response with no text.
    pub fn llm_empty(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            code: ErrorCode::LlmEmptyResponse,
            source: None,
        }
    }

    /// Create a trends upstream error.
    pub fn trends(message: impl Into<String>) -> Self {
        Self::Trends {
            message: message.into(),
            code: ErrorCode::TrdUnavailable,
            source: None,
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
            code: ErrorCode::DbOperationFailed,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Llm { code, .. } => *code,
            Self::Trends { code, .. } => *code,
            Self::Database { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Authentication { .. } => {
                Some("Pass apiKey in the request or set GEMINI_API_KEY on the server")
            }
            Self::NotFound { .. } => Some("Please check the content id and ensure it exists"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Llm { .. } => Some("Please check your LLM provider configuration"),
            _ => None,
        }
    }

    /// Whether this error is a unique-constraint violation on the version column.
    pub fn is_version_conflict(&self) -> bool {
        matches!(
            self,
            Self::Database {
                code: ErrorCode::DbVersionConflict,
                ..
            }
        )
    }
}

impl From<rusqlite::Error> for QuillError {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                ErrorCode::DbVersionConflict
            }
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::CannotOpen =>
            {
                ErrorCode::DbConnectionFailed
            }
            _ => ErrorCode::DbOperationFailed,
        };
        Self::Database {
            message: err.to_string(),
            code,
            source: Some(Box::new(err)),
        }
    }
}
