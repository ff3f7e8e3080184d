//! Unified error handling for Galaxybook Extras
//!
//! This crate provides the single error type used across the driver core.
//! Every variant belongs to one [`ErrorKind`], which is how callers tell a missing
//! ACPI method apart from a malformed firmware response or an unsupported feature.

use std::io;
use std::path::PathBuf;

/// Result type alias using GalaxybookError
pub type Result<T> = std::result::Result<T, GalaxybookError>;

/// Broad classification of a [`GalaxybookError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The firmware call primitive itself failed
    Transport,
    /// The response buffer violated the generic SAWB envelope
    Envelope,
    /// The response decoded but carried a value outside the known domain
    Semantic,
    /// The feature is absent, disabled or was never negotiated
    Capability,
    /// The caller passed a value the protocol cannot carry
    InvalidInput,
    /// Configuration or filesystem problem outside the protocol
    Config,
}

/// Unified error type for all Galaxybook operations
#[derive(thiserror::Error, Debug)]
pub enum GalaxybookError {
    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("ACPI method {method} not found")]
    MethodNotFound {
        method: String,
    },

    #[error("ACPI method {method} failed: {reason}")]
    Transport {
        method: String,
        reason: String,
    },

    // ============================================================================
    // Envelope Errors
    // ============================================================================
    #[error("failed {purpose} with ACPI method {method}; response was not a buffer")]
    NotABuffer {
        method: String,
        purpose: String,
    },

    #[error("failed {purpose} with ACPI method {method}; response length mismatch (expected {expected}, got {actual})")]
    LengthMismatch {
        method: String,
        purpose: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed {purpose} with ACPI method {method}; device did not respond with success code 0x{expected:02x} (got 0x{found:02x})")]
    MissingSuccessFlag {
        method: String,
        purpose: String,
        expected: u8,
        found: u8,
    },

    #[error("failed {purpose} with ACPI method {method}; device responded with failure code 0x{code:02x}")]
    DeviceFailure {
        method: String,
        purpose: String,
        code: u8,
    },

    // ============================================================================
    // Semantic Errors
    // ============================================================================
    #[error("unexpected value {value:#x} reported for {what}")]
    UnexpectedValue {
        what: String,
        value: u64,
    },

    #[error("performance mode {0:#04x} is not mapped to any platform profile")]
    UnmappedPerformanceMode(u8),

    // ============================================================================
    // Capability Errors
    // ============================================================================
    #[error("capability not available: {0}")]
    CapabilityAbsent(String),

    #[error("operation not supported: {0}")]
    NotSupported(String),

    #[error("fan {fan} cannot use the shared EC speed register; it is already used by {owner}")]
    SharedRegisterInUse {
        fan: String,
        owner: String,
    },

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },

    #[error("invalid input {input:?}: {reason}")]
    InvalidInput {
        input: String,
        reason: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl GalaxybookError {
    /// Classify the error into one of the protocol error kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MethodNotFound { .. } | Self::Transport { .. } => ErrorKind::Transport,
            Self::NotABuffer { .. }
            | Self::LengthMismatch { .. }
            | Self::MissingSuccessFlag { .. }
            | Self::DeviceFailure { .. } => ErrorKind::Envelope,
            Self::UnexpectedValue { .. } | Self::UnmappedPerformanceMode(_) => ErrorKind::Semantic,
            Self::CapabilityAbsent(_) | Self::NotSupported(_) | Self::SharedRegisterInUse { .. } => {
                ErrorKind::Capability
            }
            Self::InvalidValue { .. } | Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Io(_)
            | Self::FileRead { .. }
            | Self::FileWrite { .. }
            | Self::Config(_)
            | Self::JsonParse(_) => ErrorKind::Config,
        }
    }

    /// True when the firmware reported that the method or object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MethodNotFound { .. })
    }

    /// Create a transport error from a method name and reason
    pub fn transport(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create an unexpected value error
    pub fn unexpected(what: impl Into<String>, value: u64) -> Self {
        Self::UnexpectedValue {
            what: what.into(),
            value,
        }
    }

    /// Create a capability absent error
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::CapabilityAbsent(msg.into())
    }

    /// Create a not supported error
    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported(msg.into())
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
