//! Error type shared by every plugin-facing operation.

use thiserror::Error;

use crate::plugins::{LifecycleState, PluginKind};

/// Stable code and HTTP-style status attached to each error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    pub code: u32,
    pub status: u16,
}

impl ErrorCode {
    pub const UNEXPECTED: ErrorCode = ErrorCode { code: 1000, status: 500 };
    pub const DUPLICATE_REGISTRATION: ErrorCode = ErrorCode { code: 2001, status: 500 };
    pub const PLUGIN_NOT_FOUND: ErrorCode = ErrorCode { code: 2002, status: 404 };
    pub const LIFECYCLE_VIOLATION: ErrorCode = ErrorCode { code: 2003, status: 409 };
    pub const CONFIG_TRANSLATION: ErrorCode = ErrorCode { code: 2004, status: 400 };
    pub const EXTERNAL_GATHER: ErrorCode = ErrorCode { code: 2005, status: 502 };
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PluginError {
    #[error("{kind} plugin {name} is already registered")]
    DuplicateRegistration { kind: PluginKind, name: String },

    #[error("{kind} plugin {name} not found")]
    NotFound { kind: PluginKind, name: String },

    #[error("{kind} plugin {name}: {operation} not allowed in state {state}")]
    LifecycleViolation {
        kind: PluginKind,
        name: String,
        operation: &'static str,
        state: LifecycleState,
    },

    #[error("invalid configuration for {plugin}: {message}")]
    ConfigTranslation { plugin: String, message: String },

    #[error("{plugin} failed to gather metrics: {message}")]
    ExternalGather { plugin: String, message: String },

    #[error("{message}")]
    Unexpected { message: String },
}

impl PluginError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PluginError::DuplicateRegistration { .. } => ErrorCode::DUPLICATE_REGISTRATION,
            PluginError::NotFound { .. } => ErrorCode::PLUGIN_NOT_FOUND,
            PluginError::LifecycleViolation { .. } => ErrorCode::LIFECYCLE_VIOLATION,
            PluginError::ConfigTranslation { .. } => ErrorCode::CONFIG_TRANSLATION,
            PluginError::ExternalGather { .. } => ErrorCode::EXTERNAL_GATHER,
            PluginError::Unexpected { .. } => ErrorCode::UNEXPECTED,
        }
    }

    pub(crate) fn config(plugin: &str, message: impl std::fmt::Display) -> Self {
        PluginError::ConfigTranslation {
            plugin: plugin.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn unexpected(message: impl std::fmt::Display) -> Self {
        PluginError::Unexpected {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PluginError>;
