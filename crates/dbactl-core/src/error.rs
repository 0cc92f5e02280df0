//! Unified error handling for dbactl-core
//!
//! Every administrative operation reports failures through [`AdminError`].
//! Callers that need to branch on the failure class (the CLI for exit codes,
//! the contract tests for expected-failure assertions) use the classifier
//! helpers instead of matching variants directly.

use thiserror::Error;

/// Core error type for administrative operations
#[derive(Error, Debug)]
pub enum AdminError {
    /// An argument failed validation (empty name, bad port, unknown option key)
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The operation is valid but the current state forbids it
    #[error("{message}")]
    Precondition { message: String },

    /// No cluster registered under the given name
    #[error("The cluster '{name}' does not exist")]
    ClusterNotFound { name: String },

    /// The instance is not part of the replica set
    #[error("The instance '{address}' is not part of the replica set")]
    InstanceNotFound { address: String },

    /// No sandbox instance deployed on the given port
    #[error("No local instance is deployed on port {port}")]
    SandboxNotFound { port: u16 },

    /// The metadata schema has not been created yet
    #[error("Metadata schema does not exist")]
    MetadataMissing,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Error reading or writing sandbox/metadata state
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error serializing or deserializing persisted state
    #[error("State serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for administrative operations
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        AdminError::InvalidArgument {
            message: message.into(),
        }
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        AdminError::Precondition {
            message: message.into(),
        }
    }

    /// Returns true if this is an argument-validation error
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, AdminError::InvalidArgument { .. })
    }

    /// Returns true if this is an operation-precondition violation
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, AdminError::Precondition { .. })
    }

    /// Returns true if the referenced cluster, instance or sandbox is missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AdminError::ClusterNotFound { .. }
                | AdminError::InstanceNotFound { .. }
                | AdminError::SandboxNotFound { .. }
                | AdminError::MetadataMissing
        )
    }
}

impl From<toml::ser::Error> for AdminError {
    fn from(err: toml::ser::Error) -> Self {
        AdminError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AdminError {
    fn from(err: toml::de::Error) -> Self {
        AdminError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_classifier() {
        let err = AdminError::invalid_argument("The cluster name cannot be empty");
        assert!(err.is_invalid_argument());
        assert!(!err.is_precondition());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_precondition_classifier() {
        let err = AdminError::precondition("The cluster 'dev' is not empty");
        assert!(err.is_precondition());
        assert!(!err.is_invalid_argument());
    }

    #[test]
    fn test_not_found_classifier() {
        let err = AdminError::ClusterNotFound {
            name: "dev".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_precondition());

        let err = AdminError::SandboxNotFound { port: 3310 };
        assert!(err.is_not_found());

        assert!(AdminError::MetadataMissing.is_not_found());
    }

    #[test]
    fn test_display_includes_context() {
        let err = AdminError::ClusterNotFound {
            name: "devCluster".to_string(),
        };
        assert!(err.to_string().contains("devCluster"));

        let err = AdminError::SandboxNotFound { port: 3310 };
        assert!(err.to_string().contains("3310"));
    }
}
