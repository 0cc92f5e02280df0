//! Error types for dbactl
//!
//! Wraps the core error taxonomy with CLI-facing diagnostics: a cargo-style
//! error formatter and per-error suggestions.

use colored::Colorize;
use dbactl_core::AdminError;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: The cluster 'devCluster' does not exist
///
///   tip: list registered clusters:
///       dbactl cluster list
/// ```
pub struct CliDiagnostic {
    message: String,
    tips: Vec<String>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            tips: Vec::new(),
        }
    }

    /// Add a tip line.
    pub fn tip(mut self, description: &str) -> Self {
        self.tips.push(description.to_string());
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        for tip in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", tip);
        }
    }
}

/// Main error type for the dbactl application
#[derive(Error, Debug)]
pub enum DbaCtlError {
    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error("Configuration error: {0}")]
    Config(#[from] dbactl_core::ConfigError),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for dbactl operations
pub type Result<T> = std::result::Result<T, DbaCtlError>;

impl DbaCtlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            DbaCtlError::Admin(AdminError::ClusterNotFound { .. }) => vec![
                "List registered clusters: dbactl cluster list".to_string(),
                "Create the cluster: dbactl cluster create <name>".to_string(),
            ],
            DbaCtlError::Admin(AdminError::SandboxNotFound { port }) => vec![
                format!("Deploy it first: dbactl local deploy {port}"),
                "List deployed sandboxes: dbactl local list".to_string(),
            ],
            DbaCtlError::Admin(AdminError::MetadataMissing) => vec![
                "Creating a cluster also creates the metadata schema: dbactl cluster create <name>"
                    .to_string(),
            ],
            DbaCtlError::Config(dbactl_core::ConfigError::ProfileNotFound { .. }) => vec![
                "Check the profile name in your config file".to_string(),
                "Pass a connection string instead of a profile".to_string(),
            ],
            DbaCtlError::InvalidInput { .. } => vec![
                "Check the command syntax: dbactl <command> --help".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion);
        }
        diag.print();
    }
}

impl From<anyhow::Error> for DbaCtlError {
    fn from(err: anyhow::Error) -> Self {
        DbaCtlError::OutputError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DbaCtlError {
    fn from(err: serde_json::Error) -> Self {
        DbaCtlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for DbaCtlError {
    fn from(err: std::io::Error) -> Self {
        DbaCtlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_error_passthrough_display() {
        let err: DbaCtlError = AdminError::ClusterNotFound {
            name: "devCluster".to_string(),
        }
        .into();
        assert!(err.to_string().contains("devCluster"));
        assert!(!err.suggestions().is_empty());
    }

    #[test]
    fn test_sandbox_suggestion_names_port() {
        let err: DbaCtlError = AdminError::SandboxNotFound { port: 3310 }.into();
        assert!(err.suggestions().iter().any(|tip| tip.contains("3310")));
    }
}
