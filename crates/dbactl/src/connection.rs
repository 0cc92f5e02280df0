//! Session and connection management for dbactl

use std::path::PathBuf;

use dbactl_core::{AdminSession, Config, ConnectOptions};
use tracing::debug;

use crate::error::Result as CliResult;

/// Opens administrative sessions and resolves instance targets
#[derive(Clone)]
pub struct SessionManager {
    pub config: Config,
    state_dir_override: Option<PathBuf>,
}

impl SessionManager {
    pub fn new(config: Config, state_dir_override: Option<PathBuf>) -> Self {
        Self {
            config,
            state_dir_override,
        }
    }

    /// Open the administrative session rooted at the resolved state directory
    pub fn open_session(&self) -> CliResult<AdminSession> {
        let state_dir = match &self.state_dir_override {
            Some(dir) => dir.clone(),
            None => self.config.resolve_state_dir()?,
        };
        debug!(state_dir = %state_dir.display(), "opening session");
        Ok(AdminSession::open(&state_dir)?)
    }

    /// Resolve a target instance argument.
    ///
    /// A target containing `@` is parsed as a connection string of the
    /// shape `<user>[:<password>]@<host>:<port>`; anything else names a
    /// profile from the configuration.
    pub fn resolve_target(&self, target: &str) -> CliResult<ConnectOptions> {
        if target.contains('@') {
            return Ok(target.parse::<ConnectOptions>()?);
        }

        let profile = self.config.resolve_profile(Some(target))?;
        debug!(profile = target, "resolved target from profile");
        Ok(profile.connection.parse::<ConnectOptions>()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbactl_core::Profile;

    fn manager_with_profile() -> SessionManager {
        let mut config = Config::default();
        config.profiles.insert(
            "sandbox".to_string(),
            Profile {
                connection: "root:secret@127.0.0.1:3310".to_string(),
            },
        );
        SessionManager::new(config, None)
    }

    #[test]
    fn test_resolve_target_connection_string() {
        let manager = manager_with_profile();
        let options = manager.resolve_target("root@db1.example.com:3306").unwrap();
        assert_eq!(options.host, "db1.example.com");
        assert_eq!(options.port, 3306);
    }

    #[test]
    fn test_resolve_target_profile() {
        let manager = manager_with_profile();
        let options = manager.resolve_target("sandbox").unwrap();
        assert_eq!(options.host, "127.0.0.1");
        assert_eq!(options.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_resolve_target_unknown_profile() {
        let manager = manager_with_profile();
        assert!(manager.resolve_target("production").is_err());
    }

    #[test]
    fn test_session_uses_state_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SessionManager::new(Config::default(), Some(dir.path().to_path_buf()));
        let session = manager.open_session().unwrap();
        assert!(!session.schema_exists());
    }
}
