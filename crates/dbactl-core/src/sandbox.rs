//! Local sandbox instance lifecycle
//!
//! Sandbox instances are locally managed database instances used for
//! development and testing. Each one lives in its own directory under the
//! state directory (`sandboxes/<port>/`), with a `sandboxdata` data
//! directory and an `instance.toml` state file, so a later session observes
//! previously deployed sandboxes.
//!
//! The registry tracks the lifecycle:
//!
//! ```text
//! deploy -> Stopped -> start -> Running -> stop|kill -> Stopped -> delete
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{AdminError, Result};

/// Name of the data directory inside each sandbox
pub const SANDBOX_DATADIR: &str = "sandboxdata";

/// State file inside each sandbox directory
const INSTANCE_FILE: &str = "instance.toml";

/// Lifecycle state of a sandbox instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxState {
    Stopped,
    Running,
}

impl std::fmt::Display for SandboxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SandboxState::Stopped => write!(f, "stopped"),
            SandboxState::Running => write!(f, "running"),
        }
    }
}

/// Options accepted by `deploy_local_instance`
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Root password for the deployed instance; generated when omitted
    pub password: Option<String>,
}

impl DeployOptions {
    /// Build deploy options from a JSON map, rejecting unknown keys
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "password" => {
                    options.password = Some(
                        value
                            .as_str()
                            .ok_or_else(|| {
                                AdminError::invalid_argument(
                                    "The option 'password' must be a string",
                                )
                            })?
                            .to_string(),
                    );
                }
                other => {
                    return Err(AdminError::invalid_argument(format!(
                        "Unexpected argument '{other}' on deploy options"
                    )));
                }
            }
        }
        Ok(options)
    }
}

/// Serializable status of a sandbox instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxStatus {
    pub port: u16,
    pub state: SandboxState,
    pub clean_shutdown: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datadir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SandboxInstance {
    port: u16,
    state: SandboxState,
    clean_shutdown: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
}

#[derive(Debug)]
struct Inner {
    base_dir: Option<PathBuf>,
    instances: BTreeMap<u16, SandboxInstance>,
}

/// Shared handle to the sandbox registry
#[derive(Debug, Clone)]
pub struct SandboxRegistry {
    inner: Rc<RefCell<Inner>>,
}

impl SandboxRegistry {
    /// Registry without filesystem backing, used by ephemeral sessions
    pub fn in_memory() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                base_dir: None,
                instances: BTreeMap::new(),
            })),
        }
    }

    /// Open the registry rooted at `base_dir`, loading any sandbox
    /// directories deployed by earlier sessions.
    pub fn open(base_dir: PathBuf) -> Result<Self> {
        let mut instances = BTreeMap::new();

        if base_dir.exists() {
            for entry in fs::read_dir(&base_dir)? {
                let entry = entry?;
                let state_file = entry.path().join(INSTANCE_FILE);
                if !state_file.is_file() {
                    continue;
                }
                let content = fs::read_to_string(&state_file)?;
                match toml::from_str::<SandboxInstance>(&content) {
                    Ok(instance) => {
                        debug!(port = instance.port, state = %instance.state, "loaded sandbox");
                        instances.insert(instance.port, instance);
                    }
                    Err(err) => {
                        warn!(
                            path = %state_file.display(),
                            %err,
                            "skipping unreadable sandbox state file"
                        );
                    }
                }
            }
        }

        Ok(Self {
            inner: Rc::new(RefCell::new(Inner {
                base_dir: Some(base_dir),
                instances,
            })),
        })
    }

    /// True if a sandbox is deployed on the port
    pub fn contains(&self, port: u16) -> bool {
        self.inner.borrow().instances.contains_key(&port)
    }

    /// Status of the sandbox on the port
    pub fn status(&self, port: u16) -> Result<SandboxStatus> {
        let inner = self.inner.borrow();
        let instance = inner
            .instances
            .get(&port)
            .ok_or(AdminError::SandboxNotFound { port })?;
        Ok(self.status_of(&inner, instance))
    }

    /// Status of every deployed sandbox, ordered by port
    pub fn list(&self) -> Vec<SandboxStatus> {
        let inner = self.inner.borrow();
        inner
            .instances
            .values()
            .map(|instance| self.status_of(&inner, instance))
            .collect()
    }

    /// Deploy a new sandbox on the port, in the `Stopped` state
    pub fn deploy(&self, port: u16, options: DeployOptions) -> Result<SandboxStatus> {
        check_port(port)?;

        let mut inner = self.inner.borrow_mut();
        if inner.instances.contains_key(&port) {
            return Err(AdminError::precondition(format!(
                "A local instance is already deployed on port {port}"
            )));
        }

        if let Some(dir) = sandbox_dir(&inner, port) {
            fs::create_dir_all(dir.join(SANDBOX_DATADIR))?;
        }

        let instance = SandboxInstance {
            port,
            state: SandboxState::Stopped,
            clean_shutdown: true,
            password: options.password,
        };
        write_state(&inner, &instance)?;
        info!(port, "deployed local instance");

        let status = self.status_of(&inner, &instance);
        inner.instances.insert(port, instance);
        Ok(status)
    }

    /// Start a stopped sandbox
    pub fn start(&self, port: u16) -> Result<SandboxStatus> {
        self.transition(port, "start", |instance| {
            if instance.state == SandboxState::Running {
                return Err(AdminError::precondition(format!(
                    "The local instance on port {port} is already running"
                )));
            }
            instance.state = SandboxState::Running;
            instance.clean_shutdown = true;
            Ok(())
        })
    }

    /// Gracefully stop a running sandbox
    pub fn stop(&self, port: u16) -> Result<SandboxStatus> {
        self.transition(port, "stop", |instance| {
            if instance.state != SandboxState::Running {
                return Err(AdminError::precondition(format!(
                    "The local instance on port {port} is not running"
                )));
            }
            instance.state = SandboxState::Stopped;
            instance.clean_shutdown = true;
            Ok(())
        })
    }

    /// Forcibly stop a running sandbox, leaving it marked as unclean
    pub fn kill(&self, port: u16) -> Result<SandboxStatus> {
        self.transition(port, "kill", |instance| {
            if instance.state != SandboxState::Running {
                return Err(AdminError::precondition(format!(
                    "The local instance on port {port} is not running"
                )));
            }
            instance.state = SandboxState::Stopped;
            instance.clean_shutdown = false;
            Ok(())
        })
    }

    /// Delete a stopped sandbox, removing its directory
    pub fn delete(&self, port: u16) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        let instance = inner
            .instances
            .get(&port)
            .ok_or(AdminError::SandboxNotFound { port })?;

        if instance.state == SandboxState::Running {
            return Err(AdminError::precondition(format!(
                "The local instance on port {port} is running; stop or kill it first"
            )));
        }

        if let Some(dir) = sandbox_dir(&inner, port)
            && dir.exists()
        {
            fs::remove_dir_all(&dir)?;
        }
        inner.instances.remove(&port);
        info!(port, "deleted local instance");
        Ok(())
    }

    fn transition(
        &self,
        port: u16,
        action: &str,
        apply: impl FnOnce(&mut SandboxInstance) -> Result<()>,
    ) -> Result<SandboxStatus> {
        let mut inner = self.inner.borrow_mut();
        let Some(mut instance) = inner.instances.get(&port).cloned() else {
            return Err(AdminError::SandboxNotFound { port });
        };

        apply(&mut instance)?;
        write_state(&inner, &instance)?;
        info!(port, action, state = %instance.state, "local instance transition");

        let status = self.status_of(&inner, &instance);
        inner.instances.insert(port, instance);
        Ok(status)
    }

    fn status_of(&self, inner: &Inner, instance: &SandboxInstance) -> SandboxStatus {
        SandboxStatus {
            port: instance.port,
            state: instance.state,
            clean_shutdown: instance.clean_shutdown,
            datadir: sandbox_dir(inner, instance.port)
                .map(|dir| dir.join(SANDBOX_DATADIR).display().to_string()),
        }
    }
}

fn sandbox_dir(inner: &Inner, port: u16) -> Option<PathBuf> {
    inner.base_dir.as_ref().map(|base| base.join(port.to_string()))
}

fn write_state(inner: &Inner, instance: &SandboxInstance) -> Result<()> {
    let Some(dir) = sandbox_dir(inner, instance.port) else {
        return Ok(());
    };
    fs::create_dir_all(&dir)?;
    fs::write(dir.join(INSTANCE_FILE), toml::to_string_pretty(instance)?)?;
    Ok(())
}

fn check_port(port: u16) -> Result<()> {
    if port < 1024 {
        return Err(AdminError::invalid_argument(format!(
            "Invalid port {port}: sandbox ports must be between 1024 and 65535"
        )));
    }
    Ok(())
}
