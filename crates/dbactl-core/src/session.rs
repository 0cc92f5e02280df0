//! Administrative session
//!
//! [`AdminSession`] is the explicit context object behind every
//! administrative operation: it owns the metadata registry and the sandbox
//! registry, hands out [`Cluster`] handles, and keeps a per-session handle
//! cache that `reset_session` discards.
//!
//! The operation surface is enumerated statically by [`AdminOp`] and
//! [`ClusterOp`]; contract tests assert set equality of those enumerations
//! against the expected member names instead of relying on runtime
//! introspection.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address::ConnectOptions;
use crate::cluster::Cluster;
use crate::config::Config;
use crate::error::{AdminError, Result};
use crate::metadata::{ClusterRecord, MetadataStorage, ReplicaSetRecord};
use crate::sandbox::{DeployOptions, SandboxRegistry, SandboxStatus};

const GENERATED_PASSWORD_LENGTH: usize = 16;
const MAX_CLUSTER_NAME_LENGTH: usize = 40;

/// Operations exposed by the administrative session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminOp {
    CreateCluster,
    DeleteLocalInstance,
    DeployLocalInstance,
    DropCluster,
    DropMetadataSchema,
    GetCluster,
    Help,
    KillLocalInstance,
    ResetSession,
    StartLocalInstance,
    StopLocalInstance,
    ValidateInstance,
}

impl AdminOp {
    pub const ALL: [AdminOp; 12] = [
        AdminOp::CreateCluster,
        AdminOp::DeleteLocalInstance,
        AdminOp::DeployLocalInstance,
        AdminOp::DropCluster,
        AdminOp::DropMetadataSchema,
        AdminOp::GetCluster,
        AdminOp::Help,
        AdminOp::KillLocalInstance,
        AdminOp::ResetSession,
        AdminOp::StartLocalInstance,
        AdminOp::StopLocalInstance,
        AdminOp::ValidateInstance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AdminOp::CreateCluster => "create_cluster",
            AdminOp::DeleteLocalInstance => "delete_local_instance",
            AdminOp::DeployLocalInstance => "deploy_local_instance",
            AdminOp::DropCluster => "drop_cluster",
            AdminOp::DropMetadataSchema => "drop_metadata_schema",
            AdminOp::GetCluster => "get_cluster",
            AdminOp::Help => "help",
            AdminOp::KillLocalInstance => "kill_local_instance",
            AdminOp::ResetSession => "reset_session",
            AdminOp::StartLocalInstance => "start_local_instance",
            AdminOp::StopLocalInstance => "stop_local_instance",
            AdminOp::ValidateInstance => "validate_instance",
        }
    }

    pub fn signature(self) -> &'static str {
        match self {
            AdminOp::CreateCluster => "create_cluster(name[, options])",
            AdminOp::DeleteLocalInstance => "delete_local_instance(port)",
            AdminOp::DeployLocalInstance => "deploy_local_instance(port[, options])",
            AdminOp::DropCluster => "drop_cluster(name[, options])",
            AdminOp::DropMetadataSchema => "drop_metadata_schema(options)",
            AdminOp::GetCluster => "get_cluster(name)",
            AdminOp::Help => "help([operation])",
            AdminOp::KillLocalInstance => "kill_local_instance(port)",
            AdminOp::ResetSession => "reset_session()",
            AdminOp::StartLocalInstance => "start_local_instance(port)",
            AdminOp::StopLocalInstance => "stop_local_instance(port)",
            AdminOp::ValidateInstance => "validate_instance(connectionData)",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            AdminOp::CreateCluster => "Creates a cluster and returns its handle",
            AdminOp::DeleteLocalInstance => "Deletes a stopped local sandbox instance",
            AdminOp::DeployLocalInstance => "Deploys a new local sandbox instance",
            AdminOp::DropCluster => "Drops a cluster from the metadata",
            AdminOp::DropMetadataSchema => "Drops the metadata schema and everything it tracks",
            AdminOp::GetCluster => "Retrieves the handle of an existing cluster",
            AdminOp::Help => "Describes the administrative operations",
            AdminOp::KillLocalInstance => "Forcibly stops a running local sandbox instance",
            AdminOp::ResetSession => "Discards cached cluster handles for this session",
            AdminOp::StartLocalInstance => "Starts a stopped local sandbox instance",
            AdminOp::StopLocalInstance => "Gracefully stops a running local sandbox instance",
            AdminOp::ValidateInstance => "Validates an instance descriptor for cluster use",
        }
    }

    pub fn from_name(name: &str) -> Option<AdminOp> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// Operations exposed by a cluster handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterOp {
    AddInstance,
    RemoveInstance,
}

impl ClusterOp {
    pub const ALL: [ClusterOp; 2] = [ClusterOp::AddInstance, ClusterOp::RemoveInstance];

    pub fn name(self) -> &'static str {
        match self {
            ClusterOp::AddInstance => "add_instance",
            ClusterOp::RemoveInstance => "remove_instance",
        }
    }

    pub fn signature(self) -> &'static str {
        match self {
            ClusterOp::AddInstance => "add_instance(connectionData[, credential])",
            ClusterOp::RemoveInstance => "remove_instance(connectionData)",
        }
    }

    pub fn summary(self) -> &'static str {
        match self {
            ClusterOp::AddInstance => "Adds an instance to the default replica set",
            ClusterOp::RemoveInstance => "Removes an instance from the default replica set",
        }
    }

    pub fn from_name(name: &str) -> Option<ClusterOp> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }
}

/// Options accepted by `create_cluster`
#[derive(Debug, Clone, Default)]
pub struct CreateClusterOptions {
    /// Administrative password for the cluster; generated when omitted
    pub admin_password: Option<String>,
    /// Account used to manage member instances
    pub instance_admin_user: Option<String>,
    pub instance_admin_password: Option<String>,
}

impl CreateClusterOptions {
    /// Build options from a JSON map, rejecting unknown keys
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            let as_string = |value: &serde_json::Value| -> Result<String> {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        AdminError::invalid_argument(format!(
                            "The option '{key}' must be a string"
                        ))
                    })
            };
            match key.as_str() {
                "adminPassword" => options.admin_password = Some(as_string(value)?),
                "instanceAdminUser" => options.instance_admin_user = Some(as_string(value)?),
                "instanceAdminPassword" => {
                    options.instance_admin_password = Some(as_string(value)?);
                }
                other => {
                    return Err(AdminError::invalid_argument(format!(
                        "Unexpected argument '{other}' on create_cluster options"
                    )));
                }
            }
        }
        options.check()?;
        Ok(options)
    }

    fn check(&self) -> Result<()> {
        if let Some(user) = &self.instance_admin_user {
            if user.is_empty() {
                return Err(AdminError::invalid_argument(
                    "The instanceAdminUser option cannot be empty",
                ));
            }
            if self.instance_admin_password.is_none() {
                return Err(AdminError::invalid_argument(
                    "instanceAdminUser password not provided",
                ));
            }
        }
        Ok(())
    }
}

/// Options accepted by `drop_cluster`
#[derive(Debug, Clone, Copy, Default)]
pub struct DropClusterOptions {
    /// Drop the cluster even if its default replica set has members
    pub drop_default_replica_set: bool,
}

impl DropClusterOptions {
    /// Build options from a JSON map, rejecting unknown keys
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "dropDefaultReplicaSet" => {
                    options.drop_default_replica_set = value.as_bool().ok_or_else(|| {
                        AdminError::invalid_argument(
                            "The option 'dropDefaultReplicaSet' must be a boolean",
                        )
                    })?;
                }
                other => {
                    return Err(AdminError::invalid_argument(format!(
                        "Unexpected argument '{other}' on drop_cluster options"
                    )));
                }
            }
        }
        Ok(options)
    }
}

/// Options accepted by `drop_metadata_schema`
#[derive(Debug, Clone, Copy, Default)]
pub struct DropMetadataOptions {
    pub enforce: bool,
}

impl DropMetadataOptions {
    pub fn enforced() -> Self {
        Self { enforce: true }
    }

    /// Build options from a JSON map, rejecting unknown keys
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "enforce" => {
                    options.enforce = value.as_bool().ok_or_else(|| {
                        AdminError::invalid_argument("The option 'enforce' must be a boolean")
                    })?;
                }
                other => {
                    return Err(AdminError::invalid_argument(format!(
                        "Unexpected argument '{other}' on drop_metadata_schema options"
                    )));
                }
            }
        }
        Ok(options)
    }
}

/// Result of `validate_instance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub address: String,
    pub local_sandbox: bool,
}

/// The administrative session
#[derive(Debug)]
pub struct AdminSession {
    storage: MetadataStorage,
    sandboxes: SandboxRegistry,
    handles: RefCell<HashMap<String, Cluster>>,
}

impl AdminSession {
    /// Session with no filesystem backing; state dies with the session
    pub fn ephemeral() -> Self {
        Self {
            storage: MetadataStorage::in_memory(),
            sandboxes: SandboxRegistry::in_memory(),
            handles: RefCell::new(HashMap::new()),
        }
    }

    /// Session backed by a state directory (`metadata.toml` + `sandboxes/`)
    pub fn open(state_dir: &Path) -> Result<Self> {
        Ok(Self {
            storage: MetadataStorage::open(state_dir.join("metadata.toml"))?,
            sandboxes: SandboxRegistry::open(state_dir.join("sandboxes"))?,
            handles: RefCell::new(HashMap::new()),
        })
    }

    /// Session rooted at the state directory the configuration resolves to
    pub fn from_config(config: &Config) -> Result<Self> {
        let state_dir = config.resolve_state_dir()?;
        debug!(state_dir = %state_dir.display(), "opening administrative session");
        Self::open(&state_dir)
    }

    /// True if the metadata schema exists
    pub fn schema_exists(&self) -> bool {
        self.storage.schema_exists()
    }

    /// Create a new cluster and return its handle.
    ///
    /// The metadata schema is created on first use. The new cluster becomes
    /// the default cluster when none is set.
    pub fn create_cluster(&self, name: &str, options: CreateClusterOptions) -> Result<Cluster> {
        check_cluster_name(name)?;
        options.check()?;

        self.storage.create_schema()?;

        let admin_password = options
            .admin_password
            .unwrap_or_else(|| generate_password(GENERATED_PASSWORD_LENGTH));
        let record = ClusterRecord {
            name: name.to_string(),
            description: "Default Cluster".to_string(),
            instance_admin_user: options
                .instance_admin_user
                .unwrap_or_else(|| "instance_admin".to_string()),
            admin_password,
            default_replica_set: ReplicaSetRecord::new_default(),
        };

        let shared = self.storage.insert_cluster(record)?;
        info!(cluster = name, "created cluster");

        let cluster = Cluster::new(shared, self.storage.clone(), self.sandboxes.clone());
        self.handles
            .borrow_mut()
            .insert(name.to_string(), cluster.clone());
        Ok(cluster)
    }

    /// Retrieve the handle of a registered cluster
    pub fn get_cluster(&self, name: &str) -> Result<Cluster> {
        if name.is_empty() {
            return Err(AdminError::invalid_argument(
                "The cluster name cannot be empty",
            ));
        }

        if let Some(cluster) = self.handles.borrow().get(name) {
            return Ok(cluster.clone());
        }

        let shared = self.storage.get_cluster(name)?;
        let cluster = Cluster::new(shared, self.storage.clone(), self.sandboxes.clone());
        self.handles
            .borrow_mut()
            .insert(name.to_string(), cluster.clone());
        Ok(cluster)
    }

    /// Retrieve the handle of the default cluster
    pub fn get_default_cluster(&self) -> Result<Cluster> {
        let name = self
            .storage
            .default_cluster_name()
            .ok_or_else(|| AdminError::precondition("There is no default cluster"))?;
        self.get_cluster(&name)
    }

    /// Drop a cluster from the metadata
    pub fn drop_cluster(&self, name: &str, options: DropClusterOptions) -> Result<()> {
        if name.is_empty() {
            return Err(AdminError::invalid_argument(
                "The cluster name cannot be empty",
            ));
        }

        self.storage
            .drop_cluster(name, options.drop_default_replica_set)?;
        self.handles.borrow_mut().remove(name);
        Ok(())
    }

    /// Drop the metadata schema.
    ///
    /// Destructive, so it must be explicitly enforced.
    pub fn drop_metadata_schema(&self, options: DropMetadataOptions) -> Result<()> {
        if !options.enforce {
            return Err(AdminError::precondition(
                "Dropping the metadata schema must be enforced: set the 'enforce' option",
            ));
        }
        self.storage.drop_schema()?;
        self.handles.borrow_mut().clear();
        Ok(())
    }

    /// Discard cached cluster handles; the metadata itself is untouched
    pub fn reset_session(&self) {
        debug!("resetting administrative session");
        self.handles.borrow_mut().clear();
    }

    /// Validate an instance descriptor for cluster use
    pub fn validate_instance(&self, options: &ConnectOptions) -> Result<ValidationReport> {
        options.check_shape()?;

        let local_sandbox = options.is_local() && self.sandboxes.contains(options.port);
        if options.is_local() && !local_sandbox {
            return Err(AdminError::precondition(format!(
                "{} is a local address but no sandbox instance is deployed on port {}",
                options.host, options.port
            )));
        }

        let address = options.address();
        if self.storage.address_in_use(&address) {
            return Err(AdminError::precondition(format!(
                "The instance '{address}' is already part of a cluster"
            )));
        }

        Ok(ValidationReport {
            address: address.to_string(),
            local_sandbox,
        })
    }

    /// Deploy a new local sandbox instance
    pub fn deploy_local_instance(
        &self,
        port: u16,
        options: DeployOptions,
    ) -> Result<SandboxStatus> {
        self.sandboxes.deploy(port, options)
    }

    /// Start a stopped local sandbox instance
    pub fn start_local_instance(&self, port: u16) -> Result<SandboxStatus> {
        self.sandboxes.start(port)
    }

    /// Gracefully stop a running local sandbox instance
    pub fn stop_local_instance(&self, port: u16) -> Result<SandboxStatus> {
        self.sandboxes.stop(port)
    }

    /// Forcibly stop a running local sandbox instance
    pub fn kill_local_instance(&self, port: u16) -> Result<SandboxStatus> {
        self.sandboxes.kill(port)
    }

    /// Delete a stopped local sandbox instance
    pub fn delete_local_instance(&self, port: u16) -> Result<()> {
        self.sandboxes.delete(port)
    }

    /// Status of every deployed local sandbox instance
    pub fn list_local_instances(&self) -> Vec<SandboxStatus> {
        self.sandboxes.list()
    }

    /// Names of every registered cluster
    pub fn list_clusters(&self) -> Vec<String> {
        self.storage.cluster_names()
    }

    /// Help text for the whole session or a single operation
    pub fn help(&self, topic: Option<&str>) -> Result<String> {
        match topic {
            None => {
                let mut text = String::from("Administrative session operations:\n");
                for op in AdminOp::ALL {
                    let _ = writeln!(text, "  {:<40} {}", op.signature(), op.summary());
                }
                text.push_str("Cluster handle operations:\n");
                for op in ClusterOp::ALL {
                    let _ = writeln!(text, "  {:<40} {}", op.signature(), op.summary());
                }
                Ok(text)
            }
            Some(name) => {
                if let Some(op) = AdminOp::from_name(name) {
                    Ok(format!("{}\n  {}\n", op.signature(), op.summary()))
                } else if let Some(op) = ClusterOp::from_name(name) {
                    Ok(format!("{}\n  {}\n", op.signature(), op.summary()))
                } else {
                    Err(AdminError::invalid_argument(format!(
                        "Unknown help topic '{name}'"
                    )))
                }
            }
        }
    }
}

fn check_cluster_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AdminError::invalid_argument(
            "The cluster name cannot be empty",
        ));
    }
    if name.len() > MAX_CLUSTER_NAME_LENGTH {
        return Err(AdminError::invalid_argument(format!(
            "The cluster name cannot be longer than {MAX_CLUSTER_NAME_LENGTH} characters"
        )));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AdminError::invalid_argument(
            "The cluster name can only contain alphanumeric characters or '_'",
        ));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(AdminError::invalid_argument(
            "The cluster name cannot start with a digit",
        ));
    }
    Ok(())
}

fn generate_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_name_validation() {
        assert!(check_cluster_name("devCluster").is_ok());
        assert!(check_cluster_name("dev_cluster_2").is_ok());

        for bad in ["", "dev cluster", "dev-cluster", "1cluster"] {
            let err = check_cluster_name(bad).unwrap_err();
            assert!(err.is_invalid_argument(), "expected rejection of {bad:?}");
        }

        let long = "c".repeat(MAX_CLUSTER_NAME_LENGTH + 1);
        assert!(check_cluster_name(&long).is_err());
    }

    #[test]
    fn test_generated_password_shape() {
        let password = generate_password(GENERATED_PASSWORD_LENGTH);
        assert_eq!(password.len(), GENERATED_PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
        // two draws colliding would mean the generator is broken
        assert_ne!(password, generate_password(GENERATED_PASSWORD_LENGTH));
    }

    #[test]
    fn test_create_cluster_creates_schema() {
        let session = AdminSession::ephemeral();
        assert!(!session.schema_exists());

        session
            .create_cluster("devCluster", CreateClusterOptions::default())
            .unwrap();
        assert!(session.schema_exists());
    }

    #[test]
    fn test_create_options_from_map() {
        let map = serde_json::json!({
            "adminPassword": "secret",
            "instanceAdminUser": "ops",
            "instanceAdminPassword": "ops-secret",
        });
        let options = CreateClusterOptions::from_map(map.as_object().unwrap()).unwrap();
        assert_eq!(options.admin_password.as_deref(), Some("secret"));
        assert_eq!(options.instance_admin_user.as_deref(), Some("ops"));

        let map = serde_json::json!({"instanceAdminUser": "ops"});
        let err = CreateClusterOptions::from_map(map.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("password not provided"));

        let map = serde_json::json!({"multiPrimary": true});
        let err = CreateClusterOptions::from_map(map.as_object().unwrap()).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("multiPrimary"));
    }

    #[test]
    fn test_drop_options_from_map() {
        let map = serde_json::json!({"dropDefaultReplicaSet": true});
        let options = DropClusterOptions::from_map(map.as_object().unwrap()).unwrap();
        assert!(options.drop_default_replica_set);

        let map = serde_json::json!({"dropDefaultReplicaSet": 5});
        assert!(DropClusterOptions::from_map(map.as_object().unwrap()).is_err());

        let map = serde_json::json!({"force": true});
        let err = DropClusterOptions::from_map(map.as_object().unwrap()).unwrap_err();
        assert!(err.to_string().contains("force"));
    }

    #[test]
    fn test_reset_session_keeps_metadata() {
        let session = AdminSession::ephemeral();
        session
            .create_cluster("devCluster", CreateClusterOptions::default())
            .unwrap();

        session.reset_session();
        assert!(session.handles.borrow().is_empty());

        // the registry still knows the cluster
        let cluster = session.get_cluster("devCluster").unwrap();
        assert_eq!(cluster.name(), "devCluster");
    }

    #[test]
    fn test_default_cluster() {
        let session = AdminSession::ephemeral();
        assert!(session.get_default_cluster().unwrap_err().is_precondition());

        session
            .create_cluster("devCluster", CreateClusterOptions::default())
            .unwrap();
        assert_eq!(session.get_default_cluster().unwrap().name(), "devCluster");
    }

    #[test]
    fn test_help_topics() {
        let session = AdminSession::ephemeral();

        let overview = session.help(None).unwrap();
        for op in AdminOp::ALL {
            assert!(overview.contains(op.name()), "missing {}", op.name());
        }

        let detail = session.help(Some("create_cluster")).unwrap();
        assert!(detail.contains("create_cluster(name[, options])"));

        let detail = session.help(Some("add_instance")).unwrap();
        assert!(detail.contains("add_instance"));

        assert!(session.help(Some("make_coffee")).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn test_validate_instance() {
        let session = AdminSession::ephemeral();

        // loopback without a sandbox on that port
        let err = session
            .validate_instance(&ConnectOptions::new("root", "127.0.0.1", 3310))
            .unwrap_err();
        assert!(err.is_precondition());

        session
            .deploy_local_instance(3310, DeployOptions::default())
            .unwrap();
        let report = session
            .validate_instance(&ConnectOptions::new("root", "127.0.0.1", 3310))
            .unwrap();
        assert!(report.local_sandbox);
        assert_eq!(report.address, "127.0.0.1:3310");

        // a remote host validates without a sandbox
        let report = session
            .validate_instance(&ConnectOptions::new("root", "db1.example.com", 3306))
            .unwrap();
        assert!(!report.local_sandbox);
    }

    #[test]
    fn test_validate_instance_rejects_cluster_member() {
        let session = AdminSession::ephemeral();
        let cluster = session
            .create_cluster("devCluster", CreateClusterOptions::default())
            .unwrap();
        cluster
            .add_instance(&ConnectOptions::new("root", "db1.example.com", 3306), None)
            .unwrap();

        let err = session
            .validate_instance(&ConnectOptions::new("root", "db1.example.com", 3306))
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains("already part of a cluster"));
    }
}
