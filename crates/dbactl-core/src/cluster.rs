//! Cluster handles
//!
//! A [`Cluster`] is an opaque handle to a registered cluster. Handles are
//! cheap to clone and all handles for the same name share the underlying
//! record, so membership changes are visible through the session and every
//! other handle immediately.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::address::ConnectOptions;
use crate::error::{AdminError, Result};
use crate::metadata::{ClusterRecord, InstanceRecord, MetadataStorage};
use crate::sandbox::SandboxRegistry;

/// Handle to a registered cluster
#[derive(Debug, Clone)]
pub struct Cluster {
    record: Rc<RefCell<ClusterRecord>>,
    storage: MetadataStorage,
    sandboxes: SandboxRegistry,
}

/// Serializable topology snapshot, as produced by [`Cluster::describe`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterDescription {
    pub cluster_name: String,
    pub default_replica_set: ReplicaSetDescription,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaSetDescription {
    pub name: String,
    pub instances: Vec<InstanceDescription>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceDescription {
    pub address: String,
    pub user: String,
}

impl Cluster {
    pub(crate) fn new(
        record: Rc<RefCell<ClusterRecord>>,
        storage: MetadataStorage,
        sandboxes: SandboxRegistry,
    ) -> Self {
        Self {
            record,
            storage,
            sandboxes,
        }
    }

    /// Name of the cluster this handle refers to
    pub fn name(&self) -> String {
        self.record.borrow().name.clone()
    }

    /// True if two handles refer to the same registered cluster
    pub fn same_cluster(&self, other: &Cluster) -> bool {
        Rc::ptr_eq(&self.record, &other.record)
    }

    /// Number of instances in the default replica set
    pub fn instance_count(&self) -> usize {
        self.record.borrow().default_replica_set.instances.len()
    }

    /// Add an instance to the default replica set.
    ///
    /// The descriptor must be structurally valid, the address must not be
    /// registered already, and a loopback address must refer to a deployed
    /// sandbox instance.
    pub fn add_instance(
        &self,
        options: &ConnectOptions,
        credential: Option<&str>,
    ) -> Result<()> {
        options.check_shape()?;
        if let Some(credential) = credential
            && credential.is_empty()
        {
            return Err(AdminError::invalid_argument(
                "The credential cannot be empty",
            ));
        }
        self.check_local_is_sandbox(options)?;

        let address = options.address();
        {
            let mut record = self.record.borrow_mut();
            let replica_set = &mut record.default_replica_set;

            if replica_set
                .instances
                .iter()
                .any(|instance| instance.address == address)
            {
                return Err(AdminError::precondition(format!(
                    "The instance '{address}' is already part of the replica set"
                )));
            }

            replica_set.instances.push(InstanceRecord {
                address: address.clone(),
                user: options.user.clone(),
            });
            info!(cluster = %record.name, instance = %address, "added instance");
        }
        self.storage.persist()
    }

    /// Remove an instance from the default replica set
    pub fn remove_instance(&self, options: &ConnectOptions) -> Result<()> {
        options.check_shape()?;

        let address = options.address();
        {
            let mut record = self.record.borrow_mut();
            let replica_set = &mut record.default_replica_set;

            let position = replica_set
                .instances
                .iter()
                .position(|instance| instance.address == address)
                .ok_or_else(|| AdminError::InstanceNotFound {
                    address: address.to_string(),
                })?;

            replica_set.instances.remove(position);
            info!(cluster = %record.name, instance = %address, "removed instance");
        }
        self.storage.persist()
    }

    /// Topology snapshot of the cluster
    pub fn describe(&self) -> ClusterDescription {
        let record = self.record.borrow();
        ClusterDescription {
            cluster_name: record.name.clone(),
            default_replica_set: ReplicaSetDescription {
                name: record.default_replica_set.name.clone(),
                instances: record
                    .default_replica_set
                    .instances
                    .iter()
                    .map(|instance| InstanceDescription {
                        address: instance.address.to_string(),
                        user: instance.user.clone(),
                    })
                    .collect(),
            },
        }
    }

    // A loopback address is only routable from this host, so it can only
    // name one of our own sandbox instances.
    fn check_local_is_sandbox(&self, options: &ConnectOptions) -> Result<()> {
        if options.is_local() && !self.sandboxes.contains(options.port) {
            return Err(AdminError::precondition(format!(
                "To add an instance to the cluster, please use a valid, non-local hostname or IP. \
                 {} can only be used with sandbox instances",
                options.host
            )));
        }
        Ok(())
    }
}
