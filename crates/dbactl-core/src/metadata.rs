//! Cluster metadata registry
//!
//! The metadata schema is the bookkeeping store the administrative layer
//! uses to track clusters and their replica set membership. It is modeled
//! as an explicit in-memory registry keyed by cluster name, optionally
//! backed by a TOML file (`metadata.toml` in the state directory) so that
//! separate CLI invocations observe the same clusters.
//!
//! [`MetadataStorage`] is a cheaply cloneable handle; the session and every
//! cluster handle share the same underlying registry, so membership changes
//! made through one handle are visible through all of them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::address::InstanceAddress;
use crate::error::{AdminError, Result};

/// Option key that authorizes dropping a cluster with a populated replica set
pub const OPT_DROP_DEFAULT_REPLICA_SET: &str = "dropDefaultReplicaSet";

/// Name given to the replica set every cluster starts with
pub const DEFAULT_REPLICA_SET: &str = "default";

/// A single instance registered in a replica set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub address: InstanceAddress,
    pub user: String,
}

/// Replica set membership for a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaSetRecord {
    pub name: String,
    #[serde(default)]
    pub instances: Vec<InstanceRecord>,
}

impl ReplicaSetRecord {
    pub fn new_default() -> Self {
        Self {
            name: DEFAULT_REPLICA_SET.to_string(),
            instances: Vec::new(),
        }
    }
}

/// Registered state of a cluster
#[derive(Clone, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    pub description: String,
    pub instance_admin_user: String,
    pub admin_password: String,
    pub default_replica_set: ReplicaSetRecord,
}

// Manual Debug so the admin password never leaks into logs.
impl std::fmt::Debug for ClusterRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterRecord")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("instance_admin_user", &self.instance_admin_user)
            .field("admin_password", &"****")
            .field("default_replica_set", &self.default_replica_set)
            .finish()
    }
}

/// Serialized form of the whole registry
#[derive(Debug, Default, Serialize, Deserialize)]
struct MetadataDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_cluster: Option<String>,
    #[serde(default)]
    clusters: Vec<ClusterRecord>,
}

#[derive(Debug, Default)]
struct Schema {
    default_cluster: Option<String>,
    clusters: BTreeMap<String, Rc<RefCell<ClusterRecord>>>,
}

#[derive(Debug)]
struct Inner {
    path: Option<PathBuf>,
    // None means the metadata schema has not been created
    schema: RefCell<Option<Schema>>,
}

/// Shared handle to the metadata registry
#[derive(Debug, Clone)]
pub struct MetadataStorage {
    inner: Rc<Inner>,
}

impl MetadataStorage {
    /// Registry without file backing, used by ephemeral sessions and tests
    pub fn in_memory() -> Self {
        Self {
            inner: Rc::new(Inner {
                path: None,
                schema: RefCell::new(None),
            }),
        }
    }

    /// Open the registry backed by the given metadata file.
    ///
    /// A missing file means the metadata schema does not exist yet; it is
    /// created lazily by the first `create_cluster`.
    pub fn open(path: PathBuf) -> Result<Self> {
        let schema = if path.exists() {
            let content = fs::read_to_string(&path)?;
            let document: MetadataDocument = toml::from_str(&content)?;
            debug!(
                clusters = document.clusters.len(),
                path = %path.display(),
                "loaded metadata schema"
            );
            Some(Schema {
                default_cluster: document.default_cluster,
                clusters: document
                    .clusters
                    .into_iter()
                    .map(|record| (record.name.clone(), Rc::new(RefCell::new(record))))
                    .collect(),
            })
        } else {
            None
        };

        Ok(Self {
            inner: Rc::new(Inner {
                path: Some(path),
                schema: RefCell::new(schema),
            }),
        })
    }

    /// True if the metadata schema exists
    pub fn schema_exists(&self) -> bool {
        self.inner.schema.borrow().is_some()
    }

    /// Create the metadata schema if it does not exist yet
    pub fn create_schema(&self) -> Result<()> {
        {
            let mut schema = self.inner.schema.borrow_mut();
            if schema.is_some() {
                return Ok(());
            }
            info!("creating metadata schema");
            *schema = Some(Schema::default());
        }
        self.persist()
    }

    /// Drop the metadata schema and everything it tracks.
    ///
    /// Idempotent: dropping an absent schema is not an error, so a fresh
    /// environment can always be reset to a known state.
    pub fn drop_schema(&self) -> Result<()> {
        let existed = self.inner.schema.borrow_mut().take().is_some();
        if existed {
            info!("dropped metadata schema");
        }
        if let Some(path) = &self.inner.path
            && path.exists()
        {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Register a new cluster and return its shared record
    pub fn insert_cluster(&self, record: ClusterRecord) -> Result<Rc<RefCell<ClusterRecord>>> {
        let shared = {
            let mut borrow = self.inner.schema.borrow_mut();
            let schema = borrow.as_mut().ok_or(AdminError::MetadataMissing)?;

            if schema.clusters.contains_key(&record.name) {
                return Err(AdminError::precondition(format!(
                    "A cluster with the name '{}' already exists",
                    record.name
                )));
            }

            let name = record.name.clone();
            let shared = Rc::new(RefCell::new(record));
            schema.clusters.insert(name.clone(), Rc::clone(&shared));

            if schema.default_cluster.is_none() {
                schema.default_cluster = Some(name);
            }
            shared
        };
        self.persist()?;
        Ok(shared)
    }

    /// Look up a registered cluster by name
    pub fn get_cluster(&self, name: &str) -> Result<Rc<RefCell<ClusterRecord>>> {
        let borrow = self.inner.schema.borrow();
        let schema = borrow.as_ref().ok_or(AdminError::MetadataMissing)?;
        schema
            .clusters
            .get(name)
            .cloned()
            .ok_or_else(|| AdminError::ClusterNotFound {
                name: name.to_string(),
            })
    }

    /// Names of every registered cluster, ordered by name
    pub fn cluster_names(&self) -> Vec<String> {
        self.inner
            .schema
            .borrow()
            .as_ref()
            .map(|schema| schema.clusters.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Name of the default cluster, if one is set
    pub fn default_cluster_name(&self) -> Option<String> {
        self.inner
            .schema
            .borrow()
            .as_ref()
            .and_then(|schema| schema.default_cluster.clone())
    }

    /// Remove a cluster from the registry.
    ///
    /// A cluster whose default replica set still holds instances is only
    /// dropped when `drop_default_replica_set` is set.
    pub fn drop_cluster(&self, name: &str, drop_default_replica_set: bool) -> Result<()> {
        {
            let mut borrow = self.inner.schema.borrow_mut();
            let schema = borrow.as_mut().ok_or(AdminError::MetadataMissing)?;

            let record = schema
                .clusters
                .get(name)
                .ok_or_else(|| AdminError::ClusterNotFound {
                    name: name.to_string(),
                })?;

            let members = record.borrow().default_replica_set.instances.len();
            if members > 0 && !drop_default_replica_set {
                return Err(AdminError::precondition(format!(
                    "Cannot drop cluster '{name}': the default replica set still has {members} \
                     instance(s). Set the '{OPT_DROP_DEFAULT_REPLICA_SET}' option to drop it anyway"
                )));
            }

            schema.clusters.remove(name);
            if schema.default_cluster.as_deref() == Some(name) {
                schema.default_cluster = None;
            }
            info!(cluster = name, "dropped cluster");
        }
        self.persist()
    }

    /// True if any registered replica set contains the address
    pub fn address_in_use(&self, address: &InstanceAddress) -> bool {
        self.inner
            .schema
            .borrow()
            .as_ref()
            .map(|schema| {
                schema.clusters.values().any(|record| {
                    record
                        .borrow()
                        .default_replica_set
                        .instances
                        .iter()
                        .any(|instance| &instance.address == address)
                })
            })
            .unwrap_or(false)
    }

    /// Write the registry back to its backing file, if it has one
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        let borrow = self.inner.schema.borrow();
        let Some(schema) = borrow.as_ref() else {
            return Ok(());
        };

        let document = MetadataDocument {
            default_cluster: schema.default_cluster.clone(),
            clusters: schema
                .clusters
                .values()
                .map(|record| record.borrow().clone())
                .collect(),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(&document)?)?;
        debug!(path = %path.display(), "persisted metadata schema");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ClusterRecord {
        ClusterRecord {
            name: name.to_string(),
            description: "Default Cluster".to_string(),
            instance_admin_user: "instance_admin".to_string(),
            admin_password: "secret".to_string(),
            default_replica_set: ReplicaSetRecord::new_default(),
        }
    }

    #[test]
    fn test_schema_lifecycle() {
        let storage = MetadataStorage::in_memory();
        assert!(!storage.schema_exists());

        // dropping an absent schema is fine
        storage.drop_schema().unwrap();

        storage.create_schema().unwrap();
        assert!(storage.schema_exists());

        storage.drop_schema().unwrap();
        assert!(!storage.schema_exists());
    }

    #[test]
    fn test_operations_require_schema() {
        let storage = MetadataStorage::in_memory();
        assert!(matches!(
            storage.get_cluster("dev"),
            Err(AdminError::MetadataMissing)
        ));
        assert!(matches!(
            storage.drop_cluster("dev", false),
            Err(AdminError::MetadataMissing)
        ));
        assert!(storage.insert_cluster(record("dev")).is_err());
    }

    #[test]
    fn test_insert_sets_default_and_rejects_duplicates() {
        let storage = MetadataStorage::in_memory();
        storage.create_schema().unwrap();

        storage.insert_cluster(record("dev")).unwrap();
        assert_eq!(storage.default_cluster_name().as_deref(), Some("dev"));

        let err = storage.insert_cluster(record("dev")).unwrap_err();
        assert!(err.is_precondition());

        storage.insert_cluster(record("qa")).unwrap();
        // first cluster stays the default
        assert_eq!(storage.default_cluster_name().as_deref(), Some("dev"));
    }

    #[test]
    fn test_drop_nonempty_requires_override() {
        let storage = MetadataStorage::in_memory();
        storage.create_schema().unwrap();
        let cluster = storage.insert_cluster(record("dev")).unwrap();

        cluster
            .borrow_mut()
            .default_replica_set
            .instances
            .push(InstanceRecord {
                address: InstanceAddress {
                    host: "127.0.0.1".to_string(),
                    port: 3310,
                },
                user: "root".to_string(),
            });

        let err = storage.drop_cluster("dev", false).unwrap_err();
        assert!(err.is_precondition());
        assert!(err.to_string().contains(OPT_DROP_DEFAULT_REPLICA_SET));

        storage.drop_cluster("dev", true).unwrap();
        assert!(matches!(
            storage.get_cluster("dev"),
            Err(AdminError::ClusterNotFound { .. })
        ));
        assert_eq!(storage.default_cluster_name(), None);
    }

    #[test]
    fn test_handles_share_state() {
        let storage = MetadataStorage::in_memory();
        storage.create_schema().unwrap();
        storage.insert_cluster(record("dev")).unwrap();

        let first = storage.get_cluster("dev").unwrap();
        let second = storage.get_cluster("dev").unwrap();
        first.borrow_mut().description = "changed".to_string();
        assert_eq!(second.borrow().description, "changed");
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.toml");

        {
            let storage = MetadataStorage::open(path.clone()).unwrap();
            storage.create_schema().unwrap();
            let cluster = storage.insert_cluster(record("dev")).unwrap();
            cluster
                .borrow_mut()
                .default_replica_set
                .instances
                .push(InstanceRecord {
                    address: InstanceAddress {
                        host: "127.0.0.1".to_string(),
                        port: 3310,
                    },
                    user: "root".to_string(),
                });
            storage.persist().unwrap();
        }

        let storage = MetadataStorage::open(path.clone()).unwrap();
        assert!(storage.schema_exists());
        assert_eq!(storage.default_cluster_name().as_deref(), Some("dev"));
        let cluster = storage.get_cluster("dev").unwrap();
        assert_eq!(cluster.borrow().default_replica_set.instances.len(), 1);

        storage.drop_schema().unwrap();
        assert!(!path.exists());
    }
}
