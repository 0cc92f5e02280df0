//! # dbactl-core
//!
//! Core library behind the `dbactl` administrative tools. It implements the
//! administrative session contract for database cluster lifecycle
//! management:
//!
//! - [`AdminSession`] — the explicit session context exposing the
//!   enumerated operation surface ([`AdminOp`])
//! - [`Cluster`] — opaque handles to registered clusters, supporting
//!   replica set membership changes ([`ClusterOp`])
//! - [`MetadataStorage`] — the cluster registry (the "metadata schema"),
//!   optionally persisted in the state directory
//! - [`SandboxRegistry`] — local sandbox instance lifecycle
//!   (deploy/start/stop/kill/delete)
//! - [`config`] — TOML configuration with named connection profiles
//!
//! ```no_run
//! use dbactl_core::{AdminSession, ConnectOptions, CreateClusterOptions};
//!
//! # fn main() -> dbactl_core::Result<()> {
//! let session = AdminSession::ephemeral();
//! let cluster = session.create_cluster("devCluster", CreateClusterOptions::default())?;
//! cluster.add_instance(&"root:secret@db1.example.com:3306".parse::<ConnectOptions>()?, None)?;
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod cluster;
pub mod config;
pub mod error;
pub mod metadata;
pub mod sandbox;
pub mod session;

pub use address::{ConnectOptions, InstanceAddress};
pub use cluster::{Cluster, ClusterDescription};
pub use config::{Config, ConfigError, Profile};
pub use error::{AdminError, Result};
pub use metadata::{MetadataStorage, OPT_DROP_DEFAULT_REPLICA_SET};
pub use sandbox::{DeployOptions, SandboxRegistry, SandboxState, SandboxStatus};
pub use session::{
    AdminOp, AdminSession, ClusterOp, CreateClusterOptions, DropClusterOptions,
    DropMetadataOptions, ValidationReport,
};
