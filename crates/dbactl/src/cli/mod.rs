//! CLI structure and command definitions
//!
//! Defines the command-line interface using clap. Every administrative
//! operation of the session surface is reachable from a subcommand; the
//! session itself is rooted at the resolved state directory.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Administrative CLI for database cluster lifecycle management
#[derive(Parser, Debug)]
#[command(name = "dbactl")]
#[command(version, about = "Database cluster administration CLI")]
#[command(long_about = "
Database cluster administration CLI

Clusters are tracked in a metadata registry under the state directory;
local sandbox instances live next to it and are addressable by port.

EXAMPLES:
    # Create a cluster and inspect it
    dbactl cluster create devCluster --admin-password secret
    dbactl cluster status devCluster -o table

    # Deploy a local sandbox instance and add it to the cluster
    dbactl local deploy 3310
    dbactl instance add devCluster root@127.0.0.1:3310 --credential root

    # Drop a populated cluster
    dbactl cluster drop devCluster --drop-default-replica-set

For more help on a specific command, run:
    dbactl <command> --help
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "DBACTL_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Directory holding the metadata registry and sandbox instances
    #[arg(long, global = true, env = "DBACTL_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster lifecycle management
    Cluster {
        #[command(subcommand)]
        command: ClusterCommands,
    },

    /// Replica set instance management
    Instance {
        #[command(subcommand)]
        command: InstanceCommands,
    },

    /// Local sandbox instance management
    Local {
        #[command(subcommand)]
        command: LocalCommands,
    },

    /// Metadata schema management
    Metadata {
        #[command(subcommand)]
        command: MetadataCommands,
    },

    /// Session management
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Describe the administrative operations
    Ops {
        /// Operation to describe; all of them when omitted
        topic: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Cluster lifecycle commands
#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Create a new cluster
    #[command(after_help = "EXAMPLES:
    dbactl cluster create devCluster
    dbactl cluster create devCluster --admin-password secret
    dbactl cluster create devCluster --option instanceAdminUser=ops \\
        --option instanceAdminPassword=ops-secret
")]
    Create {
        /// Name of the cluster
        name: String,

        /// Administrative password; generated when omitted
        #[arg(long, conflicts_with = "prompt_admin_password")]
        admin_password: Option<String>,

        /// Prompt for the administrative password
        #[arg(long)]
        prompt_admin_password: bool,

        /// Additional option as KEY=VALUE (repeatable)
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },

    /// Retrieve a registered cluster
    Get {
        /// Name of the cluster
        name: String,
    },

    /// List registered clusters
    List,

    /// Show the topology of a cluster
    Status {
        /// Name of the cluster; the default cluster when omitted
        name: Option<String>,
    },

    /// Drop a cluster from the metadata
    #[command(after_help = "EXAMPLES:
    dbactl cluster drop devCluster
    dbactl cluster drop devCluster --drop-default-replica-set
")]
    Drop {
        /// Name of the cluster
        name: String,

        /// Drop the cluster even if its replica set has members
        #[arg(long)]
        drop_default_replica_set: bool,

        /// Additional option as KEY=VALUE (repeatable)
        #[arg(long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },
}

/// Replica set instance commands
#[derive(Subcommand, Debug)]
pub enum InstanceCommands {
    /// Add an instance to a cluster's default replica set
    Add {
        /// Name of the cluster
        cluster: String,

        /// Target instance: `<user>[:<password>]@<host>:<port>` or a profile name
        target: String,

        /// Credential used to authenticate against the target
        #[arg(long)]
        credential: Option<String>,
    },

    /// Remove an instance from a cluster's default replica set
    Remove {
        /// Name of the cluster
        cluster: String,

        /// Target instance: `<user>[:<password>]@<host>:<port>` or a profile name
        target: String,
    },

    /// Validate an instance descriptor for cluster use
    Validate {
        /// Target instance: `<user>[:<password>]@<host>:<port>` or a profile name
        target: String,
    },
}

/// Local sandbox instance commands
#[derive(Subcommand, Debug)]
pub enum LocalCommands {
    /// Deploy a new sandbox instance on a port
    Deploy {
        /// Port of the sandbox instance
        port: u16,

        /// Root password for the instance; generated when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Start a stopped sandbox instance
    Start { port: u16 },

    /// Gracefully stop a running sandbox instance
    Stop { port: u16 },

    /// Forcibly stop a running sandbox instance
    Kill { port: u16 },

    /// Delete a stopped sandbox instance
    Delete { port: u16 },

    /// List deployed sandbox instances
    List,
}

/// Metadata schema commands
#[derive(Subcommand, Debug)]
pub enum MetadataCommands {
    /// Drop the metadata schema and everything it tracks
    Drop {
        /// Required confirmation that the drop is intended
        #[arg(long)]
        enforce: bool,
    },

    /// Show whether the metadata schema exists
    Status,
}

/// Session commands
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Discard cached cluster handles
    Reset,
}
