//! Cluster command implementations

use dbactl_core::{CreateClusterOptions, DropClusterOptions, OPT_DROP_DEFAULT_REPLICA_SET};
use serde::Serialize;

use crate::commands::parse_kv_options;
use crate::connection::SessionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

#[derive(Serialize)]
struct ClusterRow {
    name: String,
    instances: usize,
    default: bool,
}

pub fn create_cluster(
    manager: &SessionManager,
    name: &str,
    admin_password: Option<&str>,
    prompt_admin_password: bool,
    options: &[String],
    output_format: OutputFormat,
) -> CliResult<()> {
    let mut map = parse_kv_options(options)?;

    if let Some(password) = admin_password {
        map.insert(
            "adminPassword".to_string(),
            serde_json::Value::String(password.to_string()),
        );
    } else if prompt_admin_password {
        let password = rpassword::prompt_password("Cluster admin password: ")?;
        map.insert(
            "adminPassword".to_string(),
            serde_json::Value::String(password),
        );
    }

    let create_options = CreateClusterOptions::from_map(&map)?;
    let session = manager.open_session()?;
    let cluster = session.create_cluster(name, create_options)?;

    print_output(cluster.describe(), output_format)?;
    Ok(())
}

pub fn get_cluster(
    manager: &SessionManager,
    name: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let session = manager.open_session()?;
    let cluster = session.get_cluster(name)?;
    print_output(cluster.describe(), output_format)?;
    Ok(())
}

pub fn list_clusters(manager: &SessionManager, output_format: OutputFormat) -> CliResult<()> {
    let session = manager.open_session()?;
    let default_name = session
        .get_default_cluster()
        .map(|cluster| cluster.name())
        .ok();

    let mut rows = Vec::new();
    for name in session.list_clusters() {
        let cluster = session.get_cluster(&name)?;
        rows.push(ClusterRow {
            default: default_name.as_deref() == Some(name.as_str()),
            instances: cluster.instance_count(),
            name,
        });
    }

    print_output(rows, output_format)?;
    Ok(())
}

pub fn cluster_status(
    manager: &SessionManager,
    name: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let session = manager.open_session()?;
    let cluster = match name {
        Some(name) => session.get_cluster(name)?,
        None => session.get_default_cluster()?,
    };
    print_output(cluster.describe(), output_format)?;
    Ok(())
}

pub fn drop_cluster(
    manager: &SessionManager,
    name: &str,
    drop_default_replica_set: bool,
    options: &[String],
) -> CliResult<()> {
    let mut map = parse_kv_options(options)?;
    if drop_default_replica_set {
        map.insert(
            OPT_DROP_DEFAULT_REPLICA_SET.to_string(),
            serde_json::Value::Bool(true),
        );
    }

    let drop_options = DropClusterOptions::from_map(&map)?;
    let session = manager.open_session()?;
    session.drop_cluster(name, drop_options)?;
    Ok(())
}
