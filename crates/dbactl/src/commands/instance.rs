//! Replica set instance command implementations

use crate::connection::SessionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub fn add_instance(
    manager: &SessionManager,
    cluster_name: &str,
    target: &str,
    credential: Option<&str>,
) -> CliResult<()> {
    let options = manager.resolve_target(target)?;
    let session = manager.open_session()?;
    let cluster = session.get_cluster(cluster_name)?;
    cluster.add_instance(&options, credential)?;
    Ok(())
}

pub fn remove_instance(
    manager: &SessionManager,
    cluster_name: &str,
    target: &str,
) -> CliResult<()> {
    let options = manager.resolve_target(target)?;
    let session = manager.open_session()?;
    let cluster = session.get_cluster(cluster_name)?;
    cluster.remove_instance(&options)?;
    Ok(())
}

pub fn validate_instance(
    manager: &SessionManager,
    target: &str,
    output_format: OutputFormat,
) -> CliResult<()> {
    let options = manager.resolve_target(target)?;
    let session = manager.open_session()?;
    let report = session.validate_instance(&options)?;
    print_output(report, output_format)?;
    Ok(())
}
