//! Local sandbox instance command implementations

use dbactl_core::DeployOptions;

use crate::connection::SessionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub fn deploy(
    manager: &SessionManager,
    port: u16,
    password: Option<&str>,
    output_format: OutputFormat,
) -> CliResult<()> {
    let session = manager.open_session()?;
    let status = session.deploy_local_instance(
        port,
        DeployOptions {
            password: password.map(str::to_string),
        },
    )?;
    print_output(status, output_format)?;
    Ok(())
}

pub fn start(manager: &SessionManager, port: u16, output_format: OutputFormat) -> CliResult<()> {
    let session = manager.open_session()?;
    let status = session.start_local_instance(port)?;
    print_output(status, output_format)?;
    Ok(())
}

pub fn stop(manager: &SessionManager, port: u16, output_format: OutputFormat) -> CliResult<()> {
    let session = manager.open_session()?;
    let status = session.stop_local_instance(port)?;
    print_output(status, output_format)?;
    Ok(())
}

pub fn kill(manager: &SessionManager, port: u16, output_format: OutputFormat) -> CliResult<()> {
    let session = manager.open_session()?;
    let status = session.kill_local_instance(port)?;
    print_output(status, output_format)?;
    Ok(())
}

pub fn delete(manager: &SessionManager, port: u16) -> CliResult<()> {
    let session = manager.open_session()?;
    session.delete_local_instance(port)?;
    Ok(())
}

pub fn list(manager: &SessionManager, output_format: OutputFormat) -> CliResult<()> {
    let session = manager.open_session()?;
    print_output(session.list_local_instances(), output_format)?;
    Ok(())
}
