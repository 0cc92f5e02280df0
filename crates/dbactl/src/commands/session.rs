//! Session command implementations

use crate::connection::SessionManager;
use crate::error::Result as CliResult;

pub fn reset(manager: &SessionManager) -> CliResult<()> {
    let session = manager.open_session()?;
    session.reset_session();
    Ok(())
}

pub fn describe_operations(manager: &SessionManager, topic: Option<&str>) -> CliResult<()> {
    let session = manager.open_session()?;
    print!("{}", session.help(topic)?);
    Ok(())
}
