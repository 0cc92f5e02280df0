//! Metadata schema command implementations

use dbactl_core::DropMetadataOptions;
use serde_json::json;

use crate::connection::SessionManager;
use crate::error::Result as CliResult;
use crate::output::{OutputFormat, print_output};

pub fn drop_schema(manager: &SessionManager, enforce: bool) -> CliResult<()> {
    let session = manager.open_session()?;
    session.drop_metadata_schema(DropMetadataOptions { enforce })?;
    Ok(())
}

pub fn schema_status(manager: &SessionManager, output_format: OutputFormat) -> CliResult<()> {
    let session = manager.open_session()?;
    print_output(
        json!({
            "schema_exists": session.schema_exists(),
            "clusters": session.list_clusters(),
        }),
        output_format,
    )?;
    Ok(())
}
