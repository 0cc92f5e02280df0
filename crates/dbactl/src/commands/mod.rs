//! Command implementations

pub mod cluster;
pub mod instance;
pub mod local;
pub mod metadata;
pub mod session;

use crate::error::{DbaCtlError, Result as CliResult};

/// Parse repeated `KEY=VALUE` pairs into a JSON map.
///
/// Values are parsed as JSON scalars when possible (`true`, `3310`), and
/// fall back to plain strings otherwise. Key validation is left to the
/// option parsers in dbactl-core so unknown keys are rejected with the
/// same errors the library reports everywhere else.
pub fn parse_kv_options(pairs: &[String]) -> CliResult<serde_json::Map<String, serde_json::Value>> {
    let mut map = serde_json::Map::new();
    for pair in pairs {
        let (key, value) = pair.split_once('=').ok_or_else(|| DbaCtlError::InvalidInput {
            message: format!("Invalid option '{pair}': expected KEY=VALUE"),
        })?;
        if key.is_empty() {
            return Err(DbaCtlError::InvalidInput {
                message: format!("Invalid option '{pair}': empty key"),
            });
        }
        let value = serde_json::from_str(value)
            .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
        map.insert(key.to_string(), value);
    }
    Ok(map)
}
