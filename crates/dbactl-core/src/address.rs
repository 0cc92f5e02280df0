//! Connection descriptors for addressing database instances
//!
//! Instances are addressed either by a structured descriptor map
//! (`{dbUser: "root", host: "127.0.0.1", port: 3310}`) or by a compact
//! URI of the shape `<user>:<password>@<host>:<port>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, Result};

/// Descriptor keys accepted when building [`ConnectOptions`] from a map.
const VALID_CONNECT_KEYS: &[&str] = &["user", "dbUser", "password", "dbPassword", "host", "port"];

/// Host/port pair identifying an instance inside a replica set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceAddress {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for InstanceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Full connection descriptor for a target instance
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub host: String,
    pub port: u16,
}

impl ConnectOptions {
    pub fn new(user: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            user: user.into(),
            password: None,
            host: host.into(),
            port,
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Address portion of the descriptor, used as the membership key
    pub fn address(&self) -> InstanceAddress {
        InstanceAddress {
            host: self.host.clone(),
            port: self.port,
        }
    }

    /// Build a descriptor from a JSON map, rejecting unknown keys.
    ///
    /// `dbUser`/`dbPassword` are accepted as aliases of `user`/`password`.
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        for key in map.keys() {
            if !VALID_CONNECT_KEYS.contains(&key.as_str()) {
                return Err(AdminError::invalid_argument(format!(
                    "Unexpected argument '{key}' on connection data"
                )));
            }
        }

        let string_at = |primary: &str, alias: &str| -> Result<Option<String>> {
            let value = map.get(primary).or_else(|| map.get(alias));
            match value {
                None => Ok(None),
                Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(AdminError::invalid_argument(format!(
                    "The connection option '{primary}' must be a string"
                ))),
            }
        };

        let user = string_at("user", "dbUser")?.ok_or_else(|| {
            AdminError::invalid_argument("Missing required connection option 'user'")
        })?;
        let password = string_at("password", "dbPassword")?;
        let host = string_at("host", "host")?.ok_or_else(|| {
            AdminError::invalid_argument("Missing required connection option 'host'")
        })?;

        let port = match map.get("port") {
            Some(value) => value
                .as_u64()
                .and_then(|p| u16::try_from(p).ok())
                .ok_or_else(|| {
                    AdminError::invalid_argument(
                        "The connection option 'port' must be an integer between 1 and 65535",
                    )
                })?,
            None => {
                return Err(AdminError::invalid_argument(
                    "Missing required connection option 'port'",
                ));
            }
        };

        let options = Self {
            user,
            password,
            host,
            port,
        };
        options.check_shape()?;
        Ok(options)
    }

    /// Structural validation shared by every entry point that accepts a
    /// descriptor: non-empty user and host, non-zero port.
    pub fn check_shape(&self) -> Result<()> {
        if self.user.is_empty() {
            return Err(AdminError::invalid_argument(
                "The connection user cannot be empty",
            ));
        }
        if self.host.is_empty() {
            return Err(AdminError::invalid_argument(
                "The connection host cannot be empty",
            ));
        }
        if self.port == 0 {
            return Err(AdminError::invalid_argument(
                "The connection port cannot be 0",
            ));
        }
        Ok(())
    }

    /// True if the host is a loopback name or address.
    ///
    /// Loopback targets can only refer to sandbox instances; a production
    /// cluster member must be addressable from other hosts.
    pub fn is_local(&self) -> bool {
        self.host == "localhost" || self.host.starts_with("127.")
    }
}

impl FromStr for ConnectOptions {
    type Err = AdminError;

    /// Parse the harness connection shape `<user>:<password>@<host>:<port>`.
    ///
    /// The password segment is optional: `root@127.0.0.1:3310` is accepted.
    fn from_str(s: &str) -> Result<Self> {
        let (credentials, transport) = s.rsplit_once('@').ok_or_else(|| {
            AdminError::invalid_argument(format!(
                "Invalid connection string '{s}': expected <user>[:<password>]@<host>:<port>"
            ))
        })?;

        let (user, password) = match credentials.split_once(':') {
            Some((user, password)) => (user, Some(password.to_string())),
            None => (credentials, None),
        };

        let (host, port) = transport.rsplit_once(':').ok_or_else(|| {
            AdminError::invalid_argument(format!(
                "Invalid connection string '{s}': missing port"
            ))
        })?;

        let port: u16 = port.parse().map_err(|_| {
            AdminError::invalid_argument(format!("Invalid port '{port}' in connection string"))
        })?;

        let options = Self {
            user: user.to_string(),
            password,
            host: host.to_string(),
            port,
        };
        options.check_shape()?;
        Ok(options)
    }
}

impl fmt::Display for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.password.is_some() {
            write!(f, "{}:****@{}:{}", self.user, self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}

// Manual Debug so a password never leaks into logs or error output.
impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_parse_full_connection_string() {
        let opts: ConnectOptions = "root:secret@127.0.0.1:3310".parse().unwrap();
        assert_eq!(opts.user, "root");
        assert_eq!(opts.password.as_deref(), Some("secret"));
        assert_eq!(opts.host, "127.0.0.1");
        assert_eq!(opts.port, 3310);
    }

    #[test]
    fn test_parse_without_password() {
        let opts: ConnectOptions = "admin@db.example.com:3306".parse().unwrap();
        assert_eq!(opts.user, "admin");
        assert_eq!(opts.password, None);
        assert!(!opts.is_local());
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        for input in ["", "root", "root@host", "root@host:notaport", "@host:3306"] {
            let err = input.parse::<ConnectOptions>().unwrap_err();
            assert!(err.is_invalid_argument(), "expected rejection of {input:?}");
        }
    }

    #[test]
    fn test_from_map_with_aliases() {
        let opts = ConnectOptions::from_map(&map(json!({
            "dbUser": "root",
            "host": "127.0.0.1",
            "port": 3310,
        })))
        .unwrap();
        assert_eq!(opts.user, "root");
        assert_eq!(opts.address().to_string(), "127.0.0.1:3310");
        assert!(opts.is_local());
    }

    #[test]
    fn test_from_map_rejects_unknown_key() {
        let err = ConnectOptions::from_map(&map(json!({
            "dbUser": "root",
            "host": "127.0.0.1",
            "port": 3310,
            "socket": "/tmp/db.sock",
        })))
        .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("socket"));
    }

    #[test]
    fn test_from_map_rejects_bad_port_type() {
        let err = ConnectOptions::from_map(&map(json!({
            "user": "root",
            "host": "127.0.0.1",
            "port": "high",
        })))
        .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_display_and_debug_redact_password() {
        let opts = ConnectOptions::new("root", "127.0.0.1", 3310).with_password("secret");
        assert!(!format!("{opts}").contains("secret"));
        assert!(!format!("{opts:?}").contains("secret"));
    }
}
