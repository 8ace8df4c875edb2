//! Configuration for the radiko client
//!
//! The configuration is resolved in three layers:
//!
//! 1. the embedded default document (`radiko.yaml`),
//! 2. an optional external YAML file, deep-merged over the defaults,
//! 3. `PMORADIKO__<KEY>[__<SUBKEY>]` environment variables, parsed as YAML
//!    scalars (`PMORADIKO__TIMEOUT_SECS=30`, `PMORADIKO__APP__DEVICE=pc`).
//!
//! # Example
//!
//! ```no_run
//! use pmoradiko::{RadikoClient, RadikoConfig};
//! use std::path::Path;
//!
//! # fn main() -> pmoradiko::Result<()> {
//! let config = RadikoConfig::load(Some(Path::new("radiko.yaml")))?;
//! let client = RadikoClient::builder().config(&config).build()?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::{env, fs};
use tracing::{debug, info};

/// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("radiko.yaml");

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "PMORADIKO__";

/// Application identity sent with the authorization handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    /// `X-Radiko-App`
    pub app: String,
    /// `X-Radiko-App-Version`
    pub app_version: String,
    /// `X-Radiko-User`
    pub user: String,
    /// `X-Radiko-Device`
    pub device: String,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            app: "pc_html5".to_string(),
            app_version: "0.0.1".to_string(),
            user: "dummy_user".to_string(),
            device: "pc".to_string(),
        }
    }
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadikoConfig {
    /// API root, versioned paths are resolved against it
    pub base_url: String,
    /// HTTP timeout of the transport
    pub timeout_secs: u64,
    /// User-Agent of the transport
    pub user_agent: String,
    /// Initial auth token (empty: not authorized yet)
    #[serde(default)]
    pub auth_token: String,
    /// Handshake identity headers
    #[serde(default)]
    pub app: AppIdentity,
}

impl Default for RadikoConfig {
    fn default() -> Self {
        Self {
            base_url: crate::client::DEFAULT_BASE_URL.to_string(),
            timeout_secs: crate::transport::DEFAULT_HTTP_TIMEOUT_SECS,
            user_agent: crate::transport::DEFAULT_USER_AGENT.to_string(),
            auth_token: String::new(),
            app: AppIdentity::default(),
        }
    }
}

impl RadikoConfig {
    /// Load the configuration: embedded defaults, optional file, environment
    ///
    /// A missing file is not an error; the defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        if let Some(path) = path {
            match fs::read(path) {
                Ok(data) => {
                    info!(config_file = %path.display(), "Loaded radiko config file");
                    let external: Value = serde_yaml::from_slice(&data)?;
                    merge_yaml(&mut value, &lower_keys(external));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!(config_file = %path.display(), "Config file not found, using defaults");
                }
                Err(e) => return Err(e.into()),
            }
        }

        apply_overrides(&mut value, env::vars());

        Ok(serde_yaml::from_value(value)?)
    }

    /// Parse a YAML document merged over the embedded defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
        let external: Value = serde_yaml::from_str(yaml)?;
        merge_yaml(&mut value, &lower_keys(external));
        Ok(serde_yaml::from_value(value)?)
    }
}

/// Apply `PMORADIKO__` overrides from `vars` onto `config`
///
/// Keys are split on `__` and lower-cased; values that parse as YAML keep
/// their type, others are taken as strings.
pub fn apply_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, raw) in vars {
        let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<String> = stripped
            .split("__")
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
            .collect();
        if path.is_empty() {
            continue;
        }

        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        debug!(key = %key, "Applying radiko config override");
        set_path(config, &path, value);
    }
}

fn set_path(config: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *config = value;
        return;
    };

    if !config.is_mapping() {
        *config = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(map) = config {
        let entry = map
            .entry(Value::String(head.clone()))
            .or_insert(Value::Null);
        set_path(entry, rest, value);
    }
}

fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| match k {
                    Value::String(s) => (Value::String(s.to_lowercase()), lower_keys(v)),
                    other => (other, lower_keys(v)),
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}

fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        // empty document or key: keep the default
        (_, Value::Null) => {}
        // scalars and sequences are replaced
        (d, e) => *d = e.clone(),
    }
}
