//! # Z-Push connector configuration
//!
//! This crate holds the account and client settings shared by the Z-Push
//! connector and its command-line front-end:
//! - Loading configuration from a YAML file
//! - Merging with the embedded default configuration
//! - Environment variable overrides (`ZPUSH_CONFIG__SECTION__KEY=value`)
//! - Typed getters and setters with defaults
//! - A lazily loaded shared instance
//!
//! ## Usage
//!
//! ```no_run
//! use zpushconfig::get_config;
//!
//! let config = get_config();
//! let server = config.get_server_url()?;
//! let device_id = config.get_device_id()?;
//! config.set_http_timeout_secs(60)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env, fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{info, warn};
use uuid::Uuid;

// Embedded default configuration
const DEFAULT_CONFIG: &str = include_str!("zpush.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load Z-Push configuration"));
}

const ENV_CONFIG_DIR: &str = "ZPUSH_CONFIG";
const ENV_PREFIX: &str = "ZPUSH_CONFIG__";
const CONFIG_DIR_NAME: &str = ".zpush";

const DEFAULT_DEVICE_TYPE: &str = "WindowsOutlook";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_CLIENT_PLUGIN: &str = concat!("zpushctl/", env!("CARGO_PKG_VERSION"));

/// Generates a getter/setter pair for a `u64` value with a default
macro_rules! impl_u64_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> u64 {
            match self.get_value($path) {
                Ok(Value::Number(n)) => n.as_u64().unwrap_or($default),
                Ok(Value::String(s)) => s.trim().parse().unwrap_or_else(|_| {
                    warn!(path = ?$path, value = %s, "Invalid number, using default");
                    $default
                }),
                _ => $default,
            }
        }

        pub fn $setter(&self, value: u64) -> Result<()> {
            self.set_value($path, Value::Number(Number::from(value)))
        }
    };
}

/// Generates a getter/setter pair for a required string value
macro_rules! impl_string_config {
    ($getter:ident, $setter:ident, $path:expr) => {
        pub fn $getter(&self) -> Result<String> {
            match self.get_value($path)? {
                Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
                _ => Err(anyhow!("{} is not configured", $path.join("."))),
            }
        }

        pub fn $setter(&self, value: String) -> Result<()> {
            self.set_value($path, Value::String(value))
        }
    };
}

/// Configuration manager for the Z-Push connector
///
/// The configuration is an untyped YAML tree behind a mutex; every change
/// made through a setter is written back to `config.yaml`.
///
/// # Examples
///
/// ```no_run
/// use zpushconfig::Config;
///
/// let config = Config::load_config("/tmp/zpush")?;
/// println!("device type: {}", config.get_device_type());
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self.lock().clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> String {
        if !directory.is_empty() {
            return directory.to_string();
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return env_path;
        }

        if Path::new(CONFIG_DIR_NAME).exists() {
            return CONFIG_DIR_NAME.to_string();
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config.to_string_lossy().to_string();
            }
        }

        CONFIG_DIR_NAME.to_string()
    }

    /// Creates the directory if needed and checks it is readable and writable
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `ZPUSH_CONFIG` environment variable
    /// 3. `.zpush` in the current directory
    /// 4. `.zpush` in the user's home directory
    ///
    /// The directory is created if it doesn't exist.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(Path::new(&dir_path))?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// The embedded defaults are merged with `<dir>/config.yaml` when it
    /// exists, keys are lower-cased, environment overrides are applied and
    /// the merged result is saved back.
    pub fn load_config(directory: &str) -> Result<Self> {
        Self::load_config_with_env(directory, env::vars())
    }

    /// Same as [`Config::load_config`], with `ZPUSH_CONFIG__*` overrides
    /// taken from `vars` instead of the process environment.
    pub fn load_config_with_env<I>(directory: &str, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir = %config_dir, "Using config directory");

        let config_file_path = Path::new(&config_dir).join("config.yaml");
        let path = config_file_path.to_string_lossy().to_string();

        let mut config_value: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;

        match fs::read(&path) {
            Ok(data) => {
                info!(config_file = %path, "Loaded config file");
                let external_value: Value = serde_yaml::from_slice(&data)?;
                merge_yaml(&mut config_value, &Self::lower_keys_value(external_value));
            }
            Err(_) => {
                info!(config_file = %path, "Config file not found, using default embedded config");
            }
        }
        let mut config_value = Self::lower_keys_value(config_value);

        Self::apply_env_overrides(&mut config_value, vars);

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    fn lock(&self) -> MutexGuard<'_, Value> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["http", "timeout_secs"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        {
            let mut data = self.lock();
            Self::set_value_internal(&mut data, path, value)?;
        }
        self.save()
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        let Some((first, rest)) = path.split_first() else {
            *data = value;
            return Ok(());
        };
        if let Value::Mapping(map) = data {
            let key_value = Value::String(first.to_lowercase());
            if rest.is_empty() {
                map.insert(key_value, value);
            } else {
                let entry = map
                    .entry(key_value)
                    .or_insert(Value::Mapping(Mapping::new()));
                Self::set_value_internal(entry, rest, value)?;
            }
            Ok(())
        } else {
            Err(anyhow!("Current node is not a map"))
        }
    }

    /// Gets a configuration value at the specified path
    ///
    /// Keys are matched case-insensitively. Fails when the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        Self::get_value_internal(&self.lock(), path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        let mut current = data;
        for (i, key) in path.iter().enumerate() {
            if let Value::Mapping(map) = current {
                match map.get(&Value::String(key.to_lowercase())) {
                    Some(next) => current = next,
                    None => return Err(anyhow!("Path {} does not exist", path[..=i].join("."))),
                }
            } else {
                return Err(anyhow!("Path {} is not a map", path[..i].join(".")));
            }
        }
        Ok(current.clone())
    }

    fn apply_env_overrides<I>(config: &mut Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(rest) = key.strip_prefix(ENV_PREFIX) {
                let key_path = rest.split("__").collect::<Vec<_>>();
                let yaml_value = Self::convert_env_value(&value);
                if let Err(err) = Self::set_value_internal(config, &key_path, yaml_value) {
                    warn!(env_var = %key, error = %err, "Ignoring environment override");
                }
            }
        }
    }

    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
    }

    fn lower_keys_value(value: Value) -> Value {
        match value {
            Value::Mapping(map) => Value::Mapping(
                map.into_iter()
                    .map(|(k, v)| {
                        let k = match k {
                            Value::String(s) => Value::String(s.to_lowercase()),
                            other => other,
                        };
                        (k, Self::lower_keys_value(v))
                    })
                    .collect(),
            ),
            Value::Sequence(seq) => {
                Value::Sequence(seq.into_iter().map(Self::lower_keys_value).collect())
            }
            _ => value,
        }
    }

    fn get_string_list(&self, path: &[&str]) -> Vec<String> {
        match self.get_value(path) {
            Ok(Value::Sequence(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Ok(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    impl_string_config!(get_server_url, set_server_url, &["server", "url"]);
    impl_string_config!(get_user_name, set_user_name, &["server", "user"]);
    impl_string_config!(get_password, set_password, &["server", "password"]);

    /// Identifier this client registers under, generated on first use
    ///
    /// The identifier is 32 lower-case hexadecimal digits and is persisted so
    /// the server keeps seeing the same device.
    pub fn get_device_id(&self) -> Result<String> {
        let path = &["device", "id"];
        match self.get_value(path) {
            Ok(Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_lowercase()),
            _ => {
                let id = Uuid::new_v4().simple().to_string();
                info!(device_id = %id, "Generated new device id");
                self.set_value(path, Value::String(id.clone()))?;
                Ok(id)
            }
        }
    }

    pub fn set_device_id(&self, id: String) -> Result<()> {
        self.set_value(&["device", "id"], Value::String(id.trim().to_lowercase()))
    }

    /// ActiveSync device type, `WindowsOutlook` unless configured
    pub fn get_device_type(&self) -> String {
        match self.get_value(&["device", "type"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => DEFAULT_DEVICE_TYPE.to_string(),
        }
    }

    /// Value of the client identification header
    pub fn get_client_plugin(&self) -> String {
        match self.get_value(&["client", "plugin"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => DEFAULT_CLIENT_PLUGIN.to_string(),
        }
    }

    /// Capabilities announced to the server, lower-cased
    pub fn get_client_capabilities(&self) -> Vec<String> {
        self.get_string_list(&["client", "capabilities"])
            .into_iter()
            .map(|c| c.to_lowercase())
            .collect()
    }

    /// Hosts whose invalid TLS certificates are accepted without asking
    pub fn get_accept_invalid_certificates(&self) -> Vec<String> {
        self.get_string_list(&["server", "accept_invalid_certificates"])
    }

    impl_u64_config!(
        get_http_timeout_secs,
        set_http_timeout_secs,
        &["http", "timeout_secs"],
        DEFAULT_HTTP_TIMEOUT_SECS
    );

    /// Gets the minimum log level from the configuration
    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["logger", "min_level"]) {
            Ok(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }

    /// Sets the minimum log level in the configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["logger", "min_level"], Value::String(level))
    }
}

/// Returns the global configuration instance
///
/// The instance is loaded on first access from the default directory
/// (see [`Config::config_dir`]).
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Merges external YAML configuration into default configuration
///
/// Mappings are merged key by key; scalars and sequences from `external`
/// replace the default ones.
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
        (d, e) => *d = e.clone(),
    }
}
