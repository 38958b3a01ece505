//! ABOUTME: Monitor options with defaults, validation and environment loading
//! ABOUTME: Handles instance name, metric namespace and duration buckets

use config::{Config as ConfigBuilder, Environment, File};
use mp_core::{Error, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Instance label used when none is configured
pub const DEFAULT_INSTANCE_NAME: &str = "unnamed";

/// Histogram buckets for command durations, in seconds
pub const DEFAULT_DURATION_BUCKETS: [f64; 9] =
    [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

/// Environment variable prefix, e.g. `MONGOPROM_INSTANCE_NAME`
pub const ENV_PREFIX: &str = "MONGOPROM";

/// Optional settings file looked up in the working directory (any format `config` knows)
pub const CONFIG_FILE: &str = "mongoprom";

/// A deferred change applied by [`MonitorOptions::merge`]
pub type MonitorOption = Box<dyn FnOnce(&mut MonitorOptions)>;

/// A deferred change applied by [`PoolMonitorOptions::merge`]
pub type PoolMonitorOption = Box<dyn FnOnce(&mut PoolMonitorOptions)>;

/// Options for the command monitor
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct MonitorOptions {
    /// Value of the `instance` label
    #[validate(length(min = 1))]
    pub instance_name: String,
    /// Prefix joined to every metric name with `_`; empty means no prefix
    pub namespace: String,
    /// Upper bounds of the command duration histogram
    #[validate(length(min = 1))]
    pub duration_buckets: Vec<f64>,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            namespace: String::new(),
            duration_buckets: DEFAULT_DURATION_BUCKETS.to_vec(),
        }
    }
}

impl MonitorOptions {
    /// Set the name of the MongoDB instance
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// Set the namespace of all metrics
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the duration buckets of commands
    pub fn with_duration_buckets(mut self, buckets: impl Into<Vec<f64>>) -> Self {
        self.duration_buckets = buckets.into();
        self
    }

    /// Apply overrides in order; later ones win
    pub fn merge(mut self, overrides: impl IntoIterator<Item = MonitorOption>) -> Self {
        for apply in overrides {
            apply(&mut self);
        }
        self
    }

    /// Load from defaults, the optional settings file and `MONGOPROM_*` variables
    pub fn load() -> Result<Self> {
        let builder = base_builder()?
            .set_default(
                "duration_buckets",
                DEFAULT_DURATION_BUCKETS.to_vec(),
            )?;

        let options: Self = build(builder)?;
        options
            .validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(options)
    }
}

/// Options for the connection pool monitor
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct PoolMonitorOptions {
    /// Value of the `instance` label
    #[validate(length(min = 1))]
    pub instance_name: String,
    /// Prefix joined to every metric name with `_`; empty means no prefix
    pub namespace: String,
}

impl Default for PoolMonitorOptions {
    fn default() -> Self {
        Self {
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            namespace: String::new(),
        }
    }
}

impl PoolMonitorOptions {
    /// Set the name of the MongoDB instance
    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// Set the namespace of all metrics
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Apply overrides in order; later ones win
    pub fn merge(mut self, overrides: impl IntoIterator<Item = PoolMonitorOption>) -> Self {
        for apply in overrides {
            apply(&mut self);
        }
        self
    }

    /// Load from defaults, the optional settings file and `MONGOPROM_*` variables
    pub fn load() -> Result<Self> {
        let options: Self = build(base_builder()?)?;
        options
            .validate()
            .map_err(|e| Error::Config(format!("Config validation failed: {}", e)))?;

        Ok(options)
    }
}

impl From<&MonitorOptions> for PoolMonitorOptions {
    fn from(options: &MonitorOptions) -> Self {
        Self {
            instance_name: options.instance_name.clone(),
            namespace: options.namespace.clone(),
        }
    }
}

type Builder = config::builder::ConfigBuilder<config::builder::DefaultState>;

fn base_builder() -> Result<Builder> {
    let builder = ConfigBuilder::builder()
        .set_default("instance_name", DEFAULT_INSTANCE_NAME)?
        .set_default("namespace", "")?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        // Highest priority; single underscores stay inside the key
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("duration_buckets"),
        );

    Ok(builder)
}

fn build<T: for<'de> Deserialize<'de>>(builder: Builder) -> Result<T> {
    let config = builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to build config: {}", e)))?;

    config
        .try_deserialize()
        .map_err(|e| Error::Config(format!("Failed to deserialize config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Use a mutex to serialize tests that modify environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 3] = [
        "MONGOPROM_INSTANCE_NAME",
        "MONGOPROM_NAMESPACE",
        "MONGOPROM_DURATION_BUCKETS",
    ];

    fn clear_env() {
        for key in VARS {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_default_options() {
        let options = MonitorOptions::default();

        assert_eq!(options.instance_name, "unnamed");
        assert_eq!(options.namespace, "");
        assert_eq!(
            options.duration_buckets,
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
        );
    }

    #[test]
    fn test_default_pool_options() {
        let options = PoolMonitorOptions::default();

        assert_eq!(options.instance_name, "unnamed");
        assert_eq!(options.namespace, "");
    }

    #[test]
    fn test_merge_applies_overrides_in_order() {
        let overrides: Vec<MonitorOption> = vec![
            Box::new(|o| o.namespace = "custom".to_string()),
            Box::new(|o| o.duration_buckets = vec![0.1]),
            Box::new(|o| o.namespace = "last".to_string()),
        ];

        let options = MonitorOptions::default().merge(overrides);

        assert_eq!(
            options,
            MonitorOptions {
                instance_name: "unnamed".to_string(),
                namespace: "last".to_string(),
                duration_buckets: vec![0.1],
            }
        );
    }

    #[test]
    fn test_builder_setters() {
        let options = MonitorOptions::default()
            .with_instance_name("database")
            .with_namespace("custom")
            .with_duration_buckets([0.01]);

        assert_eq!(options.instance_name, "database");
        assert_eq!(options.namespace, "custom");
        assert_eq!(options.duration_buckets, vec![0.01]);

        let pool = PoolMonitorOptions::default()
            .merge([Box::new(|o: &mut PoolMonitorOptions| o.instance_name = "db".into())
                as PoolMonitorOption])
            .with_namespace("ns");
        assert_eq!(pool.instance_name, "db");
        assert_eq!(pool.namespace, "ns");
    }

    #[test]
    fn test_pool_options_from_command_options() {
        let options = MonitorOptions::default()
            .with_instance_name("primary")
            .with_namespace("app");

        let pool = PoolMonitorOptions::from(&options);
        assert_eq!(pool.instance_name, "primary");
        assert_eq!(pool.namespace, "app");
    }

    #[test]
    fn test_validation_rejects_empty_values() {
        let options = MonitorOptions::default().with_duration_buckets(Vec::new());
        assert!(options.validate().is_err());

        let options = PoolMonitorOptions::default().with_instance_name("");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_json_uses_defaults() {
        let options: MonitorOptions =
            serde_json::from_str(r#"{"namespace": "svc"}"#).expect("valid json");

        assert_eq!(options.namespace, "svc");
        assert_eq!(options.instance_name, "unnamed");
        assert_eq!(options.duration_buckets.len(), 9);
    }

    #[test]
    fn test_load_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        let options = MonitorOptions::load().expect("Should load with defaults");
        assert_eq!(options, MonitorOptions::default());

        let pool = PoolMonitorOptions::load().expect("Should load with defaults");
        assert_eq!(pool, PoolMonitorOptions::default());
    }

    #[test]
    fn test_load_from_env() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("MONGOPROM_INSTANCE_NAME", "orders");
        env::set_var("MONGOPROM_NAMESPACE", "shop");
        env::set_var("MONGOPROM_DURATION_BUCKETS", "0.1,0.2,0.5");

        let options = MonitorOptions::load().expect("Should load from env");
        assert_eq!(options.instance_name, "orders");
        assert_eq!(options.namespace, "shop");
        assert_eq!(options.duration_buckets, vec![0.1, 0.2, 0.5]);

        let pool = PoolMonitorOptions::load().expect("Should load from env");
        assert_eq!(pool.instance_name, "orders");
        assert_eq!(pool.namespace, "shop");

        clear_env();
    }

    #[test]
    fn test_load_validation_failure() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_env();

        env::set_var("MONGOPROM_INSTANCE_NAME", "");

        let result = MonitorOptions::load();
        assert!(matches!(result, Err(Error::Config(_))));

        clear_env();
    }
}
