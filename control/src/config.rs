//! Configuration for the KROUTE service
//!
//! Defaults match a typical ingress-nginx installation. Every field can be
//! overridden from the environment (see [`ServiceConfig::from_env`]).

use crate::error::RouteError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// HTTP API bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// IngressClass stamped on every generated Ingress (default: nginx)
    #[serde(default = "default_ingress_class")]
    pub ingress_class: String,

    /// JSON file backing the record store; in-memory store when unset
    #[serde(default)]
    pub store_path: Option<PathBuf>,

    /// Timeout configuration
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

/// Timeout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    /// Upper bound for one API request, cluster and store calls included (default: 30s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_ingress_class() -> String {
    "nginx".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            ingress_class: default_ingress_class(),
            store_path: None,
            timeouts: TimeoutConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, RouteError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RouteError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("KROUTE_BIND_ADDR") {
            config.bind_addr = val;
        }

        if let Some(val) = lookup("KROUTE_INGRESS_CLASS") {
            if val.is_empty() {
                return Err(RouteError::Config(
                    "KROUTE_INGRESS_CLASS cannot be empty".to_string(),
                ));
            }
            config.ingress_class = val;
        }

        if let Some(val) = lookup("KROUTE_STORE_PATH") {
            if !val.is_empty() {
                config.store_path = Some(PathBuf::from(val));
            }
        }

        if let Some(val) = lookup("KROUTE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = val.parse().map_err(|e| {
                RouteError::Config(format!("Invalid KROUTE_REQUEST_TIMEOUT_SECS '{}': {}", val, e))
            })?;
            if secs == 0 {
                return Err(RouteError::Config(
                    "KROUTE_REQUEST_TIMEOUT_SECS must be positive".to_string(),
                ));
            }
            config.timeouts.request_timeout_secs = secs;
        }

        Ok(config)
    }
}
