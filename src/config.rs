//! Store configuration
//!
//! Small serde struct so hosts can ship it as JSON next to their own
//! settings, or build it in code.

use serde::{Deserialize, Serialize};

/// Environment variable consulted by `StoreConfig::from_env` (native only)
#[cfg(not(target_arch = "wasm32"))]
pub const DEBUG_ENV_VAR: &str = "SCOPED_STORE_DEBUG";

/// Store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Log decode failures and cleanup snapshots
    pub debug_logging: bool,
    /// Register the page-unload cleanup listener (web entry point)
    pub cleanup_on_unload: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            cleanup_on_unload: true,
        }
    }
}

impl StoreConfig {
    pub fn with_debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    pub fn with_cleanup_on_unload(mut self, enabled: bool) -> Self {
        self.cleanup_on_unload = enabled;
        self
    }

    /// Parse from JSON, falling back to defaults for malformed input
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str(json) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid store config ({}), using defaults", e);
                Self::default()
            }
        }
    }

    /// Defaults, with debug logging enabled by `SCOPED_STORE_DEBUG=1|true`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Self {
        let debug_logging = std::env::var(DEBUG_ENV_VAR)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self::default().with_debug_logging(debug_logging)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
