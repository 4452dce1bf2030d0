//! Runtime configuration for the world, scheduler, and transform propagation.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```json
//! { "entity_capacity": 4096, "log_schedule": true }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::EcsError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Entity slots reserved up front by [`World::with_config`](crate::ecs::World::with_config).
    pub entity_capacity: usize,
    /// Log the resolved system order at info level instead of debug.
    pub log_schedule: bool,
    /// Warn when propagation finds entities with a `LocalTransform` that no
    /// root reaches.
    pub warn_unreachable_transforms: bool,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 0,
            log_schedule: false,
            warn_unreachable_transforms: true,
        }
    }
}

impl EcsConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, EcsError> {
        serde_json::from_str(json).map_err(|e| EcsError::Config(e.to_string()))
    }

    pub fn to_json_string(&self) -> Result<String, EcsError> {
        serde_json::to_string_pretty(self).map_err(|e| EcsError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let config = EcsConfig::from_json_str(r#"{ "log_schedule": true }"#).unwrap();
        assert!(config.log_schedule);
        assert_eq!(config.entity_capacity, 0);
        assert!(config.warn_unreachable_transforms);
        assert_eq!(EcsConfig::from_json_str("{}").unwrap(), EcsConfig::default());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = EcsConfig::from_json_str(r#"{ "entity_capacty": 10 }"#).unwrap_err();
        let EcsError::Config(msg) = err else {
            panic!("expected a config error, got {err:?}");
        };
        assert!(msg.contains("entity_capacty"), "{msg}");
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            EcsConfig::from_json_str("{ entity_capacity: "),
            Err(EcsError::Config(_))
        ));
    }

    #[test]
    fn written_config_reads_back() {
        let config = EcsConfig {
            entity_capacity: 256,
            log_schedule: true,
            warn_unreachable_transforms: false,
        };
        let json = config.to_json_string().unwrap();
        assert_eq!(EcsConfig::from_json_str(&json).unwrap(), config);
    }
}
