//! # Circuit Breaker Configuration
//!
//! Provides configuration structures and validation for circuit breaker
//! behavior. [`CircuitBreakerConfig`] configures a single breaker;
//! [`CircuitBreakerSystemConfig`] is the file-loadable shape used by the
//! manager, with plain-integer timeouts for TOML friendliness and
//! per-component overrides.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for a single circuit breaker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure tally that must be exceeded before the circuit opens
    pub failure_threshold: u32,

    /// Time to wait in open state before probing recovery
    pub timeout: Duration,

    /// Success tally that must be exceeded in half-open state to close
    pub success_threshold: u32,
}

impl CircuitBreakerConfig {
    /// Create configuration for database operations
    pub fn for_database() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }

    /// Create configuration for queue operations
    pub fn for_queue() -> Self {
        Self {
            failure_threshold: 3,
            timeout: Duration::from_secs(15),
            success_threshold: 2,
        }
    }

    /// Create configuration for external API calls
    pub fn for_external_api() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(45),
            success_threshold: 2,
        }
    }

    /// Validate configuration parameters.
    ///
    /// Zero thresholds are legal: threshold N trips on the (N+1)-th event,
    /// so a threshold of 0 trips on the first one.
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold > 1000 {
            return Err("failure_threshold should not exceed 1000".to_string());
        }

        if self.success_threshold > 1000 {
            return Err("success_threshold should not exceed 1000".to_string());
        }

        if self.timeout > Duration::from_secs(3600) {
            return Err("timeout should not exceed 3600 seconds".to_string());
        }

        Ok(())
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(5),
            success_threshold: 5,
        }
    }
}

/// Per-component circuit breaker settings as written in config files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerComponentConfig {
    /// Failure tally that must be exceeded before the circuit opens
    pub failure_threshold: u32,

    /// Open-state cool-down in whole seconds
    pub timeout_seconds: u64,

    /// Success tally that must be exceeded in half-open state to close
    pub success_threshold: u32,
}

impl CircuitBreakerComponentConfig {
    /// Convert the file shape into a runtime breaker configuration.
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            timeout: Duration::from_secs(self.timeout_seconds),
            success_threshold: self.success_threshold,
        }
    }
}

impl Default for CircuitBreakerComponentConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 5,
            success_threshold: 5,
        }
    }
}

/// Global circuit breaker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalCircuitBreakerSettings {
    /// Maximum number of circuit breakers allowed
    pub max_circuit_breakers: usize,

    /// Interval for metrics collection and reporting, in seconds
    pub metrics_collection_interval_seconds: u64,

    /// Minimum interval between state transitions, in seconds
    /// (prevents oscillation)
    pub min_state_transition_interval_seconds: f64,
}

impl GlobalCircuitBreakerSettings {
    /// Validate global settings
    pub fn validate(&self) -> Result<(), String> {
        if self.max_circuit_breakers == 0 {
            return Err("max_circuit_breakers must be greater than 0".to_string());
        }

        if self.max_circuit_breakers > 1000 {
            return Err("max_circuit_breakers should not exceed 1000".to_string());
        }

        if self.metrics_collection_interval_seconds == 0 {
            return Err("metrics_collection_interval_seconds must be greater than 0".to_string());
        }

        if self.min_state_transition_interval_seconds <= 0.0 {
            return Err(
                "min_state_transition_interval_seconds must be greater than 0".to_string(),
            );
        }

        Ok(())
    }
}

impl Default for GlobalCircuitBreakerSettings {
    fn default() -> Self {
        Self {
            max_circuit_breakers: 50,
            metrics_collection_interval_seconds: 30,
            min_state_transition_interval_seconds: 1.0,
        }
    }
}

/// System-wide circuit breaker configuration with per-component overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSystemConfig {
    /// Whether circuit breaker protection is enabled at all
    pub enabled: bool,

    /// Global settings shared by every breaker
    pub global_settings: GlobalCircuitBreakerSettings,

    /// Settings applied to components without an explicit entry
    pub default_config: CircuitBreakerComponentConfig,

    /// Per-component overrides keyed by component name
    pub component_configs: HashMap<String, CircuitBreakerComponentConfig>,
}

impl CircuitBreakerSystemConfig {
    /// Look up the configuration for a component, falling back to the
    /// default when no override exists.
    pub fn config_for_component(&self, component_name: &str) -> &CircuitBreakerComponentConfig {
        self.component_configs
            .get(component_name)
            .unwrap_or(&self.default_config)
    }

    /// Validate the whole configuration tree
    pub fn validate(&self) -> Result<(), String> {
        self.global_settings.validate()?;
        self.default_config.to_breaker_config().validate()?;

        for (name, component) in &self.component_configs {
            component
                .to_breaker_config()
                .validate()
                .map_err(|e| format!("component '{name}': {e}"))?;
        }

        Ok(())
    }
}
