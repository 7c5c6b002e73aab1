//! TOML-based circuit breaker configuration tests.
//!
//! Verifies that the file-loadable system configuration deserializes from
//! TOML, that per-component overrides apply, and that a manager built from
//! that configuration hands out correctly configured breakers.

use circuit_breaker::{CircuitBreakerManager, CircuitBreakerSystemConfig};
use std::time::Duration;

const SYSTEM_CONFIG_TOML: &str = r#"
enabled = true

[global_settings]
max_circuit_breakers = 25
metrics_collection_interval_seconds = 15
min_state_transition_interval_seconds = 0.5

[default_config]
failure_threshold = 4
timeout_seconds = 20
success_threshold = 2

[component_configs.search_index]
failure_threshold = 3
timeout_seconds = 45
success_threshold = 2

[component_configs.message_queue]
failure_threshold = 2
timeout_seconds = 10
success_threshold = 1
"#;

#[test]
fn test_system_config_deserializes_from_toml() {
    let config: CircuitBreakerSystemConfig = toml::from_str(SYSTEM_CONFIG_TOML).unwrap();

    assert!(config.enabled);
    assert_eq!(config.global_settings.max_circuit_breakers, 25);
    assert_eq!(config.default_config.failure_threshold, 4);
    assert_eq!(config.component_configs.len(), 2);
    assert_eq!(
        config.config_for_component("message_queue").failure_threshold,
        2
    );
    assert_eq!(
        config.config_for_component("unknown").failure_threshold,
        4
    );
    assert!(config.validate().is_ok());
}

#[test]
fn test_manager_applies_toml_configuration() {
    let config: CircuitBreakerSystemConfig = toml::from_str(SYSTEM_CONFIG_TOML).unwrap();
    let manager = CircuitBreakerManager::from_config(&config);

    let search_index = manager.get_circuit_breaker("search_index");
    let message_queue = manager.get_circuit_breaker("message_queue");
    let unknown = manager.get_circuit_breaker("unknown_component");

    assert_eq!(search_index.name(), "search_index");
    assert_eq!(search_index.config().timeout, Duration::from_secs(45));
    assert_eq!(message_queue.config().failure_threshold, 2);

    // Components without an override inherit the default section.
    assert_eq!(unknown.config().failure_threshold, 4);
    assert_eq!(unknown.config().timeout, Duration::from_secs(20));

    let components = manager.list_components();
    assert_eq!(components.len(), 3);

    // All circuit breakers start closed and healthy.
    assert_eq!(manager.system_health_score(), 1.0);
    let metrics = manager.get_component_metrics("message_queue").unwrap();
    assert_eq!(metrics.total_calls, 0);
    assert_eq!(metrics.failure_count, 0);
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config: CircuitBreakerSystemConfig = toml::from_str("enabled = true").unwrap();

    assert!(config.enabled);
    assert_eq!(config.global_settings.max_circuit_breakers, 50);
    assert_eq!(config.default_config.failure_threshold, 5);
    assert!(config.component_configs.is_empty());
}
