use ferrous_wire::{location, ConfigError, ContainerConfig, EnvironmentConfigSource, Registrations, DEFAULT_MAX_DEPTH};
use serial_test::serial;
use std::env;

const VARS: [&str; 3] = ["FERROUS_WIRE_TRACE", "FERROUS_WIRE_MAX_DEPTH", "FERROUS_WIRE_LOG_GRAPH"];

fn clear() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear();
    let config = ContainerConfig::from_env().unwrap();
    assert!(!config.trace_resolutions);
    assert!(!config.log_graph_on_error);
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear();
    env::set_var("FERROUS_WIRE_TRACE", "yes");
    env::set_var("FERROUS_WIRE_MAX_DEPTH", "64");
    env::set_var("FERROUS_WIRE_LOG_GRAPH", "on");

    let config = ContainerConfig::from_env().unwrap();
    assert!(config.trace_resolutions);
    assert!(config.log_graph_on_error);
    assert_eq!(config.max_depth, 64);
    clear();
}

#[test]
#[serial]
fn test_from_env_rejects_garbage() {
    clear();
    env::set_var("FERROUS_WIRE_MAX_DEPTH", "deep");

    match ContainerConfig::from_env().unwrap_err() {
        ConfigError::InvalidValue { key, value, .. } => {
            assert_eq!(key, "max_depth");
            assert_eq!(value, "deep");
        }
        #[allow(unreachable_patterns)]
        other => panic!("unexpected error: {}", other),
    }
    clear();
}

#[test]
#[serial]
fn test_custom_prefix() {
    env::set_var("MYAPP_MAX_DEPTH", "8");
    let config = ContainerConfig::load(&EnvironmentConfigSource::with_prefix("myapp")).unwrap();
    assert_eq!(config.max_depth, 8);
    env::remove_var("MYAPP_MAX_DEPTH");
}

#[test]
#[serial]
fn test_env_config_applied_to_container() {
    clear();
    env::set_var("FERROUS_WIRE_MAX_DEPTH", "2");

    let mut regs = Registrations::new();
    regs.with_config(ContainerConfig::from_env().unwrap());
    regs.supply(1u8, location!());
    let container = regs.build().unwrap();
    assert_eq!(container.config().max_depth, 2);
    clear();
}
