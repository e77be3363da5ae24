use clap::error::ErrorKind;
use serial_test::serial;
use std::env;
use std::io::Write;
use tennis_assistant::config::{AppConfig, CREDENTIAL_ENV, load_llm_settings};
use tennis_assistant::error::ConfigError;

const BIN: &str = "tennis-assistant";

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("TENNIS_SERVER__PORT");
        env::remove_var("TENNIS_LLM__MODEL");
        env::remove_var("TENNIS_LLM__TEMPERATURE");
        env::remove_var("CONFIG_FILE");
        env::remove_var("HOST");
        env::remove_var("PORT");
        env::remove_var("LLM_MODEL");
        env::remove_var(CREDENTIAL_ENV);
    }
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).expect("defaults should load");
    assert_eq!(config.server.port, 8501);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.llm.model, "gpt-4o-mini");
    assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
    assert!(config.llm.system_prompt.contains("Virtual Tennis Assistant"));
    assert_eq!(config.chat.idle_timeout_secs, 30 * 60);
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("TENNIS_SERVER__PORT", "9090");
        env::set_var("TENNIS_LLM__MODEL", "gpt-4o");
    }

    let config = AppConfig::load_from_args([BIN]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.llm.model, "gpt-4o");

    clear_env_vars();
}

#[test]
#[serial]
fn test_cli_beats_env() {
    clear_env_vars();
    unsafe {
        env::set_var("TENNIS_SERVER__PORT", "9090");
    }

    let config = AppConfig::load_from_args([BIN, "--port", "7000", "--model", "gpt-4.1-mini"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 7000);
    assert_eq!(config.llm.model, "gpt-4.1-mini");

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(
        file,
        "server:\n  port: 7070\nllm:\n  temperature: 0.2\n"
    )
    .expect("Failed to write temp config");

    let path = file.path().to_str().unwrap().to_string();
    let config = AppConfig::load_from_args([BIN, "--config", &path])
        .expect("Failed to load config from file");
    assert_eq!(config.server.port, 7070);
    assert!((config.llm.temperature - 0.2).abs() < f32::EPSILON);
    // Untouched keys keep their defaults.
    assert_eq!(config.llm.model, "gpt-4o-mini");
}

#[test]
#[serial]
fn test_missing_config_file_fails() {
    clear_env_vars();

    let result = AppConfig::load_from_args([BIN, "--config", "does-not-exist.yaml"]);
    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
#[serial]
fn test_help_and_version_are_not_config_errors() {
    clear_env_vars();

    let help = AppConfig::load_from_args([BIN, "--help"]).unwrap_err();
    assert!(matches!(&help, ConfigError::Cli(e) if e.kind() == ErrorKind::DisplayHelp));

    let version = AppConfig::load_from_args([BIN, "--version"]).unwrap_err();
    assert!(matches!(&version, ConfigError::Cli(e) if e.kind() == ErrorKind::DisplayVersion));

    let unknown = AppConfig::load_from_args([BIN, "--serve-speed", "fast"]).unwrap_err();
    assert!(matches!(&unknown, ConfigError::Cli(e) if e.kind() == ErrorKind::UnknownArgument));
}

#[test]
#[serial]
fn test_missing_credential_is_fatal() {
    clear_env_vars();

    let config = AppConfig::load_from_args([BIN]).unwrap();
    let err = load_llm_settings(&config.llm).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential(CREDENTIAL_ENV)));

    unsafe {
        env::set_var(CREDENTIAL_ENV, "   ");
    }
    assert!(load_llm_settings(&config.llm).is_err());

    clear_env_vars();
}

#[test]
#[serial]
fn test_credential_loads_settings() {
    clear_env_vars();
    unsafe {
        env::set_var(CREDENTIAL_ENV, "sk-test");
    }

    let config = AppConfig::load_from_args([BIN]).unwrap();
    let settings = load_llm_settings(&config.llm).expect("settings should load");
    assert_eq!(settings.api_key, "sk-test");
    assert_eq!(settings.model, "gpt-4o-mini");

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_base_url() {
    clear_env_vars();
    unsafe {
        env::set_var(CREDENTIAL_ENV, "sk-test");
    }

    let mut config = AppConfig::load_from_args([BIN]).unwrap();
    config.llm.base_url = "not a url".to_string();
    let err = load_llm_settings(&config.llm).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));

    clear_env_vars();
}
