//! Integration tests for configuration loading from disk

use std::fs;
use tempfile::TempDir;

use conductor_engine::config::Config;
use sdk::errors::ConductorError;

#[test]
fn test_load_full_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[core]
log_level = "debug"

[server]
host = "127.0.0.1"
port = 9090

[organization]
name = "DevTeam"
base_prompt = "You are assisting a software development team."

[llm]
api_key_env = "MY_CLAUDE_KEY"
timeout_secs = 15

[llm.anthropic]
base_url = "http://localhost:4010/v1"
model = "claude-3-haiku-20240307"
max_tokens = 500
temperature = 0.2
system_prompt = "Answer with JSON only."
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.organization.name, "DevTeam");
    assert_eq!(config.llm.api_key_env, "MY_CLAUDE_KEY");
    assert_eq!(config.llm.timeout_secs, 15);
    assert_eq!(config.llm.anthropic.max_tokens, 500);
    assert_eq!(config.llm.anthropic.system_prompt, "Answer with JSON only.");
}

#[test]
fn test_empty_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "").unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.organization.name, "Default Organization");
    assert_eq!(config.llm.timeout_secs, 60);
}

#[test]
fn test_written_defaults_load_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, toml::to_string_pretty(&Config::default()).unwrap()).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(
        config.organization.base_prompt,
        Config::default().organization.base_prompt
    );
    assert_eq!(config.llm.anthropic.temperature, 0.6);
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConductorError::Config(_)));
}

#[test]
fn test_invalid_values_are_rejected() {
    let dir = TempDir::new().unwrap();
    let cases = [
        "[llm]\ntimeout_secs = 0\n",
        "[llm]\napi_key_env = \"  \"\n",
        "[llm.anthropic]\nmax_tokens = 0\n",
        "[organization]\nname = \"\"\n",
        "not = [valid toml",
    ];

    for (i, contents) in cases.iter().enumerate() {
        let path = dir.path().join(format!("bad-{}.toml", i));
        fs::write(&path, contents).unwrap();
        let result = Config::load_from_path(&path);
        assert!(
            matches!(result, Err(ConductorError::Config(_))),
            "expected rejection for {:?}",
            contents
        );
    }
}
