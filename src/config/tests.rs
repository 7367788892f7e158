//! Configuration tests
//!
//! Round-trips guard the template: every field written by `to_toml` must
//! parse back into the same effective configuration.

use super::*;
use std::collections::HashMap;
use std::time::Duration;

fn no_env(_: &str) -> Option<String> {
    None
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Round-trip tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_roundtrip_default() {
    let config = Config::default();
    let toml_str = config.to_toml();

    let parsed = Config::parse_file_config(&toml_str);
    assert!(
        parsed.is_ok(),
        "Default config should round-trip.\nTOML:\n{}\nError: {:?}",
        toml_str,
        parsed.as_ref().err()
    );

    let reloaded = Config::from_sources(parsed.unwrap(), no_env);
    assert_eq!(reloaded, config);
}

#[test]
fn test_config_roundtrip_custom_values() {
    let mut config = Config::default();
    config.theme = "Tokyo Night".to_string();
    config.refresh.local_status_ms = 500;
    config.refresh.remote_status_ms = 60_000;
    config.toasts.max = 5;
    config.toasts.ttl_ms = 1500;
    config.editor.min_height = 2;
    config.editor.max_height = 6;
    config.logging.level = "debug".to_string();
    config.logging.file_enabled = true;
    config.logging.file_rotation = LogRotation::Hourly;

    let parsed = Config::parse_file_config(&config.to_toml()).unwrap();
    assert_eq!(Config::from_sources(parsed, no_env), config);
}

#[test]
fn test_theme_with_quotes_is_escaped() {
    let mut config = Config::default();
    config.theme = r#"My "Fancy" Theme"#.to_string();

    let parsed = Config::parse_file_config(&config.to_toml()).unwrap();
    assert_eq!(parsed.theme.as_deref(), Some(r#"My "Fancy" Theme"#));
}

// ─────────────────────────────────────────────────────────────────────────────
// Precedence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_empty_file_gives_defaults() {
    let parsed = Config::parse_file_config("").unwrap();
    assert_eq!(Config::from_sources(parsed, no_env), Config::default());
}

#[test]
fn test_file_overrides_defaults() {
    let parsed = Config::parse_file_config(
        r#"
theme = "Nord"
[toasts]
max = 7
"#,
    )
    .unwrap();
    let config = Config::from_sources(parsed, no_env);

    assert_eq!(config.theme, "Nord");
    assert_eq!(config.toasts.max, 7);
    assert_eq!(config.toasts.ttl_ms, 3000);
    assert_eq!(config.refresh, RefreshConfig::default());
}

#[test]
fn test_env_overrides_file() {
    let parsed = Config::parse_file_config(
        r#"
theme = "Nord"
[logging]
level = "warn"
"#,
    )
    .unwrap();
    let env = env_from(&[
        (ENV_THEME, "Gruvbox Dark"),
        (ENV_LOG, "trace"),
        (ENV_DEMO, "true"),
    ]);
    let config = Config::from_sources(parsed, env);

    assert_eq!(config.theme, "Gruvbox Dark");
    assert_eq!(config.logging.level, "trace");
    assert!(config.demo_mode);
}

#[test]
fn test_blank_env_values_are_ignored() {
    let parsed = Config::parse_file_config(r#"theme = "Nord""#).unwrap();
    let config = Config::from_sources(parsed, env_from(&[(ENV_THEME, "  ")]));
    assert_eq!(config.theme, "Nord");
}

#[test]
fn test_demo_flag_values() {
    for (value, expected) in [("1", true), ("TRUE", true), ("0", false), ("yes", false)] {
        let config = Config::from_sources(FileConfig::default(), env_from(&[(ENV_DEMO, value)]));
        assert_eq!(config.demo_mode, expected, "AGENTDECK_DEMO={}", value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_toml_is_an_error() {
    assert!(Config::parse_file_config("theme = ").is_err());
    assert!(Config::parse_file_config("[toasts]\nmax = \"many\"").is_err());
}

#[test]
fn test_editor_max_never_below_min() {
    let parsed = Config::parse_file_config("[editor]\nmin_height = 8\nmax_height = 4").unwrap();
    let config = Config::from_sources(parsed, no_env);
    assert_eq!(config.editor.min_height, 8);
    assert_eq!(config.editor.max_height, 8);
}

#[test]
fn test_zero_values_are_clamped() {
    let parsed = Config::parse_file_config(
        "[refresh]\nlocal_status_ms = 0\n[toasts]\nmax = 0\nttl_ms = 0\n[editor]\nmin_height = 0",
    )
    .unwrap();
    let config = Config::from_sources(parsed, no_env);

    assert!(config.refresh.local_status_ms > 0);
    assert_eq!(config.toasts.max, 1);
    assert_eq!(config.toasts.ttl_ms, 1);
    assert_eq!(config.editor.min_height, 1);
}

#[test]
fn test_log_rotation_parse() {
    assert_eq!(LogRotation::parse("HOURLY"), LogRotation::Hourly);
    assert_eq!(LogRotation::parse("never"), LogRotation::Never);
    assert_eq!(LogRotation::parse("weekly"), LogRotation::Daily);
}

#[test]
fn test_filter_directive_targets_crate() {
    let mut logging = LoggingConfig::default();
    logging.level = "debug".to_string();
    assert_eq!(logging.filter_directive(), "agentdeck=debug");
}

#[test]
fn test_controller_config_conversion() {
    let mut config = Config::default();
    config.refresh.local_status_ms = 1000;
    config.toasts.max = 4;

    let controller = config.controller_config();
    assert_eq!(controller.local_refresh, Duration::from_millis(1000));
    assert_eq!(controller.remote_refresh, Duration::from_millis(30_000));
    assert_eq!(controller.toast_max, 4);
    assert_eq!(controller.toast_ttl, Duration::from_millis(3000));
    assert_eq!(controller.editor_min_height, 3);
    assert_eq!(controller.editor_max_height, 10);
}
