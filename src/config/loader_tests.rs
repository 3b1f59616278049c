//! Tests for configuration file loading.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;

/// RAII guard to ensure environment variable cleanup even under test parallelism.
struct EnvGuard(&'static str);

impl EnvGuard {
    fn new(name: &'static str) -> Self {
        env::remove_var(name);
        EnvGuard(name)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        env::remove_var(self.0);
    }
}

/// Temp file removed on drop.
struct TempConfig(PathBuf);

impl TempConfig {
    fn write(name: &str, contents: &str) -> Self {
        let path = env::temp_dir().join(format!("recyclist_{}_{name}", std::process::id()));
        fs::write(&path, contents).expect("Failed to write test config");
        TempConfig(path)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        fs::remove_file(&self.0).ok();
    }
}

// ===== Paths =====

#[test]
fn default_config_path_contains_recyclist_config_toml() {
    let Some(path) = default_config_path() else {
        return;
    };
    let path_str = path.to_string_lossy();
    assert!(
        path_str.contains("recyclist") && path_str.ends_with("config.toml"),
        "Path should contain 'recyclist' and end with 'config.toml', got: {}",
        path_str
    );
}

#[test]
fn default_log_path_ends_with_recyclist_log() {
    let path = default_log_path();
    assert!(
        path.to_string_lossy().ends_with("recyclist.log"),
        "Default log path should end with 'recyclist.log', got: {:?}",
        path
    );
}

// ===== Loading =====

#[test]
fn load_config_file_returns_ok_none_for_missing_file() {
    let result = load_config_file("/nonexistent/path/to/config.toml");
    assert_eq!(result, Ok(None), "Missing config file should return Ok(None), not an error");
}

#[test]
fn load_config_file_parses_valid_toml() {
    let file = TempConfig::write(
        "valid.toml",
        r#"
orientation = "horizontal"
render_ahead_offset = 400.0
force_non_deterministic_rendering = true
non_deterministic_mode = "auto_layout"
preserve_visible_position = true
layout_size = { width = 320.0, height = 640.0 }

[edge_thresholds]
end_relative = 0.5

[window_correction]
apply_to_item_scroll = true
value = { window_shift = 12.0 }

[timing]
refix_debounce_ms = 1000
"#,
    );

    let config = load_config_file(&file.0)
        .expect("Should successfully parse valid TOML")
        .expect("Should return Some(ConfigFile) for existing file");

    assert_eq!(config.orientation, Some(Orientation::Horizontal));
    assert_eq!(config.render_ahead_offset, Some(400.0));
    assert_eq!(config.force_non_deterministic_rendering, Some(true));
    assert_eq!(config.non_deterministic_mode, Some(NonDeterministicMode::AutoLayout));
    assert_eq!(config.layout_size, Some(Dimension::new(320.0, 640.0)));
    assert_eq!(config.edge_thresholds.map(|t| t.end_relative), Some(0.5));

    let correction = config.window_correction.expect("window correction section");
    assert!(correction.apply_to_item_scroll);
    assert_eq!(correction.value.window_shift, 12.0);

    let timing = config.timing.expect("timing section");
    assert_eq!(timing.refix_debounce_ms, 1000);
    assert_eq!(timing.hold_poll_ms, TimingConfig::default().hold_poll_ms);
}

#[test]
fn load_config_file_returns_error_for_invalid_toml() {
    let file = TempConfig::write("invalid.toml", "this is not valid TOML ][}{");

    match load_config_file(&file.0) {
        Err(ConfigError::ParseError { path, reason: _ }) => assert_eq!(path, file.0),
        other => panic!("Expected ParseError, got {:?}", other),
    }
}

#[test]
fn config_file_rejects_unknown_fields() {
    let result: Result<ConfigFile, _> = toml::from_str("render_ahead = 10.0");
    assert!(result.is_err(), "Should reject TOML with unknown fields due to deny_unknown_fields");
}

#[test]
fn config_file_rejects_unknown_fields_in_sections() {
    let result: Result<ConfigFile, _> = toml::from_str("[edge_thresholds]\nend = 1.0");
    assert!(result.is_err());
}

// ===== Merging =====

#[test]
fn merge_config_uses_defaults_when_none() {
    assert_eq!(merge_config(None), ResolvedConfig::default());
}

#[test]
fn merge_config_uses_defaults_for_none_fields() {
    let config_file = ConfigFile {
        render_ahead_offset: Some(600.0),
        start_edge_preserved: Some(true),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(config_file));
    let defaults = ListConfig::default();

    assert_eq!(resolved.list.render_ahead_offset, 600.0);
    assert!(resolved.list.start_edge_preserved);
    assert_eq!(resolved.list.orientation, defaults.orientation);
    assert_eq!(resolved.list.timing, defaults.timing);
    assert_eq!(resolved.log_file_path, default_log_path());
}

#[test]
fn config_file_log_path_overrides_default() {
    let custom_path = PathBuf::from("/custom/path/to/app.log");
    let config_file = ConfigFile {
        log_file_path: Some(custom_path.clone()),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(config_file));
    assert_eq!(resolved.log_file_path, custom_path);
}

// ===== Environment =====

#[test]
#[serial(recyclist_render_ahead)]
fn apply_env_overrides_respects_render_ahead() {
    let _guard = EnvGuard::new(RENDER_AHEAD_ENV_VAR);
    env::set_var(RENDER_AHEAD_ENV_VAR, "750");

    let result = apply_env_overrides(ResolvedConfig::default());
    assert_eq!(result.list.render_ahead_offset, 750.0);
}

#[test]
#[serial(recyclist_render_ahead)]
fn apply_env_overrides_ignores_garbage() {
    let _guard = EnvGuard::new(RENDER_AHEAD_ENV_VAR);
    env::set_var(RENDER_AHEAD_ENV_VAR, "lots");

    let base = ResolvedConfig::default();
    assert_eq!(apply_env_overrides(base.clone()), base);
}

#[test]
#[serial(recyclist_render_ahead)]
fn apply_env_overrides_no_change_when_env_var_not_set() {
    let _guard = EnvGuard::new(RENDER_AHEAD_ENV_VAR);
    let base = ResolvedConfig::default();
    assert_eq!(apply_env_overrides(base.clone()), base);
}

#[test]
#[serial(recyclist_config)]
fn load_config_with_precedence_prefers_explicit_path() {
    let _guard = EnvGuard::new(CONFIG_ENV_VAR);
    let explicit = TempConfig::write("explicit.toml", "render_ahead_offset = 1.0");
    let from_env = TempConfig::write("env.toml", "render_ahead_offset = 2.0");
    env::set_var(CONFIG_ENV_VAR, &from_env.0);

    let config = load_config_with_precedence(Some(explicit.0.clone()))
        .expect("explicit config loads")
        .expect("explicit config exists");
    assert_eq!(config.render_ahead_offset, Some(1.0), "Should use explicit path, not env var");
}

#[test]
#[serial(recyclist_config)]
fn load_config_with_precedence_uses_env_var_when_no_explicit_path() {
    let _guard = EnvGuard::new(CONFIG_ENV_VAR);
    let from_env = TempConfig::write("env_only.toml", "render_ahead_offset = 2.0");
    env::set_var(CONFIG_ENV_VAR, &from_env.0);

    let config = load_config_with_precedence(None)
        .expect("env config loads")
        .expect("env config exists");
    assert_eq!(config.render_ahead_offset, Some(2.0));
}

#[test]
#[serial(recyclist_config)]
fn load_config_with_precedence_rejects_empty_env_path() {
    let _guard = EnvGuard::new(CONFIG_ENV_VAR);
    env::set_var(CONFIG_ENV_VAR, "");

    let result = load_config_with_precedence(None);
    assert!(matches!(result, Err(ConfigError::InvalidPath(_))));
}

// ===== CLI =====

#[test]
fn apply_cli_overrides_only_touches_given_flags() {
    let base = ResolvedConfig::default();
    let result = apply_cli_overrides(base.clone(), Some(1000.0), None, Some(true), None);

    assert_eq!(result.list.render_ahead_offset, 1000.0);
    assert!(result.list.force_non_deterministic_rendering);
    assert_eq!(result.list.orientation, base.list.orientation);
    assert_eq!(result.list.preserve_visible_position, base.list.preserve_visible_position);
}

#[test]
fn apply_cli_overrides_no_overrides() {
    let base = ResolvedConfig::default();
    assert_eq!(apply_cli_overrides(base.clone(), None, None, None, None), base);
}

#[test]
#[serial(recyclist_render_ahead)]
fn precedence_chain_full_defaults_to_cli() {
    let _guard = EnvGuard::new(RENDER_AHEAD_ENV_VAR);

    let config_file = ConfigFile {
        render_ahead_offset: Some(300.0),
        orientation: Some(Orientation::Horizontal),
        ..ConfigFile::default()
    };

    let merged = merge_config(Some(config_file));
    assert_eq!(merged.list.render_ahead_offset, 300.0);

    env::set_var(RENDER_AHEAD_ENV_VAR, "500");
    let with_env = apply_env_overrides(merged);
    assert_eq!(with_env.list.render_ahead_offset, 500.0, "Env overrides config file");

    let with_cli = apply_cli_overrides(with_env, Some(800.0), Some(Orientation::Vertical), None, None);
    assert_eq!(with_cli.list.render_ahead_offset, 800.0, "CLI overrides env");
    assert_eq!(with_cli.list.orientation, Orientation::Vertical);
}
