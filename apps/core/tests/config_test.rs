use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use quickhop_core::config::{self, Config, ConfigError, KnownApp};

fn scratch_dir(label: &str) -> PathBuf {
    let unique = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("quickhop-config-{label}-{unique}"));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn accepts_default_config() {
    let cfg = Config::default();
    assert_eq!(cfg.staleness(), Duration::from_millis(2_000));
    assert_eq!(cfg.devtools_base_url(), "http://127.0.0.1:9222");
    assert_eq!(cfg.window_list_command, vec!["wmctrl", "-l"]);
    assert_eq!(cfg.max_results, 0);
    assert!(cfg.config_path.to_string_lossy().contains("quickhop"));
    assert!(config::validate(&cfg).is_ok());
}

#[test]
fn rejects_out_of_range_values() {
    let zero_staleness = Config {
        staleness_ms: 0,
        ..Default::default()
    };
    assert!(config::validate(&zero_staleness).is_err());

    let tiny_timeout = Config {
        provider_timeout_ms: 10,
        ..Default::default()
    };
    assert!(config::validate(&tiny_timeout).is_err());

    let no_port = Config {
        devtools_port: 0,
        ..Default::default()
    };
    assert!(config::validate(&no_port).is_err());

    let no_command = Config {
        window_list_command: Vec::new(),
        ..Default::default()
    };
    assert!(config::validate(&no_command).is_err());

    let bad_level = Config {
        log_level: "loud".into(),
        ..Default::default()
    };
    assert!(config::validate(&bad_level).is_err());

    let bad_app = Config {
        known_apps: vec![KnownApp::new("", "Nothing")],
        ..Default::default()
    };
    assert!(config::validate(&bad_app).is_err());
}

#[test]
fn missing_file_yields_defaults_at_that_path() {
    let path = scratch_dir("missing").join("absent.toml");
    let cfg = config::load(Some(&path)).unwrap();

    assert_eq!(cfg.config_path, path);
    assert_eq!(cfg.staleness_ms, Config::default().staleness_ms);
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let dir = scratch_dir("toml");
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        r#"
staleness_ms = 500
devtools_port = 9333
browser_name = "chromium"

[[known_apps]]
pattern = "Kitty"
name = "Kitty"
"#,
    )
    .unwrap();

    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.staleness_ms, 500);
    assert_eq!(cfg.devtools_base_url(), "http://127.0.0.1:9333");
    assert_eq!(cfg.browser_name, "chromium");
    assert_eq!(cfg.known_apps, vec![KnownApp::new("Kitty", "Kitty")]);
    assert_eq!(cfg.provider_timeout_ms, Config::default().provider_timeout_ms);
    assert_eq!(cfg.config_path, path);

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn json5_files_are_accepted() {
    let dir = scratch_dir("json5");
    let path = dir.join("config.json5");
    std::fs::write(
        &path,
        "{\n  // tighter refresh for a fast machine\n  staleness_ms: 750,\n  log_level: 'debug',\n}\n",
    )
    .unwrap();

    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.staleness_ms, 750);
    assert_eq!(cfg.log_level, "debug");

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn invalid_values_in_file_are_rejected() {
    let dir = scratch_dir("invalid");
    let path = dir.join("config.toml");
    std::fs::write(&path, "provider_timeout_ms = 5\n").unwrap();

    assert!(matches!(config::load(Some(&path)), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "staleness_ms = \"soon\"\n").unwrap();
    assert!(matches!(config::load(Some(&path)), Err(ConfigError::Parse(_))));

    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn saved_config_loads_back() {
    let dir = scratch_dir("save");
    let cfg = Config {
        staleness_ms: 1_250,
        reserved_titles: vec!["Desktop".into(), "Dock".into()],
        config_path: dir.join("nested").join("config.toml"),
        ..Default::default()
    };

    config::save(&cfg).unwrap();
    let loaded = config::load(Some(&cfg.config_path)).unwrap();
    assert_eq!(loaded, cfg);

    std::fs::remove_dir_all(dir).unwrap();
}
