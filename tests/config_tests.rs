#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Configuration file loading tests
//!
//! Exercises YAML and TOML files on disk, rule compilation, and the
//! environment override of the dispatcher name.

mod common;

use brrtbridge::codec::Framing;
use brrtbridge::config::{BridgeConfigFile, ConfigError, DISPATCHER_ENV};
use brrtbridge::path::PathRuleSpec;
use common::temp_files::config_file;
use std::path::Path;

const YAML: &str = r#"
dispatcher: greeter
base_url: http://bridge.local/rpc
framing: length_prefixed
path_rules:
  - kind: pattern
    pattern: '^helloworld\.Greeter/(?P<m>\w+)$'
    replacement: '/greeter/$m'
  - kind: lower_camel_method
methods:
  - helloworld.Greeter/SayHello
  - admin.Ops/Ping
"#;

const TOML: &str = r#"
dispatcher = "greeter"
methods = ["helloworld.Greeter/SayHello"]
"#;

#[test]
fn test_load_yaml() {
    let file = config_file(YAML, "yaml");
    let loaded = BridgeConfigFile::load(file.path()).unwrap();
    assert_eq!(loaded.dispatcher, "greeter");
    assert_eq!(loaded.framing, Framing::LengthPrefixed);
    assert_eq!(loaded.path_rules.len(), 2);
    assert_eq!(loaded.path_rules[1], PathRuleSpec::LowerCamelMethod);
    assert_eq!(loaded.codec().framing(), Framing::LengthPrefixed);

    let config = loaded.build().unwrap();
    assert_eq!(config.base_url().as_str(), "http://bridge.local/rpc/");

    let hello = config.resolve("helloworld.Greeter/SayHello").unwrap();
    assert_eq!(hello.path, "/greeter/SayHello");
    assert_eq!(hello.url, "http://bridge.local/rpc/greeter/SayHello");

    // Falls through to the second rule
    let ping = config.resolve("admin.Ops/Ping").unwrap();
    assert_eq!(ping.path, "/admin.Ops/ping");
}

#[test]
fn test_load_toml_with_defaults() {
    let file = config_file(TOML, "toml");
    let config = BridgeConfigFile::load(file.path())
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(config.dispatcher_name(), "greeter");
    assert_eq!(config.base_url().as_str(), "http://localhost/");
    let routes = config.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].path, "/helloworld.Greeter/sayHello");
}

#[test]
fn test_unsupported_extension() {
    let file = config_file(TOML, "ini");
    let err = BridgeConfigFile::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn test_missing_file() {
    let err = BridgeConfigFile::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn test_unknown_field_rejected() {
    let file = config_file("dispatcher: greeter\ntimeout_ms: 10\n", "yml");
    let err = BridgeConfigFile::load(file.path()).unwrap_err();
    match err {
        ConfigError::Parse { reason, .. } => assert!(reason.contains("timeout_ms")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_invalid_pattern_reported() {
    let yaml = "dispatcher: greeter\npath_rules:\n  - kind: pattern\n    pattern: '(unclosed'\n    replacement: /x\n";
    let file = config_file(yaml, "yaml");
    let err = BridgeConfigFile::load(file.path())
        .unwrap()
        .build()
        .unwrap_err();
    match err {
        ConfigError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(unclosed"),
        other => panic!("expected invalid pattern, got {other:?}"),
    }
}

#[test]
fn test_unresolvable_declared_method() {
    let yaml = "dispatcher: greeter\npath_rules:\n  - kind: pattern\n    pattern: '^a\\.B/C$'\n    replacement: /c\nmethods:\n  - a.B/D\n";
    let file = config_file(yaml, "yaml");
    let err = BridgeConfigFile::load(file.path())
        .unwrap()
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::UnresolvedPath {
            method: "a.B/D".into()
        }
    );
}

#[test]
fn test_env_overrides_file_dispatcher() {
    let file = config_file(TOML, "toml");
    let config = BridgeConfigFile::load(file.path())
        .unwrap()
        .apply_env_from(|key| (key == DISPATCHER_ENV).then(|| "staging".to_string()))
        .build()
        .unwrap();
    assert_eq!(config.dispatcher_name(), "staging");
}
