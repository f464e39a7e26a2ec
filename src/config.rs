//! # Bridge Configuration
//!
//! [`BridgeConfig`] is the immutable configuration a
//! [`DispatchBridge`](crate::bridge::DispatchBridge) is built from: which
//! registered dispatcher to drive, how RPC method identifiers map to dispatcher
//! paths, and the base URL used to synthesise request URLs.
//!
//! Configuration is validated eagerly in [`BridgeConfigBuilder::build`]. Every
//! declared method is translated once at that point, so a routing mistake fails
//! bridge startup instead of individual calls.
//!
//! ## Configuration files
//!
//! [`BridgeConfigFile`] loads the same settings from YAML or TOML:
//!
//! ```yaml
//! dispatcher: resource-dispatcher
//! base_url: http://localhost:8081/
//! framing: raw
//! path_rules:
//!   - kind: lower_camel_method
//! methods:
//!   - helloworld.Greeter/SayHello
//! ```
//!
//! `BRRTB_DISPATCHER` overrides the dispatcher name when
//! [`BridgeConfigFile::apply_env`] is called.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use crate::codec::{Framing, ProstCodec};
use crate::path::{PathRule, PathRuleSpec, PathTranslator};

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Environment variable overriding the dispatcher name from a config file
pub const DISPATCHER_ENV: &str = "BRRTB_DISPATCHER";

/// Configuration error, fatal to bridge startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No dispatcher registration name was given
    MissingDispatcherName,
    /// The path translator has no rules
    NoPathRules,
    /// No method identifiers were declared
    NoMethods,
    /// No rule translates this method identifier
    UnresolvedPath { method: String },
    /// The method was not declared when the configuration was built
    UndeclaredMethod { method: String },
    /// The base URL does not parse or cannot carry a path
    InvalidBaseUrl { url: String, reason: String },
    /// A pattern rule does not compile
    InvalidPattern { pattern: String, reason: String },
    /// The configuration file could not be read
    Io { path: PathBuf, reason: String },
    /// The configuration file could not be parsed
    Parse { path: PathBuf, reason: String },
    /// The file extension is not `.yaml`, `.yml` or `.toml`
    UnsupportedFormat { path: PathBuf },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingDispatcherName => {
                write!(f, "bridge configuration error: dispatcher name is required")
            }
            ConfigError::NoPathRules => write!(
                f,
                "bridge configuration error: at least one path translation rule is required"
            ),
            ConfigError::NoMethods => write!(
                f,
                "bridge configuration error: at least one RPC method must be declared"
            ),
            ConfigError::UnresolvedPath { method } => write!(
                f,
                "bridge configuration error: no path rule matches method '{method}'"
            ),
            ConfigError::UndeclaredMethod { method } => write!(
                f,
                "bridge configuration error: method '{method}' was not declared"
            ),
            ConfigError::InvalidBaseUrl { url, reason } => {
                write!(f, "bridge configuration error: invalid base URL '{url}': {reason}")
            }
            ConfigError::InvalidPattern { pattern, reason } => write!(
                f,
                "bridge configuration error: invalid path pattern '{pattern}': {reason}"
            ),
            ConfigError::Io { path, reason } => {
                write!(f, "failed to read {}: {reason}", path.display())
            }
            ConfigError::Parse { path, reason } => {
                write!(f, "failed to parse {}: {reason}", path.display())
            }
            ConfigError::UnsupportedFormat { path } => write!(
                f,
                "unsupported configuration format for {} (expected .yaml, .yml or .toml)",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Dispatcher path and URL resolved for one RPC method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRoute {
    /// Method identifier without leading `/`
    pub method_id: String,
    /// Dispatcher path, starting with `/`
    pub path: String,
    /// Absolute request URL
    pub url: String,
}

/// Immutable bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    dispatcher: Arc<str>,
    base_url: Url,
    translator: PathTranslator,
    routes: Arc<HashMap<String, ResolvedRoute>>,
}

impl BridgeConfig {
    #[must_use]
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Registration name of the dispatcher this bridge drives
    #[must_use]
    pub fn dispatcher_name(&self) -> &str {
        &self.dispatcher
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn translator(&self) -> &PathTranslator {
        &self.translator
    }

    /// Routes resolved at build time, sorted by method identifier
    #[must_use]
    pub fn routes(&self) -> Vec<&ResolvedRoute> {
        let mut routes: Vec<_> = self.routes.values().collect();
        routes.sort_by(|a, b| a.method_id.cmp(&b.method_id));
        routes
    }

    /// Route for a declared method; a leading `/` is ignored.
    ///
    /// Every route was translated in [`BridgeConfigBuilder::build`], so the
    /// only per-call failure is a method that was never declared.
    pub fn resolve(&self, method_id: &str) -> Result<&ResolvedRoute, ConfigError> {
        let key = method_id.trim_start_matches('/');
        self.routes
            .get(key)
            .ok_or_else(|| ConfigError::UndeclaredMethod {
                method: key.to_string(),
            })
    }
}

fn resolve_route(
    translator: &PathTranslator,
    base_url: &Url,
    method_id: &str,
) -> Result<ResolvedRoute, ConfigError> {
    let path = translator
        .translate(method_id)
        .ok_or_else(|| ConfigError::UnresolvedPath {
            method: method_id.to_string(),
        })?;
    let url = base_url
        .join(path.trim_start_matches('/'))
        .map_err(|e| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
    Ok(ResolvedRoute {
        method_id: method_id.to_string(),
        path,
        url: url.into(),
    })
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };
    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path".to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Accumulates bridge settings; nothing is validated until [`build`](Self::build)
#[derive(Debug, Clone, Default)]
pub struct BridgeConfigBuilder {
    dispatcher: Option<String>,
    translator: Option<PathTranslator>,
    methods: Vec<String>,
    base_url: Option<String>,
}

impl BridgeConfigBuilder {
    /// Registration name of the dispatcher to drive
    #[must_use]
    pub fn dispatcher(mut self, name: impl Into<String>) -> Self {
        self.dispatcher = Some(name.into());
        self
    }

    /// Use a single translation rule
    #[must_use]
    pub fn path_rule(mut self, rule: PathRule) -> Self {
        self.translator = Some(PathTranslator::single(rule));
        self
    }

    /// Use an ordered list of translation rules
    #[must_use]
    pub fn path_translator(mut self, translator: PathTranslator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Declare an RPC method the bridge will serve; its path is resolved at build time
    #[must_use]
    pub fn method(mut self, method_id: impl Into<String>) -> Self {
        self.methods.push(method_id.into());
        self
    }

    #[must_use]
    pub fn methods<I, S>(mut self, method_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(method_ids.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Validate the settings and produce an immutable configuration.
    ///
    /// May be called repeatedly; each call yields an independent value.
    pub fn build(&self) -> Result<BridgeConfig, ConfigError> {
        let dispatcher = self
            .dispatcher
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingDispatcherName)?;

        let translator = self.translator.clone().unwrap_or_default();
        if translator.is_empty() {
            return Err(ConfigError::NoPathRules);
        }

        let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        if self.methods.is_empty() {
            return Err(ConfigError::NoMethods);
        }

        let mut routes = HashMap::with_capacity(self.methods.len());
        for method in &self.methods {
            let key = method.trim_start_matches('/');
            let route = resolve_route(&translator, &base_url, key)?;
            debug!(
                method = %route.method_id,
                path = %route.path,
                url = %route.url,
                "Resolved bridge route"
            );
            routes.insert(key.to_string(), route);
        }

        info!(
            dispatcher = %dispatcher,
            base_url = %base_url,
            routes_count = routes.len(),
            "Bridge configuration built"
        );

        Ok(BridgeConfig {
            dispatcher: Arc::from(dispatcher),
            base_url,
            translator,
            routes: Arc::new(routes),
        })
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// On-disk form of the bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfigFile {
    pub dispatcher: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub framing: Framing,
    /// Empty means the default `lower_camel_method` rule
    #[serde(default)]
    pub path_rules: Vec<PathRuleSpec>,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl BridgeConfigFile {
    /// Load from a `.yaml`/`.yml` or `.toml` file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let parse_err = |reason: String| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => {
                serde_yaml::from_str(&contents).map_err(|e| parse_err(e.to_string()))
            }
            Some("toml") => toml::from_str(&contents).map_err(|e| parse_err(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Apply `BRRTB_DISPATCHER` from the process environment
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    #[must_use]
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(DISPATCHER_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(dispatcher = %name, "Dispatcher name overridden from environment");
            self.dispatcher = name;
        }
        self
    }

    /// Codec matching the configured framing
    #[must_use]
    pub fn codec(&self) -> ProstCodec {
        ProstCodec::with_framing(self.framing)
    }

    /// Convert into a builder, compiling pattern rules
    pub fn builder(&self) -> Result<BridgeConfigBuilder, ConfigError> {
        let mut builder = BridgeConfig::builder()
            .dispatcher(self.dispatcher.clone())
            .base_url(self.base_url.clone())
            .methods(self.methods.iter().cloned());
        if !self.path_rules.is_empty() {
            let rules = self
                .path_rules
                .iter()
                .map(|spec| {
                    PathRule::try_from(spec).map_err(|e| ConfigError::InvalidPattern {
                        pattern: match spec {
                            PathRuleSpec::Pattern { pattern, .. } => pattern.clone(),
                            _ => String::new(),
                        },
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            builder = builder.path_translator(PathTranslator::new(rules));
        }
        Ok(builder)
    }

    pub fn build(&self) -> Result<BridgeConfig, ConfigError> {
        self.builder()?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_resolves_declared_methods() {
        let config = BridgeConfig::builder()
            .dispatcher("resource-dispatcher")
            .method("helloworld.Greeter/SayHello")
            .build()
            .unwrap();
        assert_eq!(config.dispatcher_name(), "resource-dispatcher");
        let route = config.resolve("/helloworld.Greeter/SayHello").unwrap();
        assert_eq!(route.path, "/helloworld.Greeter/sayHello");
        assert_eq!(route.url, "http://localhost/helloworld.Greeter/sayHello");
    }

    #[test]
    fn test_missing_dispatcher_name() {
        let err = BridgeConfig::builder().build().unwrap_err();
        assert_eq!(err, ConfigError::MissingDispatcherName);
        let err = BridgeConfig::builder().dispatcher("  ").build().unwrap_err();
        assert_eq!(err, ConfigError::MissingDispatcherName);
    }

    #[test]
    fn test_unresolvable_method_fails_build() {
        let rule = PathRule::pattern(r"^only\.This/(\w+)$", "x/$1").unwrap();
        let err = BridgeConfig::builder()
            .dispatcher("d")
            .path_rule(rule)
            .method("helloworld.Greeter/SayHello")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnresolvedPath {
                method: "helloworld.Greeter/SayHello".into()
            }
        );
    }

    #[test]
    fn test_empty_translator_rejected() {
        let err = BridgeConfig::builder()
            .dispatcher("d")
            .path_translator(PathTranslator::new(Vec::new()))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NoPathRules);
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = BridgeConfig::builder()
            .dispatcher("d")
            .base_url("http://localhost:8081/api")
            .method("pkg.Svc/Call")
            .build()
            .unwrap();
        assert_eq!(config.base_url().as_str(), "http://localhost:8081/api/");
        assert_eq!(
            config.resolve("pkg.Svc/Call").unwrap().url,
            "http://localhost:8081/api/pkg.Svc/call"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = BridgeConfig::builder()
            .dispatcher("d")
            .base_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
        let err = BridgeConfig::builder()
            .dispatcher("d")
            .base_url("mailto:someone@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_methods_are_required() {
        let err = BridgeConfig::builder().dispatcher("d").build().unwrap_err();
        assert_eq!(err, ConfigError::NoMethods);
    }

    #[test]
    fn test_unmatched_rule_without_methods_fails_build() {
        let rule = PathRule::pattern(r"^other\.Service/(\w+)$", "/other/$1").unwrap();
        let built = BridgeConfig::builder()
            .dispatcher("d")
            .path_rule(rule)
            .build();
        assert_eq!(built.unwrap_err(), ConfigError::NoMethods);
    }

    #[test]
    fn test_undeclared_method_is_rejected() {
        let config = BridgeConfig::builder()
            .dispatcher("d")
            .method("pkg.Svc/Call")
            .build()
            .unwrap();
        assert_eq!(
            config.resolve("pkg.Svc/Other").unwrap_err(),
            ConfigError::UndeclaredMethod {
                method: "pkg.Svc/Other".into()
            }
        );
    }

    #[test]
    fn test_builds_are_independent() {
        let builder = BridgeConfig::builder().dispatcher("d").method("a.B/C");
        let first = builder.build().unwrap();
        let second = builder.clone().method("a.B/D").build().unwrap();
        assert_eq!(first.routes().len(), 1);
        assert_eq!(second.routes().len(), 2);
    }

    #[test]
    fn test_env_override() {
        let file = BridgeConfigFile {
            dispatcher: "from-file".into(),
            base_url: default_base_url(),
            framing: Framing::Raw,
            path_rules: Vec::new(),
            methods: Vec::new(),
        };
        let overridden = file
            .clone()
            .apply_env_from(|key| (key == DISPATCHER_ENV).then(|| "from-env".to_string()));
        assert_eq!(overridden.dispatcher, "from-env");
        let untouched = file.apply_env_from(|_| Some(" ".to_string()));
        assert_eq!(untouched.dispatcher, "from-file");
    }
}
