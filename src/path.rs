//! # Path Translation
//!
//! Maps an RPC method identifier (`<Service>/<Method>`, optionally with a
//! leading `/` as it appears on the wire) to the path the dispatcher's route
//! table expects.
//!
//! Translation is a pure function of the identifier and the configured rules:
//! the same identifier always yields the same path. Rules are tried in order
//! and the first one producing a path wins.
//!
//! ```rust
//! use brrtbridge::path::{PathRule, PathTranslator};
//!
//! let translator = PathTranslator::new(vec![PathRule::LowerCamelMethod]);
//! assert_eq!(
//!     translator.translate("helloworld.Greeter/SayHello").as_deref(),
//!     Some("/helloworld.Greeter/sayHello")
//! );
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

static METHOD_ID: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^/?(?P<service>[A-Za-z_][\w.]*)/(?P<method>[A-Za-z_]\w*)$").ok());

/// A parsed `<Service>/<Method>` identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodId<'a> {
    pub service: &'a str,
    pub method: &'a str,
}

impl<'a> MethodId<'a> {
    /// Parse `pkg.Service/Method` or `/pkg.Service/Method`
    #[must_use]
    pub fn parse(id: &'a str) -> Option<Self> {
        let caps = METHOD_ID.as_ref()?.captures(id)?;
        Some(Self {
            service: caps.name("service")?.as_str(),
            method: caps.name("method")?.as_str(),
        })
    }
}

impl fmt::Display for MethodId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.method)
    }
}

/// `SayHello` -> `sayHello`
#[must_use]
pub fn lower_camel(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

type CustomRule = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A single translation rule
#[derive(Clone)]
pub enum PathRule {
    /// `pkg.Service/Method` -> `/pkg.Service/Method`
    Identity,
    /// `pkg.Service/Method` -> `/pkg.Service/method`
    LowerCamelMethod,
    /// Regex over the identifier (without leading `/`); `$name` groups are
    /// substituted into the replacement. No match means no path.
    Pattern { regex: Regex, replacement: String },
    /// Arbitrary function over the identifier
    Custom(CustomRule),
}

impl PathRule {
    /// Compile a pattern rule
    pub fn pattern(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(PathRule::Pattern {
            regex: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        PathRule::Custom(Arc::new(f))
    }

    fn apply(&self, id: &str) -> Option<String> {
        match self {
            PathRule::Identity => MethodId::parse(id).map(|m| format!("/{m}")),
            PathRule::LowerCamelMethod => MethodId::parse(id)
                .map(|m| format!("/{}/{}", m.service, lower_camel(m.method))),
            PathRule::Pattern { regex, replacement } => {
                let id = id.trim_start_matches('/');
                regex
                    .is_match(id)
                    .then(|| regex.replace(id, replacement.as_str()).into_owned())
            }
            PathRule::Custom(f) => f(id),
        }
    }
}

impl fmt::Debug for PathRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathRule::Identity => write!(f, "Identity"),
            PathRule::LowerCamelMethod => write!(f, "LowerCamelMethod"),
            PathRule::Pattern { regex, replacement } => f
                .debug_struct("Pattern")
                .field("regex", &regex.as_str())
                .field("replacement", replacement)
                .finish(),
            PathRule::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Serializable form of a [`PathRule`] as written in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathRuleSpec {
    Identity,
    LowerCamelMethod,
    Pattern {
        pattern: String,
        replacement: String,
    },
}

impl TryFrom<&PathRuleSpec> for PathRule {
    type Error = regex::Error;

    fn try_from(spec: &PathRuleSpec) -> Result<Self, Self::Error> {
        match spec {
            PathRuleSpec::Identity => Ok(PathRule::Identity),
            PathRuleSpec::LowerCamelMethod => Ok(PathRule::LowerCamelMethod),
            PathRuleSpec::Pattern {
                pattern,
                replacement,
            } => PathRule::pattern(pattern, replacement.as_str()),
        }
    }
}

/// Ordered list of rules; the first rule that yields a path wins
#[derive(Debug, Clone)]
pub struct PathTranslator {
    rules: Vec<PathRule>,
}

impl Default for PathTranslator {
    fn default() -> Self {
        Self::new(vec![PathRule::LowerCamelMethod])
    }
}

impl PathTranslator {
    #[must_use]
    pub fn new(rules: Vec<PathRule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn single(rule: PathRule) -> Self {
        Self::new(vec![rule])
    }

    #[must_use]
    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Translate a method identifier to a dispatcher path starting with `/`.
    ///
    /// Returns `None` when no rule matches or a rule yields an empty path.
    #[must_use]
    pub fn translate(&self, method_id: &str) -> Option<String> {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(method_id))
            .and_then(|path| {
                let trimmed = path.trim_start_matches('/');
                (!trimmed.is_empty()).then(|| format!("/{trimmed}"))
            })
    }
}
