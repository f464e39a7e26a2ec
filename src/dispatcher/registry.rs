use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Dispatcher;

type Entries = HashMap<String, Arc<dyn Dispatcher>>;

/// Registry error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A dispatcher is already bound under this name
    AlreadyBound { name: String },
    /// Registration names must not be empty
    EmptyName,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::AlreadyBound { name } => {
                write!(f, "dispatcher '{name}' is already bound")
            }
            RegistryError::EmptyName => write!(f, "dispatcher name must not be empty"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// Result of looking a dispatcher up by name
#[derive(Clone)]
pub enum Binding {
    /// Nothing is registered under the name yet
    Unbound,
    Bound(Arc<dyn Dispatcher>),
}

impl Binding {
    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }

    #[must_use]
    pub fn dispatcher(&self) -> Option<&Arc<dyn Dispatcher>> {
        match self {
            Binding::Bound(d) => Some(d),
            Binding::Unbound => None,
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Unbound => f.write_str("Unbound"),
            Binding::Bound(_) => f.write_str("Bound(..)"),
        }
    }
}

/// Name -> dispatcher map shared between the code that starts dispatchers and
/// the bridges that drive them.
///
/// Lookups are lock-free snapshot reads. Each name can be bound once; after
/// that the entry is read-only until it is explicitly unbound.
pub struct DispatcherRegistry {
    entries: ArcSwap<Entries>,
}

impl Default for DispatcherRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DispatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl DispatcherRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Publish a started dispatcher under `name`.
    ///
    /// Fails with [`RegistryError::AlreadyBound`] if the name is taken.
    pub fn bind(
        &self,
        name: impl Into<String>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut already_bound = false;
        self.entries.rcu(|current| {
            if current.contains_key(&name) {
                already_bound = true;
                return Arc::clone(current);
            }
            already_bound = false;
            let mut next = HashMap::clone(current);
            next.insert(name.clone(), Arc::clone(&dispatcher));
            Arc::new(next)
        });

        if already_bound {
            warn!(dispatcher = %name, "Dispatcher already bound - rejecting rebind");
            return Err(RegistryError::AlreadyBound { name });
        }

        info!(
            dispatcher = %name,
            total_dispatchers = self.entries.load().len(),
            "Dispatcher bound"
        );
        Ok(())
    }

    /// Remove a binding, returning the dispatcher that was bound
    pub fn unbind(&self, name: &str) -> Option<Arc<dyn Dispatcher>> {
        let mut removed = None;
        self.entries.rcu(|current| {
            removed = current.get(name).cloned();
            if removed.is_none() {
                return Arc::clone(current);
            }
            let mut next = HashMap::clone(current);
            next.remove(name);
            Arc::new(next)
        });
        if removed.is_some() {
            info!(dispatcher = %name, "Dispatcher unbound");
        }
        removed
    }

    /// Look up `name` without blocking
    #[must_use]
    pub fn resolve(&self, name: &str) -> Binding {
        match self.entries.load().get(name) {
            Some(dispatcher) => Binding::Bound(Arc::clone(dispatcher)),
            None => {
                debug!(dispatcher = %name, "Dispatcher lookup found no binding");
                Binding::Unbound
            }
        }
    }

    /// Registered names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.load().keys().cloned().collect();
        names.sort();
        names
    }
}

/// A registry reference paired with the name a bridge resolves at call time
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    name: Arc<str>,
    registry: Arc<DispatcherRegistry>,
}

impl DispatcherHandle {
    #[must_use]
    pub fn new(registry: Arc<DispatcherRegistry>, name: &str) -> Self {
        Self {
            name: Arc::from(name),
            registry,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<DispatcherRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn resolve(&self) -> Binding {
        self.registry.resolve(&self.name)
    }
}
