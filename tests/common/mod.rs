#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

pub mod fixtures {
    use brrtbridge::config::BridgeConfig;
    use brrtbridge::dispatcher::{DispatchError, Dispatcher, DispatcherRegistry, ResourceDispatcher};
    use brrtbridge::greeter::{register_greeter_resources, SAY_HELLO};
    use brrtbridge::surface::{ServerRequest, ServerResponse};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub const DISPATCHER: &str = "greeter";

    pub fn greeter_config() -> BridgeConfig {
        BridgeConfig::builder()
            .dispatcher(DISPATCHER)
            .method(SAY_HELLO)
            .build()
            .unwrap()
    }

    pub fn greeter_resources() -> ResourceDispatcher {
        let mut resources = ResourceDispatcher::new();
        register_greeter_resources(&mut resources).unwrap();
        resources
    }

    /// Registry with the greeter resources bound under [`DISPATCHER`]
    pub fn greeter_registry() -> Arc<DispatcherRegistry> {
        registry_with(Arc::new(greeter_resources()))
    }

    pub fn registry_with(dispatcher: Arc<dyn Dispatcher>) -> Arc<DispatcherRegistry> {
        let registry = Arc::new(DispatcherRegistry::new());
        registry.bind(DISPATCHER, dispatcher).unwrap();
        registry
    }

    /// Wraps a dispatcher and counts `service` invocations
    pub struct Counting<D> {
        pub inner: D,
        pub calls: AtomicUsize,
    }

    impl<D> Counting<D> {
        pub fn new(inner: D) -> Arc<Self> {
            Arc::new(Self {
                inner,
                calls: AtomicUsize::new(0),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl<D: Dispatcher> Dispatcher for Counting<D> {
        fn service(
            &self,
            request: &mut dyn ServerRequest,
            response: &mut dyn ServerResponse,
        ) -> Result<(), DispatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.service(request, response)
        }
    }
}

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Write `content` to a temporary file with the given extension
    pub fn config_file(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("brrtbridge_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }
}
