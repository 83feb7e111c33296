//! Stream-provider lookup capability and its test double.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Opaque handle to a stream provider.
///
/// Stream routing internals are an external collaborator; the harness only
/// hands providers out by name.
pub trait StreamProvider {
    /// Name this provider is registered under.
    fn name(&self) -> &str;
}

/// Capability for looking up stream providers by name.
pub trait StreamProviderLookup {
    /// Get the provider registered under `name`, if any.
    fn provider(&self, name: &str) -> Option<Rc<dyn StreamProvider>>;
}

/// Name-keyed stream provider table used by the test silo.
#[derive(Default)]
pub struct TestStreamProviders {
    providers: RefCell<HashMap<String, Rc<dyn StreamProvider>>>,
}

impl TestStreamProviders {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous entry.
    pub fn add_provider(&self, provider: Rc<dyn StreamProvider>) {
        let name = provider.name().to_string();
        tracing::debug!(name, "stream provider added");
        self.providers.borrow_mut().insert(name, provider);
    }

    /// Get the number of registered providers.
    pub fn count(&self) -> usize {
        self.providers.borrow().len()
    }
}

impl StreamProviderLookup for TestStreamProviders {
    fn provider(&self, name: &str) -> Option<Rc<dyn StreamProvider>> {
        self.providers.borrow().get(name).cloned()
    }
}

impl std::fmt::Debug for TestStreamProviders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestStreamProviders")
            .field("providers", &self.providers.borrow().len())
            .finish()
    }
}
