//! Capability namespace: the bindings visible to executed code.

use std::sync::Arc;

use rustpython_vm::builtins::PyModule;
use rustpython_vm::{PyRef, VirtualMachine};

/// One capability injected into the sandbox.
///
/// The alias is exposed two ways, matching how the hosting integration
/// binds its SDK: pre-bound in the execution scope under `alias`, and
/// registered as an importable module of the same name. `make_module`
/// runs on the VM worker thread once per execution.
pub trait CapabilityModule: Send + Sync {
    fn alias(&self) -> &str;
    fn make_module(&self, vm: &VirtualMachine) -> PyRef<PyModule>;
}

/// Collects capability bindings for [`CapabilityNamespace`].
#[derive(Default)]
pub struct NamespaceBuilder {
    bindings: Vec<Arc<dyn CapabilityModule>>,
}

impl NamespaceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a capability. Rebinding an alias replaces the earlier entry.
    pub fn bind(self, module: impl CapabilityModule + 'static) -> Self {
        self.bind_shared(Arc::new(module))
    }

    pub fn bind_shared(mut self, module: Arc<dyn CapabilityModule>) -> Self {
        if let Some(existing) = self
            .bindings
            .iter_mut()
            .find(|b| b.alias() == module.alias())
        {
            tracing::debug!(alias = module.alias(), "replacing capability binding");
            *existing = module;
        } else {
            self.bindings.push(module);
        }
        self
    }

    pub fn build(self) -> CapabilityNamespace {
        CapabilityNamespace {
            bindings: self.bindings,
        }
    }
}

/// Immutable registry of capability bindings, built once at startup and
/// shared read-only across executions.
pub struct CapabilityNamespace {
    bindings: Vec<Arc<dyn CapabilityModule>>,
}

impl CapabilityNamespace {
    /// Namespace with no capabilities; snippets see only the allowlisted
    /// standard library.
    pub fn empty() -> Self {
        NamespaceBuilder::new().build()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|b| b.alias())
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn bindings(&self) -> &[Arc<dyn CapabilityModule>] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_vm::PyPayload;

    struct Dummy(&'static str);

    impl CapabilityModule for Dummy {
        fn alias(&self) -> &str {
            self.0
        }

        fn make_module(&self, vm: &VirtualMachine) -> PyRef<PyModule> {
            PyModule::new().into_ref(&vm.ctx)
        }
    }

    #[test]
    fn test_build_collects_aliases() {
        let ns = NamespaceBuilder::new()
            .bind(Dummy("finvizfinance"))
            .bind(Dummy("helpers"))
            .build();
        let aliases: Vec<&str> = ns.aliases().collect();
        assert_eq!(aliases, vec!["finvizfinance", "helpers"]);
    }

    #[test]
    fn test_rebinding_replaces() {
        let ns = NamespaceBuilder::new()
            .bind(Dummy("finvizfinance"))
            .bind(Dummy("finvizfinance"))
            .build();
        assert_eq!(ns.len(), 1);
    }

    #[test]
    fn test_empty_namespace() {
        assert!(CapabilityNamespace::empty().is_empty());
    }
}
