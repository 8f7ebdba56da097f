//! Capability registry.
//!
//! Typeguards for the published capability sets, plus lookup by name. The
//! registry holds no state of its own; every answer comes from the engine.

pub mod builtins;

use std::collections::BTreeMap;
use std::sync::Arc;

use lion_core::error::{DeclarationError, Result};
use tracing::error;

use crate::check::ConformanceEngine;
use crate::model::{Instance, Protocol, TypeDef};

pub use builtins::{published_protocols, CANCELLABLE, CONFIGURABLE, FACTORY, RENDERABLE};

/// Generates an instance and a type guard for a published protocol.
///
/// Guards answer `false` when the check itself fails; the failure is logged.
macro_rules! typeguards {
    ($($protocol:ident => $is_instance:ident, $is_type:ident;)+) => {
        $(
            #[doc = concat!("Whether `instance` conforms to `", stringify!($protocol), "`.")]
            pub fn $is_instance(&self, instance: &Instance) -> bool {
                self.guard(self.engine.is_instance(instance, &$protocol), &$protocol)
            }

            #[doc = concat!("Whether `type_def` conforms to `", stringify!($protocol), "`.")]
            pub fn $is_type(&self, type_def: &TypeDef) -> bool {
                self.guard(self.engine.is_subtype(type_def, &$protocol), &$protocol)
            }
        )+
    };
}

/// Lookup layer over the published protocols.
#[derive(Clone)]
pub struct CapabilityRegistry {
    engine: Arc<ConformanceEngine>,
    protocols: BTreeMap<String, Arc<Protocol>>,
}

impl CapabilityRegistry {
    /// Create a registry over `engine` holding the published protocols.
    pub fn new(engine: Arc<ConformanceEngine>) -> Self {
        let protocols = published_protocols()
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();
        Self { engine, protocols }
    }

    pub fn engine(&self) -> &Arc<ConformanceEngine> {
        &self.engine
    }

    typeguards! {
        CONFIGURABLE => is_configurable, is_configurable_type;
        CANCELLABLE => is_cancellable, is_cancellable_type;
        FACTORY => is_factory, is_factory_type;
        RENDERABLE => is_renderable, is_renderable_type;
    }

    /// A published protocol by name.
    pub fn protocol(&self, name: &str) -> Option<&Arc<Protocol>> {
        self.protocols.get(name)
    }

    /// Names of the published protocols, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.protocols.keys().map(String::as_str)
    }

    /// Check an instance against a published protocol named at runtime.
    pub fn check(&self, name: &str, instance: &Instance) -> Result<bool> {
        let protocol = self.lookup(name)?;
        self.engine.is_instance(instance, protocol)
    }

    /// Check a type against a published protocol named at runtime.
    pub fn check_type(&self, name: &str, type_def: &TypeDef) -> Result<bool> {
        let protocol = self.lookup(name)?;
        self.engine.is_subtype(type_def, protocol)
    }

    fn lookup(&self, name: &str) -> Result<&Arc<Protocol>> {
        self.protocols
            .get(name)
            .ok_or_else(|| DeclarationError::UnknownName(name.to_string()).into())
    }

    fn guard(&self, result: Result<bool>, protocol: &Protocol) -> bool {
        match result {
            Ok(conforms) => conforms,
            Err(e) => {
                error!(protocol = protocol.name(), error = %e, "typeguard check failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lion_core::error::Error;

    fn registry() -> CapabilityRegistry {
        CapabilityRegistry::new(Arc::new(ConformanceEngine::new()))
    }

    #[test]
    fn test_configurable_guard() {
        let registry = registry();
        let service = TypeDef::builder("Service")
            .method("read_config")
            .method("apply_config")
            .build()
            .unwrap();
        let half = TypeDef::builder("Half").method("read_config").build().unwrap();

        assert!(registry.is_configurable_type(&service));
        assert!(registry.is_configurable(&Instance::new(service)));
        assert!(!registry.is_configurable_type(&half));
    }

    #[test]
    fn test_factory_guard_requires_class_method() {
        let registry = registry();
        let good = TypeDef::builder("Widget").class_method("create").build().unwrap();
        let bad = TypeDef::builder("Gadget").method("create").build().unwrap();

        assert!(registry.is_factory_type(&good));
        assert!(!registry.is_factory_type(&bad));
    }

    #[test]
    fn test_dynamic_lookup() {
        let registry = registry();
        let view = TypeDef::builder("View").method("render").build().unwrap();

        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["Cancellable", "Configurable", "Factory", "Renderable"]
        );
        assert!(registry.check_type("Renderable", &view).unwrap());
        assert!(!registry.check("Cancellable", &Instance::new(view.clone())).unwrap());
        assert!(matches!(
            registry.check_type("Plottable", &view).unwrap_err(),
            Error::Declaration(DeclarationError::UnknownName(_))
        ));
    }
}
