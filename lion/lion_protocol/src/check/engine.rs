//! Conformance engine.
//!
//! Answers "does this value satisfy this protocol?" for instances and types.
//! A check runs through a fixed sequence of stages: protocol validation,
//! the root shortcut, the nominal base of an intersection, the cache, the
//! re-entrancy guard, nominal relationships, the subtype hook, intersection
//! components and finally the structural matcher.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use lion_core::error::{DeclarationError, ProtocolError, Result};
use lion_core::id::{EngineId, TypeDefId};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::model::{Instance, Protocol, TypeDef};
use crate::store::{CacheKey, CacheStats, ConformanceCache};

use super::audit::{AuditEntry, AuditLog};
use super::guard::InFlight;
use super::matcher::{self, Candidate, Mismatch};
use super::CheckMode;

/// Why a type conforms to a protocol without being matched structurally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Nominal {
    /// The type or an ancestor declares the protocol, or a refinement of it.
    Declared,

    /// The named type in the resolution order was registered with the
    /// engine as implementing the protocol, or a refinement of it.
    Registered { owner: String },
}

impl fmt::Display for Nominal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declared => write!(f, "declared implementation"),
            Self::Registered { owner } => write!(f, "registered implementation on {}", owner),
        }
    }
}

/// Conformance engine.
///
/// Owns the result cache and the explicit registrations. All queries take
/// `&self`, so one engine can be shared between threads behind an `Arc`.
pub struct ConformanceEngine {
    id: EngineId,
    config: EngineConfig,
    cache: ConformanceCache,

    /// Protocols registered as implemented by a type without the type
    /// declaring them.
    registrations: DashMap<TypeDefId, Vec<Arc<Protocol>>>,

    audit_log: Option<AuditLog>,
}

impl ConformanceEngine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache and audit settings. An `audit_capacity` of zero
    ///   leaves the engine without an audit log.
    pub fn with_config(config: EngineConfig) -> Self {
        let audit_log = (config.audit_capacity > 0).then(|| AuditLog::new(config.audit_capacity));
        Self {
            id: EngineId::new(),
            cache: ConformanceCache::new(config.cache_capacity),
            registrations: DashMap::new(),
            audit_log,
            config,
        }
    }

    /// Replace the audit log. The log is shared, so the caller can keep a
    /// clone to read entries from.
    pub fn with_audit_log(mut self, audit_log: AuditLog) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    /// Get the engine's unique identifier.
    pub fn id(&self) -> EngineId {
        self.id
    }

    /// Get the configuration the engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the audit log, if auditing is enabled.
    pub fn audit_log(&self) -> Option<&AuditLog> {
        self.audit_log.as_ref()
    }

    /// Record that `type_def` implements `protocol` without declaring it.
    ///
    /// Registration affects earlier answers, so the cache is cleared. Checks
    /// already running when this is called do not cache their answers.
    pub fn register(&self, type_def: &TypeDef, protocol: Arc<Protocol>) {
        debug!(
            engine = %self.id,
            type_name = type_def.name(),
            protocol = protocol.name(),
            "registering implementation"
        );
        self.registrations
            .entry(type_def.id())
            .or_insert_with(Vec::new)
            .push(protocol);
        self.cache.clear();
    }

    /// Whether `instance` satisfies `protocol`.
    ///
    /// # Errors
    ///
    /// * [`ProtocolError::NotRuntimeCheckable`] - If `protocol` does not
    ///   allow runtime checks.
    pub fn is_instance(&self, instance: &Instance, protocol: &Protocol) -> Result<bool> {
        self.check(Candidate::Instance(instance), protocol)
    }

    /// Whether `type_def` satisfies `protocol`.
    ///
    /// # Errors
    ///
    /// * [`ProtocolError::NotRuntimeCheckable`] - If `protocol` does not
    ///   allow runtime checks.
    /// * [`DeclarationError::NonMethodSubtypeCheck`] - If `protocol` has data
    ///   members and no subtype hook. Data members cannot be verified on a
    ///   type alone.
    pub fn is_subtype(&self, type_def: &TypeDef, protocol: &Protocol) -> Result<bool> {
        self.check(Candidate::Type(type_def), protocol)
    }

    /// The first requirement of `protocol` that `candidate` fails, if any.
    pub fn find_mismatch(&self, candidate: Candidate<'_>, protocol: &Protocol) -> Option<Mismatch> {
        matcher::find_mismatch(candidate, protocol)
    }

    /// Drop every cached answer. Results are unaffected; only the work of
    /// computing them is repeated.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Get the current cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn check(&self, candidate: Candidate<'_>, protocol: &Protocol) -> Result<bool> {
        let conforms = self.evaluate(candidate, protocol)?;
        let type_def = candidate.type_def();
        let mode = mode_of(candidate);

        debug!(
            engine = %self.id,
            protocol = protocol.name(),
            candidate = type_def.name(),
            %mode,
            conforms,
            "conformance check"
        );

        if let Some(audit_log) = &self.audit_log {
            audit_log.log_check(AuditEntry {
                timestamp: Utc::now(),
                protocol_id: protocol.id(),
                protocol: protocol.name().to_string(),
                candidate_id: type_def.id(),
                candidate: type_def.name().to_string(),
                mode,
                conforms,
            });
        }

        Ok(conforms)
    }

    fn evaluate(&self, candidate: Candidate<'_>, protocol: &Protocol) -> Result<bool> {
        if !protocol.is_runtime_checkable() {
            return Err(ProtocolError::NotRuntimeCheckable(protocol.name().to_string()).into());
        }

        if protocol.is_root() {
            return Ok(true);
        }

        let mode = mode_of(candidate);
        if mode == CheckMode::Subtype && protocol.subtype_hook().is_none() && protocol.members().has_data() {
            return Err(DeclarationError::NonMethodSubtypeCheck {
                protocol: protocol.name().to_string(),
                members: protocol.members().data().map(|m| m.name.clone()).collect(),
            }
            .into());
        }

        let type_def = candidate.type_def();
        if let Some(base) = protocol.nominal_base() {
            if !type_def.inherits_from(base) {
                trace!(protocol = protocol.name(), base = base.name(), "missing nominal base");
                return Ok(false);
            }
        }

        let key = CacheKey::new(type_def.id(), protocol.id(), mode);
        let cacheable = self.config.cache_enabled
            && match candidate {
                Candidate::Type(_) => true,
                Candidate::Instance(instance) => !instance.has_overrides(),
            };

        // Read before anything the answer depends on, so a registration made
        // while this check runs keeps the answer out of the cache.
        let generation = self.cache.generation();

        if cacheable {
            if let Some(cached) = self.cache.get(&key) {
                return Ok(cached);
            }
        }

        let Some(in_flight) = InFlight::enter(self.id, key) else {
            debug!(
                protocol = protocol.name(),
                candidate = type_def.name(),
                %mode,
                "re-entrant conformance check, answering false"
            );
            return Ok(false);
        };

        let conforms = match candidate {
            // The answer is stored for every plain instance of the type, so
            // it is computed on one. The live instance may gain attributes
            // while the check runs.
            Candidate::Instance(instance) if cacheable => {
                let plain = Instance::new(Arc::clone(instance.type_def()));
                self.decide(Candidate::Instance(&plain), protocol)?
            }
            _ => self.decide(candidate, protocol)?,
        };

        if cacheable && !in_flight.is_tainted() {
            Ok(self.cache.insert_at(generation, key, conforms))
        } else {
            Ok(conforms)
        }
    }

    fn decide(&self, candidate: Candidate<'_>, protocol: &Protocol) -> Result<bool> {
        let type_def = candidate.type_def();

        if self.is_nominal(type_def, protocol) {
            return Ok(true);
        }

        if let Some(hook) = protocol.subtype_hook() {
            match (hook(self, type_def), candidate) {
                (Some(answer), Candidate::Type(_)) => return Ok(answer),
                // An instance of a type the hook accepts conforms. A refusal
                // still leaves the instance's own attributes to be checked.
                (Some(true), Candidate::Instance(_)) => return Ok(true),
                _ => {}
            }
        }

        if let Some(components) = protocol.components() {
            for component in components {
                if !self.evaluate(candidate, component)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        Ok(matcher::find_mismatch(candidate, protocol).is_none())
    }

    /// How `type_def` nominally implements `protocol`, if it does.
    ///
    /// # Returns
    ///
    /// * `Some(Nominal::Declared)` - If the type or one of its ancestors
    ///   declares `protocol` or a refinement of it.
    /// * `Some(Nominal::Registered { .. })` - If such a declaration was
    ///   registered with [`register`](Self::register) instead.
    /// * `None` - If conformance has to be established some other way.
    pub fn nominal(&self, type_def: &TypeDef, protocol: &Protocol) -> Option<Nominal> {
        if type_def.declares(protocol) {
            return Some(Nominal::Declared);
        }
        type_def
            .resolution_order()
            .find(|ancestor| {
                self.registrations
                    .get(&ancestor.id())
                    .map(|registered| registered.iter().any(|p| p.refines(protocol)))
                    .unwrap_or(false)
            })
            .map(|owner| Nominal::Registered {
                owner: owner.name().to_string(),
            })
    }

    fn is_nominal(&self, type_def: &TypeDef, protocol: &Protocol) -> bool {
        self.nominal(type_def, protocol).is_some()
    }
}

impl Default for ConformanceEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn mode_of(candidate: Candidate<'_>) -> CheckMode {
    match candidate {
        Candidate::Instance(_) => CheckMode::Instance,
        Candidate::Type(_) => CheckMode::Subtype,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttrValue;
    use lion_core::error::Error;
    use parking_lot::Mutex;
    use serde_json::json;

    fn closable() -> Arc<Protocol> {
        Protocol::builder("Closable").method("close").build().unwrap()
    }

    #[test]
    fn test_structural_subtype() {
        let engine = ConformanceEngine::new();
        let file = TypeDef::builder("File").method("close").build().unwrap();
        let rock = TypeDef::builder("Rock").build().unwrap();

        assert!(engine.is_subtype(&file, &closable()).unwrap());
        assert!(!engine.is_subtype(&rock, &closable()).unwrap());
    }

    #[test]
    fn test_root_accepts_everything() {
        let engine = ConformanceEngine::new();
        let rock = TypeDef::builder("Rock").build().unwrap();
        assert!(engine.is_subtype(&rock, &Protocol::root()).unwrap());
        assert!(engine.is_instance(&Instance::new(rock), &Protocol::root()).unwrap());
    }

    #[test]
    fn test_not_runtime_checkable_is_an_error() {
        let engine = ConformanceEngine::new();
        let protocol = Protocol::builder("Opaque")
            .method("close")
            .not_runtime_checkable()
            .build()
            .unwrap();
        let file = TypeDef::builder("File").method("close").build().unwrap();

        let err = engine.is_subtype(&file, &protocol).unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::NotRuntimeCheckable(_))));
    }

    #[test]
    fn test_data_protocol_subtype_check_is_an_error() {
        let engine = ConformanceEngine::new();
        let named = Protocol::builder("Named").data("name").build().unwrap();
        let person = TypeDef::builder("Person").field("name").build().unwrap();

        let err = engine.is_subtype(&person, &named).unwrap_err();
        assert!(matches!(
            err,
            Error::Declaration(DeclarationError::NonMethodSubtypeCheck { .. })
        ));
        assert!(engine.is_instance(&Instance::new(person), &named).unwrap());
    }

    #[test]
    fn test_subtype_hook_decides() {
        let engine = ConformanceEngine::new();
        let protocol = Protocol::builder("Named")
            .data("name")
            .subtype_hook(|_, ty| Some(ty.name().starts_with("Named")))
            .build()
            .unwrap();

        let yes = TypeDef::builder("NamedThing").build().unwrap();
        let no = TypeDef::builder("Thing").field("name").build().unwrap();
        assert!(engine.is_subtype(&yes, &protocol).unwrap());
        assert!(!engine.is_subtype(&no, &protocol).unwrap());
    }

    #[test]
    fn test_hook_returning_none_falls_through() {
        let engine = ConformanceEngine::new();
        let protocol = Protocol::builder("Closable")
            .method("close")
            .subtype_hook(|_, _| None)
            .build()
            .unwrap();
        let file = TypeDef::builder("File").method("close").build().unwrap();
        assert!(engine.is_subtype(&file, &protocol).unwrap());
    }

    #[test]
    fn test_declared_implementation_is_nominal() {
        let engine = ConformanceEngine::new();
        let protocol = closable();
        let handle = TypeDef::builder("Handle").implements(protocol.clone()).build().unwrap();
        let derived = TypeDef::builder("Derived").base(handle).build().unwrap();

        assert!(engine.is_subtype(&derived, &protocol).unwrap());
    }

    #[test]
    fn test_nominal_reports_where_the_implementation_comes_from() {
        let engine = ConformanceEngine::new();
        let protocol = closable();
        let handle = TypeDef::builder("Handle").implements(protocol.clone()).build().unwrap();
        let socket = TypeDef::builder("Socket").build().unwrap();
        let tcp = TypeDef::builder("TcpSocket").base(socket.clone()).build().unwrap();

        assert_eq!(engine.nominal(&handle, &protocol), Some(Nominal::Declared));
        assert_eq!(engine.nominal(&tcp, &protocol), None);

        engine.register(&socket, protocol.clone());
        assert_eq!(
            engine.nominal(&tcp, &protocol),
            Some(Nominal::Registered {
                owner: "Socket".to_string()
            })
        );
    }

    #[test]
    fn test_registration_clears_cache() {
        let engine = ConformanceEngine::new();
        let protocol = closable();
        let socket = TypeDef::builder("Socket").build().unwrap();

        assert!(!engine.is_subtype(&socket, &protocol).unwrap());
        assert_eq!(engine.cache_stats().entries, 1);

        engine.register(&socket, protocol.clone());
        assert_eq!(engine.cache_stats().entries, 0);
        assert!(engine.is_subtype(&socket, &protocol).unwrap());
    }

    #[test]
    fn test_instance_with_overrides_bypasses_cache() {
        let engine = ConformanceEngine::new();
        let protocol = closable();
        let ty = TypeDef::builder("Blank").build().unwrap();

        let plain = Instance::new(ty.clone());
        assert!(!engine.is_instance(&plain, &protocol).unwrap());

        let patched = Instance::new(ty).with_attr("close", AttrValue::Callable);
        assert!(engine.is_instance(&patched, &protocol).unwrap());

        patched.set_attr("close", AttrValue::Data(json!(false)));
        assert!(!engine.is_instance(&patched, &protocol).unwrap());
    }

    #[test]
    fn test_registration_during_check_keeps_stale_answer_out_of_cache() {
        let engine = ConformanceEngine::new();
        let slot: Arc<Mutex<Option<Arc<Protocol>>>> = Arc::new(Mutex::new(None));
        let hook_slot = slot.clone();
        let socket = TypeDef::builder("Socket").build().unwrap();
        let hook_socket = socket.clone();

        let protocol = Protocol::builder("Closable")
            .method("close")
            .subtype_hook(move |engine, _| {
                if let Some(me) = hook_slot.lock().take() {
                    engine.register(&hook_socket, me);
                }
                None
            })
            .build()
            .unwrap();
        *slot.lock() = Some(protocol.clone());

        // Computed before the registration was visible.
        assert!(!engine.is_subtype(&socket, &protocol).unwrap());
        assert_eq!(engine.cache_stats().entries, 0);
        assert!(engine.is_subtype(&socket, &protocol).unwrap());
    }

    #[test]
    fn test_attribute_added_during_check_is_not_cached_for_the_type() {
        let engine = ConformanceEngine::new();
        let ty = TypeDef::builder("Blank").build().unwrap();
        let patched = Arc::new(Instance::new(ty.clone()));
        let hook_patched = patched.clone();

        let protocol = Protocol::builder("Closable")
            .method("close")
            .subtype_hook(move |_, _| {
                hook_patched.set_attr("close", AttrValue::Callable);
                None
            })
            .build()
            .unwrap();

        assert!(!engine.is_instance(&patched, &protocol).unwrap());
        assert!(!engine.is_instance(&Instance::new(ty), &protocol).unwrap());
        assert!(engine.is_instance(&patched, &protocol).unwrap());
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let engine = ConformanceEngine::with_config(EngineConfig {
            cache_enabled: false,
            ..EngineConfig::default()
        });
        let file = TypeDef::builder("File").method("close").build().unwrap();

        assert!(engine.is_subtype(&file, &closable()).unwrap());
        assert_eq!(engine.cache_stats().entries, 0);
    }

    #[test]
    fn test_audit_log_records_top_level_checks() {
        let audit_log = AuditLog::new(10);
        let engine = ConformanceEngine::new().with_audit_log(audit_log.clone());
        let protocol = closable();
        let file = TypeDef::builder("File").method("close").build().unwrap();

        engine.is_subtype(&file, &protocol).unwrap();

        let entries = audit_log.get_entries(&protocol.id());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].candidate, "File");
        assert_eq!(entries[0].mode, CheckMode::Subtype);
        assert!(entries[0].conforms);
    }
}
