//! Binding registry: the catalogue of type descriptors
//!
//! Populated during a bootstrap phase, then frozen. After `freeze` the
//! registry is read-only, so an `Arc<BindingRegistry>` can be shared and read
//! from any thread without locking.

use std::sync::Arc;

use log::{debug, info};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;

use crate::coercion::{CoercionEngine, CoercionRule};
use crate::descriptor::{FieldMapping, MethodMapping, TypeDescriptor};
use crate::error::{BindResult, BindingError};

/// Registry of type descriptors keyed by bound class id
#[derive(Debug, Default)]
pub struct BindingRegistry {
    descriptors: FxHashMap<String, Arc<TypeDescriptor>>,
    /// Registration order, for deterministic validation and listing
    order: Vec<String>,
    coercions: CoercionEngine,
    frozen: bool,
}

impl BindingRegistry {
    /// Create new empty registry with the built-in coercion rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry using a prepared coercion engine
    pub fn with_coercions(coercions: CoercionEngine) -> Self {
        Self {
            coercions,
            ..Self::default()
        }
    }

    /// Register a descriptor.
    ///
    /// The supertype, if any, must already be registered.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> BindResult<Arc<TypeDescriptor>> {
        let class_id = descriptor.class_id().to_string();
        if self.frozen {
            return Err(BindingError::RegistryFrozen(class_id));
        }
        if self.descriptors.contains_key(&class_id) || self.coercions.has_rule(&class_id) {
            return Err(BindingError::DuplicateBinding(class_id));
        }
        if let Some(name) = descriptor.host_constructor() {
            if name.is_empty() {
                return Err(BindingError::NoHostConstructor(class_id));
            }
        }
        if let Some(super_class) = descriptor.super_class() {
            if super_class == class_id {
                return Err(BindingError::InheritanceCycle(class_id));
            }
            if !self.descriptors.contains_key(super_class) {
                return Err(BindingError::MissingSuperType {
                    class: class_id,
                    super_class: super_class.to_string(),
                });
            }
        }

        debug!(
            "registered binding '{}' (host: {:?}, {} field(s), {} method(s))",
            class_id,
            descriptor.host_constructor(),
            descriptor.fields().len(),
            descriptor.methods().len()
        );

        let descriptor = Arc::new(descriptor);
        self.descriptors.insert(class_id.clone(), Arc::clone(&descriptor));
        self.order.push(class_id);
        Ok(descriptor)
    }

    /// Register a custom coercion rule for a named (non-class) type
    pub fn register_coercion(
        &mut self,
        name: &str,
        rule: impl CoercionRule + 'static,
    ) -> BindResult<()> {
        if self.frozen {
            return Err(BindingError::RegistryFrozen(name.to_string()));
        }
        if self.descriptors.contains_key(name) {
            return Err(BindingError::DuplicateBinding(name.to_string()));
        }
        self.coercions.register_rule(name, rule)
    }

    /// Validate every descriptor and end the bootstrap phase.
    ///
    /// Every named type must be a registered class or coercion rule. On
    /// failure the registry stays open and the first error is returned.
    pub fn freeze(&mut self) -> BindResult<()> {
        if self.frozen {
            return Ok(());
        }

        for class_id in &self.order {
            let descriptor = &self.descriptors[class_id];
            for (member, ty) in descriptor.declared_types() {
                for name in ty.named_types() {
                    if !self.descriptors.contains_key(name) && !self.coercions.has_rule(name) {
                        return Err(BindingError::UnregisteredType {
                            class: class_id.clone(),
                            member: member.to_string(),
                            type_name: name.to_string(),
                        });
                    }
                }
            }
        }

        self.frozen = true;
        info!(
            "binding registry frozen with {} class(es), {} custom coercion(s)",
            self.order.len(),
            self.coercions.rule_count()
        );
        Ok(())
    }

    /// Check if the bootstrap phase is over
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Resolve a descriptor by class id
    pub fn resolve(&self, class_id: &str) -> BindResult<Arc<TypeDescriptor>> {
        self.get(class_id).map(Arc::clone)
    }

    fn get(&self, class_id: &str) -> BindResult<&Arc<TypeDescriptor>> {
        self.descriptors
            .get(class_id)
            .ok_or_else(|| BindingError::UnknownBinding(class_id.to_string()))
    }

    /// Check if a class is registered
    pub fn contains(&self, class_id: &str) -> bool {
        self.descriptors.contains_key(class_id)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Class ids in registration order
    pub fn class_ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// The coercion engine shared by both bridges
    pub fn coercions(&self) -> &CoercionEngine {
        &self.coercions
    }

    /// Class ids from `class_id` up to the root, most-derived first
    pub fn ancestry(&self, class_id: &str) -> BindResult<Vec<&str>> {
        let mut chain = Vec::new();
        let mut current = self.get(class_id)?;
        loop {
            chain.push(current.class_id());
            match current.super_class() {
                Some(parent) => current = self.get(parent)?,
                None => return Ok(chain),
            }
        }
    }

    /// Check if `class_id` is `ancestor` or derives from it
    pub fn is_subclass(&self, class_id: &str, ancestor: &str) -> bool {
        self.ancestry(class_id)
            .map(|chain| chain.contains(&ancestor))
            .unwrap_or(false)
    }

    /// Find a field mapping, walking the chain most-derived first
    pub fn find_field(&self, class_id: &str, name: &str) -> BindResult<&FieldMapping> {
        let mut current = self.get(class_id)?;
        loop {
            if let Some(field) = current.own_field(name) {
                return Ok(field);
            }
            match current.super_class() {
                Some(parent) => current = self.get(parent)?,
                None => {
                    return Err(BindingError::UnknownField {
                        class: class_id.to_string(),
                        field: name.to_string(),
                    })
                }
            }
        }
    }

    /// Find a method mapping, walking the chain most-derived first
    pub fn find_method(&self, class_id: &str, name: &str) -> BindResult<&MethodMapping> {
        let mut current = self.get(class_id)?;
        loop {
            if let Some(method) = current.own_method(name) {
                return Ok(method);
            }
            match current.super_class() {
                Some(parent) => current = self.get(parent)?,
                None => {
                    return Err(BindingError::UnknownMethod {
                        class: class_id.to_string(),
                        method: name.to_string(),
                    })
                }
            }
        }
    }
}

// ============================================================================
// Process-wide registry
// ============================================================================

/// The process-wide, installed-once registry.
pub mod global {
    use super::*;

    static INSTALLED: OnceCell<Arc<BindingRegistry>> = OnceCell::new();

    /// Install a frozen registry for the whole process.
    ///
    /// Fails with `RegistryNotFrozen` for an open registry and with
    /// `RegistryFrozen` if one is already installed.
    pub fn install(registry: BindingRegistry) -> BindResult<Arc<BindingRegistry>> {
        if !registry.is_frozen() {
            return Err(BindingError::RegistryNotFrozen);
        }
        let registry = Arc::new(registry);
        INSTALLED
            .set(Arc::clone(&registry))
            .map_err(|_| BindingError::RegistryFrozen("<global>".to_string()))?;
        Ok(registry)
    }

    /// The installed registry, if any
    pub fn registry() -> Option<Arc<BindingRegistry>> {
        INSTALLED.get().cloned()
    }
}
