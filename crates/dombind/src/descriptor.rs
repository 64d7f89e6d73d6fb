//! Type descriptors: static binding metadata for one bound class
//!
//! A descriptor is the compiled form of one binding declaration. It lists
//! the class's own field and method mappings in declaration order; inherited
//! members live on the supertype's descriptor and are found by walking the
//! chain through the registry.

use rustc_hash::FxHashMap;

use crate::error::{BindResult, BindingError};
use crate::types::DeclaredType;

/// Mapping of one typed field to one host property.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    /// Field name in typed code
    pub name: String,
    /// Host property name
    pub host_property: String,
    /// Declared type
    pub declared_type: DeclaredType,
    /// Host-side read-only (computed) property
    pub read_only: bool,
}

/// Mapping of one native method to one host operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMapping {
    /// Method name in typed code
    pub name: String,
    /// Host operation name
    pub host_operation: String,
    /// Declared parameter types, in order
    pub parameter_types: Vec<DeclaredType>,
    /// Declared return type (`Void` for fire-and-forget calls)
    pub return_type: DeclaredType,
}

impl MethodMapping {
    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }
}

/// Builder for constructing TypeDescriptor instances.
pub struct TypeDescriptorBuilder {
    class_id: String,
    host_constructor: Option<String>,
    constructor_params: Vec<DeclaredType>,
    super_class: Option<String>,
    fields: Vec<FieldMapping>,
    methods: Vec<MethodMapping>,
}

impl TypeDescriptorBuilder {
    /// Set the host constructor name
    pub fn host_constructor(mut self, name: &str) -> Self {
        self.host_constructor = Some(name.to_string());
        self
    }

    /// Declare the host constructor's parameter types
    pub fn constructor_params(mut self, params: impl IntoIterator<Item = DeclaredType>) -> Self {
        self.constructor_params = params.into_iter().collect();
        self
    }

    /// Set the immediate supertype
    pub fn extends(mut self, super_class: &str) -> Self {
        self.super_class = Some(super_class.to_string());
        self
    }

    /// Add a field whose host property has the same name
    pub fn field(self, name: &str, ty: DeclaredType) -> Self {
        self.push_field(name, name, ty, false)
    }

    /// Add a field mapped to a differently-named host property
    pub fn field_as(self, name: &str, host_property: &str, ty: DeclaredType) -> Self {
        self.push_field(name, host_property, ty, false)
    }

    /// Add a field the host exposes read-only
    pub fn read_only_field(self, name: &str, ty: DeclaredType) -> Self {
        self.push_field(name, name, ty, true)
    }

    /// Add a field with every attribute spelled out
    pub fn push_field(
        mut self,
        name: &str,
        host_property: &str,
        ty: DeclaredType,
        read_only: bool,
    ) -> Self {
        self.fields.push(FieldMapping {
            name: name.to_string(),
            host_property: host_property.to_string(),
            declared_type: ty,
            read_only,
        });
        self
    }

    /// Add a method whose host operation has the same name
    pub fn method(
        self,
        name: &str,
        params: impl IntoIterator<Item = DeclaredType>,
        returns: DeclaredType,
    ) -> Self {
        self.method_as(name, name, params, returns)
    }

    /// Add a method mapped to a differently-named host operation
    pub fn method_as(
        mut self,
        name: &str,
        host_operation: &str,
        params: impl IntoIterator<Item = DeclaredType>,
        returns: DeclaredType,
    ) -> Self {
        self.methods.push(MethodMapping {
            name: name.to_string(),
            host_operation: host_operation.to_string(),
            parameter_types: params.into_iter().collect(),
            return_type: returns,
        });
        self
    }

    /// Build the TypeDescriptor, rejecting repeated own member names
    pub fn build(self) -> BindResult<TypeDescriptor> {
        let mut field_lookup = FxHashMap::default();
        for (index, field) in self.fields.iter().enumerate() {
            if field_lookup.insert(field.name.clone(), index).is_some() {
                return Err(BindingError::DuplicateMember {
                    class: self.class_id,
                    member: field.name.clone(),
                });
            }
        }

        let mut method_lookup = FxHashMap::default();
        for (index, method) in self.methods.iter().enumerate() {
            if method_lookup.insert(method.name.clone(), index).is_some() {
                return Err(BindingError::DuplicateMember {
                    class: self.class_id,
                    member: method.name.clone(),
                });
            }
        }

        Ok(TypeDescriptor {
            class_id: self.class_id,
            host_constructor: self.host_constructor,
            constructor_params: self.constructor_params,
            super_class: self.super_class,
            fields: self.fields,
            methods: self.methods,
            field_lookup,
            method_lookup,
        })
    }
}

/// Immutable binding metadata for one bound class.
///
/// Own-member lookups are `FxHashMap<String, usize>` → O(1).
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    class_id: String,
    host_constructor: Option<String>,
    constructor_params: Vec<DeclaredType>,
    super_class: Option<String>,
    fields: Vec<FieldMapping>,
    methods: Vec<MethodMapping>,
    field_lookup: FxHashMap<String, usize>,
    method_lookup: FxHashMap<String, usize>,
}

impl TypeDescriptor {
    /// Create a builder
    pub fn builder(class_id: &str) -> TypeDescriptorBuilder {
        TypeDescriptorBuilder {
            class_id: class_id.to_string(),
            host_constructor: None,
            constructor_params: Vec::new(),
            super_class: None,
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Bound class id
    pub fn class_id(&self) -> &str {
        &self.class_id
    }

    /// Host constructor name; `None` for abstract bindings
    pub fn host_constructor(&self) -> Option<&str> {
        self.host_constructor.as_deref()
    }

    /// Declared host constructor parameters
    pub fn constructor_params(&self) -> &[DeclaredType] {
        &self.constructor_params
    }

    /// Immediate supertype
    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_deref()
    }

    /// Own fields in declaration order
    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    /// Own methods in declaration order
    pub fn methods(&self) -> &[MethodMapping] {
        &self.methods
    }

    /// Look up an own field by name
    pub fn own_field(&self, name: &str) -> Option<&FieldMapping> {
        self.field_lookup.get(name).map(|&i| &self.fields[i])
    }

    /// Look up an own method by name
    pub fn own_method(&self, name: &str) -> Option<&MethodMapping> {
        self.method_lookup.get(name).map(|&i| &self.methods[i])
    }

    /// Every declared type used by this descriptor, tagged with the member
    /// that uses it. Constructor parameters are tagged `<init>`.
    pub fn declared_types(&self) -> Vec<(&str, &DeclaredType)> {
        let mut out = Vec::new();
        for ty in &self.constructor_params {
            out.push(("<init>", ty));
        }
        for f in &self.fields {
            out.push((f.name.as_str(), &f.declared_type));
        }
        for m in &self.methods {
            for ty in &m.parameter_types {
                out.push((m.name.as_str(), ty));
            }
            out.push((m.name.as_str(), &m.return_type));
        }
        out
    }
}
