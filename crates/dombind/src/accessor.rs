//! Property accessor bridge
//!
//! Field reads and writes on a wrapper become host property gets and sets.
//! The mapping is resolved most-derived first, so an override in a subclass
//! redirects the access to its own host property.

use log::trace;

use crate::binder::{Binder, Wrapper};
use crate::error::{BindResult, BindingError};
use crate::types::DeclaredType;
use crate::value::{FromValue, HostValue, IntoValue, Sequence, Value};

impl Binder {
    /// Read a field, coercing the host value to the declared type
    pub fn read_field(&self, wrapper: &Wrapper, field: &str) -> BindResult<Value> {
        let mapping = self.registry().find_field(wrapper.class_id(), field)?;
        let target = self.host_ref(wrapper)?;

        trace!("get {}.{} (field {})", target, mapping.host_property, field);
        let raw = self
            .host()
            .get_property(target, &mapping.host_property)
            .map_err(|source| BindingError::HostInvocationFailed {
                class: wrapper.class_id().to_string(),
                member: field.to_string(),
                source,
            })?;

        self.registry()
            .coercions()
            .from_host(&mapping.declared_type, raw, self)
    }

    /// Write a field, coercing the value to the host representation
    pub fn write_field(&self, wrapper: &Wrapper, field: &str, value: Value) -> BindResult<()> {
        let mapping = self.registry().find_field(wrapper.class_id(), field)?;
        if mapping.read_only {
            return Err(BindingError::ReadOnlyField {
                class: wrapper.class_id().to_string(),
                field: field.to_string(),
            });
        }
        let target = self.host_ref(wrapper)?;

        let raw = self
            .registry()
            .coercions()
            .to_host(&mapping.declared_type, &value, self)?;

        trace!("set {}.{} = {:?}", target, mapping.host_property, raw);
        self.host()
            .set_property(target, &mapping.host_property, raw)
            .map_err(|source| BindingError::HostInvocationFailed {
                class: wrapper.class_id().to_string(),
                member: field.to_string(),
                source,
            })
    }

    /// Typed field read
    pub fn get<T: FromValue>(&self, wrapper: &Wrapper, field: &str) -> BindResult<T> {
        T::from_value(self.read_field(wrapper, field)?)
    }

    /// Typed field write
    pub fn set(&self, wrapper: &Wrapper, field: &str, value: impl IntoValue) -> BindResult<()> {
        self.write_field(wrapper, field, value.into_value())
    }

    // ========================================================================
    // Sequences
    // ========================================================================

    /// Length of a host sequence
    pub fn sequence_len(&self, sequence: &Sequence) -> BindResult<usize> {
        let raw = self.sequence_property(sequence, "length")?;
        match self
            .registry()
            .coercions()
            .from_host(&DeclaredType::Int, raw, self)?
        {
            Value::Int(n) if n >= 0 => Ok(n as usize),
            other => Err(BindingError::coercion("sequence length", other.kind_name())),
        }
    }

    /// Element `index`, coerced per the sequence's element type.
    ///
    /// Untyped sequences have no element rule; use [`Binder::sequence_get_raw`].
    /// A missing element reads as the host's `undefined`, so it is only
    /// accepted for nullable element types.
    pub fn sequence_get(&self, sequence: &Sequence, index: usize) -> BindResult<Value> {
        let element = sequence
            .element_type()
            .ok_or_else(|| BindingError::coercion("typed sequence", "Array"))?;
        let raw = self.sequence_get_raw(sequence, index)?;
        self.registry().coercions().from_host(element, raw, self)
    }

    /// Element `index` as the host returns it
    pub fn sequence_get_raw(&self, sequence: &Sequence, index: usize) -> BindResult<HostValue> {
        self.sequence_property(sequence, &index.to_string())
    }

    fn sequence_property(&self, sequence: &Sequence, name: &str) -> BindResult<HostValue> {
        trace!("get {}[{}]", sequence.host_ref(), name);
        self.host()
            .get_property(sequence.host_ref(), name)
            .map_err(|source| BindingError::HostInvocationFailed {
                class: "Array".to_string(),
                member: name.to_string(),
                source,
            })
    }
}
