//! Type coercion between typed values and host values
//!
//! Primitive types convert by direct representation mapping. Sequences wrap
//! the host collection reference without copying. Bound-class types adopt or
//! unwrap a host object through a [`CoercionScope`], which the binder
//! provides. Any other named type must have a custom [`CoercionRule`]
//! registered before the registry freezes.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::binder::Wrapper;
use crate::error::{BindResult, BindingError};
use crate::types::DeclaredType;
use crate::value::{HostRef, HostValue, Sequence, Value};

/// A pure conversion pair for one declared type.
///
/// Implementations must satisfy, for every host value `h` they accept,
/// `to_host(from_host(h)) == h`, and for every typed value `v` they accept,
/// `from_host(to_host(v)) == v`.
pub trait CoercionRule: Send + Sync {
    /// Convert a typed value to its host representation
    fn to_host(&self, value: &Value) -> BindResult<HostValue>;

    /// Convert a host value to its typed representation
    fn from_host(&self, value: HostValue) -> BindResult<Value>;
}

/// Binder services the engine needs for bound-class and numeric coercion.
pub trait CoercionScope {
    /// Whether `name` is a registered bound class
    fn is_bound_class(&self, name: &str) -> bool;

    /// Attach (or reuse) a wrapper of `class` for a host object
    fn adopt_for(&self, host: HostRef, class: &str) -> BindResult<Wrapper>;

    /// The host object behind `wrapper`, which must be a `class`
    fn unwrap_for(&self, wrapper: &Wrapper, class: &str) -> BindResult<HostRef>;

    /// Whether an `Int` may stand in for a `Number`
    fn numeric_widening(&self) -> bool {
        true
    }
}

// ============================================================================
// Built-in rules
// ============================================================================

/// `boolean` ↔ host boolean
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolRule;

impl CoercionRule for BoolRule {
    fn to_host(&self, value: &Value) -> BindResult<HostValue> {
        match value {
            Value::Bool(b) => Ok(HostValue::Bool(*b)),
            other => Err(BindingError::coercion("boolean", other.kind_name())),
        }
    }

    fn from_host(&self, value: HostValue) -> BindResult<Value> {
        match value {
            HostValue::Bool(b) => Ok(Value::Bool(b)),
            other => Err(BindingError::coercion("boolean", other.type_name())),
        }
    }
}

/// `int` ↔ integral host number within i32 range
#[derive(Debug, Clone, Copy, Default)]
pub struct IntRule;

impl CoercionRule for IntRule {
    fn to_host(&self, value: &Value) -> BindResult<HostValue> {
        match value {
            Value::Int(i) => Ok(HostValue::Number(*i as f64)),
            other => Err(BindingError::coercion("int", other.kind_name())),
        }
    }

    fn from_host(&self, value: HostValue) -> BindResult<Value> {
        match value {
            HostValue::Number(n)
                if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 =>
            {
                Ok(Value::Int(n as i32))
            }
            HostValue::Number(n) => Err(BindingError::coercion("int", n)),
            other => Err(BindingError::coercion("int", other.type_name())),
        }
    }
}

/// `number` ↔ host number
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberRule;

impl CoercionRule for NumberRule {
    fn to_host(&self, value: &Value) -> BindResult<HostValue> {
        match value {
            Value::Number(n) => Ok(HostValue::Number(*n)),
            other => Err(BindingError::coercion("number", other.kind_name())),
        }
    }

    fn from_host(&self, value: HostValue) -> BindResult<Value> {
        match value {
            HostValue::Number(n) => Ok(Value::Number(n)),
            other => Err(BindingError::coercion("number", other.type_name())),
        }
    }
}

/// `string` ↔ host string
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRule;

impl CoercionRule for TextRule {
    fn to_host(&self, value: &Value) -> BindResult<HostValue> {
        match value {
            Value::Text(s) => Ok(HostValue::String(s.clone())),
            other => Err(BindingError::coercion("string", other.kind_name())),
        }
    }

    fn from_host(&self, value: HostValue) -> BindResult<Value> {
        match value {
            HostValue::String(s) => Ok(Value::Text(s)),
            other => Err(BindingError::coercion("string", other.type_name())),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Shared value-conversion rules, keyed by declared type.
#[derive(Clone, Default)]
pub struct CoercionEngine {
    rules: FxHashMap<String, Arc<dyn CoercionRule>>,
}

impl fmt::Debug for CoercionEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.rules.keys().collect();
        names.sort();
        f.debug_struct("CoercionEngine")
            .field("custom_rules", &names)
            .finish()
    }
}

impl CoercionEngine {
    /// Create an engine with only the built-in rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom rule for a named type
    pub fn register_rule(
        &mut self,
        name: &str,
        rule: impl CoercionRule + 'static,
    ) -> BindResult<()> {
        if self.rules.contains_key(name) {
            return Err(BindingError::DuplicateBinding(name.to_string()));
        }
        self.rules.insert(name.to_string(), Arc::new(rule));
        Ok(())
    }

    /// Check if a custom rule is registered
    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// Number of custom rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn primitive(ty: &DeclaredType) -> Option<&'static dyn CoercionRule> {
        match ty {
            DeclaredType::Bool => Some(&BoolRule),
            DeclaredType::Int => Some(&IntRule),
            DeclaredType::Number => Some(&NumberRule),
            DeclaredType::Text => Some(&TextRule),
            _ => None,
        }
    }

    fn custom(&self, name: &str) -> BindResult<&dyn CoercionRule> {
        self.rules
            .get(name)
            .map(|rule| rule.as_ref())
            .ok_or_else(|| BindingError::coercion(name, "type without coercion rule"))
    }

    /// Convert a typed value to the host representation of `ty`
    pub fn to_host(
        &self,
        ty: &DeclaredType,
        value: &Value,
        scope: &dyn CoercionScope,
    ) -> BindResult<HostValue> {
        if let Some(rule) = Self::primitive(ty) {
            if let (DeclaredType::Number, Value::Int(i)) = (ty, value) {
                if scope.numeric_widening() {
                    return Ok(HostValue::Number(*i as f64));
                }
            }
            return rule.to_host(value);
        }

        match ty {
            DeclaredType::Void => match value {
                Value::Void => Ok(HostValue::Undefined),
                other => Err(BindingError::coercion("void", other.kind_name())),
            },
            DeclaredType::Nullable(inner) => match value {
                Value::Null => Ok(HostValue::Null),
                other => self.to_host(inner, other, scope),
            },
            DeclaredType::Sequence(_) => match value {
                Value::Sequence(seq) => Ok(HostValue::Array(seq.host_ref())),
                other => Err(BindingError::coercion(ty, other.kind_name())),
            },
            DeclaredType::Named(name) if scope.is_bound_class(name) => match value {
                Value::Object(wrapper) => Ok(HostValue::Object(scope.unwrap_for(wrapper, name)?)),
                other => Err(BindingError::coercion(name, other.kind_name())),
            },
            DeclaredType::Named(name) => self.custom(name)?.to_host(value),
            _ => unreachable!("primitive types handled above"),
        }
    }

    /// Convert a host value to the typed representation of `ty`
    pub fn from_host(
        &self,
        ty: &DeclaredType,
        value: HostValue,
        scope: &dyn CoercionScope,
    ) -> BindResult<Value> {
        if ty.is_void() {
            return Ok(Value::Void);
        }
        if let DeclaredType::Nullable(inner) = ty {
            if value.is_nullish() {
                return Ok(Value::Null);
            }
            return self.from_host(inner, value, scope);
        }
        if value.is_nullish() {
            return Err(BindingError::coercion(ty, value.type_name()));
        }

        if let Some(rule) = Self::primitive(ty) {
            return rule.from_host(value);
        }

        match ty {
            DeclaredType::Sequence(element) => match value {
                HostValue::Array(host) => Ok(Value::Sequence(Sequence::new(
                    host,
                    element.as_deref().cloned(),
                ))),
                other => Err(BindingError::coercion(ty, other.type_name())),
            },
            DeclaredType::Named(name) if scope.is_bound_class(name) => match value {
                HostValue::Object(host) => Ok(Value::Object(scope.adopt_for(host, name)?)),
                other => Err(BindingError::coercion(name, other.type_name())),
            },
            DeclaredType::Named(name) => self.custom(name)?.from_host(value),
            _ => unreachable!("void, nullable and primitive types handled above"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scope with no bound classes
    struct NoClasses {
        widening: bool,
    }

    impl CoercionScope for NoClasses {
        fn is_bound_class(&self, _name: &str) -> bool {
            false
        }

        fn adopt_for(&self, _host: HostRef, class: &str) -> BindResult<Wrapper> {
            Err(BindingError::UnknownBinding(class.to_string()))
        }

        fn unwrap_for(&self, _wrapper: &Wrapper, class: &str) -> BindResult<HostRef> {
            Err(BindingError::UnknownBinding(class.to_string()))
        }

        fn numeric_widening(&self) -> bool {
            self.widening
        }
    }

    const SCOPE: NoClasses = NoClasses { widening: true };

    /// Pixels carried as a "12px" host string
    struct PixelRule;

    impl CoercionRule for PixelRule {
        fn to_host(&self, value: &Value) -> BindResult<HostValue> {
            match value {
                Value::Int(px) => Ok(HostValue::String(format!("{}px", px))),
                other => Err(BindingError::coercion("pixels", other.kind_name())),
            }
        }

        fn from_host(&self, value: HostValue) -> BindResult<Value> {
            match value {
                HostValue::String(s) => s
                    .strip_suffix("px")
                    .and_then(|n| n.parse().ok())
                    .map(Value::Int)
                    .ok_or_else(|| BindingError::coercion("pixels", &s)),
                other => Err(BindingError::coercion("pixels", other.type_name())),
            }
        }
    }

    #[test]
    fn test_primitive_round_trip() {
        let engine = CoercionEngine::new();
        let cases = [
            (DeclaredType::Bool, Value::Bool(true)),
            (DeclaredType::Int, Value::Int(-42)),
            (DeclaredType::Number, Value::Number(2.5)),
            (DeclaredType::Text, Value::Text("héllo".into())),
        ];
        for (ty, value) in cases {
            let host = engine.to_host(&ty, &value, &SCOPE).unwrap();
            assert_eq!(engine.from_host(&ty, host, &SCOPE).unwrap(), value);
        }
    }

    #[test]
    fn test_host_side_idempotence() {
        let engine = CoercionEngine::new();
        let cases = [
            (DeclaredType::Bool, HostValue::Bool(false)),
            (DeclaredType::Int, HostValue::Number(7.0)),
            (DeclaredType::Number, HostValue::Number(0.1)),
            (DeclaredType::Text, HostValue::String("x".into())),
            (DeclaredType::Text.nullable(), HostValue::Null),
            (
                DeclaredType::Sequence(None),
                HostValue::Array(HostRef::from_raw(3)),
            ),
        ];
        for (ty, host) in cases {
            let typed = engine.from_host(&ty, host.clone(), &SCOPE).unwrap();
            assert_eq!(engine.to_host(&ty, &typed, &SCOPE).unwrap(), host);
        }
    }

    #[test]
    fn test_int_rejects_fractional_and_out_of_range() {
        let engine = CoercionEngine::new();
        for n in [1.5, f64::NAN, 3e10, f64::INFINITY] {
            let err = engine
                .from_host(&DeclaredType::Int, HostValue::Number(n), &SCOPE)
                .unwrap_err();
            assert!(matches!(err, BindingError::CoercionError { .. }));
        }
    }

    #[test]
    fn test_null_for_non_nullable() {
        let engine = CoercionEngine::new();
        let err = engine
            .from_host(&DeclaredType::Text, HostValue::Null, &SCOPE)
            .unwrap_err();
        assert!(matches!(err, BindingError::CoercionError { ref got, .. } if got == "null"));
        assert!(engine
            .to_host(&DeclaredType::Text, &Value::Null, &SCOPE)
            .is_err());
    }

    #[test]
    fn test_undefined_is_null_for_nullable() {
        let engine = CoercionEngine::new();
        let v = engine
            .from_host(&DeclaredType::Int.nullable(), HostValue::Undefined, &SCOPE)
            .unwrap();
        assert!(v.is_null());
    }

    #[test]
    fn test_void_ignores_host_value() {
        let engine = CoercionEngine::new();
        let v = engine
            .from_host(&DeclaredType::Void, HostValue::Number(1.0), &SCOPE)
            .unwrap();
        assert!(v.is_void());
    }

    #[test]
    fn test_numeric_widening() {
        let engine = CoercionEngine::new();
        assert_eq!(
            engine
                .to_host(&DeclaredType::Number, &Value::Int(3), &SCOPE)
                .unwrap(),
            HostValue::Number(3.0)
        );
        let strict = NoClasses { widening: false };
        assert!(engine
            .to_host(&DeclaredType::Number, &Value::Int(3), &strict)
            .is_err());
        // Narrowing is never implicit
        assert!(engine
            .to_host(&DeclaredType::Int, &Value::Number(3.0), &SCOPE)
            .is_err());
    }

    #[test]
    fn test_sequence_wraps_without_copy() {
        let engine = CoercionEngine::new();
        let r = HostRef::from_raw(9);
        let ty = DeclaredType::sequence_of(DeclaredType::Text);
        let v = engine.from_host(&ty, HostValue::Array(r), &SCOPE).unwrap();
        match v {
            Value::Sequence(seq) => {
                assert_eq!(seq.host_ref(), r);
                assert_eq!(seq.element_type(), Some(&DeclaredType::Text));
            }
            other => panic!("expected sequence, got {:?}", other),
        }
        assert!(engine
            .from_host(&ty, HostValue::Object(r), &SCOPE)
            .is_err());
    }

    #[test]
    fn test_custom_rule() {
        let mut engine = CoercionEngine::new();
        engine.register_rule("pixels", PixelRule).unwrap();
        assert!(engine.has_rule("pixels"));
        assert!(engine.register_rule("pixels", PixelRule).is_err());

        let ty = DeclaredType::named("pixels");
        let host = engine.to_host(&ty, &Value::Int(12), &SCOPE).unwrap();
        assert_eq!(host, HostValue::String("12px".into()));
        assert_eq!(engine.from_host(&ty, host, &SCOPE).unwrap(), Value::Int(12));
    }

    #[test]
    fn test_unknown_named_type() {
        let engine = CoercionEngine::new();
        let err = engine
            .to_host(&DeclaredType::named("Mystery"), &Value::Int(1), &SCOPE)
            .unwrap_err();
        assert!(matches!(err, BindingError::CoercionError { .. }));
    }
}
