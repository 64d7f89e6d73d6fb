//! Integration tests for field access through the property bridge

mod common;

use std::rc::Rc;
use std::sync::Arc;

use dombind::{
    Binder, BindingConfig, BindingError, BindingRegistry, DeclaredType, HostObjectModel,
    HostValue, Sequence, TypeDescriptor, Value,
};
use dombind_memhost::{HostClass, MemoryHost};

#[test]
fn test_round_trip_primitive_fields() {
    let (binder, _host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();

    let cases = [
        ("title", Value::Text("Save changes".into())),
        ("lang", Value::Text(String::new())),
        ("dir", Value::Text("rtl".into())),
        ("tabIndex", Value::Int(-1)),
        ("tabIndex", Value::Int(i32::MAX)),
        ("disabled", Value::Bool(true)),
        ("opacity", Value::Number(0.25)),
    ];
    for (field, value) in cases {
        binder.write_field(&button, field, value.clone()).unwrap();
        assert_eq!(binder.read_field(&button, field).unwrap(), value, "field {}", field);
    }
}

#[test]
fn test_write_is_visible_on_host() {
    let (binder, host) = common::binder();
    let el = binder.create("HTMLElement").unwrap();
    binder.set(&el, "className", "primary wide").unwrap();

    let target = binder.host_ref(&el).unwrap();
    assert_eq!(
        host.property(target, "className"),
        Some(HostValue::String("primary wide".into()))
    );

    // Host-side mutation is seen by the next read
    host.set_property(target, "title", "from host".into()).unwrap();
    assert_eq!(binder.get::<String>(&el, "title").unwrap(), "from host");
}

#[test]
fn test_explicit_property_name() {
    let (binder, host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();
    binder.set(&button, "opacity", 0.5).unwrap();
    let target = binder.host_ref(&button).unwrap();
    assert_eq!(host.property(target, "style.opacity"), Some(HostValue::Number(0.5)));
    assert_eq!(host.property(target, "opacity"), None);
}

#[test]
fn test_inherited_field() {
    let (binder, host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();
    binder.set(&button, "id", "submit").unwrap();
    let target = binder.host_ref(&button).unwrap();
    assert_eq!(host.property(target, "id"), Some(HostValue::String("submit".into())));
}

#[test]
fn test_read_only_fields() {
    let (binder, _host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();

    assert_eq!(binder.get::<String>(&button, "tagName").unwrap(), "");
    let err = binder.set(&button, "tagName", "DIV").unwrap_err();
    assert!(matches!(
        err,
        BindingError::ReadOnlyField { ref class, ref field }
            if class == "HTMLButtonElement" && field == "tagName"
    ));
    assert!(matches!(
        binder.write_field(&button, "form", Value::Null),
        Err(BindingError::ReadOnlyField { .. })
    ));
}

#[test]
fn test_host_rejects_write() {
    let (binder, _host) = common::binder();
    let el = binder.create("HTMLElement").unwrap();
    let err = binder.set(&el, "accessKeyLabel", "Alt+S").unwrap_err();
    assert!(matches!(
        err,
        BindingError::HostInvocationFailed { ref member, .. } if member == "accessKeyLabel"
    ));
}

#[test]
fn test_unknown_field() {
    let (binder, _host) = common::binder();
    let el = binder.create("HTMLElement").unwrap();
    assert!(matches!(
        binder.read_field(&el, "innerHTML"),
        Err(BindingError::UnknownField { .. })
    ));
    // Subclass fields are not visible through a base binding
    assert!(matches!(
        binder.read_field(&el, "disabled"),
        Err(BindingError::UnknownField { .. })
    ));
}

#[test]
fn test_coercion_errors() {
    let (binder, host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();
    let target = binder.host_ref(&button).unwrap();

    assert!(matches!(
        binder.set(&button, "tabIndex", "3"),
        Err(BindingError::CoercionError { .. })
    ));

    host.set_property(target, "tabIndex", HostValue::Number(1.5)).unwrap();
    assert!(matches!(
        binder.read_field(&button, "tabIndex"),
        Err(BindingError::CoercionError { .. })
    ));

    host.set_property(target, "title", HostValue::Null).unwrap();
    assert!(matches!(
        binder.read_field(&button, "title"),
        Err(BindingError::CoercionError { .. })
    ));
}

#[test]
fn test_nullable_bound_class_field() {
    let (binder, host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();
    let target = binder.host_ref(&button).unwrap();
    assert_eq!(binder.read_field(&button, "form").unwrap(), Value::Null);

    let form = host.insert("HTMLElement").unwrap();
    host.set_property(target, "form", HostValue::Object(form)).unwrap();
    let form_wrapper = match binder.read_field(&button, "form").unwrap() {
        Value::Object(w) => w,
        other => panic!("expected object, got {:?}", other),
    };
    assert_eq!(form_wrapper.class_id(), "HTMLElement");
    assert_eq!(binder.host_ref(&form_wrapper).unwrap(), form);

    // Reading again yields the same wrapper instance
    let again: Option<dombind::Wrapper> = binder.get(&button, "form").unwrap();
    assert!(dombind::Wrapper::ptr_eq(&form_wrapper, &again.unwrap()));
}

#[test]
fn test_dataset_sequence() {
    let (binder, host) = common::binder();
    let el = binder.create("HTMLElement").unwrap();
    let dataset: Sequence = binder.get(&el, "dataset").unwrap();
    assert_eq!(binder.sequence_len(&dataset).unwrap(), 0);
    assert!(dataset.element_type().is_none());

    let target = binder.host_ref(&el).unwrap();
    let replaced = host.create_array([HostValue::from("a"), HostValue::from(2)]);
    host.set_property(target, "dataset", HostValue::Array(replaced)).unwrap();

    let dataset: Sequence = binder.get(&el, "dataset").unwrap();
    assert_eq!(dataset.host_ref(), replaced);
    assert_eq!(binder.sequence_len(&dataset).unwrap(), 2);
    assert_eq!(binder.sequence_get_raw(&dataset, 1).unwrap(), HostValue::Number(2.0));
}

#[test]
fn test_typed_sequence_adopts_elements() {
    let (binder, host) = common::binder();
    let doc = common::document(&binder, &host);
    let doc_ref = binder.host_ref(&doc).unwrap();

    let first = host.insert("HTMLElement").unwrap();
    let second = host.insert("HTMLButtonElement").unwrap();
    let children = host.create_array([HostValue::Object(first), HostValue::Object(second)]);
    host.set_property(doc_ref, "children", HostValue::Array(children)).unwrap();

    let seq: Sequence = binder.get(&doc, "children").unwrap();
    assert_eq!(seq.element_type(), Some(&DeclaredType::named("HTMLElement")));
    assert_eq!(binder.sequence_len(&seq).unwrap(), 2);

    let second_wrapper = match binder.sequence_get(&seq, 1).unwrap() {
        Value::Object(w) => w,
        other => panic!("expected object, got {:?}", other),
    };
    // Adopted as the declared element class
    assert_eq!(second_wrapper.class_id(), "HTMLElement");
    assert_eq!(binder.host_ref(&second_wrapper).unwrap(), second);

    assert!(matches!(
        binder.sequence_get(&seq, 2),
        Err(BindingError::CoercionError { .. })
    ));
}

/// Base declares "id" -> "id"; Leaf overrides it as "id" -> "elementId".
fn override_chain() -> (Binder, Rc<MemoryHost>) {
    let mut registry = BindingRegistry::new();
    registry
        .register(
            TypeDescriptor::builder("Base")
                .field("id", DeclaredType::Text)
                .field("lang", DeclaredType::Text)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder("Mid")
                .extends("Base")
                .field("title", DeclaredType::Text)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            TypeDescriptor::builder("Leaf")
                .extends("Mid")
                .host_constructor("LeafNode")
                .field_as("id", "elementId", DeclaredType::Text)
                .build()
                .unwrap(),
        )
        .unwrap();
    registry.freeze().unwrap();

    let host = Rc::new(MemoryHost::new());
    host.define_class(
        HostClass::new("LeafNode")
            .prop("id", "")
            .prop("elementId", "")
            .prop("lang", "en")
            .prop("title", ""),
    );
    let binder = Binder::new(Arc::new(registry), host.clone(), BindingConfig::default()).unwrap();
    (binder, host)
}

#[test]
fn test_override_wins() {
    let (binder, host) = override_chain();
    let leaf = binder.create("Leaf").unwrap();
    let target = binder.host_ref(&leaf).unwrap();

    binder.set(&leaf, "id", "main").unwrap();
    assert_eq!(host.property(target, "elementId"), Some(HostValue::String("main".into())));
    assert_eq!(host.property(target, "id"), Some(HostValue::String(String::new())));
    assert_eq!(binder.get::<String>(&leaf, "id").unwrap(), "main");

    // Fields the leaf does not override still resolve up the chain
    binder.set(&leaf, "title", "t").unwrap();
    assert_eq!(host.property(target, "title"), Some(HostValue::String("t".into())));
    assert_eq!(binder.get::<String>(&leaf, "lang").unwrap(), "en");
}

#[test]
fn test_base_view_uses_base_mapping() {
    let (binder, host) = override_chain();
    let leaf = binder.create("Leaf").unwrap();
    let target = binder.host_ref(&leaf).unwrap();

    // A Base-typed wrapper over another host object uses Base's mapping
    let other = host.insert("LeafNode").unwrap();
    let base = binder.adopt(other, "Base").unwrap();
    binder.set(&base, "id", "plain").unwrap();
    assert_eq!(host.property(other, "id"), Some(HostValue::String("plain".into())));
    assert_eq!(host.property(target, "id"), Some(HostValue::String(String::new())));
}
