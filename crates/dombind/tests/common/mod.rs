//! Shared fixtures: the HTML5 catalogue and a small DOM in memory

#![allow(dead_code)]

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use dombind::{
    Binder, BindingConfig, BindingRegistry, Catalogue, HostError, HostObjectModel, HostValue, Wrapper,
};
use dombind_memhost::{HostClass, MemoryHost, CONSTRUCTOR_OPERATION};

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Frozen registry loaded from `html5.toml`
pub fn html5_registry() -> Arc<BindingRegistry> {
    let catalogue = Catalogue::from_file(&fixture("html5.toml")).unwrap();
    let mut registry = BindingRegistry::new();
    catalogue.register_into(&mut registry).unwrap();
    registry.freeze().unwrap();
    Arc::new(registry)
}

/// A host with Element, HTMLElement, HTMLButtonElement and Document
pub fn dom_host() -> Rc<MemoryHost> {
    let host = MemoryHost::new();

    host.define_class(
        HostClass::new("Element")
            .not_constructible()
            .read_only("tagName", "")
            .prop("id", "")
            .operation("getAttribute", |host, this, args| {
                let name = attribute_name(args)?;
                Ok(host.property(this, &name).unwrap_or(HostValue::Null))
            })
            .operation("setAttribute", |host, this, args| {
                let name = attribute_name(args)?;
                let value = args.get(1).cloned().unwrap_or(HostValue::Undefined);
                host.set_property(this, &name, value)?;
                Ok(HostValue::Undefined)
            })
            .operation("appendChild", |host, this, args| match args.first() {
                Some(HostValue::Object(child)) => {
                    host.set_property(*child, "parentNode", HostValue::Object(this))?;
                    Ok(HostValue::Object(*child))
                }
                _ => Err(HostError::new("appendChild: parameter 1 is not of type 'Node'")),
            }),
    );

    host.define_class(
        HostClass::new("HTMLElement")
            .extends("Element")
            .prop("accessKey", "")
            .read_only("accessKeyLabel", "")
            .prop("className", "")
            .prop("dir", "")
            .prop("lang", "")
            .prop("title", "")
            .operation(CONSTRUCTOR_OPERATION, |host, this, _| {
                let dataset = host.create_array(Vec::<HostValue>::new());
                host.set_property(this, "dataset", HostValue::Array(dataset))?;
                Ok(HostValue::Undefined)
            })
            .noop("blur")
            .noop("click")
            .operation("focus", |host, this, _| {
                host.set_property(this, "focused", HostValue::Bool(true))?;
                Ok(HostValue::Undefined)
            }),
    );

    host.define_class(
        HostClass::new("HTMLButtonElement")
            .extends("HTMLElement")
            .prop("disabled", false)
            .prop("tabIndex", 0)
            .prop("style.opacity", 1.0)
            .prop("form", HostValue::Null),
    );

    host.define_class(
        HostClass::new("Document")
            .not_constructible()
            .operation("createElement", |host, _, args| {
                let class = match args.first() {
                    Some(HostValue::String(tag)) if tag == "button" => "HTMLButtonElement",
                    Some(HostValue::String(_)) => "HTMLElement",
                    _ => return Err(HostError::new("createElement: tag name required")),
                };
                Ok(HostValue::Object(host.construct(class, &[])?))
            })
            .operation("getElementById", |host, _, args| {
                let id = args.first().cloned().unwrap_or(HostValue::Undefined);
                Ok(host
                    .find_by_property("id", &id)
                    .map_or(HostValue::Null, HostValue::Object))
            }),
    );

    Rc::new(host)
}

fn attribute_name(args: &[HostValue]) -> Result<String, HostError> {
    match args.first() {
        Some(HostValue::String(name)) => Ok(format!("attr:{}", name)),
        _ => Err(HostError::new("attribute name must be a string")),
    }
}

pub fn binder_with(config: BindingConfig) -> (Binder, Rc<MemoryHost>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let host = dom_host();
    let binder = Binder::new(html5_registry(), host.clone(), config).unwrap();
    (binder, host)
}

pub fn binder() -> (Binder, Rc<MemoryHost>) {
    binder_with(BindingConfig::default())
}

/// The host's document object, adopted as `Document`
pub fn document(binder: &Binder, host: &MemoryHost) -> Wrapper {
    let doc = host.insert("Document").unwrap();
    binder.adopt(doc, "Document").unwrap()
}
