//! Integration tests for binder configuration

mod common;

use std::fs;
use std::rc::Rc;

use dombind::{AdoptionPolicy, Binder, BindingConfig, BindingError, ConfigError, Value};
use dombind_memhost::{HostClass, MemoryHost};

#[test]
fn test_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dombind.toml");
    fs::write(
        &path,
        r#"
[binding]
adoption = "reject"
verify-constructors = false
"#,
    )
    .unwrap();

    let config = BindingConfig::from_file(&path).unwrap();
    assert_eq!(config.adoption, AdoptionPolicy::Reject);
    assert!(!config.verify_constructors);
    assert!(config.numeric_widening);

    assert!(matches!(
        BindingConfig::from_file(&dir.path().join("absent.toml")),
        Err(ConfigError::IoError(_))
    ));
}

#[test]
fn test_reject_policy_from_config() {
    let config = BindingConfig::from_str("[binding]\nadoption = \"reject\"\n").unwrap();
    let (binder, host) = common::binder_with(config);
    let target = host.insert("HTMLElement").unwrap();
    let _el = binder.adopt(target, "HTMLElement").unwrap();
    assert!(matches!(
        binder.adopt(target, "Element"),
        Err(BindingError::DuplicateAdoption { .. })
    ));
}

#[test]
fn test_numeric_widening_disabled() {
    let config = BindingConfig {
        numeric_widening: false,
        ..BindingConfig::default()
    };
    let (binder, _host) = common::binder_with(config);
    let button = binder.create("HTMLButtonElement").unwrap();
    assert!(matches!(
        binder.write_field(&button, "opacity", Value::Int(1)),
        Err(BindingError::CoercionError { .. })
    ));
    binder.write_field(&button, "opacity", Value::Number(1.0)).unwrap();

    let (binder, _host) = common::binder();
    let button = binder.create("HTMLButtonElement").unwrap();
    binder.write_field(&button, "opacity", Value::Int(1)).unwrap();
    assert_eq!(binder.get::<f64>(&button, "opacity").unwrap(), 1.0);
}

/// A host that only knows `HTMLElement`
fn partial_host() -> Rc<MemoryHost> {
    let host = MemoryHost::new();
    host.define_class(HostClass::new("HTMLElement").noop("click"));
    Rc::new(host)
}

#[test]
fn test_verify_constructors_at_bootstrap() {
    let err = Binder::new(
        common::html5_registry(),
        partial_host(),
        BindingConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, BindingError::NoHostConstructor(ref c) if c == "HTMLButtonElement"));
}

#[test]
fn test_unverified_constructor_fails_at_create() {
    let config = BindingConfig {
        verify_constructors: false,
        ..BindingConfig::default()
    };
    let binder = Binder::new(common::html5_registry(), partial_host(), config).unwrap();
    assert!(binder.create("HTMLElement").is_ok());

    let err = binder.create("HTMLButtonElement").unwrap_err();
    match &err {
        BindingError::HostConstructionFailed { class, constructor, .. } => {
            assert_eq!(class, "HTMLButtonElement");
            assert_eq!(constructor, "HTMLButtonElement");
        }
        other => panic!("expected construction failure, got {:?}", other),
    }
}

#[test]
fn test_registry_must_be_frozen() {
    let registry = std::sync::Arc::new(dombind::BindingRegistry::new());
    assert!(matches!(
        Binder::new(registry, partial_host(), BindingConfig::default()),
        Err(BindingError::RegistryNotFrozen)
    ));
}
