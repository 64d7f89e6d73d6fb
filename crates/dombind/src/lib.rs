//! dombind - Typed bindings to host object models
//!
//! Application code declares bound classes as data: a host constructor name,
//! field-to-property mappings, method-to-operation mappings and a supertype.
//! This crate provides the runtime that turns field access and native method
//! calls on typed wrappers into calls against a host object model.
//!
//! # Example
//!
//! ```ignore
//! use dombind::{Binder, BindingConfig, BindingRegistry, Catalogue};
//!
//! let mut registry = BindingRegistry::new();
//! Catalogue::from_file("html5.toml".as_ref())?.register_into(&mut registry)?;
//! registry.freeze()?;
//!
//! let binder = Binder::new(Arc::new(registry), host, BindingConfig::default())?;
//! let el = binder.create("HTMLElement")?;
//! binder.set(&el, "title", "hello")?;
//! binder.invoke(&el, "click", &[])?;
//! ```

#![warn(missing_docs)]

mod accessor;
mod binder;
pub mod catalogue;
pub mod coercion;
pub mod config;
pub mod descriptor;
pub mod error;
mod handle;
pub mod host;
mod invoker;
pub mod registry;
pub mod typed;
pub mod types;
pub mod value;

pub use binder::{Binder, Wrapper};
pub use catalogue::{Catalogue, CatalogueError};
pub use coercion::{CoercionEngine, CoercionRule, CoercionScope};
pub use config::{AdoptionPolicy, BindingConfig, ConfigError};
pub use descriptor::{FieldMapping, MethodMapping, TypeDescriptor, TypeDescriptorBuilder};
pub use error::{BindResult, BindingError, ErrorCategory};
pub use handle::NativeHandle;
pub use host::{HostError, HostObjectModel, HostResult};
pub use registry::{global, BindingRegistry};
pub use typed::BoundClass;
pub use types::{DeclaredType, TypeParseError};
pub use value::{FromValue, HostRef, HostValue, IntoValue, Sequence, Value};
