//! Typed wrappers
//!
//! Application code declares one Rust newtype per bound class and
//! implements [`BoundClass`] for it:
//!
//! ```ignore
//! struct HtmlElement(Wrapper);
//!
//! impl BoundClass for HtmlElement {
//!     const CLASS_ID: &'static str = "HTMLElement";
//!     fn from_wrapper(wrapper: Wrapper) -> Self { HtmlElement(wrapper) }
//!     fn wrapper(&self) -> &Wrapper { &self.0 }
//! }
//!
//! let el: HtmlElement = binder.create_typed()?;
//! binder.set(el.wrapper(), "title", "hello")?;
//! ```

use crate::binder::{Binder, Wrapper};
use crate::error::{BindResult, BindingError};
use crate::value::{HostRef, Value};

/// A Rust type standing for one bound class.
pub trait BoundClass: Sized {
    /// Class id in the registry
    const CLASS_ID: &'static str;

    /// Wrap without checking; use [`Binder::downcast`] for a checked cast
    fn from_wrapper(wrapper: Wrapper) -> Self;

    /// The underlying wrapper
    fn wrapper(&self) -> &Wrapper;
}

impl Binder {
    /// Construct a host object and wrap it as `T`
    pub fn create_typed<T: BoundClass>(&self) -> BindResult<T> {
        self.create(T::CLASS_ID).map(T::from_wrapper)
    }

    /// Construct with arguments and wrap as `T`
    pub fn create_typed_with<T: BoundClass>(&self, args: &[Value]) -> BindResult<T> {
        self.create_with(T::CLASS_ID, args).map(T::from_wrapper)
    }

    /// Adopt a host object as `T`
    pub fn adopt_typed<T: BoundClass>(&self, host_ref: HostRef) -> BindResult<T> {
        self.adopt(host_ref, T::CLASS_ID)
            .and_then(|wrapper| self.downcast(wrapper))
    }

    /// View a wrapper as `T` if its class is `T`'s class or a subclass
    pub fn downcast<T: BoundClass>(&self, wrapper: Wrapper) -> BindResult<T> {
        if self.registry().is_subclass(wrapper.class_id(), T::CLASS_ID) {
            Ok(T::from_wrapper(wrapper))
        } else {
            Err(BindingError::coercion(T::CLASS_ID, wrapper.class_id()))
        }
    }
}
