//! Binder: wrappers, native handle lifecycle and adoption
//!
//! A [`Binder`] ties a frozen [`BindingRegistry`] to one host object model.
//! It owns the handle table and the identity table that maps each adopted
//! host object to its single live wrapper.
//!
//! The binder is single-threaded: wrappers are `Rc`-based and the tables
//! live in `RefCell`s. Only the registry is shared across threads.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::coercion::CoercionScope;
use crate::config::{AdoptionPolicy, BindingConfig};
use crate::descriptor::TypeDescriptor;
use crate::error::{BindResult, BindingError};
use crate::handle::{HandleTable, NativeHandle};
use crate::host::HostObjectModel;
use crate::registry::BindingRegistry;
use crate::types::DeclaredType;
use crate::value::{HostRef, HostValue, Value};

// ============================================================================
// Wrapper
// ============================================================================

pub(crate) struct WrapperInner {
    descriptor: Arc<TypeDescriptor>,
    handle: RefCell<Option<NativeHandle>>,
    state: Weak<BinderState>,
}

impl Drop for WrapperInner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            if let Some(state) = self.state.upgrade() {
                state.release(handle);
            }
        }
    }
}

/// A typed wrapper instance.
///
/// Cloning a `Wrapper` yields another reference to the same instance; use
/// [`Wrapper::ptr_eq`] for identity. The handle is released when the last
/// reference is dropped.
#[derive(Clone)]
pub struct Wrapper(Rc<WrapperInner>);

impl Wrapper {
    /// Bound class id
    pub fn class_id(&self) -> &str {
        self.0.descriptor.class_id()
    }

    /// Descriptor of the wrapper's class
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.0.descriptor
    }

    /// Check if a handle is attached (it may still have been detached)
    pub fn is_bound(&self) -> bool {
        self.0.handle.borrow().is_some()
    }

    /// Identity comparison
    pub fn ptr_eq(a: &Wrapper, b: &Wrapper) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("class", &self.class_id())
            .field("handle", &*self.0.handle.borrow())
            .finish()
    }
}

// ============================================================================
// Binder state
// ============================================================================

/// Mutable tables shared between the binder and its wrappers.
pub(crate) struct BinderState {
    handles: RefCell<HandleTable>,
    wrappers: RefCell<FxHashMap<HostRef, Weak<WrapperInner>>>,
}

impl BinderState {
    fn new() -> Self {
        Self {
            handles: RefCell::new(HandleTable::new()),
            wrappers: RefCell::new(FxHashMap::default()),
        }
    }

    /// Release the handle of a dropped wrapper.
    ///
    /// No table borrow is ever held while a wrapper can be dropped.
    fn release(&self, handle: NativeHandle) {
        // Already detached handles have nothing left to release
        let Ok(host) = self.handles.borrow_mut().detach(&handle) else {
            return;
        };
        let mut wrappers = self.wrappers.borrow_mut();
        if wrappers
            .get(&host)
            .map_or(false, |weak| weak.strong_count() == 0)
        {
            wrappers.remove(&host);
        }
        debug!("released handle for host object {}", host);
    }

    fn live_wrapper(&self, host: HostRef) -> Option<Wrapper> {
        self.wrappers
            .borrow()
            .get(&host)
            .and_then(Weak::upgrade)
            .map(Wrapper)
    }
}

// ============================================================================
// Binder
// ============================================================================

/// Runtime binding context for one host object model.
pub struct Binder {
    registry: Arc<BindingRegistry>,
    host: Rc<dyn HostObjectModel>,
    config: BindingConfig,
    state: Rc<BinderState>,
}

impl fmt::Debug for Binder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binder")
            .field("classes", &self.registry.len())
            .field("live_handles", &self.live_handles())
            .field("config", &self.config)
            .finish()
    }
}

impl Binder {
    /// Create a binder over a frozen registry.
    ///
    /// With `verify_constructors` set, every host constructor named by the
    /// catalogue is checked against the host up front.
    pub fn new(
        registry: Arc<BindingRegistry>,
        host: Rc<dyn HostObjectModel>,
        config: BindingConfig,
    ) -> BindResult<Self> {
        if !registry.is_frozen() {
            return Err(BindingError::RegistryNotFrozen);
        }

        if config.verify_constructors {
            for class_id in registry.class_ids() {
                let descriptor = registry.resolve(class_id)?;
                if let Some(name) = descriptor.host_constructor() {
                    if !host.has_constructor(name) {
                        return Err(BindingError::NoHostConstructor(class_id.to_string()));
                    }
                }
            }
        }

        Ok(Self {
            registry,
            host,
            config,
            state: Rc::new(BinderState::new()),
        })
    }

    /// The registry this binder resolves against
    pub fn registry(&self) -> &Arc<BindingRegistry> {
        &self.registry
    }

    /// The host object model
    pub fn host(&self) -> &dyn HostObjectModel {
        self.host.as_ref()
    }

    /// Active configuration
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Resolve a descriptor by class id
    pub fn descriptor(&self, class_id: &str) -> BindResult<Arc<TypeDescriptor>> {
        self.registry.resolve(class_id)
    }

    /// Number of live native handles
    pub fn live_handles(&self) -> usize {
        self.state.handles.borrow().live_count()
    }

    // ========================================================================
    // Native handles
    // ========================================================================

    /// Instantiate a new host object for `descriptor` and return its handle
    pub fn create_handle(&self, descriptor: &TypeDescriptor) -> BindResult<NativeHandle> {
        self.create_handle_with(descriptor, &[])
    }

    /// Instantiate with constructor arguments coerced per the descriptor
    pub fn create_handle_with(
        &self,
        descriptor: &TypeDescriptor,
        args: &[Value],
    ) -> BindResult<NativeHandle> {
        let class_id = descriptor.class_id();
        let constructor = descriptor
            .host_constructor()
            .ok_or_else(|| BindingError::NoHostConstructor(class_id.to_string()))?;

        let params = descriptor.constructor_params();
        if args.len() != params.len() {
            return Err(BindingError::ArityMismatch {
                member: format!("{}.<init>", class_id),
                expected: params.len(),
                got: args.len(),
            });
        }
        let host_args = self.coerce_args(params, args)?;

        let host_ref = self.host.construct(constructor, &host_args).map_err(|source| {
            BindingError::HostConstructionFailed {
                class: class_id.to_string(),
                constructor: constructor.to_string(),
                source,
            }
        })?;

        let handle = self.state.handles.borrow_mut().attach(host_ref, class_id)?;
        debug!("created host object {} as '{}'", host_ref, class_id);
        Ok(handle)
    }

    /// Wrap an existing host object in a new handle without constructing
    pub fn adopt_handle(
        &self,
        host_ref: HostRef,
        descriptor: &TypeDescriptor,
    ) -> BindResult<NativeHandle> {
        let handle = self
            .state
            .handles
            .borrow_mut()
            .attach(host_ref, descriptor.class_id())?;
        debug!("adopted host object {} as '{}'", host_ref, descriptor.class_id());
        Ok(handle)
    }

    /// Release a handle; later use of it fails with `HandleDetached`
    pub fn detach(&self, handle: &NativeHandle) -> BindResult<()> {
        let host = self.state.handles.borrow_mut().detach(handle)?;
        self.state.wrappers.borrow_mut().remove(&host);
        debug!("detached handle for host object {}", host);
        Ok(())
    }

    /// Release the live handle for a host object, e.g. once the host has
    /// discarded it. A wrapper still holding that handle now fails with
    /// `HandleDetached`.
    pub fn detach_object(&self, host_ref: HostRef) -> BindResult<()> {
        self.state.handles.borrow_mut().detach_host(host_ref)?;
        self.state.wrappers.borrow_mut().remove(&host_ref);
        debug!("detached handle for host object {}", host_ref);
        Ok(())
    }

    /// Host object behind a live handle
    pub fn host_of(&self, handle: &NativeHandle) -> BindResult<HostRef> {
        self.state.handles.borrow().resolve(handle)
    }

    /// Check if a handle is still attached
    pub fn is_live(&self, handle: &NativeHandle) -> bool {
        self.host_of(handle).is_ok()
    }

    // ========================================================================
    // Wrappers
    // ========================================================================

    /// Create a wrapper with no handle attached
    pub fn unbound(&self, class_id: &str) -> BindResult<Wrapper> {
        let descriptor = self.registry.resolve(class_id)?;
        Ok(self.new_wrapper(descriptor, None))
    }

    /// Give a handle to a new wrapper of the handle's class
    pub fn wrap(&self, handle: NativeHandle) -> BindResult<Wrapper> {
        let (host, class_id) = {
            let handles = self.state.handles.borrow();
            let host = handles.resolve(&handle)?;
            (host, handles.class_of(&handle)?.to_string())
        };
        let descriptor = self.registry.resolve(&class_id)?;
        let wrapper = self.new_wrapper(descriptor, Some(handle));
        self.track(host, &wrapper);
        Ok(wrapper)
    }

    /// Attach a handle to an unbound wrapper.
    ///
    /// The handle is consumed either way; on failure it is detached. The
    /// slot is recorded as the wrapper's class from then on.
    pub fn attach(&self, wrapper: &Wrapper, handle: NativeHandle) -> BindResult<()> {
        let checked = self.check_owned(wrapper).and_then(|()| {
            let mut handles = self.state.handles.borrow_mut();
            let host = handles.resolve(&handle)?;
            let handle_class = handles.class_of(&handle)?;
            if wrapper.is_bound() {
                return Err(BindingError::AlreadyBound(wrapper.class_id().to_string()));
            }
            if !self.registry.is_subclass(handle_class, wrapper.class_id()) {
                return Err(BindingError::coercion(wrapper.class_id(), handle_class));
            }
            handles.reclass(&handle, wrapper.class_id())?;
            Ok(host)
        });

        match checked {
            Ok(host) => {
                *wrapper.0.handle.borrow_mut() = Some(handle);
                self.track(host, wrapper);
                Ok(())
            }
            Err(err) => {
                let _ = self.detach(&handle);
                Err(err)
            }
        }
    }

    /// Construct a new host object and wrap it
    pub fn create(&self, class_id: &str) -> BindResult<Wrapper> {
        self.create_with(class_id, &[])
    }

    /// Construct with arguments and wrap
    pub fn create_with(&self, class_id: &str, args: &[Value]) -> BindResult<Wrapper> {
        let descriptor = self.registry.resolve(class_id)?;
        let handle = self.create_handle_with(&descriptor, args)?;
        let host = self.host_of(&handle)?;
        let wrapper = self.new_wrapper(descriptor, Some(handle));
        self.track(host, &wrapper);
        Ok(wrapper)
    }

    /// Represent a pre-existing host object as `class_id`.
    ///
    /// Under [`AdoptionPolicy::Reuse`] a host object that already has a live
    /// wrapper of `class_id` (or a subclass) yields that same wrapper. Under
    /// [`AdoptionPolicy::Reject`], or when the live wrapper's class is not
    /// compatible, adoption fails with `DuplicateAdoption`.
    pub fn adopt(&self, host_ref: HostRef, class_id: &str) -> BindResult<Wrapper> {
        self.adopt_as(host_ref, class_id, self.config.adoption)
    }

    fn adopt_as(
        &self,
        host_ref: HostRef,
        class_id: &str,
        policy: AdoptionPolicy,
    ) -> BindResult<Wrapper> {
        let descriptor = self.registry.resolve(class_id)?;

        if let Some(existing) = self.state.live_wrapper(host_ref) {
            let compatible = self.registry.is_subclass(existing.class_id(), class_id);
            if policy == AdoptionPolicy::Reuse && compatible {
                return Ok(existing);
            }
            return Err(BindingError::DuplicateAdoption {
                host: host_ref.to_string(),
                existing: existing.class_id().to_string(),
            });
        }

        let handle = self.adopt_handle(host_ref, &descriptor)?;
        let wrapper = self.new_wrapper(descriptor, Some(handle));
        self.track(host_ref, &wrapper);
        Ok(wrapper)
    }

    /// The live wrapper for a host object, if any
    pub fn wrapper_for(&self, host_ref: HostRef) -> Option<Wrapper> {
        self.state.live_wrapper(host_ref)
    }

    /// Class the host object's live handle was attached as, if any
    pub fn owner_of(&self, host_ref: HostRef) -> Option<String> {
        self.state
            .handles
            .borrow()
            .owner_of(host_ref)
            .map(str::to_string)
    }

    /// Detach a wrapper's handle; the wrapper becomes unbound
    pub fn unbind(&self, wrapper: &Wrapper) -> BindResult<()> {
        self.check_owned(wrapper)?;
        let handle = wrapper
            .0
            .handle
            .borrow_mut()
            .take()
            .ok_or_else(|| BindingError::Unbound(wrapper.class_id().to_string()))?;
        self.detach(&handle)
    }

    /// Host object behind a wrapper
    pub fn host_ref(&self, wrapper: &Wrapper) -> BindResult<HostRef> {
        self.check_owned(wrapper)?;
        let slot = wrapper.0.handle.borrow();
        let handle = slot
            .as_ref()
            .ok_or_else(|| BindingError::Unbound(wrapper.class_id().to_string()))?;
        self.state.handles.borrow().resolve(handle)
    }

    /// Check that `wrapper` was made by this binder
    fn check_owned(&self, wrapper: &Wrapper) -> BindResult<()> {
        if Weak::as_ptr(&wrapper.0.state) == Rc::as_ptr(&self.state) {
            Ok(())
        } else {
            warn!(
                "wrapper of class '{}' used with a binder that did not create it",
                wrapper.class_id()
            );
            Err(BindingError::ForeignHandle)
        }
    }

    fn new_wrapper(&self, descriptor: Arc<TypeDescriptor>, handle: Option<NativeHandle>) -> Wrapper {
        Wrapper(Rc::new(WrapperInner {
            descriptor,
            handle: RefCell::new(handle),
            state: Rc::downgrade(&self.state),
        }))
    }

    fn track(&self, host: HostRef, wrapper: &Wrapper) {
        self.state
            .wrappers
            .borrow_mut()
            .insert(host, Rc::downgrade(&wrapper.0));
    }

    pub(crate) fn coerce_args(
        &self,
        params: &[DeclaredType],
        args: &[Value],
    ) -> BindResult<Vec<HostValue>> {
        let coercions = self.registry.coercions();
        params
            .iter()
            .zip(args)
            .map(|(ty, arg)| coercions.to_host(ty, arg, self))
            .collect()
    }
}

impl CoercionScope for Binder {
    fn is_bound_class(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Values coming back from the host reuse a compatible live wrapper
    /// under either policy; the host side effect has already happened.
    fn adopt_for(&self, host: HostRef, class: &str) -> BindResult<Wrapper> {
        self.adopt_as(host, class, AdoptionPolicy::Reuse)
    }

    fn unwrap_for(&self, wrapper: &Wrapper, class: &str) -> BindResult<HostRef> {
        if !self.registry.is_subclass(wrapper.class_id(), class) {
            return Err(BindingError::coercion(class, wrapper.class_id()));
        }
        self.host_ref(wrapper)
    }

    fn numeric_widening(&self) -> bool {
        self.config.numeric_widening
    }
}
