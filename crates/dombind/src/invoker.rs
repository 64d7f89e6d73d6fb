//! Method invoker
//!
//! Calls on declared native methods become host operation calls. This is
//! the only place that dispatches to host operations.

use log::trace;

use crate::binder::{Binder, Wrapper};
use crate::error::{BindResult, BindingError};
use crate::value::{FromValue, Value};

impl Binder {
    /// Invoke a native method.
    ///
    /// Checks run in order: the method must exist somewhere in the chain,
    /// the argument count must match, and the wrapper must be bound. A void
    /// method returns [`Value::Void`] whatever the host answered.
    pub fn invoke(&self, wrapper: &Wrapper, method: &str, args: &[Value]) -> BindResult<Value> {
        let mapping = self.registry().find_method(wrapper.class_id(), method)?;
        if args.len() != mapping.arity() {
            return Err(BindingError::ArityMismatch {
                member: format!("{}.{}", wrapper.class_id(), method),
                expected: mapping.arity(),
                got: args.len(),
            });
        }
        let target = self.host_ref(wrapper)?;
        let host_args = self.coerce_args(&mapping.parameter_types, args)?;

        trace!(
            "call {}.{}({} arg(s))",
            target,
            mapping.host_operation,
            host_args.len()
        );
        let result = self
            .host()
            .call_operation(target, &mapping.host_operation, &host_args)
            .map_err(|source| BindingError::HostInvocationFailed {
                class: wrapper.class_id().to_string(),
                member: method.to_string(),
                source,
            })?;

        if mapping.return_type.is_void() {
            return Ok(Value::Void);
        }
        self.registry()
            .coercions()
            .from_host(&mapping.return_type, result, self)
    }

    /// Invoke and convert the result
    pub fn call<T: FromValue>(&self, wrapper: &Wrapper, method: &str, args: &[Value]) -> BindResult<T> {
        T::from_value(self.invoke(wrapper, method, args)?)
    }
}
