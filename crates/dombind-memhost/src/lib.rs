//! dombind-memhost - In-memory host object model
//!
//! A small, loosely-typed object store that implements
//! [`HostObjectModel`]. Objects are property bags, classes supply default
//! properties and operations, arrays expose `length` and index properties.
//! Every operation call is journalled so tests can assert on what crossed
//! the boundary.

#![warn(missing_docs)]

use std::fmt;
use std::sync::Arc;

use dombind::{HostError, HostObjectModel, HostRef, HostResult, HostValue};
use log::{debug, trace};
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};

/// Host operation implementation
pub type OperationFn =
    Arc<dyn Fn(&MemoryHost, HostRef, &[HostValue]) -> HostResult<HostValue> + Send + Sync>;

/// Name of the operation run by `construct` with the constructor arguments
pub const CONSTRUCTOR_OPERATION: &str = "constructor";

// ============================================================================
// Host classes
// ============================================================================

/// A host-side class: default properties plus operations.
#[derive(Clone)]
pub struct HostClass {
    name: String,
    parent: Option<String>,
    constructible: bool,
    defaults: Vec<(String, HostValue)>,
    read_only: FxHashSet<String>,
    operations: FxHashMap<String, OperationFn>,
}

impl fmt::Debug for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut operations: Vec<_> = self.operations.keys().collect();
        operations.sort();
        f.debug_struct("HostClass")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("constructible", &self.constructible)
            .field("defaults", &self.defaults)
            .field("operations", &operations)
            .finish()
    }
}

impl HostClass {
    /// A constructible class named `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            constructible: true,
            defaults: Vec::new(),
            read_only: FxHashSet::default(),
            operations: FxHashMap::default(),
        }
    }

    /// Inherit defaults and operations from `parent`
    pub fn extends(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    /// Objects of this class can only be inserted, not constructed
    pub fn not_constructible(mut self) -> Self {
        self.constructible = false;
        self
    }

    /// Default property value
    pub fn prop(mut self, name: &str, value: impl Into<HostValue>) -> Self {
        self.defaults.push((name.to_string(), value.into()));
        self
    }

    /// Default property value that host-side writes refuse
    pub fn read_only(mut self, name: &str, value: impl Into<HostValue>) -> Self {
        self.read_only.insert(name.to_string());
        self.prop(name, value)
    }

    /// Operation implementation
    pub fn operation<F>(mut self, name: &str, op: F) -> Self
    where
        F: Fn(&MemoryHost, HostRef, &[HostValue]) -> HostResult<HostValue> + Send + Sync + 'static,
    {
        self.operations.insert(name.to_string(), Arc::new(op));
        self
    }

    /// Operation that does nothing and returns `undefined`
    pub fn noop(self, name: &str) -> Self {
        self.operation(name, |_, _, _| Ok(HostValue::Undefined))
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Memory host
// ============================================================================

/// One journalled operation call
#[derive(Debug, Clone, PartialEq)]
pub struct HostCall {
    /// Receiver
    pub target: HostRef,
    /// Operation name
    pub operation: String,
    /// Arguments as received
    pub args: Vec<HostValue>,
}

#[derive(Debug)]
enum ObjectKind {
    Instance(String),
    Array,
}

#[derive(Debug)]
struct HostObject {
    kind: ObjectKind,
    props: FxHashMap<String, HostValue>,
}

#[derive(Default)]
struct ObjectTable {
    next: u64,
    objects: FxHashMap<HostRef, HostObject>,
}

impl ObjectTable {
    fn allocate(&mut self, object: HostObject) -> HostRef {
        self.next += 1;
        let host_ref = HostRef::from_raw(self.next);
        self.objects.insert(host_ref, object);
        host_ref
    }

    fn get(&self, target: HostRef) -> HostResult<&HostObject> {
        self.objects
            .get(&target)
            .ok_or_else(|| HostError::new(format!("no host object {}", target)))
    }

    fn get_mut(&mut self, target: HostRef) -> HostResult<&mut HostObject> {
        self.objects
            .get_mut(&target)
            .ok_or_else(|| HostError::new(format!("no host object {}", target)))
    }
}

/// In-memory host object model
#[derive(Default)]
pub struct MemoryHost {
    classes: RwLock<FxHashMap<String, Arc<HostClass>>>,
    table: Mutex<ObjectTable>,
    calls: Mutex<Vec<HostCall>>,
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("classes", &self.classes.read().len())
            .field("objects", &self.table.lock().objects.len())
            .field("calls", &self.calls.lock().len())
            .finish()
    }
}

impl MemoryHost {
    /// Create an empty host
    pub fn new() -> Self {
        Self::default()
    }

    /// Define (or redefine) a host class
    pub fn define_class(&self, class: HostClass) {
        debug!("memhost: defined class '{}'", class.name);
        self.classes
            .write()
            .insert(class.name.clone(), Arc::new(class));
    }

    /// Class chain from `name` to the root, most-derived first
    fn chain(&self, name: &str) -> HostResult<Vec<Arc<HostClass>>> {
        let classes = self.classes.read();
        let mut chain: Vec<Arc<HostClass>> = Vec::new();
        let mut current = Some(name.to_string());
        while let Some(class_name) = current {
            if chain.iter().any(|c| c.name == class_name) {
                return Err(HostError::new(format!("class cycle through {}", class_name)));
            }
            let class = classes
                .get(&class_name)
                .cloned()
                .ok_or_else(|| HostError::new(format!("{} is not defined", class_name)))?;
            current = class.parent.clone();
            chain.push(class);
        }
        Ok(chain)
    }

    fn instantiate(&self, class_name: &str) -> HostResult<HostRef> {
        let chain = self.chain(class_name)?;
        let mut props = FxHashMap::default();
        // Root first so subclasses override defaults
        for class in chain.iter().rev() {
            for (name, value) in &class.defaults {
                props.insert(name.clone(), value.clone());
            }
        }
        let object = HostObject {
            kind: ObjectKind::Instance(class_name.to_string()),
            props,
        };
        Ok(self.table.lock().allocate(object))
    }

    /// Create an object of `class` without running its constructor, as the
    /// host would for objects it produces itself
    pub fn insert(&self, class: &str) -> HostResult<HostRef> {
        let host_ref = self.instantiate(class)?;
        trace!("memhost: inserted {} as {}", host_ref, class);
        Ok(host_ref)
    }

    /// Create a host array
    pub fn create_array(&self, values: impl IntoIterator<Item = HostValue>) -> HostRef {
        let mut props: FxHashMap<String, HostValue> = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect();
        props.insert("length".to_string(), HostValue::Number(props.len() as f64));
        self.table.lock().allocate(HostObject {
            kind: ObjectKind::Array,
            props,
        })
    }

    /// Remove an object; later access to it is a host error
    pub fn remove(&self, target: HostRef) -> bool {
        self.table.lock().objects.remove(&target).is_some()
    }

    /// Check if an object exists
    pub fn contains(&self, target: HostRef) -> bool {
        self.table.lock().objects.contains_key(&target)
    }

    /// Host class of an object (`None` for arrays and missing objects)
    pub fn class_of(&self, target: HostRef) -> Option<String> {
        match &self.table.lock().objects.get(&target)?.kind {
            ObjectKind::Instance(class) => Some(class.clone()),
            ObjectKind::Array => None,
        }
    }

    /// Peek at a property without going through the binding layer
    pub fn property(&self, target: HostRef, name: &str) -> Option<HostValue> {
        self.table.lock().objects.get(&target)?.props.get(name).cloned()
    }

    /// Lowest-numbered object whose property `name` equals `value`
    pub fn find_by_property(&self, name: &str, value: &HostValue) -> Option<HostRef> {
        self.table
            .lock()
            .objects
            .iter()
            .filter(|(_, object)| object.props.get(name) == Some(value))
            .map(|(host_ref, _)| *host_ref)
            .min()
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.table.lock().objects.len()
    }

    /// Journal of operation calls, oldest first
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().clone()
    }

    /// Clear the call journal
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn is_read_only(&self, class_name: &str, property: &str) -> HostResult<bool> {
        Ok(self
            .chain(class_name)?
            .iter()
            .any(|class| class.read_only.contains(property)))
    }

    fn find_operation(&self, class_name: &str, name: &str) -> HostResult<Option<OperationFn>> {
        Ok(self
            .chain(class_name)?
            .iter()
            .find_map(|class| class.operations.get(name).cloned()))
    }
}

impl HostObjectModel for MemoryHost {
    fn construct(&self, name: &str, args: &[HostValue]) -> HostResult<HostRef> {
        if !self.has_constructor(name) {
            return Err(HostError::new(format!("{} is not a constructor", name)));
        }
        let host_ref = self.instantiate(name)?;
        trace!("memhost: constructed {} as {}", host_ref, name);

        match self.find_operation(name, CONSTRUCTOR_OPERATION)? {
            Some(init) => {
                if let Err(err) = init(self, host_ref, args) {
                    self.remove(host_ref);
                    return Err(err);
                }
            }
            None if !args.is_empty() => {
                self.remove(host_ref);
                return Err(HostError::new(format!("{} takes no arguments", name)));
            }
            None => {}
        }
        Ok(host_ref)
    }

    fn get_property(&self, target: HostRef, name: &str) -> HostResult<HostValue> {
        let table = self.table.lock();
        let object = table.get(target)?;
        Ok(object
            .props
            .get(name)
            .cloned()
            .unwrap_or(HostValue::Undefined))
    }

    fn set_property(&self, target: HostRef, name: &str, value: HostValue) -> HostResult<()> {
        let class = match &self.table.lock().get(target)?.kind {
            ObjectKind::Instance(class) => Some(class.clone()),
            ObjectKind::Array => None,
        };
        if let Some(class) = class {
            if self.is_read_only(&class, name)? {
                return Err(HostError::new(format!(
                    "cannot assign to read only property '{}' of {}",
                    name, class
                )));
            }
        }
        self.table
            .lock()
            .get_mut(target)?
            .props
            .insert(name.to_string(), value);
        Ok(())
    }

    fn call_operation(
        &self,
        target: HostRef,
        name: &str,
        args: &[HostValue],
    ) -> HostResult<HostValue> {
        let class = match &self.table.lock().get(target)?.kind {
            ObjectKind::Instance(class) => class.clone(),
            ObjectKind::Array => return Err(HostError::new(format!("{} is not a function", name))),
        };
        let op = self
            .find_operation(&class, name)?
            .ok_or_else(|| HostError::new(format!("{}.{} is not a function", class, name)))?;

        self.calls.lock().push(HostCall {
            target,
            operation: name.to_string(),
            args: args.to_vec(),
        });
        // Table lock released; operations may call back into the host
        op(self, target, args)
    }

    fn has_constructor(&self, name: &str) -> bool {
        self.classes
            .read()
            .get(name)
            .map_or(false, |class| class.constructible)
    }
}
