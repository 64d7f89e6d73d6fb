//! Native handles: the runtime link between a wrapper and a host object
//!
//! Handles are generational keys into a slot table. Detaching frees the slot
//! and bumps its generation, so a stale handle can never reach whatever the
//! slot holds next. The table keeps at most one live handle per host object.
//! Every table has its own id, stamped into its handles, so a handle is only
//! ever resolved by the table that issued it.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use rustc_hash::FxHashMap;

use crate::error::{BindResult, BindingError};
use crate::value::HostRef;

/// Exclusive reference to exactly one host object.
///
/// Deliberately neither `Clone` nor `Copy`: whoever holds the handle owns
/// the association.
pub struct NativeHandle {
    table: u32,
    index: u32,
    generation: u32,
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NativeHandle({}:{}v{})",
            self.table, self.index, self.generation
        )
    }
}

struct Slot {
    generation: u32,
    entry: Option<SlotEntry>,
}

struct SlotEntry {
    host: HostRef,
    class_id: String,
}

static NEXT_TABLE_ID: AtomicU32 = AtomicU32::new(0);

/// Slot table of live handles.
pub(crate) struct HandleTable {
    id: u32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: FxHashMap<HostRef, u32>,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            id: NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            live: FxHashMap::default(),
        }
    }

    /// Create a handle for `host`, owned as `class_id`
    pub fn attach(&mut self, host: HostRef, class_id: &str) -> BindResult<NativeHandle> {
        if let Some(&index) = self.live.get(&host) {
            let existing = self.slots[index as usize]
                .entry
                .as_ref()
                .map(|e| e.class_id.clone())
                .unwrap_or_default();
            return Err(BindingError::DuplicateAdoption {
                host: host.to_string(),
                existing,
            });
        }

        let entry = SlotEntry {
            host,
            class_id: class_id.to_string(),
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Some(entry);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.live.insert(host, index);

        Ok(NativeHandle {
            table: self.id,
            index,
            generation: self.slots[index as usize].generation,
        })
    }

    /// Check if `handle` was issued by this table
    pub fn owns(&self, handle: &NativeHandle) -> bool {
        handle.table == self.id
    }

    fn entry(&self, handle: &NativeHandle) -> BindResult<&SlotEntry> {
        if !self.owns(handle) {
            return Err(BindingError::ForeignHandle);
        }
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(BindingError::HandleDetached)
    }

    /// Host object behind a live handle
    pub fn resolve(&self, handle: &NativeHandle) -> BindResult<HostRef> {
        self.entry(handle).map(|e| e.host)
    }

    /// Class a live handle was attached as
    pub fn class_of(&self, handle: &NativeHandle) -> BindResult<&str> {
        self.entry(handle).map(|e| e.class_id.as_str())
    }

    /// Record the class a live handle is now owned as
    pub fn reclass(&mut self, handle: &NativeHandle, class_id: &str) -> BindResult<()> {
        self.entry(handle)?;
        if let Some(entry) = self.slots[handle.index as usize].entry.as_mut() {
            entry.class_id = class_id.to_string();
        }
        Ok(())
    }

    /// Release a handle, returning the host object it referred to
    pub fn detach(&mut self, handle: &NativeHandle) -> BindResult<HostRef> {
        let host = self.resolve(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live.remove(&host);
        Ok(host)
    }

    /// Release whatever live handle refers to `host`
    pub fn detach_host(&mut self, host: HostRef) -> BindResult<()> {
        let index = *self.live.get(&host).ok_or(BindingError::HandleDetached)?;
        let handle = NativeHandle {
            table: self.id,
            index,
            generation: self.slots[index as usize].generation,
        };
        self.detach(&handle).map(|_| ())
    }

    /// Class of the live owner of a host object, if any
    pub fn owner_of(&self, host: HostRef) -> Option<&str> {
        let index = *self.live.get(&host)?;
        self.slots[index as usize]
            .entry
            .as_ref()
            .map(|e| e.class_id.as_str())
    }

    /// Number of live handles
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
