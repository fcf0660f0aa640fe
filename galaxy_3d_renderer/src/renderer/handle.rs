/// Opaque small-integer resource handles and the table that owns them
///
/// Textures, samplers and shaders are referred to by `u16` handles.
/// `u16::MAX` is reserved as the INVALID sentinel. A handle is valid
/// between its acquire and release calls; once released, its index is
/// recycled (LIFO) by the next acquire, so holding on to a released
/// handle is a caller error that cannot always be detected.

use rustc_hash::FxHashMap;
use std::marker::PhantomData;
use crate::error::{Galaxy3dError, Galaxy3dResult};

/// Common behaviour of the `u16` handle types
pub trait ResourceHandle: Copy + Eq + std::fmt::Debug {
    /// Build a handle from a table index
    fn from_index(index: u16) -> Self;
    /// Table index of this handle
    fn index(self) -> u16;
}

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u16);

        impl $name {
            /// Reserved "no resource" value
            pub const INVALID: Self = Self(u16::MAX);

            /// Whether this handle is not the INVALID sentinel
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }

            /// Return the handle and reset the variable to INVALID
            pub fn take(&mut self) -> Self {
                std::mem::replace(self, Self::INVALID)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl ResourceHandle for $name {
            fn from_index(index: u16) -> Self {
                Self(index)
            }

            fn index(self) -> u16 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(INVALID)", stringify!($name))
                }
            }
        }
    };
}

define_handle! {
    /// Handle to a texture owned by the renderer frontend
    TextureHandle
}

define_handle! {
    /// Handle to a sampler owned by the renderer frontend
    SamplerHandle
}

define_handle! {
    /// Handle to a shader owned by the renderer frontend
    ShaderHandle
}

// ===== HANDLE TABLE =====

struct Slot<R> {
    name: String,
    resource: R,
}

/// Slot array mapping handles (and optional unique names) to records
pub struct HandleTable<H: ResourceHandle, R> {
    slots: Vec<Option<Slot<R>>>,
    free_list: Vec<u16>,
    names: FxHashMap<String, u16>,
    _handle: PhantomData<H>,
}

impl<H: ResourceHandle, R> HandleTable<H, R> {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            names: FxHashMap::default(),
            _handle: PhantomData,
        }
    }

    /// Check that `name` could be inserted (unique or empty) and that a slot is available
    pub fn can_insert(&self, name: &str) -> Galaxy3dResult<()> {
        if !name.is_empty() && self.names.contains_key(name) {
            return Err(Galaxy3dError::InvalidArgument(format!("Name '{}' is already in use", name)));
        }
        if self.free_list.is_empty() && self.slots.len() >= u16::MAX as usize {
            return Err(Galaxy3dError::OutOfMemory);
        }
        Ok(())
    }

    /// Store a record and return its handle
    ///
    /// An empty name is allowed and is not registered for lookup.
    pub fn insert(&mut self, name: &str, resource: R) -> Galaxy3dResult<H> {
        self.can_insert(name)?;

        let slot = Slot { name: name.to_string(), resource };
        let index = match self.free_list.pop() {
            Some(index) => {
                self.slots[index as usize] = Some(slot);
                index
            }
            None => {
                self.slots.push(Some(slot));
                (self.slots.len() - 1) as u16
            }
        };

        if !name.is_empty() {
            self.names.insert(name.to_string(), index);
        }
        Ok(H::from_index(index))
    }

    /// Remove a record, recycling its index
    pub fn remove(&mut self, handle: H) -> Option<R> {
        let slot = self.slots.get_mut(handle.index() as usize)?.take()?;
        if !slot.name.is_empty() {
            self.names.remove(&slot.name);
        }
        self.free_list.push(handle.index());
        Some(slot.resource)
    }

    pub fn get(&self, handle: H) -> Option<&R> {
        self.slots.get(handle.index() as usize)?.as_ref().map(|slot| &slot.resource)
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut R> {
        self.slots.get_mut(handle.index() as usize)?.as_mut().map(|slot| &mut slot.resource)
    }

    /// Name the record was registered with
    pub fn name(&self, handle: H) -> Option<&str> {
        self.slots.get(handle.index() as usize)?.as_ref().map(|slot| slot.name.as_str())
    }

    /// Handle registered under `name`
    pub fn lookup(&self, name: &str) -> Option<H> {
        self.names.get(name).map(|&index| H::from_index(index))
    }

    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of every live record, in index order
    pub fn handles(&self) -> Vec<H> {
        self.slots.iter().enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| H::from_index(index as u16))
            .collect()
    }
}

impl<H: ResourceHandle, R> Default for HandleTable<H, R> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "handle_tests.rs"]
mod tests;
