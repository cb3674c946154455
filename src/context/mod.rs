// Licensed to the Apache Software Foundation (ASF) under one or more
// contributor license agreements.  See the NOTICE file distributed with
// this work for additional information regarding copyright ownership.
// The ASF licenses this file to You under the Apache License, Version 2.0
// (the "License"); you may not use this file except in compliance with
// the License.  You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Context is the immutable, key-indexed value container carried through a
//! traced process. A context is never mutated, [Context::with] derives a new
//! one, so the same context can be read from any number of threads.

pub mod helpers;
mod key;

pub use key::ContextKey;

use crate::{
    binder::Carrier,
    manager::ContextScope,
    registry::{binder, manager},
};
use std::{
    any::Any,
    fmt::{self, Formatter},
    hash::{Hash, Hasher},
    ptr,
    sync::{Arc, LazyLock},
};

static ROOT: LazyLock<Context> = LazyLock::new(|| Context::from_slots(Vec::new()));

/// Stored value, type erased.
trait Value: Send + Sync {
    /// The stored value.
    fn as_any(&self) -> &dyn Any;

    /// The entry wrapping the stored value.
    fn as_entry(&self) -> &dyn Any;

    fn key_name(&self) -> &'static str;

    fn value_eq(&self, other: &dyn Value) -> bool;

    fn value_hash(&self, state: &mut dyn Hasher);
}

/// Compared and hashed by content, stored by [Context::with].
struct Hashed<T> {
    key: &'static str,
    value: T,
}

/// Compared by content, not hashed, stored by [Context::with_eq].
struct Compared<T> {
    key: &'static str,
    value: T,
}

/// Compared and hashed by identity, stored by [Context::with_opaque].
struct Opaque<T> {
    key: &'static str,
    value: T,
}

impl<T: PartialEq + Hash + Send + Sync + 'static> Value for Hashed<T> {
    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_entry(&self) -> &dyn Any {
        self
    }

    fn key_name(&self) -> &'static str {
        self.key
    }

    fn value_eq(&self, other: &dyn Value) -> bool {
        other
            .as_entry()
            .downcast_ref::<Self>()
            .is_some_and(|other| self.value == other.value)
    }

    fn value_hash(&self, mut state: &mut dyn Hasher) {
        self.value.hash(&mut state);
    }
}

impl<T: PartialEq + Send + Sync + 'static> Value for Compared<T> {
    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_entry(&self) -> &dyn Any {
        self
    }

    fn key_name(&self) -> &'static str {
        self.key
    }

    fn value_eq(&self, other: &dyn Value) -> bool {
        other
            .as_entry()
            .downcast_ref::<Self>()
            .is_some_and(|other| self.value == other.value)
    }

    fn value_hash(&self, _state: &mut dyn Hasher) {}
}

impl<T: Send + Sync + 'static> Value for Opaque<T> {
    fn as_any(&self) -> &dyn Any {
        &self.value
    }

    fn as_entry(&self) -> &dyn Any {
        self
    }

    fn key_name(&self) -> &'static str {
        self.key
    }

    fn value_eq(&self, other: &dyn Value) -> bool {
        ptr::addr_eq(self, other.as_entry())
    }

    fn value_hash(&self, state: &mut dyn Hasher) {
        state.write_usize(ptr::from_ref(self).addr());
    }
}

type Slot = Option<Arc<dyn Value>>;

/// A value that knows the key it is stored under.
///
/// Implemented by types such as spans or baggage, which can then be put into
/// a context with [Context::with_implicit] without the caller naming the key.
pub trait ImplicitContextKeyed {
    /// Derive a context from `context` holding `self`.
    fn store_into(self, context: &Context) -> Context;
}

/// Immutable mapping from [ContextKey] to value.
///
/// Backed by a dense array of slots sized to the highest key index written
/// into this particular instance. Cloning is cheap and shares the array.
///
/// # Example
///
/// ```
/// use trace_context::{Context, ContextKey};
///
/// static SAMPLED: ContextKey<bool> = ContextKey::named("sampled");
///
/// let root = Context::root();
/// let sampled = root.with(&SAMPLED, true);
///
/// assert_eq!(root.get(&SAMPLED), None);
/// assert_eq!(sampled.get(&SAMPLED), Some(&true));
///
/// {
///     let _scope = sampled.attach();
///     assert!(Context::current().ptr_eq(&sampled));
/// }
///
/// assert!(Context::current().ptr_eq(&root));
/// ```
#[derive(Clone)]
pub struct Context {
    slots: Arc<[Slot]>,
}

impl Context {
    fn from_slots(slots: Vec<Slot>) -> Self {
        Self {
            slots: slots.into(),
        }
    }

    /// The shared context without any value. Every call returns the same
    /// instance.
    #[inline]
    pub fn empty() -> Self {
        ROOT.clone()
    }

    /// Alias of [Context::empty].
    #[inline]
    pub fn root() -> Self {
        Self::empty()
    }

    /// Get the value stored under `key`, or `None` if the slot was never
    /// written on this context's derivation chain.
    pub fn get<T: 'static>(&self, key: &ContextKey<T>) -> Option<&T> {
        self.slot(key.index())?.as_any().downcast_ref()
    }

    /// Derive a context holding `value` under `key`. The receiver is left
    /// untouched.
    ///
    /// The value takes part in the structural `==` and [Hash] of the context.
    /// Values that cannot be hashed go through [Context::with_eq], values
    /// that cannot be compared at all through [Context::with_opaque].
    pub fn with<T>(&self, key: &ContextKey<T>, value: T) -> Self
    where
        T: PartialEq + Hash + Send + Sync + 'static,
    {
        self.with_value(key, Hashed {
            key: key.name(),
            value,
        })
    }

    /// Like [Context::with], for a value that is compared by content but
    /// left out of the hash, such as a float.
    pub fn with_eq<T>(&self, key: &ContextKey<T>, value: T) -> Self
    where
        T: PartialEq + Send + Sync + 'static,
    {
        self.with_value(key, Compared {
            key: key.name(),
            value,
        })
    }

    /// Like [Context::with], for a value of any type, such as a span handle
    /// or a channel sender.
    ///
    /// The stored value is only equal to itself: two contexts compare equal on
    /// this slot only if they share the stored value, i.e. one was derived
    /// from the other without rewriting the slot.
    pub fn with_opaque<T>(&self, key: &ContextKey<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.with_value(key, Opaque {
            key: key.name(),
            value,
        })
    }

    fn with_value<T>(&self, key: &ContextKey<T>, value: impl Value + 'static) -> Self {
        let value: Arc<dyn Value> = Arc::new(value);
        self.with_slot(key.index(), Some(value))
    }

    /// Derive a context storing a value that carries its own key.
    #[inline]
    pub fn with_implicit(&self, value: impl ImplicitContextKeyed) -> Self {
        value.store_into(self)
    }

    /// Derive a context where the slot of `key` is empty. Returns the same
    /// instance when the slot is already empty.
    pub fn without<T>(&self, key: &ContextKey<T>) -> Self {
        let index = key.index();
        if self.slot(index).is_none() {
            return self.clone();
        }
        self.with_slot(index, None)
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Identity comparison, as opposed to the structural `==`.
    #[inline]
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.slots, &other.slots)
    }

    fn slot(&self, index: usize) -> Option<&dyn Value> {
        self.slots.get(index)?.as_deref()
    }

    fn with_slot(&self, index: usize, slot: Slot) -> Self {
        let mut slots = Vec::with_capacity(self.slots.len().max(index + 1));
        slots.extend(self.slots.iter().cloned());
        if slots.len() <= index {
            slots.resize(index + 1, None);
        }
        slots[index] = slot;
        Self::from_slots(slots)
    }

    /// Get the context current on this execution unit, by the registered
    /// [ContextManager](crate::ContextManager).
    #[inline]
    pub fn current() -> Self {
        manager().current()
    }

    /// Make this context current until the returned scope is closed or
    /// dropped.
    #[inline]
    pub fn attach(&self) -> ContextScope<'static> {
        manager().attach(self)
    }

    /// Make this context current without scope bookkeeping, returning the
    /// previous one.
    #[inline]
    pub fn swap(&self) -> Self {
        manager().swap(self.clone())
    }

    /// Bind this context to `carrier` for a later [Context::from_carrier].
    pub fn attach_to<C: Any + Send + Sync>(&self, carrier: &Arc<C>) {
        binder().attach_to(Carrier::of(carrier), self.clone());
    }

    /// Get the context previously bound to `carrier`.
    pub fn from_carrier<C: Any + Send + Sync>(carrier: &Arc<C>) -> Option<Self> {
        binder().retrieve_from(&Carrier::of(carrier))
    }

    /// Remove the binding of `carrier`, returning the context it held.
    pub fn detach_from<C: Any + Send + Sync>(carrier: &Arc<C>) -> Option<Self> {
        binder().detach_from(&Carrier::of(carrier))
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let len = self.slots.len().max(other.slots.len());
        (0..len).all(|index| match (self.slot(index), other.slot(index)) {
            (None, None) => true,
            (Some(a), Some(b)) => a.value_eq(b),
            _ => false,
        })
    }
}

impl Eq for Context {}

impl Hash for Context {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Occupied slots only, trailing empty slots must not change the hash.
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(value) = slot {
                index.hash(state);
                value.value_hash(state);
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keys = self
            .slots
            .iter()
            .flatten()
            .map(|value| value.key_name())
            .collect::<Vec<_>>();
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}
