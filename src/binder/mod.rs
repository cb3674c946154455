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

//! Carrier binding, for handing a captured context to code running on
//! another execution unit.
//!
//! The current-context slot cannot follow work that is queued and picked up
//! later by some other thread. Instead, the submitting side binds the context
//! to an object that travels with the work (a task, a callback, a connection
//! handle) and the running side retrieves it from that object and attaches it.

mod weak_map;

pub use weak_map::WeakMapBinder;

use crate::context::Context;
use std::{
    any::Any,
    fmt::{self, Formatter},
    ops::Deref,
    sync::{Arc, Weak},
};

/// Weak handle identifying a carrier object by its allocation.
///
/// A carrier never keeps the object alive.
#[derive(Clone)]
pub struct Carrier {
    object: Weak<dyn Any + Send + Sync>,
}

impl Carrier {
    /// Handle of the object owned by `carrier`.
    pub fn of<C: Any + Send + Sync>(carrier: &Arc<C>) -> Self {
        let object: Weak<C> = Arc::downgrade(carrier);
        Self { object }
    }

    /// Whether the carrier object is still alive.
    pub fn is_alive(&self) -> bool {
        self.object.strong_count() > 0
    }

    /// Whether both handles point to the same object.
    pub fn same_as(&self, other: &Carrier) -> bool {
        Weak::ptr_eq(&self.object, &other.object)
    }

    /// Allocation address. Stable and unique while any handle exists, since a
    /// weak reference keeps the allocation from being reused.
    pub(crate) fn address(&self) -> usize {
        Weak::as_ptr(&self.object).cast::<()>() as usize
    }
}

impl fmt::Debug for Carrier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Carrier")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Side table associating carriers with captured contexts.
///
/// Implementations are shared by every execution unit and must accept
/// concurrent calls.
pub trait ContextBinder: Send + Sync {
    /// Bind `context` to `carrier`, replacing any previous binding.
    fn attach_to(&self, carrier: Carrier, context: Context);

    /// Get the context bound to `carrier`, if any.
    fn retrieve_from(&self, carrier: &Carrier) -> Option<Context>;

    /// Remove the binding of `carrier`, returning its context.
    fn detach_from(&self, carrier: &Carrier) -> Option<Context>;
}

impl<T: ContextBinder + ?Sized> ContextBinder for Box<T> {
    fn attach_to(&self, carrier: Carrier, context: Context) {
        self.deref().attach_to(carrier, context)
    }

    fn retrieve_from(&self, carrier: &Carrier) -> Option<Context> {
        self.deref().retrieve_from(carrier)
    }

    fn detach_from(&self, carrier: &Carrier) -> Option<Context> {
        self.deref().detach_from(carrier)
    }
}

impl<T: ContextBinder + ?Sized> ContextBinder for Arc<T> {
    fn attach_to(&self, carrier: Carrier, context: Context) {
        self.deref().attach_to(carrier, context)
    }

    fn retrieve_from(&self, carrier: &Carrier) -> Option<Context> {
        self.deref().retrieve_from(carrier)
    }

    fn detach_from(&self, carrier: &Carrier) -> Option<Context> {
        self.deref().detach_from(carrier)
    }
}
