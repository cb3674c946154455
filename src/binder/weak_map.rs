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

//! Binder backed by a weak-keyed map.

use super::{Carrier, ContextBinder};
use crate::context::Context;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

const DEFAULT_SWEEP_THRESHOLD: usize = 64;

struct Binding {
    carrier: Carrier,
    context: Context,
}

struct Table {
    bindings: HashMap<usize, Binding>,
    sweep_threshold: usize,
}

impl Table {
    fn take_dead(&mut self) -> Vec<Binding> {
        let dead = self
            .bindings
            .iter()
            .filter(|(_, binding)| !binding.carrier.is_alive())
            .map(|(address, _)| *address)
            .collect::<Vec<_>>();
        dead.iter()
            .filter_map(|address| self.bindings.remove(address))
            .collect()
    }
}

/// [ContextBinder] holding carriers weakly.
///
/// A binding never keeps its carrier alive. Bindings of dropped carriers are
/// invisible to lookups and get evicted by a sweep that runs when a bind
/// finds the table at its sweep threshold. After each sweep the threshold is
/// reset to twice the number of live bindings, and never lower than the
/// configured one, so the sweep cost is amortized over the binds.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trace_context::{Carrier, Context, ContextBinder, ContextKey, WeakMapBinder};
///
/// static JOB: ContextKey<u32> = ContextKey::named("job");
///
/// let binder = WeakMapBinder::new();
/// let task = Arc::new(());
///
/// binder.attach_to(Carrier::of(&task), Context::root().with(&JOB, 9));
///
/// let context = binder.retrieve_from(&Carrier::of(&task)).unwrap();
/// assert_eq!(context.get(&JOB), Some(&9));
/// ```
pub struct WeakMapBinder {
    table: RwLock<Table>,
    min_sweep_threshold: usize,
}

impl WeakMapBinder {
    /// New binder with the default sweep threshold.
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// New binder sweeping dead bindings once `threshold` bindings are held.
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            table: RwLock::new(Table {
                bindings: HashMap::new(),
                sweep_threshold: threshold,
            }),
            min_sweep_threshold: threshold,
        }
    }

    /// Number of bindings whose carrier is alive.
    pub fn len(&self) -> usize {
        self.table
            .read()
            .bindings
            .values()
            .filter(|binding| binding.carrier.is_alive())
            .count()
    }

    /// Whether no live binding is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict the bindings of dropped carriers, returning how many were evicted.
    pub fn purge(&self) -> usize {
        let evicted = {
            let mut table = self.table.write();
            let evicted = table.take_dead();
            table.sweep_threshold = self.next_threshold(table.bindings.len());
            evicted
        };
        trace!(evicted = evicted.len(), "purge carrier bindings");
        evicted.len()
    }

    fn next_threshold(&self, live: usize) -> usize {
        (live * 2).max(self.min_sweep_threshold)
    }
}

impl Default for WeakMapBinder {
    fn default() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }
}

impl ContextBinder for WeakMapBinder {
    fn attach_to(&self, carrier: Carrier, context: Context) {
        // Evicted and replaced contexts are dropped after the lock is
        // released, their values may run arbitrary code on drop.
        let (evicted, replaced) = {
            let mut table = self.table.write();
            let evicted = if table.bindings.len() >= table.sweep_threshold {
                let evicted = table.take_dead();
                table.sweep_threshold = self.next_threshold(table.bindings.len());
                trace!(
                    evicted = evicted.len(),
                    live = table.bindings.len(),
                    "sweep carrier bindings"
                );
                evicted
            } else {
                Vec::new()
            };
            let replaced = table
                .bindings
                .insert(carrier.address(), Binding { carrier, context });
            (evicted, replaced)
        };
        drop(evicted);
        drop(replaced);
    }

    fn retrieve_from(&self, carrier: &Carrier) -> Option<Context> {
        self.table
            .read()
            .bindings
            .get(&carrier.address())
            .filter(|binding| binding.carrier.is_alive())
            .map(|binding| binding.context.clone())
    }

    fn detach_from(&self, carrier: &Carrier) -> Option<Context> {
        let binding = self.table.write().bindings.remove(&carrier.address())?;
        binding.carrier.is_alive().then_some(binding.context)
    }
}
