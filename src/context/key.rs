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

//! Typed keys addressing one slot in every [`Context`](super::Context).

use std::{
    fmt::{self, Formatter},
    marker::PhantomData,
    sync::{
        OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

static NEXT_INDEX: AtomicUsize = AtomicUsize::new(0);

/// Handle of one logical slot of type `T`.
///
/// Every key owns a dense index, handed out from a process-wide counter the
/// first time the key is used and never handed out again. Keys are compared
/// by that index, so two keys created with the same name are still two
/// different slots. Keys are meant to live in statics:
///
/// ```
/// use trace_context::{Context, ContextKey};
///
/// static USER: ContextKey<String> = ContextKey::named("user");
///
/// let context = Context::root().with(&USER, "alice".to_owned());
/// assert_eq!(context.get(&USER).map(String::as_str), Some("alice"));
/// ```
pub struct ContextKey<T> {
    name: &'static str,
    index: OnceLock<usize>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ContextKey<T> {
    /// New key with a name used for diagnostics only.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            index: OnceLock::new(),
            _marker: PhantomData,
        }
    }

    /// Get key name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the slot index, allocating it on first call.
    #[inline]
    pub fn index(&self) -> usize {
        *self
            .index
            .get_or_init(|| NEXT_INDEX.fetch_add(1, Ordering::Relaxed))
    }
}

impl<T> fmt::Debug for ContextKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextKey")
            .field("name", &self.name)
            .field("index", &self.index.get())
            .finish()
    }
}

impl<T> fmt::Display for ContextKey<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl<T> PartialEq for ContextKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index() == other.index()
    }
}

impl<T> Eq for ContextKey<T> {}
