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

//! Per-thread current context.

use super::{ContextManager, ContextScope};
use crate::context::Context;
use std::cell::RefCell;

thread_local! {
    static CURRENT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

pub(crate) fn current() -> Context {
    CURRENT
        .try_with(|slot| slot.borrow().clone())
        .ok()
        .flatten()
        .unwrap_or_default()
}

pub(crate) fn swap(context: Context) -> Context {
    // Unavailable only while the thread is being torn down.
    CURRENT
        .try_with(|slot| slot.replace(Some(context)))
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Context manager where the execution unit is the OS thread.
///
/// This is the manager used when nothing else has been registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadLocalContextManager;

impl ThreadLocalContextManager {
    /// New thread local context manager. All instances share the same
    /// per-thread slot.
    pub const fn new() -> Self {
        Self
    }
}

impl ContextManager for ThreadLocalContextManager {
    fn current(&self) -> Context {
        current()
    }

    fn swap(&self, context: Context) -> Context {
        swap(context)
    }

    fn attach(&self, context: &Context) -> ContextScope<'_> {
        ContextScope::enter(self, context)
    }
}
