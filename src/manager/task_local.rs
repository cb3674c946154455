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

//! Per-task current context for tokio.

use super::{ContextManager, ContextScope, thread_local};
use crate::context::Context;
use std::{cell::RefCell, future::Future};

tokio::task_local! {
    static TASK_CURRENT: RefCell<Context>;
}

/// Context manager where the execution unit is an async task.
///
/// A task gets its own slot by running inside [TaskLocalContextManager::scope];
/// the slot travels with the task when the runtime moves it between worker
/// threads. Outside of such a scope the manager falls back to the per-thread
/// slot of [ThreadLocalContextManager](super::ThreadLocalContextManager).
///
/// # Example
///
/// ```
/// use trace_context::{Context, ContextKey, ContextManager, TaskLocalContextManager};
///
/// static REQUEST: ContextKey<u64> = ContextKey::named("request");
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let manager = TaskLocalContextManager::new();
///
/// TaskLocalContextManager::scope(Context::root(), async move {
///     manager.swap(Context::root().with(&REQUEST, 7));
///     tokio::task::yield_now().await;
///     assert_eq!(manager.current().get(&REQUEST), Some(&7));
/// })
/// .await;
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct TaskLocalContextManager;

impl TaskLocalContextManager {
    /// New task local context manager.
    pub const fn new() -> Self {
        Self
    }

    /// Run `future` with its own current-context slot, starting at `context`.
    pub fn scope<F: Future>(context: Context, future: F) -> impl Future<Output = F::Output> {
        TASK_CURRENT.scope(RefCell::new(context), future)
    }

    /// Run `f` with its own current-context slot, starting at `context`.
    pub fn sync_scope<R>(context: Context, f: impl FnOnce() -> R) -> R {
        TASK_CURRENT.sync_scope(RefCell::new(context), f)
    }

    /// Whether the caller runs inside [TaskLocalContextManager::scope].
    pub fn in_scope() -> bool {
        TASK_CURRENT.try_with(|_| ()).is_ok()
    }
}

impl ContextManager for TaskLocalContextManager {
    fn current(&self) -> Context {
        TASK_CURRENT
            .try_with(|slot| slot.borrow().clone())
            .unwrap_or_else(|_| thread_local::current())
    }

    fn swap(&self, context: Context) -> Context {
        if Self::in_scope() {
            TASK_CURRENT.with(|slot| slot.replace(context))
        } else {
            thread_local::swap(context)
        }
    }

    fn attach(&self, context: &Context) -> ContextScope<'_> {
        ContextScope::enter(self, context)
    }
}
