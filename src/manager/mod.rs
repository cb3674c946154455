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

//! Current-context management.
//!
//! Every execution unit owns one slot holding the context in effect. A
//! [ContextManager] reads and replaces that slot, and hands out a
//! [ContextScope] that puts the previous context back when closed.

mod scope;
mod task_local;
mod thread_local;

pub use scope::ContextScope;
pub use task_local::TaskLocalContextManager;
pub use thread_local::ThreadLocalContextManager;

use crate::context::Context;
use std::{ops::Deref, sync::Arc};

/// Owner of the per-execution-unit current context.
///
/// Implementations only ever touch the slot of the calling unit, so no
/// locking is involved.
pub trait ContextManager: Send + Sync {
    /// Get the context current on the calling unit. A unit that never had a
    /// context attached sees [Context::empty].
    fn current(&self) -> Context;

    /// Make `context` current on the calling unit and return the previous
    /// one, without any scope bookkeeping.
    fn swap(&self, context: Context) -> Context;

    /// Make `context` current until the returned scope is closed. Attaching
    /// the context that is already current returns a no-op scope.
    fn attach(&self, context: &Context) -> ContextScope<'_>;
}

impl<T: ContextManager + ?Sized> ContextManager for Box<T> {
    fn current(&self) -> Context {
        self.deref().current()
    }

    fn swap(&self, context: Context) -> Context {
        self.deref().swap(context)
    }

    fn attach(&self, context: &Context) -> ContextScope<'_> {
        self.deref().attach(context)
    }
}

impl<T: ContextManager + ?Sized> ContextManager for Arc<T> {
    fn current(&self) -> Context {
        self.deref().current()
    }

    fn swap(&self, context: Context) -> Context {
        self.deref().swap(context)
    }

    fn attach(&self, context: &Context) -> ContextScope<'_> {
        self.deref().attach(context)
    }
}
