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

//! Scope restoring the previous context.

use super::ContextManager;
use crate::context::Context;
use std::{
    fmt::{self, Formatter},
    marker::PhantomData,
    mem::take,
};

struct Restore<'a> {
    manager: &'a dyn ContextManager,
    previous: Context,
}

/// Handle of an attached context, created by [ContextManager::attach].
///
/// Closing the scope, explicitly or by dropping it, makes the previous
/// context current again. The restore only happens if the scope's context is
/// still the current one, any other close is logged at debug level and
/// otherwise ignored, so a scope skipped by an early return never corrupts
/// the slot for later work. A scope is bound to the unit it was created on
/// and is therefore not `Send`.
#[must_use = "assign a variable name to guard the scope not be dropped immediately."]
pub struct ContextScope<'a> {
    context: Option<Context>,
    restore: Option<Restore<'a>>,
    closed: bool,
    stale: bool,
    _unit: PhantomData<*const ()>,
}

impl<'a> ContextScope<'a> {
    /// Attach `context` through the primitives of `manager`. This is how
    /// [ContextManager::attach] is implemented.
    pub fn enter(manager: &'a dyn ContextManager, context: &Context) -> Self {
        if manager.current().ptr_eq(context) {
            return Self {
                context: Some(context.clone()),
                restore: None,
                closed: false,
                stale: false,
                _unit: PhantomData,
            };
        }

        let previous = manager.swap(context.clone());
        Self {
            context: Some(context.clone()),
            restore: Some(Restore { manager, previous }),
            closed: false,
            stale: false,
            _unit: PhantomData,
        }
    }

    /// Scope that restores nothing when closed.
    pub fn noop() -> Self {
        Self {
            context: None,
            restore: None,
            closed: false,
            stale: false,
            _unit: PhantomData,
        }
    }

    /// Get the context attached by this scope.
    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Whether closing this scope can never change the current context.
    pub fn is_noop(&self) -> bool {
        self.restore.is_none()
    }

    /// Whether a close was attempted while the scope was not current.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Whether a close has restored the previous context.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Restore the previous context. Never panics.
    pub fn close(&mut self) {
        self.restore(true);
    }

    fn restore(&mut self, report_stale: bool) {
        let Some(restore) = &mut self.restore else {
            return;
        };

        let is_current = self
            .context
            .as_ref()
            .is_some_and(|context| restore.manager.current().ptr_eq(context));
        if self.closed || !is_current {
            if report_stale {
                tracing::debug!(
                    closed = self.closed,
                    context = ?self.context,
                    "attempt to close a scope that is not current"
                );
            }
            self.stale = true;
            return;
        }

        self.closed = true;
        self.stale = false;
        restore.manager.swap(take(&mut restore.previous));
    }
}

impl Drop for ContextScope<'_> {
    fn drop(&mut self) {
        // A scope already reported as not current is retried quietly.
        if !self.closed {
            self.restore(!self.stale);
        }
    }
}

impl fmt::Debug for ContextScope<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextScope")
            .field("context", &self.context)
            .field("noop", &self.is_noop())
            .field("closed", &self.closed)
            .field("stale", &self.stale)
            .finish()
    }
}
