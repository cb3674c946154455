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

//! Carry a context into a future, whichever thread ends up polling it.

use crate::{context::Context, manager::ContextManager, registry};
use futures_core::future::FusedFuture;
use pin_project_lite::pin_project;
use std::{
    fmt::{self, Formatter},
    future::Future,
    pin::Pin,
    task::{self, Poll},
};

pin_project! {
    /// Future attaching a captured context around every poll of the inner
    /// future. Created by [FutureExt::with_context].
    #[must_use = "futures do nothing unless you `.await` or poll them"]
    pub struct WithContext<F> {
        #[pin]
        inner: F,
        context: Context,
        manager: &'static dyn ContextManager,
    }
}

impl<F> WithContext<F> {
    /// Wrap `inner`, attaching `context` through `manager` while it is polled.
    pub fn new(inner: F, context: Context, manager: &'static dyn ContextManager) -> Self {
        Self {
            inner,
            context,
            manager,
        }
    }

    /// Get the carried context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Get the inner future.
    pub fn into_inner(self) -> F {
        self.inner
    }
}

impl<F> fmt::Debug for WithContext<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithContext")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl<F: Future> Future for WithContext<F> {
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _scope = this.manager.attach(this.context);
        this.inner.poll(cx)
    }
}

impl<F: FusedFuture> FusedFuture for WithContext<F> {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

/// Extension attaching contexts to futures.
pub trait FutureExt: Future + Sized {
    /// Attach `context` each time the future is polled, through the
    /// registered [ContextManager].
    fn with_context(self, context: Context) -> WithContext<Self> {
        WithContext::new(self, context, registry::manager())
    }

    /// Capture the current context and attach it each time the future is
    /// polled.
    fn with_current_context(self) -> WithContext<Self> {
        self.with_context(Context::current())
    }
}

impl<F: Future> FutureExt for F {}
