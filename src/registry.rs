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

//! Process-wide registration of the context manager and binder.
//!
//! Code that can have a manager or binder injected should take one. The
//! registry is for call sites that cannot, such as
//! [Context::current](crate::Context::current). The first registration wins:
//! once an implementation is active, a later registration is rejected and the
//! active one stays in place. Using the registry before anything was
//! registered activates the defaults, [ThreadLocalContextManager] and
//! [WeakMapBinder].

use crate::{
    binder::{ContextBinder, WeakMapBinder},
    error::{Error, Result},
    manager::{ContextManager, ThreadLocalContextManager},
};
use std::sync::OnceLock;
use tracing::warn;

static GLOBAL_MANAGER: OnceLock<Box<dyn ContextManager>> = OnceLock::new();

static GLOBAL_BINDER: OnceLock<Box<dyn ContextBinder>> = OnceLock::new();

/// Register the process-wide context manager.
///
/// # Errors
///
/// [Error::ManagerAlreadyRegistered] if a manager is already active.
pub fn register_manager(manager: impl ContextManager + 'static) -> Result<()> {
    GLOBAL_MANAGER.set(Box::new(manager)).map_err(|_| {
        warn!("context manager has been registered, ignore the new one");
        Error::ManagerAlreadyRegistered
    })
}

/// Register the process-wide context binder.
///
/// # Errors
///
/// [Error::BinderAlreadyRegistered] if a binder is already active.
pub fn register_binder(binder: impl ContextBinder + 'static) -> Result<()> {
    GLOBAL_BINDER.set(Box::new(binder)).map_err(|_| {
        warn!("context binder has been registered, ignore the new one");
        Error::BinderAlreadyRegistered
    })
}

/// Get the process-wide context manager.
pub fn manager() -> &'static dyn ContextManager {
    &**GLOBAL_MANAGER.get_or_init(|| Box::new(ThreadLocalContextManager::new()))
}

/// Get the process-wide context binder.
pub fn binder() -> &'static dyn ContextBinder {
    &**GLOBAL_BINDER.get_or_init(|| Box::new(WeakMapBinder::new()))
}
