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

use std::sync::Arc;
use trace_context::{
    Carrier, Context, ContextBinder, ContextKey, ContextManager, Error, TaskLocalContextManager,
    ThreadLocalContextManager, WeakMapBinder,
    registry::{binder, register_binder, register_manager},
};

static VALUE: ContextKey<u32> = ContextKey::named("value");

// Registration is process-wide and first-wins, so it is all exercised in
// one test.
#[test]
fn first_registration_wins() {
    let registered = Arc::new(WeakMapBinder::new());

    register_manager(TaskLocalContextManager::new()).unwrap();
    register_binder(registered.clone()).unwrap();

    assert!(matches!(
        register_manager(ThreadLocalContextManager::new()),
        Err(Error::ManagerAlreadyRegistered)
    ));
    assert!(matches!(
        register_binder(WeakMapBinder::new()),
        Err(Error::BinderAlreadyRegistered)
    ));

    let carrier = Arc::new(());
    let context = Context::root().with(&VALUE, 1);
    context.attach_to(&carrier);
    assert_eq!(registered.len(), 1);
    assert!(binder().retrieve_from(&Carrier::of(&carrier)).is_some());

    TaskLocalContextManager::sync_scope(Context::root(), || {
        let _scope = context.attach();
        assert_eq!(Context::current().get(&VALUE), Some(&1));
        assert!(ThreadLocalContextManager::new().current().is_empty());
    });
    assert!(Context::current().ptr_eq(&Context::root()));
}
