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

use std::{
    panic::{self, AssertUnwindSafe},
    thread,
};
use trace_context::{Context, ContextKey, ContextManager, ThreadLocalContextManager};

static VALUE: ContextKey<&'static str> = ContextKey::named("value");

fn manager() -> ThreadLocalContextManager {
    ThreadLocalContextManager::new()
}

#[test]
fn scoped_restoration() {
    let manager = manager();
    let prev = manager.current();
    let c = Context::root().with(&VALUE, "c");

    let mut scope = manager.attach(&c);
    assert!(manager.current().ptr_eq(&c));

    scope.close();
    assert!(manager.current().ptr_eq(&prev));
}

#[test]
fn idempotent_identity_attach() {
    let manager = manager();
    let c = Context::root().with(&VALUE, "c");

    let mut s1 = manager.attach(&c);
    let mut s2 = manager.attach(&c);
    assert!(!s1.is_noop());
    assert!(s2.is_noop());

    s2.close();
    assert!(manager.current().ptr_eq(&c));

    s1.close();
    assert!(manager.current().ptr_eq(&Context::root()));
}

#[test]
fn attach_current_root_is_noop() {
    let manager = manager();
    let scope = manager.attach(&Context::root());
    assert!(scope.is_noop());
}

#[test]
fn idempotent_close() {
    let manager = manager();
    let outer = Context::root().with(&VALUE, "outer");
    let inner = Context::root().with(&VALUE, "inner");

    let _outer = manager.attach(&outer);
    let mut scope = manager.attach(&inner);
    scope.close();
    assert!(manager.current().ptr_eq(&outer));

    scope.close();
    assert!(manager.current().ptr_eq(&outer));

    drop(scope);
    assert!(manager.current().ptr_eq(&outer));
}

#[test]
fn resilient_out_of_order_close() {
    let manager = manager();
    let before = manager.current();
    let a = Context::root().with(&VALUE, "a");
    let b = Context::root().with(&VALUE, "b");

    let mut sa = manager.attach(&a);
    let mut sb = manager.attach(&b);

    sa.close();
    assert!(!sa.is_closed());
    assert!(manager.current().ptr_eq(&b));

    sb.close();
    assert!(sb.is_closed());
    assert!(manager.current().ptr_eq(&a));

    // `a` is current again, so the skipped close now succeeds.
    sa.close();
    assert!(sa.is_closed());
    assert!(manager.current().ptr_eq(&before));
}

#[test]
fn nested_scopes_unwind_on_drop() {
    let manager = manager();
    let depths = ["one", "two", "three"].map(|name| Context::root().with(&VALUE, name));

    {
        let _one = manager.attach(&depths[0]);
        {
            let _two = manager.attach(&depths[1]);
            {
                let _three = manager.attach(&depths[2]);
                assert_eq!(manager.current().get(&VALUE), Some(&"three"));
            }
            assert_eq!(manager.current().get(&VALUE), Some(&"two"));
        }
        assert_eq!(manager.current().get(&VALUE), Some(&"one"));
    }
    assert!(manager.current().ptr_eq(&Context::root()));
}

#[test]
fn scope_restored_when_work_panics() {
    let manager = manager();
    let context = Context::root().with(&VALUE, "panicking");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = manager.attach(&context);
        panic!("instrumented code failed");
    }));

    assert!(result.is_err());
    assert!(manager.current().ptr_eq(&Context::root()));
}

#[test]
fn units_are_isolated() {
    let manager = manager();
    let main = Context::root().with(&VALUE, "main");
    let _scope = manager.attach(&main);

    let handles = (0..4)
        .map(|_| {
            thread::spawn(|| {
                let manager = ThreadLocalContextManager::new();
                assert!(manager.current().ptr_eq(&Context::empty()));

                let worker = Context::root().with(&VALUE, "worker");
                let _scope = manager.attach(&worker);
                assert_eq!(manager.current().get(&VALUE), Some(&"worker"));
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    assert!(manager.current().ptr_eq(&main));
}
