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

//! Lookups and merges over several contexts at once, typically the contexts
//! retrieved from a few carriers plus the current one.

use super::{Context, ContextKey, Slot};
use crate::{binder::Carrier, registry::binder};
use std::{any::Any, sync::Arc};

/// Source standing for the current context, for [find_first_in] and
/// [find_all_in].
pub const CURRENT: Source = Source::Current;

/// Where a context is looked up by [find_first_in] and [find_all_in].
#[derive(Debug, Clone)]
pub enum Source {
    /// The current context of the calling execution unit.
    Current,
    /// The context bound to a carrier through the registered binder.
    Carrier(Carrier),
}

impl Source {
    /// Source for the context bound to `carrier`.
    pub fn carrier<C: Any + Send + Sync>(carrier: &Arc<C>) -> Self {
        Self::Carrier(Carrier::of(carrier))
    }

    /// Get the context of this source. A carrier with nothing bound has no
    /// context.
    pub fn resolve(&self) -> Option<Context> {
        match self {
            Self::Current => Some(Context::current()),
            Self::Carrier(carrier) => binder().retrieve_from(carrier),
        }
    }
}

impl<C: Any + Send + Sync> From<&Arc<C>> for Source {
    fn from(carrier: &Arc<C>) -> Self {
        Self::carrier(carrier)
    }
}

/// Get the first value stored under `key`, resolving `sources` in order.
/// Sources without a context are skipped.
///
/// ```
/// use std::sync::Arc;
/// use trace_context::{
///     Context, ContextKey,
///     context::helpers::{CURRENT, Source, find_first_in},
/// };
///
/// static ORIGIN: ContextKey<&'static str> = ContextKey::named("origin");
///
/// let request = Arc::new(());
/// Context::root().with(&ORIGIN, "queue").attach_to(&request);
///
/// assert_eq!(find_first_in(&ORIGIN, [CURRENT, Source::carrier(&request)]), Some("queue"));
/// ```
pub fn find_first_in<T: Clone + 'static>(
    key: &ContextKey<T>,
    sources: impl IntoIterator<Item = Source>,
) -> Option<T> {
    sources
        .into_iter()
        .find_map(|source| source.resolve()?.get(key).cloned())
}

/// Get every value stored under `key`, resolving `sources` in order.
pub fn find_all_in<T: Clone + 'static>(
    key: &ContextKey<T>,
    sources: impl IntoIterator<Item = Source>,
) -> Vec<T> {
    sources
        .into_iter()
        .filter_map(|source| source.resolve()?.get(key).cloned())
        .collect()
}

/// Get the first value stored under `key`, searching `contexts` in order.
///
/// ```
/// use trace_context::{Context, ContextKey, context::helpers::find_first};
///
/// static ORIGIN: ContextKey<&'static str> = ContextKey::named("origin");
///
/// let unset = Context::root();
/// let set = Context::root().with(&ORIGIN, "lambda");
///
/// assert_eq!(find_first(&ORIGIN, [&unset, &set]), Some(&"lambda"));
/// ```
pub fn find_first<'a, T: 'static>(
    key: &ContextKey<T>,
    contexts: impl IntoIterator<Item = &'a Context>,
) -> Option<&'a T> {
    contexts.into_iter().find_map(|context| context.get(key))
}

/// Get every value stored under `key`, in the order of `contexts`.
pub fn find_all<'a, T: 'static>(
    key: &ContextKey<T>,
    contexts: impl IntoIterator<Item = &'a Context>,
) -> Vec<&'a T> {
    contexts
        .into_iter()
        .filter_map(|context| context.get(key))
        .collect()
}

/// Merge `contexts` slot by slot. When several contexts hold a value for the
/// same key, the first one wins.
pub fn combine<'a>(contexts: impl IntoIterator<Item = &'a Context>) -> Context {
    let mut slots: Vec<Slot> = Vec::new();
    for context in contexts {
        if slots.len() < context.slots.len() {
            slots.resize(context.slots.len(), None);
        }
        for (slot, value) in slots.iter_mut().zip(context.slots.iter()) {
            if slot.is_none() {
                slot.clone_from(value);
            }
        }
    }

    if slots.iter().all(Option::is_none) {
        Context::root()
    } else {
        Context::from_slots(slots)
    }
}

/// Fold `contexts` into [Context::root] with `combiner`. Only what the
/// combiner keeps ends up in the result.
pub fn combine_with<'a, F>(combiner: F, contexts: impl IntoIterator<Item = &'a Context>) -> Context
where
    F: FnMut(Context, &'a Context) -> Context,
{
    contexts.into_iter().fold(Context::root(), combiner)
}

#[cfg(test)]
mod tests {
    use super::*;

    static STRING: ContextKey<&'static str> = ContextKey::named("string");
    static BOOLEAN: ContextKey<bool> = ContextKey::named("boolean");
    static FLOAT: ContextKey<f32> = ContextKey::named("float");
    static LONG: ContextKey<i64> = ContextKey::named("long");

    #[test]
    fn find_values() {
        let none: [&Context; 0] = [];
        let unset = Context::root();
        let first = Context::root().with(&STRING, "value1");
        let second = Context::root().with(&STRING, "value2");

        assert_eq!(find_first(&STRING, none), None);
        assert_eq!(find_first(&STRING, [&unset]), None);
        assert_eq!(find_first(&STRING, [&first, &second]), Some(&"value1"));
        assert_eq!(find_first(&STRING, [&unset, &second]), Some(&"value2"));

        assert!(find_all(&STRING, none).is_empty());
        assert_eq!(find_all(&STRING, [&first, &unset, &second]), [&"value1", &"value2"]);
    }

    #[test]
    fn combine_keeps_first_duplicate() {
        let first = Context::root().with(&STRING, "value1").with(&BOOLEAN, true);
        let second = Context::root().with(&STRING, "value2").with_eq(&FLOAT, 2.5);
        let empty = Context::root();
        let fourth = Context::root().with_eq(&FLOAT, 567.0);

        let combined = combine([&first, &second, &empty, &fourth]);
        assert_eq!(combined.get(&STRING), Some(&"value1"));
        assert_eq!(combined.get(&BOOLEAN), Some(&true));
        assert_eq!(combined.get(&FLOAT), Some(&2.5));
    }

    #[test]
    fn combine_later_context_longer() {
        let first = Context::root().with(&STRING, "value1").with_eq(&FLOAT, 2.5);
        let second = Context::root().with(&STRING, "value2").with(&LONG, 567);

        let combined = combine([&first, &second]);
        assert_eq!(combined.get(&STRING), Some(&"value1"));
        assert_eq!(combined.get(&FLOAT), Some(&2.5));
        assert_eq!(combined.get(&LONG), Some(&567));
    }

    #[test]
    fn combine_nothing_is_root() {
        let none: [&Context; 0] = [];
        assert!(combine(none).ptr_eq(&Context::root()));
        assert!(combine([&Context::root(), &Context::root()]).ptr_eq(&Context::root()));
    }

    #[test]
    fn combiner_drops_other_values() {
        static ERRORS: ContextKey<u32> = ContextKey::named("errors");

        let first = Context::root().with(&ERRORS, 12).with(&STRING, "value1");
        let second = Context::root().with(&ERRORS, 1).with_eq(&FLOAT, 2.5);
        let third = Context::root().with(&ERRORS, 6).with(&BOOLEAN, true);

        let combined = combine_with(
            |left, right| {
                let total = left.get(&ERRORS).copied().unwrap_or_default()
                    + right.get(&ERRORS).copied().unwrap_or_default();
                left.with(&ERRORS, total)
            },
            [&first, &second, &third],
        );

        assert_eq!(combined.get(&ERRORS), Some(&19));
        assert_eq!(combined.get(&STRING), None);
        assert_eq!(combined.get(&FLOAT), None);
        assert_eq!(combined.get(&BOOLEAN), None);
    }

    struct Request;

    #[test]
    fn find_values_in_carriers() {
        let first = Arc::new(Request);
        let second = Arc::new(Request);
        let unset = Arc::new(Request);
        let unbound = Arc::new(Request);
        Context::root().with(&STRING, "value1").attach_to(&first);
        Context::root().with(&STRING, "value2").attach_to(&second);
        Context::root().attach_to(&unset);

        let none: [Source; 0] = [];
        assert_eq!(find_first_in(&STRING, none.clone()), None);
        assert_eq!(find_first_in(&STRING, [Source::from(&unbound)]), None);
        assert_eq!(find_first_in(&STRING, [Source::from(&unset)]), None);
        assert_eq!(find_first_in(&STRING, [Source::from(&first)]), Some("value1"));
        assert_eq!(
            find_first_in(&STRING, [Source::from(&first), Source::from(&second)]),
            Some("value1")
        );
        assert_eq!(
            find_first_in(&STRING, [Source::from(&unbound), Source::from(&first)]),
            Some("value1")
        );
        assert_eq!(
            find_first_in(&STRING, [Source::from(&unset), Source::from(&second)]),
            Some("value2")
        );

        assert!(find_all_in(&STRING, none).is_empty());
        assert_eq!(
            find_all_in(
                &STRING,
                [
                    Source::from(&unbound),
                    Source::from(&first),
                    Source::from(&unset),
                    Source::from(&second),
                ]
            ),
            ["value1", "value2"]
        );
    }

    #[test]
    fn find_values_in_current() {
        assert!(Context::current().ptr_eq(&Context::root()));
        assert_eq!(find_first_in(&STRING, [CURRENT]), None);

        let context = Context::root().with(&STRING, "value1");
        {
            let _scope = context.attach();
            assert_eq!(find_first_in(&STRING, [CURRENT]), Some("value1"));
            assert_eq!(find_all_in(&STRING, [CURRENT]), ["value1"]);
        }

        assert!(Context::current().ptr_eq(&Context::root()));
        assert!(find_all_in(&STRING, [CURRENT]).is_empty());
    }
}
