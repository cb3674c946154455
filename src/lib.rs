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

#![warn(rust_2018_idioms, missing_docs)]
#![warn(clippy::dbg_macro, clippy::print_stdout)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod binder;
pub mod context;
pub(crate) mod error;
pub mod future;
pub mod manager;
pub mod registry;

pub use binder::{Carrier, ContextBinder, WeakMapBinder};
pub use context::{Context, ContextKey, ImplicitContextKeyed};
pub use error::{Error, Result};
pub use manager::{
    ContextManager, ContextScope, TaskLocalContextManager, ThreadLocalContextManager,
};
