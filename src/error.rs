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

//! Crate errors.

/// Crate result.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors of the process-wide registration step.
///
/// Nothing on the propagation hot path returns an error, only the one-time
/// wiring done at startup can fail.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A context manager is already active for this process.
    #[error("context manager has been registered")]
    ManagerAlreadyRegistered,

    /// A context binder is already active for this process.
    #[error("context binder has been registered")]
    BinderAlreadyRegistered,
}
