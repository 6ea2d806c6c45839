// Copyright (C) 2024-present The flowplace Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The IPFIX information model: canonical [`InfoElement`] descriptors, the
//! process-wide [`InfoModel`] registry, and ordered [`IETemplate`]s as they
//! appear in template records on the wire.
//!
//! Element identity is global: every descriptor handed out by an
//! [`InfoModel`] is an `Arc` that stays alive for the lifetime of the model,
//! so templates and decode plans can compare elements by pointer.

pub mod ie;
pub mod iespec;
pub mod template;

mod iana;
mod model;

pub use ie::{IEType, InfoElement, VARLEN};
pub use iespec::{parse_iespec, IESpec, IESpecError};
pub use model::InfoModel;
pub use template::IETemplate;
