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

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Field length sentinel for variable-length information elements
/// ([RFC7011](https://datatracker.ietf.org/doc/html/rfc7011) Section 7).
pub const VARLEN: u16 = 0xffff;

/// Abstract data types for information elements, from the IANA "IPFIX
/// Information Element Data Types" subregistry.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(
    strum_macros::Display,
    strum_macros::FromRepr,
    strum_macros::EnumString,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Serialize,
    Deserialize,
)]
pub enum IEType {
    octetArray = 0,
    unsigned8 = 1,
    unsigned16 = 2,
    unsigned32 = 3,
    unsigned64 = 4,
    signed8 = 5,
    signed16 = 6,
    signed32 = 7,
    signed64 = 8,
    float32 = 9,
    float64 = 10,
    boolean = 11,
    macAddress = 12,
    string = 13,
    dateTimeSeconds = 14,
    dateTimeMilliseconds = 15,
    dateTimeMicroseconds = 16,
    dateTimeNanoseconds = 17,
    ipv4Address = 18,
    ipv6Address = 19,
}

impl IEType {
    /// Size in octets of the natural in-memory destination for this type,
    /// or `None` for the content types whose length is template-defined.
    pub const fn native_size(self) -> Option<usize> {
        match self {
            IEType::octetArray | IEType::string => None,
            IEType::unsigned8 | IEType::signed8 | IEType::boolean => Some(1),
            IEType::unsigned16 | IEType::signed16 => Some(2),
            IEType::unsigned32
            | IEType::signed32
            | IEType::float32
            | IEType::dateTimeSeconds
            | IEType::ipv4Address => Some(4),
            IEType::unsigned64
            | IEType::signed64
            | IEType::float64
            | IEType::dateTimeMilliseconds
            | IEType::dateTimeMicroseconds
            | IEType::dateTimeNanoseconds => Some(8),
            IEType::macAddress => Some(6),
            IEType::ipv6Address => Some(16),
        }
    }

    /// The single wire length RFC 7011 Section 6.1 admits for this type, or
    /// `None` when reduced-length or template-defined encoding is allowed.
    pub const fn fixed_wire_size(self) -> Option<u16> {
        match self {
            IEType::boolean => Some(1),
            IEType::macAddress => Some(6),
            IEType::ipv4Address => Some(4),
            IEType::ipv6Address => Some(16),
            IEType::dateTimeMicroseconds | IEType::dateTimeNanoseconds => Some(8),
            _ => None,
        }
    }

    /// The default wire length used when an IE spec omits `[len]`.
    pub const fn default_wire_size(self) -> u16 {
        match self.native_size() {
            Some(n) => n as u16,
            None => VARLEN,
        }
    }
}

/// Immutable descriptor of one information element: name, private
/// enterprise number (0 for the IANA registry), element id, abstract type,
/// and wire length in octets ([`VARLEN`] for variable-length encoding).
///
/// Canonical descriptors live in an [`InfoModel`](crate::InfoModel) and are
/// shared by `Arc`. A descriptor lazily caches reduced-length siblings so
/// that, say, `octetDeltaCount[4]` has one stable identity per model.
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoElement {
    name: String,
    pen: u32,
    number: u16,
    ietype: IEType,
    len: u16,
    #[serde(skip)]
    reduced: Mutex<HashMap<u16, Arc<InfoElement>>>,
}

impl InfoElement {
    pub fn new(name: impl Into<String>, pen: u32, number: u16, ietype: IEType, len: u16) -> Self {
        Self {
            name: name.into(),
            pen,
            number,
            ietype,
            len,
            reduced: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn pen(&self) -> u32 {
        self.pen
    }

    pub const fn number(&self) -> u16 {
        self.number
    }

    pub const fn ietype(&self) -> IEType {
        self.ietype
    }

    pub const fn len(&self) -> u16 {
        self.len
    }

    pub const fn is_varlen(&self) -> bool {
        self.len == VARLEN
    }

    /// Identity for matching purposes: (pen, number), length ignored.
    pub fn matches(&self, other: &InfoElement) -> bool {
        self.pen == other.pen && self.number == other.number
    }

    /// Returns this element, or the sibling of this element with wire
    /// length `len`. Siblings are created on first use and live as long as
    /// the canonical element; `len == 0` means "whatever the canonical
    /// length is".
    pub fn for_len(self: &Arc<Self>, len: u16) -> Arc<InfoElement> {
        if len == self.len || len == 0 {
            return Arc::clone(self);
        }
        let mut reduced = self.reduced.lock().expect("info element sibling cache poisoned");
        Arc::clone(reduced.entry(len).or_insert_with(|| {
            Arc::new(InfoElement::new(
                self.name.clone(),
                self.pen,
                self.number,
                self.ietype,
                len,
            ))
        }))
    }

    /// Renders `name(pen/number)<type>[len]`, the textual form accepted by
    /// [`parse_iespec`](crate::parse_iespec).
    pub fn to_spec(&self) -> String {
        let len = if self.is_varlen() {
            "v".to_string()
        } else {
            self.len.to_string()
        };
        if self.pen == 0 {
            format!("{}({})<{}>[{}]", self.name, self.number, self.ietype, len)
        } else {
            format!(
                "{}({}/{})<{}>[{}]",
                self.name, self.pen, self.number, self.ietype, len
            )
        }
    }
}

impl PartialEq for InfoElement {
    fn eq(&self, other: &Self) -> bool {
        self.pen == other.pen
            && self.number == other.number
            && self.ietype == other.ietype
            && self.len == other.len
            && self.name == other.name
    }
}

impl Eq for InfoElement {}

impl std::fmt::Display for InfoElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_spec())
    }
}
