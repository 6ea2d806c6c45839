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

//! Caller declarations of *which* fields to decode and *where* to put them.
//!
//! A [`PlacementTemplate`] is an ordered mapping from information elements
//! to destination cells. The caller keeps clones of the cells; between the
//! `start_placement` and `end_placement` callbacks the pipeline writes the
//! current record's values into them, and in `end_placement` the caller
//! reads them out.

use flowplace_model::{IEType, IETemplate, InfoElement};
use serde::{Deserialize, Serialize};
use std::{
    cell::{Cell, RefCell},
    net::{Ipv4Addr, Ipv6Addr},
    rc::Rc,
    sync::Arc,
};

/// Growable byte storage for octetArray and string values. Contents are
/// replaced wholesale on every record; capacity is retained across
/// records.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctetBuffer {
    data: Vec<u8>,
}

impl OctetBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_content(&mut self, content: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(content);
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

/// A typed destination cell. This is the memory location a decoded value is
/// written to; the variant must fit the information element's abstract
/// type (see [`DecodeTarget::accepts`]).
///
/// The four datetime types decode into their natural integer cells
/// (`U32` for dateTimeSeconds, `U64` for the sub-second types), and an
/// ipv4Address may alternatively be taken as a host-order `U32`.
#[derive(Debug, Clone)]
pub enum DecodeTarget {
    U8(Rc<Cell<u8>>),
    U16(Rc<Cell<u16>>),
    U32(Rc<Cell<u32>>),
    U64(Rc<Cell<u64>>),
    I8(Rc<Cell<i8>>),
    I16(Rc<Cell<i16>>),
    I32(Rc<Cell<i32>>),
    I64(Rc<Cell<i64>>),
    F32(Rc<Cell<f32>>),
    F64(Rc<Cell<f64>>),
    Bool(Rc<Cell<bool>>),
    Mac(Rc<Cell<[u8; 6]>>),
    Ipv4(Rc<Cell<Ipv4Addr>>),
    Ipv6(Rc<Cell<Ipv6Addr>>),
    Octets(Rc<RefCell<OctetBuffer>>),
}

impl DecodeTarget {
    /// Whether a value of abstract type `ietype` can be decoded into this
    /// cell.
    pub fn accepts(&self, ietype: IEType) -> bool {
        match self {
            Self::U8(_) => ietype == IEType::unsigned8,
            Self::U16(_) => ietype == IEType::unsigned16,
            Self::U32(_) => matches!(
                ietype,
                IEType::unsigned32 | IEType::dateTimeSeconds | IEType::ipv4Address
            ),
            Self::U64(_) => matches!(
                ietype,
                IEType::unsigned64
                    | IEType::dateTimeMilliseconds
                    | IEType::dateTimeMicroseconds
                    | IEType::dateTimeNanoseconds
            ),
            Self::I8(_) => ietype == IEType::signed8,
            Self::I16(_) => ietype == IEType::signed16,
            Self::I32(_) => ietype == IEType::signed32,
            Self::I64(_) => ietype == IEType::signed64,
            Self::F32(_) => ietype == IEType::float32,
            Self::F64(_) => ietype == IEType::float64,
            Self::Bool(_) => ietype == IEType::boolean,
            Self::Mac(_) => ietype == IEType::macAddress,
            Self::Ipv4(_) => ietype == IEType::ipv4Address,
            Self::Ipv6(_) => ietype == IEType::ipv6Address,
            Self::Octets(_) => matches!(ietype, IEType::octetArray | IEType::string),
        }
    }

    /// Size in octets of the destination the cell stands for.
    pub fn destination_size(&self) -> Option<usize> {
        match self {
            Self::U8(_) | Self::I8(_) | Self::Bool(_) => Some(1),
            Self::U16(_) | Self::I16(_) => Some(2),
            Self::U32(_) | Self::I32(_) | Self::F32(_) | Self::Ipv4(_) => Some(4),
            Self::U64(_) | Self::I64(_) | Self::F64(_) => Some(8),
            Self::Mac(_) => Some(6),
            Self::Ipv6(_) => Some(16),
            Self::Octets(_) => None,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bool(_) => "bool",
            Self::Mac(_) => "mac",
            Self::Ipv4(_) => "ipv4",
            Self::Ipv6(_) => "ipv6",
            Self::Octets(_) => "octets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The destination cell's type does not fit the element's type.
    IncompatibleTarget { spec: String, target: &'static str },
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompatibleTarget { spec, target } => {
                write!(f, "IE {spec} cannot be placed into a {target} destination")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

#[derive(Debug, Clone)]
pub(crate) struct PlacementEntry {
    pub(crate) ie: Arc<InfoElement>,
    pub(crate) target: DecodeTarget,
}

/// An ordered mapping from information elements to destination cells.
///
/// A placement template *matches* a wire template when every element
/// registered here appears in the wire template (by pen and element id;
/// lengths do not take part). The match score is the number of registered
/// elements, so any successful match covers the whole placement.
#[derive(Debug, Default, Clone)]
pub struct PlacementTemplate {
    entries: Vec<PlacementEntry>,
}

impl PlacementTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that values of `ie` should be decoded into `target`.
    /// Registering the same element twice replaces the earlier
    /// destination.
    pub fn register_placement(
        &mut self,
        ie: &Arc<InfoElement>,
        target: DecodeTarget,
    ) -> Result<(), PlacementError> {
        if !target.accepts(ie.ietype()) {
            return Err(PlacementError::IncompatibleTarget {
                spec: ie.to_spec(),
                target: target.kind_name(),
            });
        }
        let entry = PlacementEntry {
            ie: Arc::clone(ie),
            target,
        };
        match self.entries.iter_mut().find(|e| e.ie.matches(ie)) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
        Ok(())
    }

    /// The destination registered for an element matching `ie`, if any.
    pub(crate) fn lookup_placement(&self, ie: &InfoElement) -> Option<&PlacementEntry> {
        self.entries.iter().find(|entry| entry.ie.matches(ie))
    }

    /// Number of placed elements.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter_elements(&self) -> impl Iterator<Item = &Arc<InfoElement>> {
        self.entries.iter().map(|entry| &entry.ie)
    }

    /// Match score against a wire template: the number of placed elements
    /// if all of them appear in `wire`, 0 otherwise. On a successful
    /// partial cover, `unmatched` receives the wire elements this
    /// placement does not decode.
    pub fn is_match(&self, wire: &IETemplate, unmatched: &mut Vec<Arc<InfoElement>>) -> u32 {
        unmatched.clear();
        if !self.entries.iter().all(|entry| wire.contains(&entry.ie)) {
            return 0;
        }
        for ie in wire {
            if self.lookup_placement(ie).is_none() {
                unmatched.push(Arc::clone(ie));
            }
        }
        self.entries.len() as u32
    }
}
