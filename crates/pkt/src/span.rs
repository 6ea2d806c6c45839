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

//! A byte span that remembers its offset within the enclosing message.
//!
//! This is the binary cousin of `nom_locate`'s `LocatedSpan`, without line
//! and column bookkeeping: wire formats only ever need the octet offset,
//! and that offset is what error contexts report. The span implements the
//! nom input traits, so the usual `be_u16`-style combinators run on it
//! directly.

use nom::{
    number::complete::{be_u16, be_u32, be_u8},
    AsBytes, InputIter, InputLength, InputTake, Needed, Offset, Slice,
};
use std::{
    iter::{Copied, Enumerate},
    ops::{Range, RangeFrom, RangeTo},
    slice::Iter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    offset: usize,
    fragment: &'a [u8],
}

impl<'a> Span<'a> {
    pub const fn new(fragment: &'a [u8]) -> Self {
        Self {
            offset: 0,
            fragment,
        }
    }

    /// A span whose first byte sits `offset` octets into the enclosing
    /// message.
    pub const fn new_at(offset: usize, fragment: &'a [u8]) -> Self {
        Self { offset, fragment }
    }

    #[inline]
    pub const fn location_offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub const fn fragment(&self) -> &'a [u8] {
        self.fragment
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.fragment.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.fragment.is_empty()
    }

    /// Splits off the first `count` octets, or `None` if the span is
    /// shorter than that. Returns `(rest, taken)`.
    #[inline]
    pub fn take_bytes(self, count: usize) -> Option<(Span<'a>, &'a [u8])> {
        if self.fragment.len() < count {
            return None;
        }
        let (taken, rest) = self.fragment.split_at(count);
        Some((Span::new_at(self.offset + count, rest), taken))
    }

    /// Like [`Self::take_bytes`], but the taken prefix keeps its offset.
    #[inline]
    pub fn take_span(self, count: usize) -> Option<(Span<'a>, Span<'a>)> {
        let (rest, taken) = self.take_bytes(count)?;
        Some((rest, Span::new_at(self.offset, taken)))
    }

    #[inline]
    pub fn read_u8(self) -> Option<(Span<'a>, u8)> {
        be_u8::<_, nom::error::Error<Span<'a>>>(self).ok()
    }

    #[inline]
    pub fn read_u16(self) -> Option<(Span<'a>, u16)> {
        be_u16::<_, nom::error::Error<Span<'a>>>(self).ok()
    }

    #[inline]
    pub fn read_u32(self) -> Option<(Span<'a>, u32)> {
        be_u32::<_, nom::error::Error<Span<'a>>>(self).ok()
    }
}

impl AsBytes for Span<'_> {
    #[inline]
    fn as_bytes(&self) -> &[u8] {
        self.fragment
    }
}

impl InputLength for Span<'_> {
    #[inline]
    fn input_len(&self) -> usize {
        self.fragment.len()
    }
}

impl<'a> InputIter for Span<'a> {
    type Item = u8;
    type Iter = Enumerate<Self::IterElem>;
    type IterElem = Copied<Iter<'a, u8>>;

    #[inline]
    fn iter_indices(&self) -> Self::Iter {
        self.iter_elements().enumerate()
    }

    #[inline]
    fn iter_elements(&self) -> Self::IterElem {
        self.fragment.iter().copied()
    }

    #[inline]
    fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(Self::Item) -> bool,
    {
        self.fragment.iter().position(|b| predicate(*b))
    }

    #[inline]
    fn slice_index(&self, count: usize) -> Result<usize, Needed> {
        if self.fragment.len() >= count {
            Ok(count)
        } else {
            Err(Needed::new(count - self.fragment.len()))
        }
    }
}

impl Slice<RangeFrom<usize>> for Span<'_> {
    #[inline]
    fn slice(&self, range: RangeFrom<usize>) -> Self {
        Span::new_at(self.offset + range.start, &self.fragment[range])
    }
}

impl Slice<RangeTo<usize>> for Span<'_> {
    #[inline]
    fn slice(&self, range: RangeTo<usize>) -> Self {
        Span::new_at(self.offset, &self.fragment[range])
    }
}

impl Slice<Range<usize>> for Span<'_> {
    #[inline]
    fn slice(&self, range: Range<usize>) -> Self {
        Span::new_at(self.offset + range.start, &self.fragment[range])
    }
}

impl InputTake for Span<'_> {
    #[inline]
    fn take(&self, count: usize) -> Self {
        self.slice(..count)
    }

    #[inline]
    fn take_split(&self, count: usize) -> (Self, Self) {
        (self.slice(count..), self.slice(..count))
    }
}

impl Offset for Span<'_> {
    #[inline]
    fn offset(&self, second: &Self) -> usize {
        second.offset - self.offset
    }
}
