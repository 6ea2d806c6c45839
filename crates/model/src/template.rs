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

use serde::Serialize;
use std::sync::Arc;

use crate::ie::{InfoElement, VARLEN};

/// An ordered sequence of information elements, as carried by one template
/// record on the wire.
///
/// Equality is element-wise pointer identity: two templates are equal only
/// if they reference the same canonical descriptors, in the same order.
/// `minlen` is maintained incrementally; a variable-length element
/// contributes 1 octet (its shortest length encoding).
#[derive(Debug, Default, Clone, Serialize)]
pub struct IETemplate {
    ies: Vec<Arc<InfoElement>>,
    minlen: usize,
}

impl IETemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ie: Arc<InfoElement>) {
        self.minlen += if ie.len() == VARLEN { 1 } else { ie.len() as usize };
        self.ies.push(ie);
    }

    /// Number of elements in the template.
    pub fn len(&self) -> usize {
        self.ies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ies.is_empty()
    }

    /// Minimum encoded length of a record described by this template.
    pub const fn minlen(&self) -> usize {
        self.minlen
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<InfoElement>> {
        self.ies.iter()
    }

    /// Whether the template carries an element matching `ie` by
    /// (pen, number).
    pub fn contains(&self, ie: &InfoElement) -> bool {
        self.ies.iter().any(|member| member.matches(ie))
    }
}

impl PartialEq for IETemplate {
    fn eq(&self, other: &Self) -> bool {
        self.ies.len() == other.ies.len()
            && self
                .ies
                .iter()
                .zip(other.ies.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl Eq for IETemplate {}

impl<'a> IntoIterator for &'a IETemplate {
    type Item = &'a Arc<InfoElement>;
    type IntoIter = std::slice::Iter<'a, Arc<InfoElement>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ies.iter()
    }
}
