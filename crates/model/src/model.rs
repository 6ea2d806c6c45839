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

use std::{
    collections::HashMap,
    sync::{Arc, OnceLock, RwLock},
};

use tracing::debug;

use crate::{
    iana,
    ie::{IEType, InfoElement},
    iespec::{parse_iespec, IESpecError},
};

#[derive(Debug, Default)]
struct Registry {
    by_id: HashMap<(u32, u16), Arc<InfoElement>>,
    by_name: HashMap<String, Arc<InfoElement>>,
}

/// A registry of canonical [`InfoElement`] descriptors, keyed by
/// (pen, element id) and by name.
///
/// The registry only grows: descriptors are never removed, and the `Arc`s
/// it hands out stay valid for the model's lifetime, so templates and
/// placements can rely on pointer identity. Lookups take a read lock;
/// installations (including on-demand unknowns) take the write lock.
///
/// Most programs use one model per process via [`InfoModel::shared`], but a
/// model is an ordinary value and tests routinely build isolated ones.
#[derive(Debug, Default)]
pub struct InfoModel {
    registry: RwLock<Registry>,
}

impl InfoModel {
    /// An empty model with no registered elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// A model pre-loaded with the bundled IANA registry.
    pub fn with_default_registry() -> Self {
        let model = Self::new();
        model.load_default_ipfix_registry();
        model
    }

    /// The process-wide default model, IANA registry loaded.
    pub fn shared() -> &'static Arc<InfoModel> {
        static SHARED: OnceLock<Arc<InfoModel>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(InfoModel::with_default_registry()))
    }

    /// Loads the bundled IANA registry table. Idempotent.
    pub fn load_default_ipfix_registry(&self) {
        for &(name, number, ietype, len) in iana::DEFAULT_IPFIX_REGISTRY {
            self.add(InfoElement::new(name, 0, number, ietype, len));
        }
    }

    /// Installs `ie` as the canonical descriptor for its (pen, number),
    /// returning the shared handle. If a canonical descriptor already
    /// exists, the existing one (adjusted to `ie`'s length) is returned and
    /// the argument is dropped.
    pub fn add(&self, ie: InfoElement) -> Arc<InfoElement> {
        let mut registry = self.registry.write().expect("info model lock poisoned");
        if let Some(canonical) = registry.by_id.get(&(ie.pen(), ie.number())) {
            return canonical.for_len(ie.len());
        }
        let canonical = Arc::new(ie);
        registry
            .by_id
            .insert((canonical.pen(), canonical.number()), Arc::clone(&canonical));
        registry
            .by_name
            .entry(canonical.name().to_string())
            .or_insert_with(|| Arc::clone(&canonical));
        canonical
    }

    /// Parses a full textual IE spec and installs it.
    pub fn add_spec(&self, spec: &str) -> Result<Arc<InfoElement>, IESpecError> {
        let parsed = parse_iespec(spec)?;
        let number = parsed
            .number
            .ok_or_else(|| IESpecError::MissingNumber(spec.to_string()))?;
        let ietype = parsed
            .ietype
            .ok_or_else(|| IESpecError::MissingType(spec.to_string()))?;
        let len = parsed.len.unwrap_or_else(|| ietype.default_wire_size());
        Ok(self.add(InfoElement::new(parsed.name, parsed.pen, number, ietype, len)))
    }

    /// Installs an octetArray placeholder for an element that appeared in a
    /// template but is not in the registry. The placeholder is permanent
    /// and named `__ipfix_<pen>_<number>`.
    pub fn add_unknown(&self, pen: u32, number: u16, len: u16) -> Arc<InfoElement> {
        debug!(pen, number, len, "registering unknown information element");
        self.add(InfoElement::new(
            format!("__ipfix_{pen}_{number}"),
            pen,
            number,
            IEType::octetArray,
            len,
        ))
    }

    /// Looks up (pen, number) and returns the descriptor for wire length
    /// `len` (`0` for the canonical length).
    pub fn lookup(&self, pen: u32, number: u16, len: u16) -> Option<Arc<InfoElement>> {
        let registry = self.registry.read().expect("info model lock poisoned");
        registry.by_id.get(&(pen, number)).map(|ie| ie.for_len(len))
    }

    /// Looks up an element by name, returning its canonical-length
    /// descriptor.
    pub fn lookup_name(&self, name: &str) -> Option<Arc<InfoElement>> {
        let registry = self.registry.read().expect("info model lock poisoned");
        registry.by_name.get(name).map(Arc::clone)
    }

    /// Looks up an element through a textual IE spec, by id when the spec
    /// carries one and by name otherwise.
    pub fn lookup_spec(&self, spec: &str) -> Result<Option<Arc<InfoElement>>, IESpecError> {
        let parsed = parse_iespec(spec)?;
        let found = match parsed.number {
            Some(number) => self.lookup(parsed.pen, number, parsed.len.unwrap_or(0)),
            None => {
                let canonical = self.lookup_name(&parsed.name);
                match parsed.len {
                    Some(len) => canonical.map(|ie| ie.for_len(len)),
                    None => canonical,
                }
            }
        };
        Ok(found)
    }
}
