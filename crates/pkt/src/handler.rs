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

//! The content-handler layer between message framing and record decoding.
//!
//! Message stream parsers frame messages and sets and hand set payloads to
//! a [`ContentHandler`]. The [`PlacementContentHandler`] implementation
//! builds wire templates out of template sets, maintains the per-stream
//! template registry, matches data sets against the registered placement
//! templates, and runs the compiled decode plan over each record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
    sync::Arc,
};
use tracing::{debug, trace, warn};

use flowplace_model::{IETemplate, InfoModel};

use crate::{
    collector::{PlacementCollector, UnhandledAction},
    error::{ErrorContext, ErrorKind, Severity},
    placement::PlacementTemplate,
    plan::DecodePlan,
    span::Span,
};

/// Template and options-template record headers (IPFIX set layout).
const TEMPLATE_RECORD_HEADER_LENGTH: usize = 4;
const OPTIONS_TEMPLATE_RECORD_HEADER_LENGTH: usize = 6;

/// Minimum length of a useful IPFIX message: header plus one set header.
const IPFIX_MIN_MESSAGE_LENGTH: usize = 20;

const ENTERPRISE_BIT: u16 = 0x8000;

/// Everything a message header carries, normalized across protocols.
/// `base_time` is zero for IPFIX and the exporter boot time in
/// milliseconds since the epoch for NetFlow v9/v5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageHeader {
    pub version: u16,
    pub length: usize,
    pub export_time: DateTime<Utc>,
    pub sequence_number: u32,
    pub observation_domain: u32,
    pub base_time: u64,
}

/// Callbacks a message stream parser drives while walking a message.
/// Payload spans carry message-relative offsets, so errors constructed
/// from them point at the right octet.
pub trait ContentHandler {
    fn start_session(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_message(&mut self, header: &MessageHeader) -> Result<(), ErrorContext>;

    fn end_message(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_template_set(&mut self, set_id: u16, payload: Span<'_>)
        -> Result<(), ErrorContext>;

    fn end_template_set(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_options_template_set(
        &mut self,
        set_id: u16,
        payload: Span<'_>,
    ) -> Result<(), ErrorContext>;

    fn end_options_template_set(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn start_data_set(&mut self, set_id: u16, payload: Span<'_>) -> Result<(), ErrorContext>;

    fn end_data_set(&mut self) -> Result<(), ErrorContext> {
        Ok(())
    }
}

/// Registry key for a wire template: template ids are only unique within
/// an observation domain.
pub const fn template_key(domain: u32, template_id: u16) -> u64 {
    ((domain as u64) << 16) | template_id as u64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// No template was registered under this key before.
    New,
    /// An identical template is already registered; the old one stays.
    Duplicate,
    /// A different template was registered and has been replaced.
    Replaced,
}

/// Wire templates currently live in one stream, keyed by
/// (observation domain, template id).
#[derive(Debug, Default)]
pub struct WireTemplateRegistry {
    templates: HashMap<u64, Arc<IETemplate>>,
}

impl WireTemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, domain: u32, template_id: u16) -> Option<&Arc<IETemplate>> {
        self.templates.get(&template_key(domain, template_id))
    }

    /// Installs `template` under (domain, template_id). An identical
    /// existing template is kept (so its identity, and everything cached
    /// against it, survives); a differing one is replaced.
    pub fn install(&mut self, domain: u32, template_id: u16, template: IETemplate) -> InstallOutcome {
        match self.templates.entry(template_key(domain, template_id)) {
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(Arc::new(template));
                InstallOutcome::New
            }
            std::collections::hash_map::Entry::Occupied(mut entry) => {
                if **entry.get() == template {
                    InstallOutcome::Duplicate
                } else {
                    entry.insert(Arc::new(template));
                    InstallOutcome::Replaced
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// The placement-decoding content handler.
///
/// Owns the per-stream state: the wire-template registry, the registered
/// placement templates with their collector, the matched-template cache,
/// and the warn-once bookkeeping for unmatched and partially matched
/// template ids.
#[derive(Debug)]
pub struct PlacementContentHandler<C> {
    model: Arc<InfoModel>,
    collector: C,
    placements: Vec<Rc<PlacementTemplate>>,
    registry: WireTemplateRegistry,
    matched: HashMap<u64, Rc<PlacementTemplate>>,
    use_matched_cache: bool,
    deliver_unhandled: bool,
    unmatched_template_ids: HashSet<u64>,
    incomplete_template_ids: HashSet<u64>,
    observation_domain: u32,
}

impl<C: PlacementCollector> PlacementContentHandler<C> {
    pub fn new(model: Arc<InfoModel>, collector: C) -> Self {
        Self {
            model,
            collector,
            placements: Vec::new(),
            registry: WireTemplateRegistry::new(),
            matched: HashMap::new(),
            use_matched_cache: false,
            deliver_unhandled: false,
            unmatched_template_ids: HashSet::new(),
            incomplete_template_ids: HashSet::new(),
            observation_domain: 0,
        }
    }

    pub fn register_placement_template(&mut self, template: Rc<PlacementTemplate>) {
        self.placements.push(template);
    }

    /// Caches the placement matched for a wire template, so repeated data
    /// sets skip the match scan. Replaced templates drop their cache
    /// entry.
    pub fn use_matched_template_cache(&mut self, enabled: bool) {
        self.use_matched_cache = enabled;
    }

    /// Routes data sets without a known wire template to the collector's
    /// `unhandled_data_set` instead of silently skipping them.
    pub fn deliver_unhandled_data_sets(&mut self, enabled: bool) {
        self.deliver_unhandled = enabled;
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut C {
        &mut self.collector
    }

    pub fn into_collector(self) -> C {
        self.collector
    }

    pub fn registry(&self) -> &WireTemplateRegistry {
        &self.registry
    }

    /// Parses every template record in a template set and installs the
    /// resulting wire templates.
    fn process_template_set(
        &mut self,
        payload: Span<'_>,
        is_options_set: bool,
    ) -> Result<(), ErrorContext> {
        let header_length = if is_options_set {
            OPTIONS_TEMPLATE_RECORD_HEADER_LENGTH
        } else {
            TEMPLATE_RECORD_HEADER_LENGTH
        };
        let mut cur = payload;
        while cur.len() >= header_length {
            cur = self.process_template_record(cur, is_options_set)?;
        }
        Ok(())
    }

    fn process_template_record<'a>(
        &mut self,
        record: Span<'a>,
        is_options_set: bool,
    ) -> Result<Span<'a>, ErrorContext> {
        let truncated = |at: Span<'_>| {
            ErrorContext::recoverable(
                ErrorKind::LongFieldspec,
                at.location_offset(),
                "field specifier partly outside template record",
            )
        };

        let Some((cur, template_id)) = record.read_u16() else {
            return Err(truncated(record));
        };
        let Some((mut cur, field_count)) = cur.read_u16() else {
            return Err(truncated(cur));
        };
        if is_options_set {
            let Some((rest, scope_field_count)) = cur.read_u16() else {
                return Err(truncated(cur));
            };
            if scope_field_count > field_count {
                return Err(ErrorContext::recoverable(
                    ErrorKind::FormatError,
                    cur.location_offset(),
                    format!(
                        "scope field count {scope_field_count} exceeds field count {field_count}"
                    ),
                ));
            }
            // Scope fields are decoded like ordinary fields, so beyond the
            // count check the distinction does not matter here.
            cur = rest;
        }

        let mut wire = IETemplate::new();
        for _ in 0..field_count {
            let Some((rest, raw_id)) = cur.read_u16() else {
                return Err(truncated(cur));
            };
            let Some((rest, ie_length)) = rest.read_u16() else {
                return Err(truncated(rest));
            };
            let (rest, pen) = if raw_id & ENTERPRISE_BIT != 0 {
                let Some((rest, pen)) = rest.read_u32() else {
                    return Err(truncated(rest));
                };
                (rest, pen)
            } else {
                (rest, 0)
            };
            let ie_id = raw_id & !ENTERPRISE_BIT;
            let ie = match self.model.lookup(pen, ie_id, ie_length) {
                Some(ie) => ie,
                None => self.model.add_unknown(pen, ie_id, ie_length),
            };
            trace!(field = %ie.to_spec(), "template field");
            wire.add(ie);
            cur = rest;
        }

        self.install_template(template_id, wire);
        Ok(cur)
    }

    fn install_template(&mut self, template_id: u16, wire: IETemplate) {
        if wire.is_empty() {
            return;
        }
        let domain = self.observation_domain;
        let key = template_key(domain, template_id);
        let fields = wire.len();
        match self.registry.install(domain, template_id, wire) {
            InstallOutcome::New => {
                debug!(domain, template_id, fields, "new wire template");
            }
            InstallOutcome::Duplicate => {
                trace!(domain, template_id, "duplicate wire template, keeping old");
            }
            InstallOutcome::Replaced => {
                warn!(domain, template_id, "overwriting wire template");
                self.matched.remove(&key);
                self.incomplete_template_ids.remove(&key);
            }
        }
    }

    /// Finds the wire template a data set refers to, giving the collector
    /// one chance to install a missing one. `None` means the set should
    /// be skipped.
    fn data_set_wire_template(
        &mut self,
        set_id: u16,
        payload: Span<'_>,
    ) -> Result<Option<Arc<IETemplate>>, ErrorContext> {
        let domain = self.observation_domain;
        if let Some(wire) = self.registry.lookup(domain, set_id) {
            return Ok(Some(Arc::clone(wire)));
        }
        if self.deliver_unhandled {
            let action = self.collector.unhandled_data_set(
                &mut self.registry,
                domain,
                set_id,
                payload.fragment(),
            )?;
            if action == UnhandledAction::Again {
                if let Some(wire) = self.registry.lookup(domain, set_id) {
                    return Ok(Some(Arc::clone(wire)));
                }
            }
        }
        if self.unmatched_template_ids.insert(template_key(domain, set_id)) {
            warn!(
                domain,
                template_id = set_id,
                "no wire template for data set, skipping (reported once)"
            );
        }
        Ok(None)
    }

    /// First placement template whose elements all occur in `wire`.
    /// Partial covers are reported once per template key.
    fn match_placement_template(
        &mut self,
        set_id: u16,
        wire: &IETemplate,
    ) -> Option<Rc<PlacementTemplate>> {
        let key = template_key(self.observation_domain, set_id);
        if self.use_matched_cache {
            if let Some(placement) = self.matched.get(&key) {
                return Some(Rc::clone(placement));
            }
        }
        let mut unmatched = Vec::new();
        for placement in &self.placements {
            let n_matches = placement.is_match(wire, &mut unmatched);
            if n_matches == 0 {
                continue;
            }
            if (n_matches as usize) < wire.len() && self.incomplete_template_ids.insert(key) {
                let missing: Vec<String> = unmatched.iter().map(|ie| ie.to_spec()).collect();
                warn!(
                    domain = self.observation_domain,
                    template_id = set_id,
                    unmatched = %missing.join(", "),
                    "placement match is incomplete (reported once)"
                );
            }
            self.matched.insert(key, Rc::clone(placement));
            return Some(Rc::clone(placement));
        }
        None
    }
}

impl<C: PlacementCollector> ContentHandler for PlacementContentHandler<C> {
    fn start_message(&mut self, header: &MessageHeader) -> Result<(), ErrorContext> {
        if header.version == crate::parser::ipfix::IPFIX_VERSION {
            if header.base_time != 0 {
                return Err(ErrorContext::fatal(
                    ErrorKind::IpfixBasetime,
                    0,
                    format!("expected base time 0 for IPFIX, got {:#x}", header.base_time),
                ));
            }
            if header.length < IPFIX_MIN_MESSAGE_LENGTH {
                return Err(ErrorContext::fatal(
                    ErrorKind::ShortMessage,
                    0,
                    format!(
                        "must be at least {IPFIX_MIN_MESSAGE_LENGTH} octets long, got {}",
                        header.length
                    ),
                ));
            }
        }
        self.observation_domain = header.observation_domain;
        self.collector.start_message(header)
    }

    fn start_template_set(
        &mut self,
        set_id: u16,
        payload: Span<'_>,
    ) -> Result<(), ErrorContext> {
        trace!(set_id, length = payload.len(), "template set");
        match self.process_template_set(payload, false) {
            Err(err) if err.severity() == Severity::Recoverable => {
                warn!(error = %err, "skipping rest of malformed template set");
                Ok(())
            }
            other => other,
        }
    }

    fn start_options_template_set(
        &mut self,
        set_id: u16,
        payload: Span<'_>,
    ) -> Result<(), ErrorContext> {
        trace!(set_id, length = payload.len(), "options template set");
        match self.process_template_set(payload, true) {
            Err(err) if err.severity() == Severity::Recoverable => {
                warn!(error = %err, "skipping rest of malformed options template set");
                Ok(())
            }
            other => other,
        }
    }

    fn start_data_set(&mut self, set_id: u16, payload: Span<'_>) -> Result<(), ErrorContext> {
        trace!(set_id, length = payload.len(), "data set");
        let Some(wire) = self.data_set_wire_template(set_id, payload)? else {
            return Ok(());
        };
        let Some(placement) = self.match_placement_template(set_id, &wire) else {
            trace!(set_id, "no placement interested in this data set, skipping");
            return Ok(());
        };

        let plan = DecodePlan::compile(&placement, &wire)?;
        let min_length = wire.minlen();
        let mut cur = payload;
        while !cur.is_empty() && cur.len() >= min_length {
            self.collector.start_placement(&placement)?;
            let consumed = plan.execute(cur)?;
            self.collector.end_placement(&placement)?;
            if consumed == 0 {
                return Err(ErrorContext::fatal(
                    ErrorKind::InconsistentState,
                    cur.location_offset(),
                    "decode plan consumed no octets",
                ));
            }
            match cur.take_bytes(consumed) {
                Some((rest, _)) => cur = rest,
                None => break,
            }
        }
        Ok(())
    }
}
