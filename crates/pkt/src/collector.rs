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

//! The user-facing collection API: implement [`PlacementCollector`], wire
//! it into a [`PlacementPipeline`] together with placement templates, and
//! feed the pipeline a byte stream.

use std::{io::Read, rc::Rc, sync::Arc};

use flowplace_model::InfoModel;

use crate::{
    error::ErrorContext,
    handler::{MessageHeader, PlacementContentHandler, WireTemplateRegistry},
    parser::{IpfixMessageStreamParser, V5MessageStreamParser, V9MessageStreamParser},
    placement::PlacementTemplate,
};

/// The protocol an input stream speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ipfix,
    NetflowV9,
    NetflowV5,
}

/// What to do after [`PlacementCollector::unhandled_data_set`] ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnhandledAction {
    /// Skip the data set.
    Skip,
    /// The handler installed a template; look the set's template up once
    /// more.
    Again,
}

/// A consumer of decoded records.
///
/// `start_placement` and `end_placement` bracket the window in which the
/// destinations of the given placement template are written; read the
/// destination cells in `end_placement`. The same collector serves every
/// placement template registered with the pipeline; distinguish templates
/// with [`Rc::ptr_eq`].
pub trait PlacementCollector {
    /// A message header was accepted. `base_time` is nonzero only for the
    /// NetFlow protocols.
    fn start_message(&mut self, header: &MessageHeader) -> Result<(), ErrorContext> {
        let _ = header;
        Ok(())
    }

    /// A record matching `template` is about to be decoded.
    fn start_placement(&mut self, template: &Rc<PlacementTemplate>) -> Result<(), ErrorContext>;

    /// The record has been decoded; the destinations hold its values.
    fn end_placement(&mut self, template: &Rc<PlacementTemplate>) -> Result<(), ErrorContext>;

    /// Called for data sets with no known wire template, when enabled via
    /// [`PlacementPipeline::deliver_unhandled_data_sets`]. May install a
    /// template into `registry` and return [`UnhandledAction::Again`] to
    /// have the lookup retried once.
    fn unhandled_data_set(
        &mut self,
        registry: &mut WireTemplateRegistry,
        domain: u32,
        set_id: u16,
        payload: &[u8],
    ) -> Result<UnhandledAction, ErrorContext> {
        let _ = (registry, domain, set_id, payload);
        Ok(UnhandledAction::Skip)
    }
}

/// One decoding pipeline: a protocol-specific message stream parser
/// driving a [`PlacementContentHandler`] that decodes into the registered
/// placement templates and reports records to collector `C`.
///
/// Pipelines are independent of each other; only the
/// [`InfoModel`] may be shared between them.
#[derive(Debug)]
pub struct PlacementPipeline<C> {
    protocol: Protocol,
    handler: PlacementContentHandler<C>,
}

impl<C: PlacementCollector> PlacementPipeline<C> {
    /// A pipeline over the process-wide shared information model.
    pub fn new(protocol: Protocol, collector: C) -> Self {
        Self::with_model(protocol, Arc::clone(InfoModel::shared()), collector)
    }

    /// A pipeline over an explicit information model.
    pub fn with_model(protocol: Protocol, model: Arc<InfoModel>, collector: C) -> Self {
        Self {
            protocol,
            handler: PlacementContentHandler::new(model, collector),
        }
    }

    pub fn register_placement_template(&mut self, template: Rc<PlacementTemplate>) {
        self.handler.register_placement_template(template);
    }

    /// See [`PlacementContentHandler::use_matched_template_cache`].
    pub fn use_matched_template_cache(&mut self, enabled: bool) {
        self.handler.use_matched_template_cache(enabled);
    }

    /// See [`PlacementContentHandler::deliver_unhandled_data_sets`].
    pub fn deliver_unhandled_data_sets(&mut self, enabled: bool) {
        self.handler.deliver_unhandled_data_sets(enabled);
    }

    pub fn collector(&self) -> &C {
        self.handler.collector()
    }

    pub fn collector_mut(&mut self) -> &mut C {
        self.handler.collector_mut()
    }

    pub fn into_collector(self) -> C {
        self.handler.into_collector()
    }

    /// Parses `input` to the end of the stream or the first fatal error.
    /// Template state survives across calls, so message streams arriving
    /// in pieces (one datagram at a time, say) can be fed through repeated
    /// `collect` calls.
    pub fn collect<R: Read>(&mut self, input: R) -> Result<(), ErrorContext> {
        match self.protocol {
            Protocol::Ipfix => {
                IpfixMessageStreamParser::new().parse(input, &mut self.handler)
            }
            Protocol::NetflowV9 => {
                V9MessageStreamParser::new().parse(input, &mut self.handler)
            }
            Protocol::NetflowV5 => {
                V5MessageStreamParser::new().parse(input, &mut self.handler)
            }
        }
    }
}
