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

//! Streaming IPFIX (RFC 7011) and NetFlow v9/v5 decoding into caller-owned
//! destinations.
//!
//! Instead of materializing every record, callers declare up front which
//! information elements they care about and where each decoded value should
//! land (a [`PlacementTemplate`] over typed destination cells). Incoming
//! wire templates are matched against those declarations, each match is
//! compiled into a linear [`plan::DecodePlan`], and the plan is executed
//! once per record with `start_placement`/`end_placement` callbacks
//! bracketing every freshly decoded record.
//!
//! ```no_run
//! use flowplace_pkt::{
//!     DecodeTarget, PlacementCollector, PlacementPipeline, PlacementTemplate, Protocol,
//! };
//! use flowplace_model::InfoModel;
//! use std::{cell::Cell, net::Ipv4Addr, rc::Rc, sync::Arc};
//!
//! struct Printer {
//!     source: Rc<Cell<Ipv4Addr>>,
//! }
//!
//! impl PlacementCollector for Printer {
//!     fn start_placement(
//!         &mut self,
//!         _: &Rc<PlacementTemplate>,
//!     ) -> Result<(), flowplace_pkt::ErrorContext> {
//!         Ok(())
//!     }
//!     fn end_placement(
//!         &mut self,
//!         _: &Rc<PlacementTemplate>,
//!     ) -> Result<(), flowplace_pkt::ErrorContext> {
//!         println!("source address {}", self.source.get());
//!         Ok(())
//!     }
//! }
//!
//! let model = Arc::clone(InfoModel::shared());
//! let source = Rc::new(Cell::new(Ipv4Addr::UNSPECIFIED));
//! let mut template = PlacementTemplate::new();
//! template
//!     .register_placement(
//!         &model.lookup(0, 8, 0).unwrap(),
//!         DecodeTarget::Ipv4(Rc::clone(&source)),
//!     )
//!     .unwrap();
//!
//! let mut pipeline = PlacementPipeline::new(Protocol::Ipfix, Printer { source });
//! pipeline.register_placement_template(Rc::new(template));
//! pipeline.collect(std::io::stdin().lock()).unwrap();
//! ```

pub mod codec;
pub mod collector;
pub mod error;
pub mod handler;
pub mod parser;
pub mod placement;
pub mod plan;
pub mod span;

#[cfg(test)]
mod tests;

pub use codec::IpfixMessageFramer;
pub use collector::{PlacementCollector, PlacementPipeline, Protocol, UnhandledAction};
pub use error::{ErrorContext, ErrorKind, Severity};
pub use handler::{
    template_key, ContentHandler, InstallOutcome, MessageHeader, PlacementContentHandler,
    WireTemplateRegistry,
};
pub use placement::{DecodeTarget, OctetBuffer, PlacementError, PlacementTemplate};
pub use span::Span;
