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

//! Message stream parsers: byte-level framing of IPFIX and NetFlow
//! messages and sets, driving a [`ContentHandler`] with one callback pair
//! per set.
//!
//! Framing errors are fatal; a parser must not be reused after returning
//! an error. Reading zero bytes at a message boundary is the clean end of
//! the stream.

pub mod ipfix;
pub mod netflow;

use std::io::Read;

use crate::{
    error::{ErrorContext, ErrorKind},
    handler::ContentHandler,
    span::Span,
};

pub use ipfix::IpfixMessageStreamParser;
pub use netflow::{V5MessageStreamParser, V9MessageStreamParser};

/// Set header: 2-octet set id, 2-octet length including the header.
pub const SET_HEADER_LENGTH: usize = 4;

/// Reads until `buf` is full or the input is exhausted, returning the
/// number of octets read.
pub(crate) fn read_full<R: Read>(input: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

/// Set ids that select the template and options-template dispatch paths;
/// IPFIX uses 2/3, NetFlow v9 uses 0/1. Everything else is handed to the
/// data-set path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SetIds {
    pub template: u16,
    pub options_template: u16,
}

/// Walks the sets of one framed message body and fires the matching
/// callback pair per set. `body`'s offset must be message-relative (i.e.
/// start right after the message header).
pub(crate) fn dispatch_sets<H: ContentHandler>(
    body: Span<'_>,
    ids: SetIds,
    handler: &mut H,
) -> Result<(), ErrorContext> {
    let mut cur = body;
    while cur.len() >= SET_HEADER_LENGTH {
        let set_start = cur.location_offset();
        let Some((after_id, set_id)) = cur.read_u16() else {
            break;
        };
        let Some((after_header, set_length)) = after_id.read_u16() else {
            break;
        };
        if (set_length as usize) < SET_HEADER_LENGTH {
            return Err(ErrorContext::fatal(
                ErrorKind::FormatError,
                set_start,
                format!("set length {set_length} shorter than the set header"),
            ));
        }
        let payload_length = set_length as usize - SET_HEADER_LENGTH;
        let Some((rest, payload)) = after_header.take_span(payload_length) else {
            return Err(ErrorContext::fatal(
                ErrorKind::LongSet,
                set_start,
                format!(
                    "set of {set_length} octets at offset {set_start} exceeds message end at {}",
                    body.location_offset() + body.len()
                ),
            ));
        };

        if set_id == ids.template {
            handler.start_template_set(set_id, payload)?;
            handler.end_template_set()?;
        } else if set_id == ids.options_template {
            handler.start_options_template_set(set_id, payload)?;
            handler.end_options_template_set()?;
        } else {
            handler.start_data_set(set_id, payload)?;
            handler.end_data_set()?;
        }
        cur = rest;
    }
    Ok(())
}
