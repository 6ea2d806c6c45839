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

//! NetFlow v9 and v5 message framing.
//!
//! Both protocols reuse the IPFIX content-handler path once a message is
//! framed. v9 messages carry no message length, so the parser scans set
//! headers until it sees the next message header (or the stream ends); v5
//! carries no templates at all, so the parser announces a synthetic
//! template describing the fixed 48-octet record layout and then hands the
//! records over as an ordinary data set.

use byteorder::{ByteOrder, NetworkEndian};
use chrono::{LocalResult, TimeZone, Utc};
use std::io::Read;

use crate::{
    error::{ErrorContext, ErrorKind},
    handler::{ContentHandler, MessageHeader},
    parser::{dispatch_sets, read_full, SetIds, SET_HEADER_LENGTH},
    span::Span,
};

pub const NETFLOW_V9_VERSION: u16 = 9;
pub const NETFLOW_V5_VERSION: u16 = 5;

/// 2-octet version, 2-octet count, 4 octets each of sysUpTime, UNIX time,
/// sequence number and source id.
pub const NETFLOW_V9_HEADER_LENGTH: usize = 20;

pub const NETFLOW_V9_TEMPLATE_SET_ID: u16 = 0;
pub const NETFLOW_V9_OPTIONS_TEMPLATE_SET_ID: u16 = 1;

/// Largest message a scan will assemble before calling it malformed.
const MAX_MESSAGE_LENGTH: usize = 65535;

/// NetFlow v9 message parser.
///
/// A v9 header has no message length, so set headers double as the
/// message delimiter: a "set id" equal to the version number is the start
/// of the next message. The four octets of lookahead that discovery costs
/// are carried over to the next iteration.
#[derive(Debug, Default)]
pub struct V9MessageStreamParser {
    offset: u64,
    lookahead: Option<[u8; 4]>,
}

impl V9MessageStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<R: Read, H: ContentHandler>(
        &mut self,
        mut input: R,
        handler: &mut H,
    ) -> Result<(), ErrorContext> {
        handler.start_session()?;

        loop {
            let message_offset = self.offset;
            let at = |err: ErrorContext| err.at_message(message_offset);

            let mut header = [0u8; NETFLOW_V9_HEADER_LENGTH];
            let mut have = 0;
            if let Some(lookahead) = self.lookahead.take() {
                header[..4].copy_from_slice(&lookahead);
                have = 4;
            }
            let got = have
                + read_full(&mut input, &mut header[have..])
                    .map_err(|e| ErrorContext::read_error(&e))?;
            if got == 0 {
                break;
            }
            if got < NETFLOW_V9_HEADER_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortHeader,
                    0,
                    format!("wanted {NETFLOW_V9_HEADER_LENGTH} octets for v9 message header, got {got}"),
                )));
            }

            let version = NetworkEndian::read_u16(&header[0..2]);
            if version != NETFLOW_V9_VERSION {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::MessageVersionNumber,
                    0,
                    format!("expected message version {NETFLOW_V9_VERSION}, got {version}"),
                )));
            }
            let sys_uptime = NetworkEndian::read_u32(&header[4..8]);
            let unix_seconds = NetworkEndian::read_u32(&header[8..12]);
            let sequence_number = NetworkEndian::read_u32(&header[12..16]);
            let source_id = NetworkEndian::read_u32(&header[16..20]);

            let mut message = header.to_vec();
            self.scan_sets(&mut input, &mut message, message_offset)?;

            let export_time = match Utc.timestamp_opt(unix_seconds as i64, 0) {
                LocalResult::Single(time) => time,
                _ => {
                    return Err(at(ErrorContext::fatal(
                        ErrorKind::FormatError,
                        8,
                        format!("invalid export time {unix_seconds}"),
                    )))
                }
            };
            // The exporter booted sysUpTime milliseconds before the export
            // timestamp; relative timestamps in records are offsets from
            // that boot instant.
            let base_time = (unix_seconds as u64 * 1000).saturating_sub(sys_uptime as u64);

            handler
                .start_message(&MessageHeader {
                    version,
                    length: message.len(),
                    export_time,
                    sequence_number,
                    observation_domain: source_id,
                    base_time,
                })
                .map_err(at)?;

            dispatch_sets(
                Span::new_at(NETFLOW_V9_HEADER_LENGTH, &message[NETFLOW_V9_HEADER_LENGTH..]),
                SetIds {
                    template: NETFLOW_V9_TEMPLATE_SET_ID,
                    options_template: NETFLOW_V9_OPTIONS_TEMPLATE_SET_ID,
                },
                handler,
            )
            .map_err(at)?;

            handler.end_message().map_err(at)?;
            self.offset += message.len() as u64;
        }

        handler.end_session()
    }

    /// Appends sets to `message` until the next message header or the end
    /// of the stream. The set header that turned out to be a message
    /// header is stashed for the next iteration.
    fn scan_sets<R: Read>(
        &mut self,
        input: &mut R,
        message: &mut Vec<u8>,
        message_offset: u64,
    ) -> Result<(), ErrorContext> {
        let at = |err: ErrorContext| err.at_message(message_offset);
        loop {
            let mut set_header = [0u8; SET_HEADER_LENGTH];
            let got = read_full(input, &mut set_header).map_err(|e| ErrorContext::read_error(&e))?;
            if got == 0 {
                return Ok(());
            }
            if got < SET_HEADER_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortHeader,
                    message.len(),
                    format!("wanted {SET_HEADER_LENGTH} octets for set header, got {got}"),
                )));
            }
            let first = NetworkEndian::read_u16(&set_header[0..2]);
            if first == NETFLOW_V9_VERSION {
                self.lookahead = Some(set_header);
                return Ok(());
            }
            if first == NETFLOW_V5_VERSION {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::MessageVersionNumber,
                    message.len(),
                    format!("wanted {NETFLOW_V9_VERSION} as version number, got {NETFLOW_V5_VERSION}"),
                )));
            }
            let set_length = NetworkEndian::read_u16(&set_header[2..4]) as usize;
            if set_length < SET_HEADER_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::FormatError,
                    message.len(),
                    format!("set length {set_length} shorter than the set header"),
                )));
            }
            if message.len() + set_length > MAX_MESSAGE_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::LongSet,
                    message.len(),
                    format!("set of {set_length} octets exceeds the v9 message space"),
                )));
            }
            let mut payload = vec![0u8; set_length - SET_HEADER_LENGTH];
            let got = read_full(input, &mut payload).map_err(|e| ErrorContext::read_error(&e))?;
            if got < payload.len() {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortBody,
                    message.len(),
                    format!("wanted {} octets for set, got {got}", payload.len()),
                )));
            }
            message.extend_from_slice(&set_header);
            message.extend_from_slice(&payload);
        }
    }
}

/// 2-octet version and count; sysUpTime, UNIX seconds, UNIX nanoseconds
/// and flow sequence of 4 octets each; engine type, engine id, sampling.
pub const NETFLOW_V5_HEADER_LENGTH: usize = 24;

pub const NETFLOW_V5_RECORD_LENGTH: usize = 48;

/// Template id under which the fixed v5 record layout is announced.
pub const NETFLOW_V5_TEMPLATE_ID: u16 = 256;

/// The classic v5 record layout as (element id, wire length) pairs, in
/// record order. Interface indices and packet/octet counters use
/// reduced-length encoding relative to their IANA types.
const V5_RECORD_LAYOUT: &[(u16, u16)] = &[
    (8, 4),   // sourceIPv4Address
    (12, 4),  // destinationIPv4Address
    (15, 4),  // ipNextHopIPv4Address
    (10, 2),  // ingressInterface
    (14, 2),  // egressInterface
    (2, 4),   // packetDeltaCount
    (1, 4),   // octetDeltaCount
    (22, 4),  // flowStartSysUpTime
    (21, 4),  // flowEndSysUpTime
    (7, 2),   // sourceTransportPort
    (11, 2),  // destinationTransportPort
    (210, 1), // paddingOctets
    (6, 1),   // tcpControlBits
    (4, 1),   // protocolIdentifier
    (5, 1),   // ipClassOfService
    (16, 2),  // bgpSourceAsNumber
    (17, 2),  // bgpDestinationAsNumber
    (9, 1),   // sourceIPv4PrefixLength
    (13, 1),  // destinationIPv4PrefixLength
    (210, 2), // paddingOctets
];

/// NetFlow v5 message parser. v5 records have a fixed layout and no
/// templates on the wire; the parser announces the layout once as a
/// synthetic template record so the data records flow through the same
/// content-handler path as the template-driven protocols.
#[derive(Debug, Default)]
pub struct V5MessageStreamParser {
    offset: u64,
}

impl V5MessageStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn synthetic_template_record() -> Vec<u8> {
        let mut record = Vec::with_capacity(4 + V5_RECORD_LAYOUT.len() * 4);
        record.extend_from_slice(&NETFLOW_V5_TEMPLATE_ID.to_be_bytes());
        record.extend_from_slice(&(V5_RECORD_LAYOUT.len() as u16).to_be_bytes());
        for (ie_id, length) in V5_RECORD_LAYOUT {
            record.extend_from_slice(&ie_id.to_be_bytes());
            record.extend_from_slice(&length.to_be_bytes());
        }
        record
    }

    pub fn parse<R: Read, H: ContentHandler>(
        &mut self,
        mut input: R,
        handler: &mut H,
    ) -> Result<(), ErrorContext> {
        handler.start_session()?;

        let mut announced_template = false;
        let mut header = [0u8; NETFLOW_V5_HEADER_LENGTH];
        loop {
            let message_offset = self.offset;
            let at = |err: ErrorContext| err.at_message(message_offset);

            let got = read_full(&mut input, &mut header).map_err(|e| ErrorContext::read_error(&e))?;
            if got == 0 {
                break;
            }
            if got < NETFLOW_V5_HEADER_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortHeader,
                    0,
                    format!("wanted {NETFLOW_V5_HEADER_LENGTH} octets for v5 message header, got {got}"),
                )));
            }

            let version = NetworkEndian::read_u16(&header[0..2]);
            if version != NETFLOW_V5_VERSION {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::MessageVersionNumber,
                    0,
                    format!("expected message version {NETFLOW_V5_VERSION}, got {version}"),
                )));
            }
            let count = NetworkEndian::read_u16(&header[2..4]) as usize;
            let sys_uptime = NetworkEndian::read_u32(&header[4..8]);
            let unix_seconds = NetworkEndian::read_u32(&header[8..12]);
            let unix_nanos = NetworkEndian::read_u32(&header[12..16]);
            let sequence_number = NetworkEndian::read_u32(&header[16..20]);
            let engine_type = header[20];
            let engine_id = header[21];

            let mut records = vec![0u8; count * NETFLOW_V5_RECORD_LENGTH];
            let got = read_full(&mut input, &mut records).map_err(|e| ErrorContext::read_error(&e))?;
            if got < records.len() {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortBody,
                    NETFLOW_V5_HEADER_LENGTH + got,
                    format!(
                        "wanted {} octets for {count} v5 records, got {got}",
                        records.len()
                    ),
                )));
            }

            let export_time = match Utc.timestamp_opt(unix_seconds as i64, 0) {
                LocalResult::Single(time) => time,
                _ => {
                    return Err(at(ErrorContext::fatal(
                        ErrorKind::FormatError,
                        8,
                        format!("invalid export time {unix_seconds}"),
                    )))
                }
            };
            let base_time = (unix_seconds as u64 * 1000 + unix_nanos as u64 / 1_000_000)
                .saturating_sub(sys_uptime as u64);

            handler
                .start_message(&MessageHeader {
                    version,
                    length: NETFLOW_V5_HEADER_LENGTH + records.len(),
                    export_time,
                    sequence_number,
                    observation_domain: ((engine_type as u32) << 8) | engine_id as u32,
                    base_time,
                })
                .map_err(at)?;

            if !announced_template {
                let template = Self::synthetic_template_record();
                handler
                    .start_template_set(
                        NETFLOW_V9_TEMPLATE_SET_ID,
                        Span::new_at(NETFLOW_V5_HEADER_LENGTH, &template),
                    )
                    .map_err(at)?;
                handler.end_template_set().map_err(at)?;
                announced_template = true;
            }

            if !records.is_empty() {
                handler
                    .start_data_set(
                        NETFLOW_V5_TEMPLATE_ID,
                        Span::new_at(NETFLOW_V5_HEADER_LENGTH, &records),
                    )
                    .map_err(at)?;
                handler.end_data_set().map_err(at)?;
            }

            handler.end_message().map_err(at)?;
            self.offset += (NETFLOW_V5_HEADER_LENGTH + records.len()) as u64;
        }

        handler.end_session()
    }
}
