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

use byteorder::{ByteOrder, NetworkEndian};
use chrono::{LocalResult, TimeZone, Utc};
use std::io::Read;

use crate::{
    error::{ErrorContext, ErrorKind},
    handler::{ContentHandler, MessageHeader},
    parser::{dispatch_sets, read_full, SetIds},
    span::Span,
};

pub const IPFIX_VERSION: u16 = 10;

/// 2-octet version, 2-octet length, 4 octets each of export time,
/// sequence number and observation domain.
pub const IPFIX_HEADER_LENGTH: usize = 16;

pub const IPFIX_TEMPLATE_SET_ID: u16 = 2;
pub const IPFIX_OPTIONS_TEMPLATE_SET_ID: u16 = 3;

/// Streaming IPFIX message parser. Frames one message at a time out of the
/// input (a 16-octet header, then exactly `length - 16` further octets)
/// and drives the content handler through the message's sets.
#[derive(Debug, Default)]
pub struct IpfixMessageStreamParser {
    /// Stream offset of the message currently being parsed.
    offset: u64,
}

impl IpfixMessageStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse<R: Read, H: ContentHandler>(
        &mut self,
        mut input: R,
        handler: &mut H,
    ) -> Result<(), ErrorContext> {
        handler.start_session()?;

        let mut header = [0u8; IPFIX_HEADER_LENGTH];
        loop {
            let message_offset = self.offset;
            let at = |err: ErrorContext| err.at_message(message_offset);

            let got = read_full(&mut input, &mut header).map_err(|e| ErrorContext::read_error(&e))?;
            if got == 0 {
                break;
            }
            if got < IPFIX_HEADER_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortHeader,
                    0,
                    format!("wanted {IPFIX_HEADER_LENGTH} octets for message header, got {got}"),
                )));
            }

            let version = NetworkEndian::read_u16(&header[0..2]);
            if version != IPFIX_VERSION {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::MessageVersionNumber,
                    0,
                    format!("expected message version {IPFIX_VERSION:#06x}, got {version:#06x}"),
                )));
            }
            let length = NetworkEndian::read_u16(&header[2..4]) as usize;
            if length < IPFIX_HEADER_LENGTH {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortMessage,
                    2,
                    format!("message length {length} shorter than the message header"),
                )));
            }
            let export_seconds = NetworkEndian::read_u32(&header[4..8]);
            let export_time = match Utc.timestamp_opt(export_seconds as i64, 0) {
                LocalResult::Single(time) => time,
                _ => {
                    return Err(at(ErrorContext::fatal(
                        ErrorKind::FormatError,
                        4,
                        format!("invalid export time {export_seconds}"),
                    )))
                }
            };
            let sequence_number = NetworkEndian::read_u32(&header[8..12]);
            let observation_domain = NetworkEndian::read_u32(&header[12..16]);

            let mut body = vec![0u8; length - IPFIX_HEADER_LENGTH];
            let got = read_full(&mut input, &mut body).map_err(|e| ErrorContext::read_error(&e))?;
            if got < body.len() {
                return Err(at(ErrorContext::fatal(
                    ErrorKind::ShortBody,
                    IPFIX_HEADER_LENGTH + got,
                    format!("wanted {} octets for message body, got {got}", body.len()),
                )));
            }

            handler
                .start_message(&MessageHeader {
                    version,
                    length,
                    export_time,
                    sequence_number,
                    observation_domain,
                    base_time: 0,
                })
                .map_err(at)?;

            dispatch_sets(
                Span::new_at(IPFIX_HEADER_LENGTH, &body),
                SetIds {
                    template: IPFIX_TEMPLATE_SET_ID,
                    options_template: IPFIX_OPTIONS_TEMPLATE_SET_ID,
                },
                handler,
            )
            .map_err(at)?;

            handler.end_message().map_err(at)?;
            self.offset += length as u64;
        }

        handler.end_session()
    }
}
