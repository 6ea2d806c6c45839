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

//! Length-based IPFIX message framing for Tokio transports.
//!
//! [`IpfixMessageFramer`] splits complete IPFIX messages out of a byte
//! stream; each frame can then be fed to
//! [`PlacementPipeline::collect`](crate::PlacementPipeline::collect),
//! which accepts an in-memory message as readily as a file. NetFlow v9
//! has no message length field and cannot be framed this way; feed v9
//! datagrams to the pipeline whole.

use byteorder::{ByteOrder, NetworkEndian};
use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::parser::ipfix::{IPFIX_HEADER_LENGTH, IPFIX_VERSION};

#[derive(Debug, PartialEq, Eq)]
pub enum FramerError {
    Io(String),
    UnsupportedVersion(u16),
    InvalidLength(u16),
}

impl std::fmt::Display for FramerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "read error: {err}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "unsupported message version: {version}")
            }
            Self::InvalidLength(length) => write!(f, "invalid message length: {length}"),
        }
    }
}

impl std::error::Error for FramerError {}

impl From<std::io::Error> for FramerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Splits IPFIX messages (header included) out of a byte stream.
#[derive(Debug, Default)]
pub struct IpfixMessageFramer;

impl IpfixMessageFramer {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for IpfixMessageFramer {
    type Item = BytesMut;
    type Error = FramerError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < IPFIX_HEADER_LENGTH {
            return Ok(None);
        }
        let version = NetworkEndian::read_u16(&buf[0..2]);
        if version != IPFIX_VERSION {
            buf.clear();
            return Err(FramerError::UnsupportedVersion(version));
        }
        let length = NetworkEndian::read_u16(&buf[2..4]);
        if (length as usize) < IPFIX_HEADER_LENGTH {
            buf.clear();
            return Err(FramerError::InvalidLength(length));
        }
        if buf.len() < length as usize {
            buf.reserve(length as usize - buf.len());
            return Ok(None);
        }
        Ok(Some(buf.split_to(length as usize)))
    }
}
