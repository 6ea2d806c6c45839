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

use serde::{Deserialize, Serialize};

/// What went wrong, independent of where.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NoError,
    /// Fewer octets than a message header needs.
    ShortHeader,
    /// The input ended before the length given in the message header.
    ShortBody,
    /// A set claims to extend past the end of its message.
    LongSet,
    /// A field specifier extends past the end of its template set.
    LongFieldspec,
    /// Unexpected protocol version in the message header.
    MessageVersionNumber,
    /// Message too short to carry anything.
    ShortMessage,
    /// Nonzero base time in an IPFIX message.
    IpfixBasetime,
    /// Malformed wire data below the framing level.
    FormatError,
    /// The input source failed.
    ReadError,
    /// An internal invariant did not hold.
    InconsistentState,
    /// A callback asked for the stream to stop.
    AbortedByUser,
    /// Retry the operation that produced this.
    Again,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoError => "no error",
            Self::ShortHeader => "short message header",
            Self::ShortBody => "short message body",
            Self::LongSet => "set too long (exceeds message size)",
            Self::LongFieldspec => "field specifier exceeds set",
            Self::MessageVersionNumber => "unexpected version number",
            Self::ShortMessage => "short message",
            Self::IpfixBasetime => "got base time in IPFIX message",
            Self::FormatError => "format error",
            Self::ReadError => "read error",
            Self::InconsistentState => "inconsistent internal state",
            Self::AbortedByUser => "aborted by user",
            Self::Again => "try again",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Fine,
    Warning,
    /// The current set or message is lost, the stream may continue.
    Recoverable,
    /// The stream must not be parsed further.
    Fatal,
}

/// An error plus the location it occurred at: the stream offset of the
/// enclosing message and the octet offset of the failure within that
/// message (0 when the failure is not tied to a message position).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    kind: ErrorKind,
    severity: Severity,
    explanation: String,
    message_offset: u64,
    set_offset: usize,
}

impl ErrorContext {
    pub fn new(
        severity: Severity,
        kind: ErrorKind,
        set_offset: usize,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            explanation: explanation.into(),
            message_offset: 0,
            set_offset,
        }
    }

    pub fn fatal(kind: ErrorKind, set_offset: usize, explanation: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, kind, set_offset, explanation)
    }

    pub fn recoverable(kind: ErrorKind, set_offset: usize, explanation: impl Into<String>) -> Self {
        Self::new(Severity::Recoverable, kind, set_offset, explanation)
    }

    pub fn read_error(err: &std::io::Error) -> Self {
        Self::fatal(ErrorKind::ReadError, 0, err.to_string())
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub const fn severity(&self) -> Severity {
        self.severity
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Offset of the enclosing message within the input stream.
    pub const fn message_offset(&self) -> u64 {
        self.message_offset
    }

    /// Offset of the failing octet within the enclosing message.
    pub const fn set_offset(&self) -> usize {
        self.set_offset
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn is_recoverable(&self) -> bool {
        self.severity == Severity::Recoverable
    }

    /// Stamps the stream offset of the message being parsed. The first
    /// stamp wins, so errors keep the innermost message they belong to.
    pub(crate) fn at_message(mut self, offset: u64) -> Self {
        if self.message_offset == 0 {
            self.message_offset = offset;
        }
        self
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (message offset {}, octet {}): {}",
            self.kind, self.message_offset, self.set_offset, self.explanation
        )
    }
}

impl std::error::Error for ErrorContext {}
