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

//! Textual IE specs of the form `name(pen/number)<type>[len]`.
//!
//! Everything after the name is optional: `octetDeltaCount`,
//! `octetDeltaCount(1)`, `fooCount(9999/42)<unsigned32>` and
//! `interfaceName(82)<string>[v]` are all accepted. `[v]` (or `[65535]`)
//! marks a variable-length element.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt, value},
    sequence::{delimited, pair, terminated, tuple},
    IResult,
};
use serde::{Deserialize, Serialize};

use crate::ie::{IEType, VARLEN};

/// The parsed form of a textual IE spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IESpec {
    pub name: String,
    pub pen: u32,
    pub number: Option<u16>,
    pub ietype: Option<IEType>,
    pub len: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IESpecError {
    /// The spec text did not parse.
    Malformed(String),
    /// A full definition was required but the spec carries no element id.
    MissingNumber(String),
    /// A full definition was required but the spec carries no type.
    MissingType(String),
}

impl std::fmt::Display for IESpecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(spec) => write!(f, "malformed IE spec: {spec:?}"),
            Self::MissingNumber(spec) => write!(f, "IE spec has no element id: {spec:?}"),
            Self::MissingType(spec) => write!(f, "IE spec has no type: {spec:?}"),
        }
    }
}

impl std::error::Error for IESpecError {}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn number_u32(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse)(input)
}

fn number_u16(input: &str) -> IResult<&str, u16> {
    map_res(digit1, str::parse)(input)
}

/// `(number)` or `(pen/number)`.
fn ids(input: &str) -> IResult<&str, (u32, u16)> {
    delimited(
        char('('),
        map(
            pair(opt(terminated(number_u32, char('/'))), number_u16),
            |(pen, number)| (pen.unwrap_or(0), number),
        ),
        char(')'),
    )(input)
}

fn ietype(input: &str) -> IResult<&str, IEType> {
    delimited(char('<'), map_res(ident, str::parse), char('>'))(input)
}

fn length(input: &str) -> IResult<&str, u16> {
    delimited(
        char('['),
        alt((value(VARLEN, char('v')), number_u16)),
        char(']'),
    )(input)
}

/// Parses a textual IE spec.
pub fn parse_iespec(input: &str) -> Result<IESpec, IESpecError> {
    let spec = input.trim();
    let (_, (name, ids, ietype, len)) =
        all_consuming(tuple((ident, opt(ids), opt(ietype), opt(length))))(spec)
            .map_err(|_: nom::Err<nom::error::Error<&str>>| {
                IESpecError::Malformed(input.to_string())
            })?;
    let (pen, number) = match ids {
        Some((pen, number)) => (pen, Some(number)),
        None => (0, None),
    };
    Ok(IESpec {
        name: name.to_string(),
        pen,
        number,
        ietype,
        len,
    })
}
