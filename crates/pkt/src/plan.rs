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

//! Compiled decode plans.
//!
//! A plan is a linear sequence of per-field decisions, compiled once from a
//! (placement template, wire template) pair and executed once per record.
//! Fields the placement does not mention become skips; adjacent fixed
//! skips are coalesced. The plan is plain data, so caching it is cheap and
//! the executor is a single linear walk.

use flowplace_model::{IEType, IETemplate, InfoElement};
use std::sync::Arc;

use crate::{
    error::{ErrorContext, ErrorKind},
    placement::{DecodeTarget, PlacementTemplate},
    span::Span,
};

/// Whether multi-octet numeric transfers need a byte swap to become
/// host-order values.
const TRANSFER_NEEDS_SWAP: bool = cfg!(target_endian = "little");

#[derive(Debug, Clone)]
pub(crate) enum Decision {
    SkipFixlen {
        length: usize,
    },
    SkipVarlen,
    /// Fixed transfer without byte reordering: single octets, MAC and IPv6
    /// addresses, and every numeric type on big-endian hosts.
    TransferFixlen {
        length: usize,
        destination_size: usize,
        target: DecodeTarget,
        ie: Arc<InfoElement>,
    },
    /// Fixed transfer with network-to-host byte reversal.
    TransferFixlenEndian {
        length: usize,
        destination_size: usize,
        target: DecodeTarget,
        ie: Arc<InfoElement>,
    },
    TransferBoolean {
        target: DecodeTarget,
    },
    TransferFixlenOctets {
        length: usize,
        target: DecodeTarget,
    },
    TransferFloat32IntoFloat64 {
        target: DecodeTarget,
    },
    TransferFloat32IntoFloat64Endian {
        target: DecodeTarget,
    },
    TransferVarlen {
        target: DecodeTarget,
    },
}

#[derive(Debug, Clone)]
pub struct DecodePlan {
    decisions: Vec<Decision>,
}

impl DecodePlan {
    /// Compiles a plan for decoding records laid out by `wire` into the
    /// destinations of `placement`. The placement must already have been
    /// found to match the wire template.
    ///
    /// Fails when a wire field cannot legally land in its destination: a
    /// wire length above the destination's size, a fixed-size address type
    /// with the wrong length, or a destination cell that does not fit the
    /// wire element's type (possible when the element was unknown to the
    /// information model and came back as an octetArray placeholder).
    pub fn compile(
        placement: &PlacementTemplate,
        wire: &IETemplate,
    ) -> Result<Self, ErrorContext> {
        let mut decisions = Vec::with_capacity(wire.len());
        for ie in wire {
            let Some(entry) = placement.lookup_placement(ie) else {
                if ie.is_varlen() {
                    decisions.push(Decision::SkipVarlen);
                } else {
                    decisions.push(Decision::SkipFixlen {
                        length: ie.len() as usize,
                    });
                }
                continue;
            };
            let target = entry.target.clone();
            if !target.accepts(ie.ietype()) {
                return Err(compile_error(format!(
                    "IE {} cannot be decoded into a {} destination",
                    ie.to_spec(),
                    target.kind_name()
                )));
            }
            decisions.push(transfer_decision(ie, target)?);
        }
        Ok(Self {
            decisions: coalesce_skips(decisions),
        })
    }

    #[cfg(test)]
    pub(crate) fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Decodes one record starting at `buf`, writing placed values into
    /// their destinations, and returns the record's encoded length. Any
    /// decision that would run past the end of `buf` is a fatal format
    /// error identifying the offending offset.
    pub fn execute(&self, buf: Span<'_>) -> Result<usize, ErrorContext> {
        let mut cur = buf;
        for decision in &self.decisions {
            match decision {
                Decision::SkipFixlen { length } => {
                    let (rest, _) = take_field(cur, *length, "skipped field")?;
                    cur = rest;
                }
                Decision::SkipVarlen => {
                    let (rest, length) = decode_varlen_length(cur)?;
                    let (rest, _) = take_field(rest, length, "skipped variable-length field")?;
                    cur = rest;
                }
                Decision::TransferFixlen {
                    length,
                    destination_size,
                    target,
                    ie,
                }
                | Decision::TransferFixlenEndian {
                    length,
                    destination_size,
                    target,
                    ie,
                } => {
                    debug_assert!(length <= destination_size);
                    let (rest, content) = take_field(cur, *length, ie.name())?;
                    store_fixlen(target, content, cur.location_offset())?;
                    cur = rest;
                }
                Decision::TransferBoolean { target } => {
                    let (rest, content) = take_field(cur, 1, "boolean field")?;
                    let value = match content[0] {
                        1 => true,
                        2 => false,
                        other => {
                            return Err(ErrorContext::fatal(
                                ErrorKind::FormatError,
                                cur.location_offset(),
                                format!("bool encoding wrong: got {other}, want 1 or 2"),
                            ))
                        }
                    };
                    store_boolean(target, value, cur.location_offset())?;
                    cur = rest;
                }
                Decision::TransferFixlenOctets { length, target } => {
                    let (rest, content) = take_field(cur, *length, "octet field")?;
                    store_octets(target, content, cur.location_offset())?;
                    cur = rest;
                }
                Decision::TransferFloat32IntoFloat64 { target }
                | Decision::TransferFloat32IntoFloat64Endian { target } => {
                    let (rest, content) = take_field(cur, 4, "float field")?;
                    let mut bits = [0u8; 4];
                    bits.copy_from_slice(content);
                    let value = f32::from_bits(u32::from_be_bytes(bits));
                    store_widened_float(target, value, cur.location_offset())?;
                    cur = rest;
                }
                Decision::TransferVarlen { target } => {
                    let (rest, length) = decode_varlen_length(cur)?;
                    let (rest, content) =
                        take_field(rest, length, "variable-length field content")?;
                    store_octets(target, content, cur.location_offset())?;
                    cur = rest;
                }
            }
        }
        Ok(cur.location_offset() - buf.location_offset())
    }
}

fn compile_error(explanation: String) -> ErrorContext {
    ErrorContext::fatal(ErrorKind::FormatError, 0, explanation)
}

/// Picks the transfer decision for a placed wire field, validating the
/// wire length against what the type admits and against the destination
/// cell.
fn transfer_decision(
    ie: &Arc<InfoElement>,
    target: DecodeTarget,
) -> Result<Decision, ErrorContext> {
    let length = ie.len() as usize;
    if let Some(want) = ie.ietype().fixed_wire_size() {
        if length != want as usize {
            return Err(compile_error(format!(
                "IE {} not {want} octets long",
                ie.to_spec()
            )));
        }
    }
    match ie.ietype() {
        IEType::octetArray | IEType::string => Ok(if ie.is_varlen() {
            Decision::TransferVarlen { target }
        } else {
            Decision::TransferFixlenOctets { length, target }
        }),
        IEType::unsigned8 | IEType::signed8 | IEType::macAddress | IEType::ipv6Address => {
            fixlen_decision(ie, target, false)
        }
        IEType::unsigned16
        | IEType::signed16
        | IEType::unsigned32
        | IEType::signed32
        | IEType::float32
        | IEType::dateTimeSeconds
        | IEType::ipv4Address
        | IEType::unsigned64
        | IEType::signed64
        | IEType::dateTimeMilliseconds
        | IEType::dateTimeMicroseconds
        | IEType::dateTimeNanoseconds => fixlen_decision(ie, target, TRANSFER_NEEDS_SWAP),
        IEType::float64 => {
            if length == 4 {
                Ok(if TRANSFER_NEEDS_SWAP {
                    Decision::TransferFloat32IntoFloat64Endian { target }
                } else {
                    Decision::TransferFloat32IntoFloat64 { target }
                })
            } else {
                fixlen_decision(ie, target, TRANSFER_NEEDS_SWAP)
            }
        }
        IEType::boolean => Ok(Decision::TransferBoolean { target }),
    }
}

fn fixlen_decision(
    ie: &Arc<InfoElement>,
    target: DecodeTarget,
    swap: bool,
) -> Result<Decision, ErrorContext> {
    let length = ie.len() as usize;
    let Some(destination_size) = target.destination_size() else {
        return Err(compile_error(format!(
            "IE {} cannot be fixed-length decoded into a {} destination",
            ie.to_spec(),
            target.kind_name()
        )));
    };
    if length > destination_size {
        return Err(compile_error(format!(
            "IE {} length {} greater than destination size {}",
            ie.to_spec(),
            length,
            destination_size
        )));
    }
    let ie = Arc::clone(ie);
    Ok(if swap {
        Decision::TransferFixlenEndian {
            length,
            destination_size,
            target,
            ie,
        }
    } else {
        Decision::TransferFixlen {
            length,
            destination_size,
            target,
            ie,
        }
    })
}

fn coalesce_skips(decisions: Vec<Decision>) -> Vec<Decision> {
    let mut coalesced: Vec<Decision> = Vec::with_capacity(decisions.len());
    for decision in decisions {
        if let Decision::SkipFixlen { length: more } = &decision {
            if let Some(Decision::SkipFixlen { length }) = coalesced.last_mut() {
                *length += more;
                continue;
            }
        }
        coalesced.push(decision);
    }
    coalesced
}

fn take_field<'a>(
    cur: Span<'a>,
    length: usize,
    what: &str,
) -> Result<(Span<'a>, &'a [u8]), ErrorContext> {
    cur.take_bytes(length).ok_or_else(|| {
        ErrorContext::fatal(
            ErrorKind::FormatError,
            cur.location_offset(),
            format!(
                "{what}: {length} octets needed, {} left in data set",
                cur.len()
            ),
        )
    })
}

/// Reads a variable-length field's length. One octet below 255 is the
/// length itself; octet 255 introduces a two-octet network-order length.
/// RFC 7011 Section 7 allows the three-octet form for any value.
fn decode_varlen_length(cur: Span<'_>) -> Result<(Span<'_>, usize), ErrorContext> {
    let (rest, first) = take_field(cur, 1, "variable-length length")?;
    if first[0] < 0xff {
        return Ok((rest, first[0] as usize));
    }
    let (rest, wide) = take_field(rest, 2, "three-octet variable-length length")?;
    Ok((rest, ((wide[0] as usize) << 8) | wide[1] as usize))
}

/// Big-endian zero-extension of up to 8 octets.
fn extend_value(content: &[u8]) -> u64 {
    content.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)
}

/// Right-justified zero-padded copy into a fixed-size byte image.
fn extend_bytes<const N: usize>(content: &[u8]) -> [u8; N] {
    let mut image = [0u8; N];
    image[N - content.len()..].copy_from_slice(content);
    image
}

fn internal_mismatch(target: &DecodeTarget, offset: usize) -> ErrorContext {
    ErrorContext::fatal(
        ErrorKind::InconsistentState,
        offset,
        format!("decision routed into {} destination", target.kind_name()),
    )
}

/// Writes a fixed-length value into its cell. A value shorter than the
/// destination is zero-extended at the high end, per the reduced-length
/// encoding rules.
fn store_fixlen(
    target: &DecodeTarget,
    content: &[u8],
    offset: usize,
) -> Result<(), ErrorContext> {
    match target {
        DecodeTarget::U8(cell) => cell.set(extend_value(content) as u8),
        DecodeTarget::U16(cell) => cell.set(extend_value(content) as u16),
        DecodeTarget::U32(cell) => cell.set(extend_value(content) as u32),
        DecodeTarget::U64(cell) => cell.set(extend_value(content)),
        DecodeTarget::I8(cell) => cell.set(extend_value(content) as i8),
        DecodeTarget::I16(cell) => cell.set(extend_value(content) as i16),
        DecodeTarget::I32(cell) => cell.set(extend_value(content) as i32),
        DecodeTarget::I64(cell) => cell.set(extend_value(content) as i64),
        DecodeTarget::F32(cell) => cell.set(f32::from_bits(extend_value(content) as u32)),
        DecodeTarget::F64(cell) => cell.set(f64::from_bits(extend_value(content))),
        DecodeTarget::Mac(cell) => cell.set(extend_bytes::<6>(content)),
        DecodeTarget::Ipv4(cell) => cell.set(extend_bytes::<4>(content).into()),
        DecodeTarget::Ipv6(cell) => cell.set(extend_bytes::<16>(content).into()),
        DecodeTarget::Bool(_) | DecodeTarget::Octets(_) => {
            return Err(internal_mismatch(target, offset))
        }
    }
    Ok(())
}

fn store_boolean(target: &DecodeTarget, value: bool, offset: usize) -> Result<(), ErrorContext> {
    match target {
        DecodeTarget::Bool(cell) => {
            cell.set(value);
            Ok(())
        }
        _ => Err(internal_mismatch(target, offset)),
    }
}

fn store_octets(target: &DecodeTarget, content: &[u8], offset: usize) -> Result<(), ErrorContext> {
    match target {
        DecodeTarget::Octets(cell) => {
            cell.borrow_mut().copy_content(content);
            Ok(())
        }
        _ => Err(internal_mismatch(target, offset)),
    }
}

fn store_widened_float(
    target: &DecodeTarget,
    value: f32,
    offset: usize,
) -> Result<(), ErrorContext> {
    match target {
        DecodeTarget::F64(cell) => {
            cell.set(value as f64);
            Ok(())
        }
        _ => Err(internal_mismatch(target, offset)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::OctetBuffer;
    use flowplace_model::InfoModel;
    use std::{
        cell::{Cell, RefCell},
        net::Ipv4Addr,
        rc::Rc,
    };

    fn u32_cell() -> Rc<Cell<u32>> {
        Rc::new(Cell::new(0))
    }

    fn placement_with(
        model: &InfoModel,
        entries: &[(u16, DecodeTarget)],
    ) -> PlacementTemplate {
        let mut placement = PlacementTemplate::new();
        for (number, target) in entries {
            placement
                .register_placement(&model.lookup(0, *number, 0).unwrap(), target.clone())
                .unwrap();
        }
        placement
    }

    #[test]
    fn test_skip_coalescing() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 7, 2).unwrap()); // sourceTransportPort
        wire.add(model.lookup(0, 8, 4).unwrap()); // sourceIPv4Address
        wire.add(model.lookup(0, 1, 8).unwrap()); // octetDeltaCount
        wire.add(model.lookup(0, 11, 2).unwrap()); // destinationTransportPort

        let port = Rc::new(Cell::new(0u16));
        let placement = placement_with(&model, &[(11, DecodeTarget::U16(port))]);
        let plan = DecodePlan::compile(&placement, &wire).unwrap();
        assert_eq!(plan.decisions().len(), 2);
        assert!(matches!(
            plan.decisions()[0],
            Decision::SkipFixlen { length: 14 }
        ));
    }

    #[test]
    fn test_reduced_length_zero_extension() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 10, 2).unwrap()); // ingressInterface, u32 in 2 octets

        let cell = u32_cell();
        let placement = placement_with(&model, &[(10, DecodeTarget::U32(Rc::clone(&cell)))]);
        let plan = DecodePlan::compile(&placement, &wire).unwrap();
        let consumed = plan.execute(Span::new(&[0x12, 0x34])).unwrap();
        assert_eq!(consumed, 2);
        assert_eq!(cell.get(), 0x1234);
    }

    #[test]
    fn test_reduced_length_signed_is_not_sign_extended() {
        let model = InfoModel::new();
        let ie = model.add_spec("temperature(9999/1)<signed32>[4]").unwrap();
        let mut wire = IETemplate::new();
        wire.add(ie.for_len(1));

        let cell = Rc::new(Cell::new(0i32));
        let mut placement = PlacementTemplate::new();
        placement
            .register_placement(&ie, DecodeTarget::I32(Rc::clone(&cell)))
            .unwrap();
        let plan = DecodePlan::compile(&placement, &wire).unwrap();
        plan.execute(Span::new(&[0xff])).unwrap();
        assert_eq!(cell.get(), 0x0000_00ff);
    }

    #[test]
    fn test_length_above_native_size_fails_compile() {
        let model = InfoModel::new();
        let ie = model.add_spec("wideCounter(9999/2)<unsigned16>[2]").unwrap();
        let mut wire = IETemplate::new();
        wire.add(ie.for_len(3));

        let mut placement = PlacementTemplate::new();
        placement
            .register_placement(&ie, DecodeTarget::U16(Rc::new(Cell::new(0))))
            .unwrap();
        let err = DecodePlan::compile(&placement, &wire).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }

    #[test]
    fn test_boolean_law() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 303, 1).unwrap()); // dataRecordsReliability

        let cell = Rc::new(Cell::new(false));
        let placement = placement_with(&model, &[(303, DecodeTarget::Bool(Rc::clone(&cell)))]);
        let plan = DecodePlan::compile(&placement, &wire).unwrap();

        plan.execute(Span::new(&[1])).unwrap();
        assert!(cell.get());
        plan.execute(Span::new(&[2])).unwrap();
        assert!(!cell.get());
        let err = plan.execute(Span::new(&[0])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        // the destination keeps its previous value after the failure
        assert!(!cell.get());
    }

    #[test]
    fn test_varlen_lengths() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 82, 0xffff).unwrap()); // interfaceName

        let buffer = Rc::new(RefCell::new(OctetBuffer::new()));
        let placement = placement_with(&model, &[(82, DecodeTarget::Octets(Rc::clone(&buffer)))]);
        let plan = DecodePlan::compile(&placement, &wire).unwrap();

        // one-octet length
        let consumed = plan.execute(Span::new(&[3, b'A', b'B', b'C'])).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(buffer.borrow().as_slice(), b"ABC");

        // empty value
        assert_eq!(plan.execute(Span::new(&[0])).unwrap(), 1);
        assert!(buffer.borrow().is_empty());

        // three-octet form used for a short value
        let consumed = plan.execute(Span::new(&[0xff, 0x00, 0x02, b'h', b'i'])).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(buffer.borrow().as_slice(), b"hi");

        // longest single-octet length
        let mut record = vec![254];
        record.extend(std::iter::repeat(b'x').take(254));
        assert_eq!(plan.execute(Span::new(&record)).unwrap(), 255);
        assert_eq!(buffer.borrow().len(), 254);

        // 255 requires the three-octet form
        let mut record = vec![0xff, 0x00, 0xff];
        record.extend(std::iter::repeat(b'x').take(255));
        assert_eq!(plan.execute(Span::new(&record)).unwrap(), 258);
        assert_eq!(buffer.borrow().len(), 255);

        // three-octet form, length 256
        let mut record = vec![0xff, 0x01, 0x00];
        record.extend(std::iter::repeat(b'x').take(256));
        assert_eq!(plan.execute(Span::new(&record)).unwrap(), 259);
        assert_eq!(buffer.borrow().len(), 256);

        // maximum encodable length
        let mut record = vec![0xff, 0xff, 0xff];
        record.extend(std::iter::repeat(b'x').take(65535));
        assert_eq!(plan.execute(Span::new(&record)).unwrap(), 65538);
        assert_eq!(buffer.borrow().len(), 65535);

        // length crossing the end of the buffer fails before any payload
        // is consumed
        let err = plan.execute(Span::new(&[5, b'a', b'b'])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }

    #[test]
    fn test_float32_widening() {
        let model = InfoModel::with_default_registry();
        // samplingProbability is float64; wire length 4 triggers widening
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 311, 4).unwrap());

        let cell = Rc::new(Cell::new(0f64));
        let placement = placement_with(&model, &[(311, DecodeTarget::F64(Rc::clone(&cell)))]);
        let plan = DecodePlan::compile(&placement, &wire).unwrap();
        assert!(matches!(
            plan.decisions()[0],
            Decision::TransferFloat32IntoFloat64 { .. }
                | Decision::TransferFloat32IntoFloat64Endian { .. }
        ));

        let wire_bytes = 0.25f32.to_bits().to_be_bytes();
        plan.execute(Span::new(&wire_bytes)).unwrap();
        assert_eq!(cell.get(), 0.25);
    }

    #[test]
    fn test_addresses_and_macs() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 8, 4).unwrap());
        wire.add(model.lookup(0, 56, 6).unwrap());

        let addr = Rc::new(Cell::new(Ipv4Addr::UNSPECIFIED));
        let mac = Rc::new(Cell::new([0u8; 6]));
        let placement = placement_with(
            &model,
            &[
                (8, DecodeTarget::Ipv4(Rc::clone(&addr))),
                (56, DecodeTarget::Mac(Rc::clone(&mac))),
            ],
        );
        let plan = DecodePlan::compile(&placement, &wire).unwrap();
        let record = [0xc0, 0x00, 0x02, 0x01, 0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
        assert_eq!(plan.execute(Span::new(&record)).unwrap(), 10);
        assert_eq!(addr.get(), Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(mac.get(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_mac_with_wrong_length_fails_compile() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 56, 4).unwrap());

        let placement = placement_with(
            &model,
            &[(56, DecodeTarget::Mac(Rc::new(Cell::new([0u8; 6]))))],
        );
        assert!(DecodePlan::compile(&placement, &wire).is_err());
    }

    #[test]
    fn test_record_overrun_is_fatal() {
        let model = InfoModel::with_default_registry();
        let mut wire = IETemplate::new();
        wire.add(model.lookup(0, 8, 4).unwrap());

        let placement = placement_with(&model, &[(8, DecodeTarget::U32(u32_cell()))]);
        let plan = DecodePlan::compile(&placement, &wire).unwrap();
        let err = plan.execute(Span::new_at(40, &[0xc0, 0x00])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
        assert_eq!(err.set_offset(), 40);
    }
}
