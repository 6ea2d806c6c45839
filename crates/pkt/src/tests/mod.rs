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

//! End-to-end tests: complete messages through `collect()` into
//! destination cells.

use std::{
    cell::{Cell, RefCell},
    net::Ipv4Addr,
    rc::Rc,
    sync::Arc,
};

use flowplace_model::{IETemplate, InfoModel};

use crate::{
    error::{ErrorContext, ErrorKind},
    handler::{ContentHandler, MessageHeader, WireTemplateRegistry},
    parser::IpfixMessageStreamParser,
    placement::{DecodeTarget, OctetBuffer, PlacementTemplate},
    span::Span,
    PlacementCollector, PlacementPipeline, Protocol, UnhandledAction,
};

/// Builds an IPFIX message from (set id, payload) pairs.
fn ipfix_message(domain: u32, sets: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (set_id, payload) in sets {
        body.extend_from_slice(&set_id.to_be_bytes());
        body.extend_from_slice(&((payload.len() + 4) as u16).to_be_bytes());
        body.extend_from_slice(payload);
    }
    let mut message = Vec::new();
    message.extend_from_slice(&10u16.to_be_bytes());
    message.extend_from_slice(&((16 + body.len()) as u16).to_be_bytes());
    message.extend_from_slice(&1u32.to_be_bytes()); // export time
    message.extend_from_slice(&1u32.to_be_bytes()); // sequence number
    message.extend_from_slice(&domain.to_be_bytes());
    message.extend_from_slice(&body);
    message
}

/// Builds a template record: id, field count, then (ie id, length) pairs.
fn template_record(template_id: u16, fields: &[(u16, u16)]) -> Vec<u8> {
    let mut record = Vec::new();
    record.extend_from_slice(&template_id.to_be_bytes());
    record.extend_from_slice(&(fields.len() as u16).to_be_bytes());
    for (ie_id, length) in fields {
        record.extend_from_slice(&ie_id.to_be_bytes());
        record.extend_from_slice(&length.to_be_bytes());
    }
    record
}

/// Snapshots one `u32` destination on every decoded record.
struct U32Capture {
    cell: Rc<Cell<u32>>,
    seen: Vec<u32>,
    placements_started: usize,
}

impl U32Capture {
    fn new(cell: Rc<Cell<u32>>) -> Self {
        Self {
            cell,
            seen: Vec::new(),
            placements_started: 0,
        }
    }
}

impl PlacementCollector for U32Capture {
    fn start_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        self.placements_started += 1;
        Ok(())
    }

    fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        self.seen.push(self.cell.get());
        Ok(())
    }
}

fn u32_pipeline(ie_number: u16) -> (PlacementPipeline<U32Capture>, Rc<Cell<u32>>) {
    let model = Arc::new(InfoModel::with_default_registry());
    let cell = Rc::new(Cell::new(0u32));
    let mut placement = PlacementTemplate::new();
    placement
        .register_placement(
            &model.lookup(0, ie_number, 0).unwrap(),
            DecodeTarget::U32(Rc::clone(&cell)),
        )
        .unwrap();
    let mut pipeline = PlacementPipeline::with_model(
        Protocol::Ipfix,
        model,
        U32Capture::new(Rc::clone(&cell)),
    );
    pipeline.register_placement_template(Rc::new(placement));
    (pipeline, cell)
}

#[test]
fn test_single_record_into_u32_destination() {
    let (mut pipeline, _) = u32_pipeline(8);
    let message = ipfix_message(
        0,
        &[
            (2, template_record(256, &[(8, 4)])),
            (256, vec![0xc0, 0x00, 0x02, 0x01]),
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201]);
}

#[test]
fn test_two_records_give_two_placement_pairs() {
    let (mut pipeline, _) = u32_pipeline(8);
    let message = ipfix_message(
        0,
        &[
            (2, template_record(256, &[(8, 4)])),
            (256, vec![0xc0, 0x00, 0x02, 0x01, 0x0a, 0x00, 0x00, 0x01]),
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().placements_started, 2);
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201, 0x0a00_0001]);
}

#[test]
fn test_template_survives_across_messages() {
    let (mut pipeline, _) = u32_pipeline(8);
    let first = ipfix_message(0, &[(2, template_record(256, &[(8, 4)]))]);
    let second = ipfix_message(0, &[(256, vec![0x0a, 0x00, 0x00, 0x02])]);
    pipeline.collect(&first[..]).unwrap();
    pipeline.collect(&second[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0x0a00_0002]);
}

struct StringCapture {
    buffer: Rc<RefCell<OctetBuffer>>,
    seen: Vec<Vec<u8>>,
}

impl PlacementCollector for StringCapture {
    fn start_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        self.seen.push(self.buffer.borrow().as_slice().to_vec());
        Ok(())
    }
}

#[test]
fn test_varlen_string_record() {
    let model = Arc::new(InfoModel::with_default_registry());
    let buffer = Rc::new(RefCell::new(OctetBuffer::new()));
    let mut placement = PlacementTemplate::new();
    placement
        .register_placement(
            &model.lookup(0, 82, 0).unwrap(),
            DecodeTarget::Octets(Rc::clone(&buffer)),
        )
        .unwrap();
    let mut pipeline = PlacementPipeline::with_model(
        Protocol::Ipfix,
        model,
        StringCapture {
            buffer: Rc::clone(&buffer),
            seen: Vec::new(),
        },
    );
    pipeline.register_placement_template(Rc::new(placement));

    let message = ipfix_message(
        0,
        &[
            (2, template_record(256, &[(82, 0xffff)])),
            (256, vec![0x03, 0x41, 0x42, 0x43]),
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![b"ABC".to_vec()]);
}

#[test]
fn test_template_redeclared_with_different_layout() {
    let (mut pipeline, _) = u32_pipeline(8);
    pipeline.use_matched_template_cache(true);
    let message = ipfix_message(
        0,
        &[
            (2, template_record(256, &[(8, 4)])),
            (256, vec![0xc0, 0x00, 0x02, 0x01]),
            // same id, different layout: the source address now comes
            // after the destination address
            (2, template_record(256, &[(12, 4), (8, 4)])),
            (256, vec![1, 2, 3, 4, 0x0a, 0x00, 0x00, 0x01]),
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201, 0x0a00_0001]);
}

#[test]
fn test_long_set_is_fatal_and_delivers_nothing() {
    let (mut pipeline, _) = u32_pipeline(8);
    // hand-built message: length 30, but the single set claims 100 octets
    let mut message = Vec::new();
    message.extend_from_slice(&10u16.to_be_bytes());
    message.extend_from_slice(&30u16.to_be_bytes());
    message.extend_from_slice(&[0u8; 12]); // export time, sequence, domain
    message.extend_from_slice(&256u16.to_be_bytes());
    message.extend_from_slice(&100u16.to_be_bytes());
    message.extend_from_slice(&[0u8; 10]);

    let err = pipeline.collect(&message[..]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LongSet);
    assert!(err.is_fatal());
    assert_eq!(err.set_offset(), 16);
    assert_eq!(pipeline.collector().placements_started, 0);
}

#[test]
fn test_unknown_template_id_is_skipped_silently() {
    let (mut pipeline, _) = u32_pipeline(8);
    let message = ipfix_message(
        0,
        &[
            (300, vec![1, 2, 3, 4]),
            (300, vec![5, 6, 7, 8]), // second set warns no further
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().placements_started, 0);
}

#[test]
fn test_partial_placement_consumes_whole_records() {
    // wire template: sourceIPv4Address followed by octetDeltaCount; the
    // placement only asks for the address, so 8 octets per record are
    // skipped
    let (mut pipeline, _) = u32_pipeline(8);
    let mut data = vec![0xc0, 0x00, 0x02, 0x01];
    data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 42]);
    data.extend_from_slice(&[0x0a, 0x00, 0x00, 0x01]);
    data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 43]);
    let message = ipfix_message(
        0,
        &[(2, template_record(256, &[(8, 4), (1, 8)])), (256, data)],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201, 0x0a00_0001]);
}

#[test]
fn test_malformed_template_set_skipped_message_continues() {
    let (mut pipeline, _) = u32_pipeline(8);
    // claims three fields but carries only one
    let mut truncated = Vec::new();
    truncated.extend_from_slice(&257u16.to_be_bytes());
    truncated.extend_from_slice(&3u16.to_be_bytes());
    truncated.extend_from_slice(&[0, 8, 0, 4]);
    let message = ipfix_message(
        0,
        &[
            (2, template_record(256, &[(8, 4)])),
            (2, truncated),
            (256, vec![0xc0, 0x00, 0x02, 0x01]),
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201]);
}

#[test]
fn test_observation_domains_scope_template_ids() {
    let (mut pipeline, _) = u32_pipeline(8);
    let template_in_seven = ipfix_message(7, &[(2, template_record(256, &[(8, 4)]))]);
    let data_in_eight = ipfix_message(8, &[(256, vec![1, 2, 3, 4])]);
    let data_in_seven = ipfix_message(7, &[(256, vec![0xc0, 0x00, 0x02, 0x01])]);
    pipeline.collect(&template_in_seven[..]).unwrap();
    pipeline.collect(&data_in_eight[..]).unwrap();
    pipeline.collect(&data_in_seven[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201]);
}

#[test]
fn test_enterprise_field_specifier_and_unknown_elements() {
    // an enterprise IE unknown to the model is installed as an octetArray
    // placeholder and can be skipped over
    let (mut pipeline, _) = u32_pipeline(8);
    let mut record = Vec::new();
    record.extend_from_slice(&256u16.to_be_bytes());
    record.extend_from_slice(&2u16.to_be_bytes());
    record.extend_from_slice(&(0x8000u16 | 42).to_be_bytes()); // enterprise bit
    record.extend_from_slice(&3u16.to_be_bytes());
    record.extend_from_slice(&9999u32.to_be_bytes()); // pen
    record.extend_from_slice(&[0, 8, 0, 4]);
    let message = ipfix_message(
        0,
        &[
            (2, record),
            (256, vec![9, 9, 9, 0xc0, 0x00, 0x02, 0x01]),
        ],
    );
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201]);
}

struct InstallingCollector {
    model: Arc<InfoModel>,
    cell: Rc<Cell<u32>>,
    seen: Vec<u32>,
    unhandled_calls: usize,
}

impl PlacementCollector for InstallingCollector {
    fn start_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        self.seen.push(self.cell.get());
        Ok(())
    }

    fn unhandled_data_set(
        &mut self,
        registry: &mut WireTemplateRegistry,
        domain: u32,
        set_id: u16,
        _payload: &[u8],
    ) -> Result<UnhandledAction, ErrorContext> {
        self.unhandled_calls += 1;
        let mut template = IETemplate::new();
        template.add(self.model.lookup(0, 8, 4).unwrap());
        registry.install(domain, set_id, template);
        Ok(UnhandledAction::Again)
    }
}

#[test]
fn test_unhandled_data_set_installs_template_and_retries() {
    let model = Arc::new(InfoModel::with_default_registry());
    let cell = Rc::new(Cell::new(0u32));
    let mut placement = PlacementTemplate::new();
    placement
        .register_placement(
            &model.lookup(0, 8, 0).unwrap(),
            DecodeTarget::U32(Rc::clone(&cell)),
        )
        .unwrap();
    let mut pipeline = PlacementPipeline::with_model(
        Protocol::Ipfix,
        Arc::clone(&model),
        InstallingCollector {
            model,
            cell,
            seen: Vec::new(),
            unhandled_calls: 0,
        },
    );
    pipeline.register_placement_template(Rc::new(placement));
    pipeline.deliver_unhandled_data_sets(true);

    let message = ipfix_message(0, &[(300, vec![0xc0, 0x00, 0x02, 0x01])]);
    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().unhandled_calls, 1);
    assert_eq!(pipeline.collector().seen, vec![0xc000_0201]);
}

/// Counts framing callbacks to check pairing and order.
#[derive(Default)]
struct CountingHandler {
    calls: Vec<&'static str>,
}

impl ContentHandler for CountingHandler {
    fn start_session(&mut self) -> Result<(), ErrorContext> {
        self.calls.push("start_session");
        Ok(())
    }

    fn end_session(&mut self) -> Result<(), ErrorContext> {
        self.calls.push("end_session");
        Ok(())
    }

    fn start_message(&mut self, _: &MessageHeader) -> Result<(), ErrorContext> {
        self.calls.push("start_message");
        Ok(())
    }

    fn end_message(&mut self) -> Result<(), ErrorContext> {
        self.calls.push("end_message");
        Ok(())
    }

    fn start_template_set(&mut self, _: u16, _: Span<'_>) -> Result<(), ErrorContext> {
        self.calls.push("start_template_set");
        Ok(())
    }

    fn end_template_set(&mut self) -> Result<(), ErrorContext> {
        self.calls.push("end_template_set");
        Ok(())
    }

    fn start_options_template_set(&mut self, _: u16, _: Span<'_>) -> Result<(), ErrorContext> {
        self.calls.push("start_options_template_set");
        Ok(())
    }

    fn end_options_template_set(&mut self) -> Result<(), ErrorContext> {
        self.calls.push("end_options_template_set");
        Ok(())
    }

    fn start_data_set(&mut self, _: u16, _: Span<'_>) -> Result<(), ErrorContext> {
        self.calls.push("start_data_set");
        Ok(())
    }

    fn end_data_set(&mut self) -> Result<(), ErrorContext> {
        self.calls.push("end_data_set");
        Ok(())
    }
}

#[test]
fn test_framing_callback_pairs_in_order() {
    let message = ipfix_message(
        0,
        &[
            (2, template_record(256, &[(8, 4)])),
            (3, {
                // options template: id 257, field count 1, scope count 1
                let mut record = Vec::new();
                record.extend_from_slice(&257u16.to_be_bytes());
                record.extend_from_slice(&1u16.to_be_bytes());
                record.extend_from_slice(&1u16.to_be_bytes());
                record.extend_from_slice(&[0, 10, 0, 4]);
                record
            }),
            (256, vec![1, 2, 3, 4]),
        ],
    );
    let mut handler = CountingHandler::default();
    IpfixMessageStreamParser::new()
        .parse(&message[..], &mut handler)
        .unwrap();
    assert_eq!(
        handler.calls,
        vec![
            "start_session",
            "start_message",
            "start_template_set",
            "end_template_set",
            "start_options_template_set",
            "end_options_template_set",
            "start_data_set",
            "end_data_set",
            "end_message",
            "end_session",
        ]
    );
}

#[test]
fn test_short_body_is_fatal() {
    let (mut pipeline, _) = u32_pipeline(8);
    let message = ipfix_message(0, &[(2, template_record(256, &[(8, 4)]))]);
    let err = pipeline.collect(&message[..message.len() - 2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShortBody);
}

#[test]
fn test_under_minimum_length_message_is_fatal() {
    let (mut pipeline, _) = u32_pipeline(8);
    // header-only message: 16 octets, below the 20-octet minimum
    let message = ipfix_message(0, &[]);
    let err = pipeline.collect(&message[..]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ShortMessage);
    assert!(err.is_fatal());
}

#[test]
fn test_wrong_version_is_fatal() {
    let (mut pipeline, _) = u32_pipeline(8);
    let mut message = ipfix_message(0, &[]);
    message[0] = 0;
    message[1] = 9;
    let err = pipeline.collect(&message[..]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MessageVersionNumber);
}

mod netflow {
    use super::*;

    struct HeaderAndValueCapture {
        cell: Rc<Cell<u32>>,
        seen: Vec<u32>,
        headers: Vec<MessageHeader>,
    }

    impl PlacementCollector for HeaderAndValueCapture {
        fn start_message(&mut self, header: &MessageHeader) -> Result<(), ErrorContext> {
            self.headers.push(header.clone());
            Ok(())
        }

        fn start_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
            Ok(())
        }

        fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
            self.seen.push(self.cell.get());
            Ok(())
        }
    }

    fn v9_message(source_id: u32, sets: &[(u16, Vec<u8>)]) -> Vec<u8> {
        let mut message = Vec::new();
        message.extend_from_slice(&9u16.to_be_bytes());
        message.extend_from_slice(&(sets.len() as u16).to_be_bytes());
        message.extend_from_slice(&1000u32.to_be_bytes()); // sysUpTime
        message.extend_from_slice(&1_000_000u32.to_be_bytes()); // unix seconds
        message.extend_from_slice(&7u32.to_be_bytes()); // sequence
        message.extend_from_slice(&source_id.to_be_bytes());
        for (set_id, payload) in sets {
            message.extend_from_slice(&set_id.to_be_bytes());
            message.extend_from_slice(&((payload.len() + 4) as u16).to_be_bytes());
            message.extend_from_slice(payload);
        }
        message
    }

    #[test]
    fn test_v9_stream_with_two_messages() {
        let model = Arc::new(InfoModel::with_default_registry());
        let cell = Rc::new(Cell::new(0u32));
        let mut placement = PlacementTemplate::new();
        placement
            .register_placement(
                &model.lookup(0, 8, 0).unwrap(),
                DecodeTarget::U32(Rc::clone(&cell)),
            )
            .unwrap();
        let mut pipeline = PlacementPipeline::with_model(
            Protocol::NetflowV9,
            model,
            HeaderAndValueCapture {
                cell,
                seen: Vec::new(),
                headers: Vec::new(),
            },
        );
        pipeline.register_placement_template(Rc::new(placement));

        // v9 template set id is 0
        let mut stream = v9_message(5, &[(0, template_record(256, &[(8, 4)]))]);
        stream.extend_from_slice(&v9_message(5, &[(256, vec![0xc0, 0x00, 0x02, 0x01])]));
        pipeline.collect(&stream[..]).unwrap();

        let collector = pipeline.collector();
        assert_eq!(collector.seen, vec![0xc000_0201]);
        assert_eq!(collector.headers.len(), 2);
        assert_eq!(collector.headers[0].version, 9);
        assert_eq!(collector.headers[0].observation_domain, 5);
        // boot instant: export time in ms minus sysUpTime
        assert_eq!(collector.headers[0].base_time, 1_000_000u64 * 1000 - 1000);
    }

    #[test]
    fn test_v5_fixed_records() {
        let model = Arc::new(InfoModel::with_default_registry());
        let source = Rc::new(Cell::new(Ipv4Addr::UNSPECIFIED));
        let packets = Rc::new(Cell::new(0u64));
        let source_port = Rc::new(Cell::new(0u16));

        let mut placement = PlacementTemplate::new();
        placement
            .register_placement(
                &model.lookup(0, 8, 0).unwrap(),
                DecodeTarget::Ipv4(Rc::clone(&source)),
            )
            .unwrap();
        placement
            .register_placement(
                &model.lookup(0, 2, 0).unwrap(),
                DecodeTarget::U64(Rc::clone(&packets)),
            )
            .unwrap();
        placement
            .register_placement(
                &model.lookup(0, 7, 0).unwrap(),
                DecodeTarget::U16(Rc::clone(&source_port)),
            )
            .unwrap();

        struct V5Capture {
            source: Rc<Cell<Ipv4Addr>>,
            packets: Rc<Cell<u64>>,
            source_port: Rc<Cell<u16>>,
            records: Vec<(Ipv4Addr, u64, u16)>,
            headers: Vec<MessageHeader>,
        }

        impl PlacementCollector for V5Capture {
            fn start_message(&mut self, header: &MessageHeader) -> Result<(), ErrorContext> {
                self.headers.push(header.clone());
                Ok(())
            }

            fn start_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
                Ok(())
            }

            fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
                self.records.push((
                    self.source.get(),
                    self.packets.get(),
                    self.source_port.get(),
                ));
                Ok(())
            }
        }

        let mut pipeline = PlacementPipeline::with_model(
            Protocol::NetflowV5,
            model,
            V5Capture {
                source: Rc::clone(&source),
                packets: Rc::clone(&packets),
                source_port: Rc::clone(&source_port),
                records: Vec::new(),
                headers: Vec::new(),
            },
        );
        pipeline.register_placement_template(Rc::new(placement));

        let mut message = Vec::new();
        message.extend_from_slice(&5u16.to_be_bytes());
        message.extend_from_slice(&1u16.to_be_bytes()); // one record
        message.extend_from_slice(&1000u32.to_be_bytes()); // sysUpTime
        message.extend_from_slice(&1_000_000u32.to_be_bytes()); // unix seconds
        message.extend_from_slice(&0u32.to_be_bytes()); // unix nanoseconds
        message.extend_from_slice(&9u32.to_be_bytes()); // flow sequence
        message.push(1); // engine type
        message.push(2); // engine id
        message.extend_from_slice(&0u16.to_be_bytes()); // sampling

        let mut record = Vec::new();
        record.extend_from_slice(&[192, 0, 2, 1]); // source address
        record.extend_from_slice(&[10, 0, 0, 1]); // destination address
        record.extend_from_slice(&[10, 0, 0, 254]); // next hop
        record.extend_from_slice(&3u16.to_be_bytes()); // input interface
        record.extend_from_slice(&4u16.to_be_bytes()); // output interface
        record.extend_from_slice(&17u32.to_be_bytes()); // packets
        record.extend_from_slice(&1234u32.to_be_bytes()); // octets
        record.extend_from_slice(&100u32.to_be_bytes()); // first
        record.extend_from_slice(&200u32.to_be_bytes()); // last
        record.extend_from_slice(&4242u16.to_be_bytes()); // source port
        record.extend_from_slice(&53u16.to_be_bytes()); // destination port
        record.push(0); // padding
        record.push(0x10); // tcp flags
        record.push(17); // protocol
        record.push(0); // tos
        record.extend_from_slice(&65000u16.to_be_bytes()); // source as
        record.extend_from_slice(&65001u16.to_be_bytes()); // destination as
        record.push(24); // source mask
        record.push(16); // destination mask
        record.extend_from_slice(&0u16.to_be_bytes()); // padding
        assert_eq!(record.len(), 48);
        message.extend_from_slice(&record);

        pipeline.collect(&message[..]).unwrap();
        let collector = pipeline.collector();
        assert_eq!(
            collector.records,
            vec![(Ipv4Addr::new(192, 0, 2, 1), 17, 4242)]
        );
        assert_eq!(collector.headers.len(), 1);
        assert_eq!(collector.headers[0].version, 5);
        assert_eq!(collector.headers[0].observation_domain, (1 << 8) | 2);
    }
}
