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

//! Decodes an in-memory IPFIX message into a couple of destination cells.

use std::{cell::Cell, net::Ipv4Addr, rc::Rc, sync::Arc};

use flowplace_model::InfoModel;
use flowplace_pkt::{
    DecodeTarget, ErrorContext, PlacementCollector, PlacementPipeline, PlacementTemplate, Protocol,
};

struct FlowPrinter {
    source: Rc<Cell<Ipv4Addr>>,
    octets: Rc<Cell<u64>>,
    records: usize,
}

impl PlacementCollector for FlowPrinter {
    fn start_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        Ok(())
    }

    fn end_placement(&mut self, _: &Rc<PlacementTemplate>) -> Result<(), ErrorContext> {
        self.records += 1;
        println!(
            "record {}: source {} sent {} octets",
            self.records,
            self.source.get(),
            self.octets.get()
        );
        Ok(())
    }
}

fn main() {
    let model = Arc::clone(InfoModel::shared());

    let source = Rc::new(Cell::new(Ipv4Addr::UNSPECIFIED));
    let octets = Rc::new(Cell::new(0u64));

    let mut placement = PlacementTemplate::new();
    placement
        .register_placement(
            &model.lookup_spec("sourceIPv4Address").unwrap().unwrap(),
            DecodeTarget::Ipv4(Rc::clone(&source)),
        )
        .unwrap();
    placement
        .register_placement(
            &model.lookup_spec("octetDeltaCount").unwrap().unwrap(),
            DecodeTarget::U64(Rc::clone(&octets)),
        )
        .unwrap();

    let mut pipeline = PlacementPipeline::new(
        Protocol::Ipfix,
        FlowPrinter {
            source,
            octets,
            records: 0,
        },
    );
    pipeline.register_placement_template(Rc::new(placement));

    // One message: a template set (id 256: sourceIPv4Address[4],
    // octetDeltaCount[8]) followed by a data set with two records.
    let message: Vec<u8> = vec![
        0x00, 0x0a, 0x00, 0x3c, // version 10, length 60
        0x64, 0x03, 0x32, 0xc0, // export time
        0x00, 0x00, 0x0e, 0xe4, // sequence number
        0x00, 0x00, 0x00, 0x00, // observation domain
        0x00, 0x02, 0x00, 0x10, // template set, length 16
        0x01, 0x00, 0x00, 0x02, // template 256, 2 fields
        0x00, 0x08, 0x00, 0x04, // sourceIPv4Address[4]
        0x00, 0x01, 0x00, 0x08, // octetDeltaCount[8]
        0x01, 0x00, 0x00, 0x1c, // data set 256, length 28
        0xc0, 0x00, 0x02, 0x01, // 192.0.2.1
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x20, // 1312 octets
        0x0a, 0x00, 0x00, 0x01, // 10.0.0.1
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x09, // 9 octets
    ];

    pipeline.collect(&message[..]).unwrap();
    assert_eq!(pipeline.collector().records, 2);
}
