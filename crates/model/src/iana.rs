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

//! The bundled slice of the IANA "IPFIX Information Elements" registry.
//!
//! Entries are `(name, element id, type, canonical wire length)`. This is
//! not the complete registry; it covers the elements that commonly occur in
//! flow exports (including everything the NetFlow v5 fixed record layout
//! maps onto). Elements absent here are synthesized as unknown octetArray
//! descriptors when they show up in templates.

use crate::ie::{IEType, VARLEN};

pub(crate) const DEFAULT_IPFIX_REGISTRY: &[(&str, u16, IEType, u16)] = &[
    ("octetDeltaCount", 1, IEType::unsigned64, 8),
    ("packetDeltaCount", 2, IEType::unsigned64, 8),
    ("deltaFlowCount", 3, IEType::unsigned64, 8),
    ("protocolIdentifier", 4, IEType::unsigned8, 1),
    ("ipClassOfService", 5, IEType::unsigned8, 1),
    ("tcpControlBits", 6, IEType::unsigned8, 1),
    ("sourceTransportPort", 7, IEType::unsigned16, 2),
    ("sourceIPv4Address", 8, IEType::ipv4Address, 4),
    ("sourceIPv4PrefixLength", 9, IEType::unsigned8, 1),
    ("ingressInterface", 10, IEType::unsigned32, 4),
    ("destinationTransportPort", 11, IEType::unsigned16, 2),
    ("destinationIPv4Address", 12, IEType::ipv4Address, 4),
    ("destinationIPv4PrefixLength", 13, IEType::unsigned8, 1),
    ("egressInterface", 14, IEType::unsigned32, 4),
    ("ipNextHopIPv4Address", 15, IEType::ipv4Address, 4),
    ("bgpSourceAsNumber", 16, IEType::unsigned32, 4),
    ("bgpDestinationAsNumber", 17, IEType::unsigned32, 4),
    ("bgpNextHopIPv4Address", 18, IEType::ipv4Address, 4),
    ("postMCastPacketDeltaCount", 19, IEType::unsigned64, 8),
    ("postMCastOctetDeltaCount", 20, IEType::unsigned64, 8),
    ("flowEndSysUpTime", 21, IEType::unsigned32, 4),
    ("flowStartSysUpTime", 22, IEType::unsigned32, 4),
    ("postOctetDeltaCount", 23, IEType::unsigned64, 8),
    ("postPacketDeltaCount", 24, IEType::unsigned64, 8),
    ("minimumIpTotalLength", 25, IEType::unsigned64, 8),
    ("maximumIpTotalLength", 26, IEType::unsigned64, 8),
    ("sourceIPv6Address", 27, IEType::ipv6Address, 16),
    ("destinationIPv6Address", 28, IEType::ipv6Address, 16),
    ("sourceIPv6PrefixLength", 29, IEType::unsigned8, 1),
    ("destinationIPv6PrefixLength", 30, IEType::unsigned8, 1),
    ("flowLabelIPv6", 31, IEType::unsigned32, 4),
    ("icmpTypeCodeIPv4", 32, IEType::unsigned16, 2),
    ("igmpType", 33, IEType::unsigned8, 1),
    ("flowActiveTimeout", 36, IEType::unsigned16, 2),
    ("flowIdleTimeout", 37, IEType::unsigned16, 2),
    ("exportedOctetTotalCount", 40, IEType::unsigned64, 8),
    ("exportedMessageTotalCount", 41, IEType::unsigned64, 8),
    ("exportedFlowRecordTotalCount", 42, IEType::unsigned64, 8),
    ("sourceIPv4Prefix", 44, IEType::ipv4Address, 4),
    ("destinationIPv4Prefix", 45, IEType::ipv4Address, 4),
    ("mplsTopLabelType", 46, IEType::unsigned8, 1),
    ("mplsTopLabelIPv4Address", 47, IEType::ipv4Address, 4),
    ("minimumTTL", 52, IEType::unsigned8, 1),
    ("maximumTTL", 53, IEType::unsigned8, 1),
    ("fragmentIdentification", 54, IEType::unsigned32, 4),
    ("postIpClassOfService", 55, IEType::unsigned8, 1),
    ("sourceMacAddress", 56, IEType::macAddress, 6),
    ("postDestinationMacAddress", 57, IEType::macAddress, 6),
    ("vlanId", 58, IEType::unsigned16, 2),
    ("postVlanId", 59, IEType::unsigned16, 2),
    ("ipVersion", 60, IEType::unsigned8, 1),
    ("flowDirection", 61, IEType::unsigned8, 1),
    ("ipNextHopIPv6Address", 62, IEType::ipv6Address, 16),
    ("bgpNextHopIPv6Address", 63, IEType::ipv6Address, 16),
    ("ipv6ExtensionHeaders", 64, IEType::unsigned32, 4),
    ("mplsTopLabelStackSection", 70, IEType::octetArray, VARLEN),
    ("mplsLabelStackSection2", 71, IEType::octetArray, VARLEN),
    ("mplsLabelStackSection3", 72, IEType::octetArray, VARLEN),
    ("destinationMacAddress", 80, IEType::macAddress, 6),
    ("postSourceMacAddress", 81, IEType::macAddress, 6),
    ("interfaceName", 82, IEType::string, VARLEN),
    ("interfaceDescription", 83, IEType::string, VARLEN),
    ("octetTotalCount", 85, IEType::unsigned64, 8),
    ("packetTotalCount", 86, IEType::unsigned64, 8),
    ("fragmentOffset", 88, IEType::unsigned16, 2),
    ("mplsVpnRouteDistinguisher", 90, IEType::octetArray, 8),
    ("mplsTopLabelPrefixLength", 91, IEType::unsigned8, 1),
    ("applicationDescription", 94, IEType::string, VARLEN),
    ("applicationId", 95, IEType::octetArray, VARLEN),
    ("applicationName", 96, IEType::string, VARLEN),
    ("postIpDiffServCodePoint", 98, IEType::unsigned8, 1),
    ("bgpNextAdjacentAsNumber", 128, IEType::unsigned32, 4),
    ("bgpPrevAdjacentAsNumber", 129, IEType::unsigned32, 4),
    ("exporterIPv4Address", 130, IEType::ipv4Address, 4),
    ("exporterIPv6Address", 131, IEType::ipv6Address, 16),
    ("droppedOctetDeltaCount", 132, IEType::unsigned64, 8),
    ("droppedPacketDeltaCount", 133, IEType::unsigned64, 8),
    ("flowEndReason", 136, IEType::unsigned8, 1),
    ("commonPropertiesId", 137, IEType::unsigned64, 8),
    ("observationPointId", 138, IEType::unsigned64, 8),
    ("icmpTypeCodeIPv6", 139, IEType::unsigned16, 2),
    ("mplsTopLabelIPv6Address", 140, IEType::ipv6Address, 16),
    ("lineCardId", 141, IEType::unsigned32, 4),
    ("portId", 142, IEType::unsigned32, 4),
    ("meteringProcessId", 143, IEType::unsigned32, 4),
    ("exportingProcessId", 144, IEType::unsigned32, 4),
    ("templateId", 145, IEType::unsigned16, 2),
    ("wlanChannelId", 146, IEType::unsigned8, 1),
    ("wlanSSID", 147, IEType::string, 32),
    ("flowId", 148, IEType::unsigned64, 8),
    ("observationDomainId", 149, IEType::unsigned32, 4),
    ("flowStartSeconds", 150, IEType::dateTimeSeconds, 4),
    ("flowEndSeconds", 151, IEType::dateTimeSeconds, 4),
    ("flowStartMilliseconds", 152, IEType::dateTimeMilliseconds, 8),
    ("flowEndMilliseconds", 153, IEType::dateTimeMilliseconds, 8),
    ("flowStartMicroseconds", 154, IEType::dateTimeMicroseconds, 8),
    ("flowEndMicroseconds", 155, IEType::dateTimeMicroseconds, 8),
    ("flowStartNanoseconds", 156, IEType::dateTimeNanoseconds, 8),
    ("flowEndNanoseconds", 157, IEType::dateTimeNanoseconds, 8),
    ("flowStartDeltaMicroseconds", 158, IEType::unsigned32, 4),
    ("flowEndDeltaMicroseconds", 159, IEType::unsigned32, 4),
    ("systemInitTimeMilliseconds", 160, IEType::dateTimeMilliseconds, 8),
    ("flowDurationMilliseconds", 161, IEType::unsigned32, 4),
    ("flowDurationMicroseconds", 162, IEType::unsigned32, 4),
    ("icmpTypeIPv4", 176, IEType::unsigned8, 1),
    ("icmpCodeIPv4", 177, IEType::unsigned8, 1),
    ("icmpTypeIPv6", 178, IEType::unsigned8, 1),
    ("icmpCodeIPv6", 179, IEType::unsigned8, 1),
    ("udpSourcePort", 180, IEType::unsigned16, 2),
    ("udpDestinationPort", 181, IEType::unsigned16, 2),
    ("tcpSourcePort", 182, IEType::unsigned16, 2),
    ("tcpDestinationPort", 183, IEType::unsigned16, 2),
    ("tcpSequenceNumber", 184, IEType::unsigned32, 4),
    ("tcpAcknowledgementNumber", 185, IEType::unsigned32, 4),
    ("tcpWindowSize", 186, IEType::unsigned16, 2),
    ("ipTTL", 192, IEType::unsigned8, 1),
    ("ipPayloadLength", 204, IEType::unsigned32, 4),
    ("udpMessageLength", 205, IEType::unsigned16, 2),
    ("isMulticast", 206, IEType::unsigned8, 1),
    ("paddingOctets", 210, IEType::octetArray, VARLEN),
    ("ipTotalLength", 224, IEType::unsigned64, 8),
    ("postNATSourceIPv4Address", 225, IEType::ipv4Address, 4),
    ("postNATDestinationIPv4Address", 226, IEType::ipv4Address, 4),
    ("postNAPTSourceTransportPort", 227, IEType::unsigned16, 2),
    ("postNAPTDestinationTransportPort", 228, IEType::unsigned16, 2),
    ("firewallEvent", 233, IEType::unsigned8, 1),
    ("ingressVRFID", 234, IEType::unsigned32, 4),
    ("egressVRFID", 235, IEType::unsigned32, 4),
    ("VRFname", 236, IEType::string, VARLEN),
    ("ethernetType", 256, IEType::unsigned16, 2),
    ("collectionTimeMilliseconds", 258, IEType::dateTimeMilliseconds, 8),
    ("exportSctpStreamId", 259, IEType::unsigned16, 2),
    ("observationTimeSeconds", 277, IEType::dateTimeSeconds, 4),
    ("observationTimeMilliseconds", 278, IEType::dateTimeMilliseconds, 8),
    ("observationTimeMicroseconds", 279, IEType::dateTimeMicroseconds, 8),
    ("observationTimeNanoseconds", 280, IEType::dateTimeNanoseconds, 8),
    ("dataRecordsReliability", 303, IEType::boolean, 1),
    ("samplingPopulation", 310, IEType::unsigned32, 4),
    ("samplingProbability", 311, IEType::float64, 8),
    ("absoluteError", 320, IEType::float64, 8),
    ("relativeError", 321, IEType::float64, 8),
];
