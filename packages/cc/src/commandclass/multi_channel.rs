use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::{
    bytes::{be_u8, rest},
    Parser,
};
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::MultiChannel;

fn hex_fmt<T: AsRef<[u8]>>(n: &T, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(n))
}

/// Version 1 is the older MULTI_INSTANCE shape of this class; the instance
/// commands share their codes with the v2+ variants.
#[derive(Debug, Clone, PartialEq)]
pub enum MultiChannelCommand {
    InstanceGet(MultiInstanceGet),
    InstanceReport(MultiInstanceReport),
    InstanceCmdEncap(MultiInstanceCmdEncap),
    EndPointGet(MultiChannelEndPointGet),
    EndPointReport(MultiChannelEndPointReport),
    CapabilityGet(MultiChannelCapabilityGet),
    CapabilityReport(MultiChannelCapabilityReport),
    EndPointFind(MultiChannelEndPointFind),
    EndPointFindReport(MultiChannelEndPointFindReport),
    CmdEncap(MultiChannelCmdEncap),
    AggregatedMembersGet(MultiChannelAggregatedMembersGet),
    AggregatedMembersReport(MultiChannelAggregatedMembersReport),
}

impl MultiChannelCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x04 => Self::InstanceGet(MultiInstanceGet {
                command_class: be_u8(i)?,
            }),
            0x05 => {
                let command_class = be_u8(i)?;
                let instances = if version >= 2 {
                    be_u8(i)? & 0x7f
                } else {
                    be_u8(i)?
                };
                Self::InstanceReport(MultiInstanceReport {
                    command_class,
                    instances,
                })
            }
            0x06 => {
                let instance = if version >= 2 {
                    be_u8(i)? & 0x7f
                } else {
                    be_u8(i)?
                };
                Self::InstanceCmdEncap(MultiInstanceCmdEncap {
                    instance,
                    command_class: be_u8(i)?,
                    command: be_u8(i)?,
                    parameter: rest(i)?,
                })
            }
            0x07 if version >= 2 => Self::EndPointGet(MultiChannelEndPointGet {}),
            0x08 if version >= 2 => {
                let b = be_u8(i)?;
                let individual_end_points = be_u8(i)? & 0x7f;
                let aggregated_end_points = if version >= 4 {
                    Some(be_u8(i)? & 0x7f)
                } else {
                    None
                };
                Self::EndPointReport(MultiChannelEndPointReport {
                    identical: b & 0x40 != 0,
                    dynamic: b & 0x80 != 0,
                    individual_end_points,
                    aggregated_end_points,
                })
            }
            0x09 if version >= 2 => Self::CapabilityGet(MultiChannelCapabilityGet {
                end_point: be_u8(i)? & 0x7f,
            }),
            0x0a if version >= 2 => {
                let b = be_u8(i)?;
                Self::CapabilityReport(MultiChannelCapabilityReport {
                    end_point: b & 0x7f,
                    dynamic: b & 0x80 != 0,
                    generic_device_class: be_u8(i)?,
                    specific_device_class: be_u8(i)?,
                    command_classes: rest(i)?.to_vec(),
                })
            }
            0x0b if version >= 2 => Self::EndPointFind(MultiChannelEndPointFind {
                generic_device_class: be_u8(i)?,
                specific_device_class: be_u8(i)?,
            }),
            0x0c if version >= 2 => {
                let reports_to_follow = be_u8(i)?;
                let generic_device_class = be_u8(i)?;
                let specific_device_class = be_u8(i)?;
                let mut end_points = Vec::new();
                while !i.is_empty() {
                    end_points.push(be_u8(i)? & 0x7f);
                }
                Self::EndPointFindReport(MultiChannelEndPointFindReport {
                    reports_to_follow,
                    generic_device_class,
                    specific_device_class,
                    end_points,
                })
            }
            0x0d if version >= 2 => {
                let source_end_point = be_u8(i)? & 0x7f;
                let b = be_u8(i)?;
                Self::CmdEncap(MultiChannelCmdEncap {
                    source_end_point,
                    destination_end_point: b & 0x7f,
                    bit_address: b & 0x80 != 0,
                    command_class: be_u8(i)?,
                    command: be_u8(i)?,
                    parameter: rest(i)?,
                })
            }
            0x0e if version >= 4 => {
                Self::AggregatedMembersGet(MultiChannelAggregatedMembersGet {
                    aggregated_end_point: be_u8(i)? & 0x7f,
                })
            }
            0x0f if version >= 4 => {
                let aggregated_end_point = be_u8(i)? & 0x7f;
                let members =
                    wavez_core::encoding::length_bitmask(0).parse(i)?;
                Self::AggregatedMembersReport(MultiChannelAggregatedMembersReport {
                    aggregated_end_point,
                    members,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            MultiChannelCommand::InstanceGet(_) => 0x04,
            MultiChannelCommand::InstanceReport(_) => 0x05,
            MultiChannelCommand::InstanceCmdEncap(_) => 0x06,
            MultiChannelCommand::EndPointGet(_) => 0x07,
            MultiChannelCommand::EndPointReport(_) => 0x08,
            MultiChannelCommand::CapabilityGet(_) => 0x09,
            MultiChannelCommand::CapabilityReport(_) => 0x0a,
            MultiChannelCommand::EndPointFind(_) => 0x0b,
            MultiChannelCommand::EndPointFindReport(_) => 0x0c,
            MultiChannelCommand::CmdEncap(_) => 0x0d,
            MultiChannelCommand::AggregatedMembersGet(_) => 0x0e,
            MultiChannelCommand::AggregatedMembersReport(_) => 0x0f,
        }
    }
}

impl Serializable for MultiChannelCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            MultiChannelCommand::InstanceGet(c) => c.serialize(output),
            MultiChannelCommand::InstanceReport(c) => c.serialize(output),
            MultiChannelCommand::InstanceCmdEncap(c) => c.serialize(output),
            MultiChannelCommand::EndPointGet(c) => c.serialize(output),
            MultiChannelCommand::EndPointReport(c) => c.serialize(output),
            MultiChannelCommand::CapabilityGet(c) => c.serialize(output),
            MultiChannelCommand::CapabilityReport(c) => c.serialize(output),
            MultiChannelCommand::EndPointFind(c) => c.serialize(output),
            MultiChannelCommand::EndPointFindReport(c) => c.serialize(output),
            MultiChannelCommand::CmdEncap(c) => c.serialize(output),
            MultiChannelCommand::AggregatedMembersGet(c) => c.serialize(output),
            MultiChannelCommand::AggregatedMembersReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiInstanceGet {
    pub command_class: u8,
}

impl Serializable for MultiInstanceGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x04), be_u8(self.command_class))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiInstanceReport {
    pub command_class: u8,
    pub instances: u8,
}

impl Serializable for MultiInstanceReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x05),
            be_u8(self.command_class),
            be_u8(self.instances & 0x7f),
        ))
        .serialize(output);
    }
}

#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct MultiInstanceCmdEncap {
    pub instance: u8,
    pub command_class: u8,
    pub command: u8,
    #[debug(with = "hex_fmt")]
    pub parameter: Bytes,
}

impl Serializable for MultiInstanceCmdEncap {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };
        tuple((
            cc_header(CLASS, 0x06),
            be_u8(self.instance & 0x7f),
            be_u8(self.command_class),
            be_u8(self.command),
            slice(&self.parameter),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiChannelEndPointGet {}

impl Serializable for MultiChannelEndPointGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x07).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiChannelEndPointReport {
    pub identical: bool,
    pub dynamic: bool,
    pub individual_end_points: u8,
    pub aggregated_end_points: Option<u8>,
}

impl Serializable for MultiChannelEndPointReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        let mut flags = 0u8;
        if self.identical {
            flags |= 0x40;
        }
        if self.dynamic {
            flags |= 0x80;
        }
        tuple((
            cc_header(CLASS, 0x08),
            be_u8(flags),
            be_u8(self.individual_end_points & 0x7f),
            self.aggregated_end_points.map(|ep| be_u8(ep & 0x7f)),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiChannelCapabilityGet {
    pub end_point: u8,
}

impl Serializable for MultiChannelCapabilityGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x09), be_u8(self.end_point & 0x7f))).serialize(output);
    }
}

/// Command classes supported by one endpoint. The list ends at the 0xEF
/// support/control marker as far as this driver is concerned; truncation
/// happens in the node model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiChannelCapabilityReport {
    pub end_point: u8,
    pub dynamic: bool,
    pub generic_device_class: u8,
    pub specific_device_class: u8,
    pub command_classes: Vec<u8>,
}

impl Serializable for MultiChannelCapabilityReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };
        let mut b = self.end_point & 0x7f;
        if self.dynamic {
            b |= 0x80;
        }
        tuple((
            cc_header(CLASS, 0x0a),
            be_u8(b),
            be_u8(self.generic_device_class),
            be_u8(self.specific_device_class),
            slice(&self.command_classes),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiChannelEndPointFind {
    pub generic_device_class: u8,
    pub specific_device_class: u8,
}

impl Serializable for MultiChannelEndPointFind {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x0b),
            be_u8(self.generic_device_class),
            be_u8(self.specific_device_class),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiChannelEndPointFindReport {
    pub reports_to_follow: u8,
    pub generic_device_class: u8,
    pub specific_device_class: u8,
    pub end_points: Vec<u8>,
}

impl Serializable for MultiChannelEndPointFindReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x0c),
            be_u8(self.reports_to_follow),
            be_u8(self.generic_device_class),
            be_u8(self.specific_device_class),
            |out: &mut BytesMut| {
                for ep in &self.end_points {
                    be_u8(ep & 0x7f).serialize(out);
                }
            },
        ))
        .serialize(output);
    }
}

/// The multi-channel encapsulation frame. Commands addressed to an endpoint
/// other than the root travel inside one of these.
#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct MultiChannelCmdEncap {
    pub source_end_point: u8,
    pub destination_end_point: u8,
    pub bit_address: bool,
    pub command_class: u8,
    pub command: u8,
    #[debug(with = "hex_fmt")]
    pub parameter: Bytes,
}

impl MultiChannelCmdEncap {
    /// The encapsulated command payload: `[class, command, parameter…]`.
    pub fn inner_payload(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.parameter.len() + 2);
        out.extend_from_slice(&[self.command_class, self.command]);
        out.extend_from_slice(&self.parameter);
        out.freeze()
    }
}

impl Serializable for MultiChannelCmdEncap {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };
        let mut dst = self.destination_end_point & 0x7f;
        if self.bit_address {
            dst |= 0x80;
        }
        tuple((
            cc_header(CLASS, 0x0d),
            be_u8(self.source_end_point & 0x7f),
            be_u8(dst),
            be_u8(self.command_class),
            be_u8(self.command),
            slice(&self.parameter),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiChannelAggregatedMembersGet {
    pub aggregated_end_point: u8,
}

impl Serializable for MultiChannelAggregatedMembersGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x0e), be_u8(self.aggregated_end_point & 0x7f)))
            .serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiChannelAggregatedMembersReport {
    pub aggregated_end_point: u8,
    /// Member bit positions decoded from the bitmask
    pub members: Vec<u8>,
}

impl Serializable for MultiChannelAggregatedMembersReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        use wavez_core::encoding;
        let mask = encoding::bitmask(&self.members, None, 0).as_bytes();
        tuple((
            cc_header(CLASS, 0x0f),
            be_u8(self.aggregated_end_point & 0x7f),
            be_u8(mask.len() as u8),
            serialize::bytes::slice(mask),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_cmd_encap_roundtrip() {
        // SWITCH_BINARY Set(0xff) wrapped for endpoint 2
        let data = hex::decode("600d00022501ff").unwrap();
        let cmd = Command::from_bytes(&data, 3).unwrap();
        let Command::MultiChannel(MultiChannelCommand::CmdEncap(encap)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(encap.source_end_point, 0);
        assert_eq!(encap.destination_end_point, 2);
        assert!(!encap.bit_address);
        assert_eq!(encap.inner_payload().as_ref(), &[0x25, 0x01, 0xff]);
        assert_eq!(cmd.as_bytes().as_ref(), data.as_slice());
    }

    #[test]
    fn test_capability_report() {
        let data = hex::decode("600a02101025262027").unwrap();
        let cmd = Command::from_bytes(&data, 2).unwrap();
        let Command::MultiChannel(MultiChannelCommand::CapabilityReport(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.end_point, 2);
        assert_eq!(report.command_classes, vec![0x25, 0x26, 0x20, 0x27]);
    }

    #[test]
    fn test_end_point_report_v4_aggregated() {
        let data = hex::decode("6008400302").unwrap();
        let cmd = Command::from_bytes(&data, 4).unwrap();
        let Command::MultiChannel(MultiChannelCommand::EndPointReport(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert!(report.identical);
        assert_eq!(report.individual_end_points, 3);
        assert_eq!(report.aggregated_end_points, Some(2));
    }
}
