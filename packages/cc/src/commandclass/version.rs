use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::{
    bytes::{be_u16, be_u24, be_u8},
    combinators::length_repeat,
    Parser,
};
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::Version;

#[derive(Debug, Clone, PartialEq)]
pub enum VersionCommand {
    Get(VersionGet),
    Report(VersionReport),
    CommandClassGet(VersionCommandClassGet),
    CommandClassReport(VersionCommandClassReport),
    CapabilitiesGet(VersionCapabilitiesGet),
    CapabilitiesReport(VersionCapabilitiesReport),
    ZwaveSoftwareGet(VersionZwaveSoftwareGet),
    ZwaveSoftwareReport(VersionZwaveSoftwareReport),
}

impl VersionCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x11 => Self::Get(VersionGet {}),
            0x12 => Self::Report(VersionReport::parse_versioned(i, version)?),
            0x13 => Self::CommandClassGet(VersionCommandClassGet {
                requested_command_class: be_u8(i)?,
            }),
            0x14 => Self::CommandClassReport(VersionCommandClassReport {
                requested_command_class: be_u8(i)?,
                command_class_version: be_u8(i)?,
            }),
            0x15 if version >= 3 => Self::CapabilitiesGet(VersionCapabilitiesGet {}),
            0x16 if version >= 3 => {
                let flags = be_u8(i)?;
                Self::CapabilitiesReport(VersionCapabilitiesReport {
                    version: flags & 0x01 != 0,
                    command_class: flags & 0x02 != 0,
                    zwave_software: flags & 0x04 != 0,
                })
            }
            0x17 if version >= 3 => Self::ZwaveSoftwareGet(VersionZwaveSoftwareGet {}),
            0x18 if version >= 3 => Self::ZwaveSoftwareReport(VersionZwaveSoftwareReport {
                sdk_version: be_u24(i)?,
                application_framework_api_version: be_u24(i)?,
                application_framework_build_number: be_u16(i)?,
                host_interface_version: be_u24(i)?,
                host_interface_build_number: be_u16(i)?,
                protocol_version: be_u24(i)?,
                protocol_build_number: be_u16(i)?,
                application_version: be_u24(i)?,
                application_build_number: be_u16(i)?,
            }),
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            VersionCommand::Get(_) => 0x11,
            VersionCommand::Report(_) => 0x12,
            VersionCommand::CommandClassGet(_) => 0x13,
            VersionCommand::CommandClassReport(_) => 0x14,
            VersionCommand::CapabilitiesGet(_) => 0x15,
            VersionCommand::CapabilitiesReport(_) => 0x16,
            VersionCommand::ZwaveSoftwareGet(_) => 0x17,
            VersionCommand::ZwaveSoftwareReport(_) => 0x18,
        }
    }
}

impl Serializable for VersionCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            VersionCommand::Get(c) => c.serialize(output),
            VersionCommand::Report(c) => c.serialize(output),
            VersionCommand::CommandClassGet(c) => c.serialize(output),
            VersionCommand::CommandClassReport(c) => c.serialize(output),
            VersionCommand::CapabilitiesGet(c) => c.serialize(output),
            VersionCommand::CapabilitiesReport(c) => c.serialize(output),
            VersionCommand::ZwaveSoftwareGet(c) => c.serialize(output),
            VersionCommand::ZwaveSoftwareReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionGet {}

impl Serializable for VersionGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x11).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub version: u8,
    pub sub_version: u8,
}

/// Version 1 calls the firmware 0 fields "application version"; the layout
/// is the same. Hardware version and firmware targets exist from v2 on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReport {
    pub library_type: u8,
    pub protocol_version: u8,
    pub protocol_sub_version: u8,
    pub firmware0_version: u8,
    pub firmware0_sub_version: u8,
    pub hardware_version: Option<u8>,
    pub firmware_targets: Option<Vec<FirmwareVersion>>,
}

impl VersionReport {
    fn parse_versioned(i: &mut Bytes, version: u8) -> ParseResult<Self> {
        let library_type = be_u8(i)?;
        let protocol_version = be_u8(i)?;
        let protocol_sub_version = be_u8(i)?;
        let firmware0_version = be_u8(i)?;
        let firmware0_sub_version = be_u8(i)?;
        let (hardware_version, firmware_targets) = if version >= 2 {
            let hardware_version = be_u8(i)?;
            let targets = length_repeat(be_u8, |i: &mut Bytes| {
                Ok(FirmwareVersion {
                    version: be_u8(i)?,
                    sub_version: be_u8(i)?,
                })
            })
            .parse(i)?;
            (Some(hardware_version), Some(targets))
        } else {
            (None, None)
        };
        Ok(Self {
            library_type,
            protocol_version,
            protocol_sub_version,
            firmware0_version,
            firmware0_sub_version,
            hardware_version,
            firmware_targets,
        })
    }
}

impl Serializable for VersionReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            cc_header(CLASS, 0x12),
            be_u8(self.library_type),
            be_u8(self.protocol_version),
            be_u8(self.protocol_sub_version),
            be_u8(self.firmware0_version),
            be_u8(self.firmware0_sub_version),
            self.hardware_version.map(be_u8),
            |out: &mut BytesMut| {
                if let Some(targets) = &self.firmware_targets {
                    be_u8(targets.len() as u8).serialize(out);
                    for t in targets {
                        be_u8(t.version).serialize(out);
                        be_u8(t.sub_version).serialize(out);
                    }
                }
            },
        ))
        .serialize(output);
    }
}

/// Asks for the node's version of a command class. The workhorse of the
/// interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCommandClassGet {
    pub requested_command_class: u8,
}

impl Serializable for VersionCommandClassGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x13),
            be_u8(self.requested_command_class),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCommandClassReport {
    pub requested_command_class: u8,
    pub command_class_version: u8,
}

impl Serializable for VersionCommandClassReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x14),
            be_u8(self.requested_command_class),
            be_u8(self.command_class_version),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionCapabilitiesGet {}

impl Serializable for VersionCapabilitiesGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x15).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionCapabilitiesReport {
    pub version: bool,
    pub command_class: bool,
    pub zwave_software: bool,
}

impl Serializable for VersionCapabilitiesReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        let mut flags = 0u8;
        if self.version {
            flags |= 0x01;
        }
        if self.command_class {
            flags |= 0x02;
        }
        if self.zwave_software {
            flags |= 0x04;
        }
        tuple((cc_header(CLASS, 0x16), be_u8(flags))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VersionZwaveSoftwareGet {}

impl Serializable for VersionZwaveSoftwareGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x17).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionZwaveSoftwareReport {
    pub sdk_version: u32,
    pub application_framework_api_version: u32,
    pub application_framework_build_number: u16,
    pub host_interface_version: u32,
    pub host_interface_build_number: u16,
    pub protocol_version: u32,
    pub protocol_build_number: u16,
    pub application_version: u32,
    pub application_build_number: u16,
}

impl Serializable for VersionZwaveSoftwareReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u16, be_u24},
            sequence::tuple,
        };
        tuple((
            cc_header(CLASS, 0x18),
            be_u24(self.sdk_version),
            be_u24(self.application_framework_api_version),
            be_u16(self.application_framework_build_number),
            be_u24(self.host_interface_version),
            be_u16(self.host_interface_build_number),
            be_u24(self.protocol_version),
            be_u16(self.protocol_build_number),
            be_u24(self.application_version),
            be_u16(self.application_build_number),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_command_class_report_parses_at_version_1() {
        let data = [0x86, 0x14, 0x60, 0x03];
        let cmd = Command::from_bytes(&data, 1).unwrap();
        let Command::Version(VersionCommand::CommandClassReport(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.requested_command_class, 0x60);
        assert_eq!(report.command_class_version, 3);
        assert_eq!(cmd.as_bytes().as_ref(), &data);
    }

    #[test]
    fn test_report_v2_firmware_targets() {
        let data = hex::decode("86120306070401050202030405").unwrap();
        let cmd = Command::from_bytes(&data, 2).unwrap();
        let Command::Version(VersionCommand::Report(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.library_type, 3);
        assert_eq!(report.hardware_version, Some(5));
        assert_eq!(
            report.firmware_targets,
            Some(vec![
                FirmwareVersion { version: 2, sub_version: 3 },
                FirmwareVersion { version: 4, sub_version: 5 },
            ])
        );
        assert_eq!(cmd.as_bytes().as_ref(), data.as_slice());
    }
}
