use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::{
    bytes::{be_u16, be_u8, take},
    Parser,
};
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::ManufacturerSpecific;

fn hex_fmt<T: AsRef<[u8]>>(n: &T, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(n))
}

#[derive(Debug, Clone, PartialEq)]
pub enum ManufacturerSpecificCommand {
    Get(ManufacturerSpecificGet),
    Report(ManufacturerSpecificReport),
    DeviceSpecificGet(DeviceSpecificGet),
    DeviceSpecificReport(DeviceSpecificReport),
}

impl ManufacturerSpecificCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x04 => Self::Get(ManufacturerSpecificGet {}),
            0x05 => Self::Report(ManufacturerSpecificReport {
                manufacturer_id: be_u16(i)?,
                product_type_id: be_u16(i)?,
                product_id: be_u16(i)?,
            }),
            0x06 if version >= 2 => Self::DeviceSpecificGet(DeviceSpecificGet {
                device_id_type: be_u8(i)? & 0x07,
            }),
            0x07 if version >= 2 => {
                let device_id_type = be_u8(i)? & 0x07;
                let b = be_u8(i)?;
                let length = b & 0x1f;
                let device_id_data_format = (b >> 5) & 0x07;
                let device_id_data = take(length).parse(i)?;
                Self::DeviceSpecificReport(DeviceSpecificReport {
                    device_id_type,
                    device_id_data_format,
                    device_id_data,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            ManufacturerSpecificCommand::Get(_) => 0x04,
            ManufacturerSpecificCommand::Report(_) => 0x05,
            ManufacturerSpecificCommand::DeviceSpecificGet(_) => 0x06,
            ManufacturerSpecificCommand::DeviceSpecificReport(_) => 0x07,
        }
    }
}

impl Serializable for ManufacturerSpecificCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            ManufacturerSpecificCommand::Get(c) => c.serialize(output),
            ManufacturerSpecificCommand::Report(c) => c.serialize(output),
            ManufacturerSpecificCommand::DeviceSpecificGet(c) => c.serialize(output),
            ManufacturerSpecificCommand::DeviceSpecificReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManufacturerSpecificGet {}

impl Serializable for ManufacturerSpecificGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x04).serialize(output);
    }
}

#[derive(custom_debug_derive::Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerSpecificReport {
    #[debug(format = "{:#06x}")]
    pub manufacturer_id: u16,
    #[debug(format = "{:#06x}")]
    pub product_type_id: u16,
    #[debug(format = "{:#06x}")]
    pub product_id: u16,
}

impl Serializable for ManufacturerSpecificReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u16, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x05),
            be_u16(self.manufacturer_id),
            be_u16(self.product_type_id),
            be_u16(self.product_id),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpecificGet {
    pub device_id_type: u8,
}

impl Serializable for DeviceSpecificGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x06), be_u8(self.device_id_type & 0x07))).serialize(output);
    }
}

#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct DeviceSpecificReport {
    pub device_id_type: u8,
    pub device_id_data_format: u8,
    #[debug(with = "hex_fmt")]
    pub device_id_data: Bytes,
}

impl Serializable for DeviceSpecificReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };
        let length_and_format =
            (self.device_id_data.len() as u8 & 0x1f) | ((self.device_id_data_format & 0x07) << 5);
        tuple((
            cc_header(CLASS, 0x07),
            be_u8(self.device_id_type & 0x07),
            be_u8(length_and_format),
            slice(&self.device_id_data),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_report_roundtrip() {
        let data = hex::decode("7205008600020064").unwrap();
        let cmd = Command::from_bytes(&data, 1).unwrap();
        let Command::ManufacturerSpecific(ManufacturerSpecificCommand::Report(report)) = &cmd
        else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.manufacturer_id, 0x0086);
        assert_eq!(report.product_type_id, 0x0002);
        assert_eq!(report.product_id, 0x0064);
        assert_eq!(cmd.as_bytes().as_ref(), data.as_slice());
    }
}
