use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding;
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::SensorBinary;

pub const SENSOR_IDLE: u8 = 0x00;
pub const SENSOR_EVENT_DETECTED: u8 = 0xff;

#[derive(Debug, Clone, PartialEq)]
pub enum SensorBinaryCommand {
    SupportedGetSensor(SensorBinarySupportedGetSensor),
    Get(SensorBinaryGet),
    Report(SensorBinaryReport),
    SupportedSensorReport(SensorBinarySupportedSensorReport),
}

impl SensorBinaryCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 if version >= 2 => {
                Self::SupportedGetSensor(SensorBinarySupportedGetSensor {})
            }
            0x02 => {
                let sensor_type = if version >= 2 { Some(be_u8(i)?) } else { None };
                Self::Get(SensorBinaryGet { sensor_type })
            }
            0x03 => {
                let sensor_value = be_u8(i)?;
                let sensor_type = if version >= 2 { Some(be_u8(i)?) } else { None };
                Self::Report(SensorBinaryReport {
                    sensor_value,
                    sensor_type,
                })
            }
            0x04 if version >= 2 => {
                Self::SupportedSensorReport(SensorBinarySupportedSensorReport {
                    bit_mask: encoding::parse_bitmask_rest(i, 0)?,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            SensorBinaryCommand::SupportedGetSensor(_) => 0x01,
            SensorBinaryCommand::Get(_) => 0x02,
            SensorBinaryCommand::Report(_) => 0x03,
            SensorBinaryCommand::SupportedSensorReport(_) => 0x04,
        }
    }
}

impl Serializable for SensorBinaryCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            SensorBinaryCommand::SupportedGetSensor(c) => c.serialize(output),
            SensorBinaryCommand::Get(c) => c.serialize(output),
            SensorBinaryCommand::Report(c) => c.serialize(output),
            SensorBinaryCommand::SupportedSensorReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorBinarySupportedGetSensor {}

impl Serializable for SensorBinarySupportedGetSensor {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x01).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorBinaryGet {
    pub sensor_type: Option<u8>,
}

impl Serializable for SensorBinaryGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x02), self.sensor_type.map(be_u8))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorBinaryReport {
    pub sensor_value: u8,
    pub sensor_type: Option<u8>,
}

impl Serializable for SensorBinaryReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x03),
            be_u8(self.sensor_value),
            self.sensor_type.map(be_u8),
        ))
        .serialize(output);
    }
}

/// The supported sensor types, as a greedy bitmask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorBinarySupportedSensorReport {
    pub bit_mask: Vec<u8>,
}

impl Serializable for SensorBinarySupportedSensorReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;
        tuple((
            cc_header(CLASS, 0x04),
            encoding::bitmask(&self.bit_mask, None, 0),
        ))
        .serialize(output);
    }
}
