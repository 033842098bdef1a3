use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding::{self, int_size, int_sized, parse_int_sized};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::SensorMultilevel;

pub const SENSOR_TYPE_TEMPERATURE: u8 = 1;
pub const SENSOR_TYPE_LUMINANCE: u8 = 3;
pub const SENSOR_TYPE_RELATIVE_HUMIDITY: u8 = 5;

/// Versions 6..=11 add no commands over v5; they only widen the sensor type
/// registry.
#[derive(Debug, Clone, PartialEq)]
pub enum SensorMultilevelCommand {
    SupportedGetSensor(SensorMultilevelSupportedGetSensor),
    SupportedSensorReport(SensorMultilevelSupportedSensorReport),
    SupportedGetScale(SensorMultilevelSupportedGetScale),
    Get(SensorMultilevelGet),
    Report(SensorMultilevelReport),
    SupportedScaleReport(SensorMultilevelSupportedScaleReport),
}

impl SensorMultilevelCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 if version >= 5 => {
                Self::SupportedGetSensor(SensorMultilevelSupportedGetSensor {})
            }
            0x02 if version >= 5 => {
                Self::SupportedSensorReport(SensorMultilevelSupportedSensorReport {
                    bit_mask: encoding::parse_bitmask_rest(i, 0)?,
                })
            }
            0x03 if version >= 5 => {
                Self::SupportedGetScale(SensorMultilevelSupportedGetScale {
                    sensor_type: be_u8(i)?,
                })
            }
            0x04 => {
                let (sensor_type, scale) = if version >= 5 {
                    let sensor_type = be_u8(i)?;
                    let scale = (be_u8(i)? >> 3) & 0x03;
                    (Some(sensor_type), Some(scale))
                } else {
                    (None, None)
                };
                Self::Get(SensorMultilevelGet { sensor_type, scale })
            }
            0x05 => {
                let sensor_type = be_u8(i)?;
                let b = be_u8(i)?;
                let size = (b & 0x07) as usize;
                Self::Report(SensorMultilevelReport {
                    sensor_type,
                    scale: (b >> 3) & 0x03,
                    precision: (b >> 5) & 0x07,
                    value: parse_int_sized(i, size)?,
                })
            }
            0x06 if version >= 5 => {
                Self::SupportedScaleReport(SensorMultilevelSupportedScaleReport {
                    sensor_type: be_u8(i)?,
                    scale_bit_mask: be_u8(i)? & 0x0f,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            SensorMultilevelCommand::SupportedGetSensor(_) => 0x01,
            SensorMultilevelCommand::SupportedSensorReport(_) => 0x02,
            SensorMultilevelCommand::SupportedGetScale(_) => 0x03,
            SensorMultilevelCommand::Get(_) => 0x04,
            SensorMultilevelCommand::Report(_) => 0x05,
            SensorMultilevelCommand::SupportedScaleReport(_) => 0x06,
        }
    }
}

impl Serializable for SensorMultilevelCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            SensorMultilevelCommand::SupportedGetSensor(c) => c.serialize(output),
            SensorMultilevelCommand::SupportedSensorReport(c) => c.serialize(output),
            SensorMultilevelCommand::SupportedGetScale(c) => c.serialize(output),
            SensorMultilevelCommand::Get(c) => c.serialize(output),
            SensorMultilevelCommand::Report(c) => c.serialize(output),
            SensorMultilevelCommand::SupportedScaleReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorMultilevelSupportedGetSensor {}

impl Serializable for SensorMultilevelSupportedGetSensor {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x01).serialize(output);
    }
}

/// Supported sensor types as a greedy bitmask of raw bit positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMultilevelSupportedSensorReport {
    pub bit_mask: Vec<u8>,
}

impl Serializable for SensorMultilevelSupportedSensorReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;
        tuple((
            cc_header(CLASS, 0x02),
            encoding::bitmask(&self.bit_mask, None, 0),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMultilevelSupportedGetScale {
    pub sensor_type: u8,
}

impl Serializable for SensorMultilevelSupportedGetScale {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x03), be_u8(self.sensor_type))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorMultilevelGet {
    pub sensor_type: Option<u8>,
    pub scale: Option<u8>,
}

impl Serializable for SensorMultilevelGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x04),
            self.sensor_type.map(be_u8),
            self.scale.map(|scale| be_u8((scale & 0x03) << 3)),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMultilevelReport {
    pub sensor_type: u8,
    pub scale: u8,
    pub precision: u8,
    pub value: i64,
}

impl Serializable for SensorMultilevelReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        let size = int_size(self.value);
        let b = ((self.precision & 0x07) << 5) | ((self.scale & 0x03) << 3) | size as u8;
        tuple((
            cc_header(CLASS, 0x05),
            be_u8(self.sensor_type),
            be_u8(b),
            int_sized(self.value, size),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorMultilevelSupportedScaleReport {
    pub sensor_type: u8,
    pub scale_bit_mask: u8,
}

impl Serializable for SensorMultilevelSupportedScaleReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x06),
            be_u8(self.sensor_type),
            be_u8(self.scale_bit_mask & 0x0f),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_temperature_report() {
        // Temperature, precision 2, scale 0, 2-byte value 22.50
        let data = hex::decode("31050142 08ca".replace(' ', "")).unwrap();
        let cmd = Command::from_bytes(&data, 1).unwrap();
        let Command::SensorMultilevel(SensorMultilevelCommand::Report(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.sensor_type, SENSOR_TYPE_TEMPERATURE);
        assert_eq!(report.precision, 2);
        assert_eq!(report.scale, 0);
        assert_eq!(report.value, 2250);
        assert_eq!(cmd.as_bytes().as_ref(), data.as_slice());
    }

    #[test]
    fn test_negative_temperature_roundtrip() {
        let report = SensorMultilevelReport {
            sensor_type: SENSOR_TYPE_TEMPERATURE,
            scale: 0,
            precision: 1,
            value: -125,
        };
        let bytes = SensorMultilevelCommand::Report(report).as_bytes();
        let cmd = Command::from_bytes(&bytes, 5).unwrap();
        let Command::SensorMultilevel(SensorMultilevelCommand::Report(parsed)) = cmd else {
            panic!("wrong command");
        };
        assert_eq!(parsed.value, -125);
    }
}
