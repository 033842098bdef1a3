use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding::{self, int_size, int_sized, parse_int_sized};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::ThermostatSetpoint;

pub const SETPOINT_TYPE_HEATING: u8 = 1;
pub const SETPOINT_TYPE_COOLING: u8 = 2;

pub const SCALE_CELSIUS: u8 = 0;
pub const SCALE_FAHRENHEIT: u8 = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum ThermostatSetpointCommand {
    Set(ThermostatSetpointSet),
    Get(ThermostatSetpointGet),
    Report(ThermostatSetpointReport),
    SupportedGet(ThermostatSetpointSupportedGet),
    SupportedReport(ThermostatSetpointSupportedReport),
    CapabilitiesGet(ThermostatSetpointCapabilitiesGet),
    CapabilitiesReport(ThermostatSetpointCapabilitiesReport),
}

/// A setpoint value with its scale and decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetpointValue {
    pub scale: u8,
    pub precision: u8,
    pub value: i64,
}

impl SetpointValue {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let b = be_u8(i)?;
        let size = (b & 0x07) as usize;
        Ok(Self {
            scale: (b >> 3) & 0x03,
            precision: (b >> 5) & 0x07,
            value: parse_int_sized(i, size)?,
        })
    }
}

impl Serializable for SetpointValue {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::bytes::be_u8;
        let size = int_size(self.value);
        let b = ((self.precision & 0x07) << 5) | ((self.scale & 0x03) << 3) | size as u8;
        be_u8(b).serialize(output);
        int_sized(self.value, size).serialize(output);
    }
}

impl ThermostatSetpointCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 => Self::Set(ThermostatSetpointSet {
                setpoint_type: be_u8(i)? & 0x0f,
                setpoint: SetpointValue::parse(i)?,
            }),
            0x02 => Self::Get(ThermostatSetpointGet {
                setpoint_type: be_u8(i)? & 0x0f,
            }),
            0x03 => Self::Report(ThermostatSetpointReport {
                setpoint_type: be_u8(i)? & 0x0f,
                setpoint: SetpointValue::parse(i)?,
            }),
            0x04 => Self::SupportedGet(ThermostatSetpointSupportedGet {}),
            0x05 => Self::SupportedReport(ThermostatSetpointSupportedReport {
                bit_mask: encoding::parse_bitmask_rest(i, 0)?,
            }),
            0x09 if version >= 3 => Self::CapabilitiesGet(ThermostatSetpointCapabilitiesGet {
                setpoint_type: be_u8(i)? & 0x0f,
            }),
            0x0a if version >= 3 => {
                Self::CapabilitiesReport(ThermostatSetpointCapabilitiesReport {
                    setpoint_type: be_u8(i)? & 0x0f,
                    min: SetpointValue::parse(i)?,
                    max: SetpointValue::parse(i)?,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            ThermostatSetpointCommand::Set(_) => 0x01,
            ThermostatSetpointCommand::Get(_) => 0x02,
            ThermostatSetpointCommand::Report(_) => 0x03,
            ThermostatSetpointCommand::SupportedGet(_) => 0x04,
            ThermostatSetpointCommand::SupportedReport(_) => 0x05,
            ThermostatSetpointCommand::CapabilitiesGet(_) => 0x09,
            ThermostatSetpointCommand::CapabilitiesReport(_) => 0x0a,
        }
    }
}

impl Serializable for ThermostatSetpointCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            ThermostatSetpointCommand::Set(c) => c.serialize(output),
            ThermostatSetpointCommand::Get(c) => c.serialize(output),
            ThermostatSetpointCommand::Report(c) => c.serialize(output),
            ThermostatSetpointCommand::SupportedGet(c) => c.serialize(output),
            ThermostatSetpointCommand::SupportedReport(c) => c.serialize(output),
            ThermostatSetpointCommand::CapabilitiesGet(c) => c.serialize(output),
            ThermostatSetpointCommand::CapabilitiesReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatSetpointSet {
    pub setpoint_type: u8,
    pub setpoint: SetpointValue,
}

impl Serializable for ThermostatSetpointSet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x01),
            be_u8(self.setpoint_type & 0x0f),
            self.setpoint,
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatSetpointGet {
    pub setpoint_type: u8,
}

impl Serializable for ThermostatSetpointGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x02), be_u8(self.setpoint_type & 0x0f))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatSetpointReport {
    pub setpoint_type: u8,
    pub setpoint: SetpointValue,
}

impl Serializable for ThermostatSetpointReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x03),
            be_u8(self.setpoint_type & 0x0f),
            self.setpoint,
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThermostatSetpointSupportedGet {}

impl Serializable for ThermostatSetpointSupportedGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x04).serialize(output);
    }
}

/// Supported setpoint types as a greedy bitmask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThermostatSetpointSupportedReport {
    pub bit_mask: Vec<u8>,
}

impl Serializable for ThermostatSetpointSupportedReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;
        tuple((
            cc_header(CLASS, 0x05),
            encoding::bitmask(&self.bit_mask, None, 0),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatSetpointCapabilitiesGet {
    pub setpoint_type: u8,
}

impl Serializable for ThermostatSetpointCapabilitiesGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x09), be_u8(self.setpoint_type & 0x0f))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatSetpointCapabilitiesReport {
    pub setpoint_type: u8,
    pub min: SetpointValue,
    pub max: SetpointValue,
}

impl Serializable for ThermostatSetpointCapabilitiesReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x0a),
            be_u8(self.setpoint_type & 0x0f),
            self.min,
            self.max,
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_set_roundtrip() {
        // Heating setpoint 21.5°C: precision 1, scale 0, value 215
        let set = ThermostatSetpointSet {
            setpoint_type: SETPOINT_TYPE_HEATING,
            setpoint: SetpointValue {
                scale: SCALE_CELSIUS,
                precision: 1,
                value: 215,
            },
        };
        let bytes = ThermostatSetpointCommand::Set(set).as_bytes();
        assert_eq!(bytes.as_ref(), hex::decode("43010122 00d7".replace(' ', "")).unwrap());

        let cmd = Command::from_bytes(&bytes, 1).unwrap();
        let Command::ThermostatSetpoint(ThermostatSetpointCommand::Set(parsed)) = cmd else {
            panic!("wrong command");
        };
        assert_eq!(parsed.setpoint.value, 215);
    }
}
