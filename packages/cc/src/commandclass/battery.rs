use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::Battery;

/// A battery level of 0xff is the low-battery warning, everything else is a
/// percentage.
pub const BATTERY_LOW_WARNING: u8 = 0xff;

#[derive(Debug, Clone, PartialEq)]
pub enum BatteryCommand {
    Get(BatteryGet),
    Report(BatteryReport),
}

impl BatteryCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x02 => Self::Get(BatteryGet {}),
            0x03 => Self::Report(BatteryReport {
                battery_level: be_u8(i)?,
            }),
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            BatteryCommand::Get(_) => 0x02,
            BatteryCommand::Report(_) => 0x03,
        }
    }
}

impl Serializable for BatteryCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            BatteryCommand::Get(c) => c.serialize(output),
            BatteryCommand::Report(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatteryGet {}

impl Serializable for BatteryGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x02).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryReport {
    pub battery_level: u8,
}

impl Serializable for BatteryReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x03), be_u8(self.battery_level))).serialize(output);
    }
}
