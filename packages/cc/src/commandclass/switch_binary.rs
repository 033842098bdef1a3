use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::SwitchBinary;

pub const SWITCH_OFF: u8 = 0x00;
pub const SWITCH_ON: u8 = 0xff;

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchBinaryCommand {
    Set(SwitchBinarySet),
    Get(SwitchBinaryGet),
    Report(SwitchBinaryReport),
}

impl SwitchBinaryCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 => {
                let value = be_u8(i)?;
                let duration = if version >= 2 { Some(be_u8(i)?) } else { None };
                Self::Set(SwitchBinarySet { value, duration })
            }
            0x02 => Self::Get(SwitchBinaryGet {}),
            0x03 => {
                let value = be_u8(i)?;
                let (target_value, duration) = if version >= 2 {
                    (Some(be_u8(i)?), Some(be_u8(i)?))
                } else {
                    (None, None)
                };
                Self::Report(SwitchBinaryReport {
                    value,
                    target_value,
                    duration,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            SwitchBinaryCommand::Set(_) => 0x01,
            SwitchBinaryCommand::Get(_) => 0x02,
            SwitchBinaryCommand::Report(_) => 0x03,
        }
    }
}

impl Serializable for SwitchBinaryCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            SwitchBinaryCommand::Set(c) => c.serialize(output),
            SwitchBinaryCommand::Get(c) => c.serialize(output),
            SwitchBinaryCommand::Report(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchBinarySet {
    pub value: u8,
    pub duration: Option<u8>,
}

impl Serializable for SwitchBinarySet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x01),
            be_u8(self.value),
            self.duration.map(be_u8),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchBinaryGet {}

impl Serializable for SwitchBinaryGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x02).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchBinaryReport {
    pub value: u8,
    pub target_value: Option<u8>,
    pub duration: Option<u8>,
}

impl Serializable for SwitchBinaryReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x03),
            be_u8(self.value),
            self.target_value.map(be_u8),
            self.duration.map(be_u8),
        ))
        .serialize(output);
    }
}
