use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::SwitchMultilevel;

pub const LEVEL_OFF: u8 = 0x00;
pub const LEVEL_ON: u8 = 0xff;

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchMultilevelCommand {
    Set(SwitchMultilevelSet),
    Get(SwitchMultilevelGet),
    Report(SwitchMultilevelReport),
    StartLevelChange(SwitchMultilevelStartLevelChange),
    StopLevelChange(SwitchMultilevelStopLevelChange),
    SupportedGet(SwitchMultilevelSupportedGet),
    SupportedReport(SwitchMultilevelSupportedReport),
}

impl SwitchMultilevelCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 => {
                let value = be_u8(i)?;
                let dimming_duration = if version >= 2 { Some(be_u8(i)?) } else { None };
                Self::Set(SwitchMultilevelSet {
                    value,
                    dimming_duration,
                })
            }
            0x02 => Self::Get(SwitchMultilevelGet {}),
            0x03 => {
                let value = be_u8(i)?;
                let (target_value, duration) = if version >= 4 {
                    (Some(be_u8(i)?), Some(be_u8(i)?))
                } else {
                    (None, None)
                };
                Self::Report(SwitchMultilevelReport {
                    value,
                    target_value,
                    duration,
                })
            }
            0x04 => {
                Self::StartLevelChange(SwitchMultilevelStartLevelChange::parse_versioned(
                    i, version,
                )?)
            }
            0x05 => Self::StopLevelChange(SwitchMultilevelStopLevelChange {}),
            0x06 if version >= 3 => Self::SupportedGet(SwitchMultilevelSupportedGet {}),
            0x07 if version >= 3 => Self::SupportedReport(SwitchMultilevelSupportedReport {
                primary_switch_type: be_u8(i)? & 0x1f,
                secondary_switch_type: be_u8(i)? & 0x1f,
            }),
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            SwitchMultilevelCommand::Set(_) => 0x01,
            SwitchMultilevelCommand::Get(_) => 0x02,
            SwitchMultilevelCommand::Report(_) => 0x03,
            SwitchMultilevelCommand::StartLevelChange(_) => 0x04,
            SwitchMultilevelCommand::StopLevelChange(_) => 0x05,
            SwitchMultilevelCommand::SupportedGet(_) => 0x06,
            SwitchMultilevelCommand::SupportedReport(_) => 0x07,
        }
    }
}

impl Serializable for SwitchMultilevelCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            SwitchMultilevelCommand::Set(c) => c.serialize(output),
            SwitchMultilevelCommand::Get(c) => c.serialize(output),
            SwitchMultilevelCommand::Report(c) => c.serialize(output),
            SwitchMultilevelCommand::StartLevelChange(c) => c.serialize(output),
            SwitchMultilevelCommand::StopLevelChange(c) => c.serialize(output),
            SwitchMultilevelCommand::SupportedGet(c) => c.serialize(output),
            SwitchMultilevelCommand::SupportedReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchMultilevelSet {
    pub value: u8,
    pub dimming_duration: Option<u8>,
}

impl Serializable for SwitchMultilevelSet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x01),
            be_u8(self.value),
            self.dimming_duration.map(be_u8),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchMultilevelGet {}

impl Serializable for SwitchMultilevelGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x02).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchMultilevelReport {
    pub value: u8,
    pub target_value: Option<u8>,
    pub duration: Option<u8>,
}

impl Serializable for SwitchMultilevelReport {
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

/// v1/v2 use a single up/down bit; v3 widens it to two bits and adds the
/// increment/decrement selector and step size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchMultilevelStartLevelChange {
    pub inc_dec: Option<u8>,
    pub ignore_start_level: bool,
    pub up_down: u8,
    pub start_level: u8,
    pub dimming_duration: Option<u8>,
    pub step_size: Option<u8>,
}

impl SwitchMultilevelStartLevelChange {
    fn parse_versioned(i: &mut Bytes, version: u8) -> ParseResult<Self> {
        let b = be_u8(i)?;
        let (inc_dec, up_down) = if version >= 3 {
            (Some((b >> 3) & 0x03), (b >> 6) & 0x03)
        } else {
            (None, (b >> 6) & 0x01)
        };
        let ignore_start_level = b & 0x20 != 0;
        let start_level = be_u8(i)?;
        let dimming_duration = if version >= 2 { Some(be_u8(i)?) } else { None };
        let step_size = if version >= 3 { Some(be_u8(i)?) } else { None };
        Ok(Self {
            inc_dec,
            ignore_start_level,
            up_down,
            start_level,
            dimming_duration,
            step_size,
        })
    }
}

impl Serializable for SwitchMultilevelStartLevelChange {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        let mut b = (self.up_down & 0x03) << 6;
        if self.ignore_start_level {
            b |= 0x20;
        }
        if let Some(inc_dec) = self.inc_dec {
            b |= (inc_dec & 0x03) << 3;
        }
        tuple((
            cc_header(CLASS, 0x04),
            be_u8(b),
            be_u8(self.start_level),
            self.dimming_duration.map(be_u8),
            self.step_size.map(be_u8),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchMultilevelStopLevelChange {}

impl Serializable for SwitchMultilevelStopLevelChange {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x05).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchMultilevelSupportedGet {}

impl Serializable for SwitchMultilevelSupportedGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x06).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchMultilevelSupportedReport {
    pub primary_switch_type: u8,
    pub secondary_switch_type: u8,
}

impl Serializable for SwitchMultilevelSupportedReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x07),
            be_u8(self.primary_switch_type & 0x1f),
            be_u8(self.secondary_switch_type & 0x1f),
        ))
        .serialize(output);
    }
}
