use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::{be_u24, be_u8};
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::WakeUp;

#[derive(Debug, Clone, PartialEq)]
pub enum WakeUpCommand {
    IntervalSet(WakeUpIntervalSet),
    IntervalGet(WakeUpIntervalGet),
    IntervalReport(WakeUpIntervalReport),
    Notification(WakeUpNotification),
    NoMoreInformation(WakeUpNoMoreInformation),
    IntervalCapabilitiesGet(WakeUpIntervalCapabilitiesGet),
    IntervalCapabilitiesReport(WakeUpIntervalCapabilitiesReport),
}

impl WakeUpCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x04 => Self::IntervalSet(WakeUpIntervalSet {
                seconds: be_u24(i)?,
                node_id: be_u8(i)?,
            }),
            0x05 => Self::IntervalGet(WakeUpIntervalGet {}),
            0x06 => Self::IntervalReport(WakeUpIntervalReport {
                seconds: be_u24(i)?,
                node_id: be_u8(i)?,
            }),
            0x07 => Self::Notification(WakeUpNotification {}),
            0x08 => Self::NoMoreInformation(WakeUpNoMoreInformation {}),
            0x09 if version >= 2 => {
                Self::IntervalCapabilitiesGet(WakeUpIntervalCapabilitiesGet {})
            }
            0x0a if version >= 2 => {
                Self::IntervalCapabilitiesReport(WakeUpIntervalCapabilitiesReport {
                    minimum_interval_seconds: be_u24(i)?,
                    maximum_interval_seconds: be_u24(i)?,
                    default_interval_seconds: be_u24(i)?,
                    interval_step_seconds: be_u24(i)?,
                })
            }
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            WakeUpCommand::IntervalSet(_) => 0x04,
            WakeUpCommand::IntervalGet(_) => 0x05,
            WakeUpCommand::IntervalReport(_) => 0x06,
            WakeUpCommand::Notification(_) => 0x07,
            WakeUpCommand::NoMoreInformation(_) => 0x08,
            WakeUpCommand::IntervalCapabilitiesGet(_) => 0x09,
            WakeUpCommand::IntervalCapabilitiesReport(_) => 0x0a,
        }
    }
}

impl Serializable for WakeUpCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            WakeUpCommand::IntervalSet(c) => c.serialize(output),
            WakeUpCommand::IntervalGet(c) => c.serialize(output),
            WakeUpCommand::IntervalReport(c) => c.serialize(output),
            WakeUpCommand::Notification(c) => c.serialize(output),
            WakeUpCommand::NoMoreInformation(c) => c.serialize(output),
            WakeUpCommand::IntervalCapabilitiesGet(c) => c.serialize(output),
            WakeUpCommand::IntervalCapabilitiesReport(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeUpIntervalSet {
    pub seconds: u32,
    pub node_id: u8,
}

impl Serializable for WakeUpIntervalSet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u24, be_u8},
            sequence::tuple,
        };
        tuple((
            cc_header(CLASS, 0x04),
            be_u24(self.seconds),
            be_u8(self.node_id),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeUpIntervalGet {}

impl Serializable for WakeUpIntervalGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x05).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeUpIntervalReport {
    pub seconds: u32,
    pub node_id: u8,
}

impl Serializable for WakeUpIntervalReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u24, be_u8},
            sequence::tuple,
        };
        tuple((
            cc_header(CLASS, 0x06),
            be_u24(self.seconds),
            be_u8(self.node_id),
        ))
        .serialize(output);
    }
}

/// A sleeping node announcing its listen window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeUpNotification {}

impl Serializable for WakeUpNotification {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x07).serialize(output);
    }
}

/// Tells the node it may go back to sleep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeUpNoMoreInformation {}

impl Serializable for WakeUpNoMoreInformation {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x08).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WakeUpIntervalCapabilitiesGet {}

impl Serializable for WakeUpIntervalCapabilitiesGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x09).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WakeUpIntervalCapabilitiesReport {
    pub minimum_interval_seconds: u32,
    pub maximum_interval_seconds: u32,
    pub default_interval_seconds: u32,
    pub interval_step_seconds: u32,
}

impl Serializable for WakeUpIntervalCapabilitiesReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u24, sequence::tuple};
        tuple((
            cc_header(CLASS, 0x0a),
            be_u24(self.minimum_interval_seconds),
            be_u24(self.maximum_interval_seconds),
            be_u24(self.default_interval_seconds),
            be_u24(self.interval_step_seconds),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_no_more_information_bytes() {
        let cmd: Command = WakeUpNoMoreInformation {}.into();
        assert_eq!(cmd.as_bytes().as_ref(), &[0x84, 0x08]);
    }

    #[test]
    fn test_notification_parses_at_version_1() {
        let cmd = Command::from_bytes(&[0x84, 0x07], 1).unwrap();
        assert!(matches!(
            cmd,
            Command::WakeUp(WakeUpCommand::Notification(_))
        ));
    }
}
