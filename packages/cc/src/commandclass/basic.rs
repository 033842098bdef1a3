use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::Basic;

#[derive(Debug, Clone, PartialEq)]
pub enum BasicCommand {
    Set(BasicSet),
    Get(BasicGet),
    Report(BasicReport),
}

impl BasicCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 => Self::Set(BasicSet { value: be_u8(i)? }),
            0x02 => Self::Get(BasicGet {}),
            0x03 => {
                let value = be_u8(i)?;
                let (target_value, duration) = if version >= 2 {
                    (Some(be_u8(i)?), Some(be_u8(i)?))
                } else {
                    (None, None)
                };
                Self::Report(BasicReport {
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
            BasicCommand::Set(_) => 0x01,
            BasicCommand::Get(_) => 0x02,
            BasicCommand::Report(_) => 0x03,
        }
    }
}

impl Serializable for BasicCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            BasicCommand::Set(c) => c.serialize(output),
            BasicCommand::Get(c) => c.serialize(output),
            BasicCommand::Report(c) => c.serialize(output),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicSet {
    pub value: u8,
}

impl Serializable for BasicSet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        tuple((cc_header(CLASS, 0x01), be_u8(self.value))).serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicGet {}

impl Serializable for BasicGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x02).serialize(output);
    }
}

/// Target value and duration arrived with version 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicReport {
    pub value: u8,
    pub target_value: Option<u8>,
    pub duration: Option<u8>,
}

impl Serializable for BasicReport {
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_report_versions() {
        let v1 = Command::from_bytes(&[0x20, 0x03, 0xff], 1).unwrap();
        let Command::Basic(BasicCommand::Report(report)) = &v1 else {
            panic!("wrong command: {v1:?}");
        };
        assert_eq!(report.value, 0xff);
        assert_eq!(report.target_value, None);
        assert_eq!(v1.as_bytes().as_ref(), &[0x20, 0x03, 0xff]);

        let v2 = Command::from_bytes(&[0x20, 0x03, 0x63, 0x63, 0x00], 2).unwrap();
        let Command::Basic(BasicCommand::Report(report)) = &v2 else {
            panic!("wrong command: {v2:?}");
        };
        assert_eq!(report.target_value, Some(0x63));
        assert_eq!(v2.as_bytes().as_ref(), &[0x20, 0x03, 0x63, 0x63, 0x00]);
    }
}
