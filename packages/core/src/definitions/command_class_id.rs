use crate::parse::{self, Parsable, ParsableEnum, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use derive_try_from_primitive::TryFromPrimitive;

/// Marker byte in NIF command class lists: everything after it is about
/// controlled (not supported) classes.
pub const SUPPORT_CONTROL_MARK: u8 = 0xef;

/// The command classes this driver has typed commands for. Nodes may report
/// others; those are carried as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive)]
#[repr(u8)]
pub enum CommandClassId {
    Basic = 0x20,
    SwitchBinary = 0x25,
    SwitchMultilevel = 0x26,
    SensorBinary = 0x30,
    SensorMultilevel = 0x31,
    Meter = 0x32,
    ThermostatSetpoint = 0x43,
    MultiChannel = 0x60,
    ManufacturerSpecific = 0x72,
    Battery = 0x80,
    WakeUp = 0x84,
    Version = 0x86,
}

impl CommandClassId {
    /// The highest version of this class the catalog declares. Commands of
    /// higher reported versions parse with the table of this version.
    pub fn max_version(&self) -> u8 {
        match self {
            CommandClassId::Basic => 2,
            CommandClassId::SwitchBinary => 2,
            CommandClassId::SwitchMultilevel => 4,
            CommandClassId::SensorBinary => 2,
            CommandClassId::SensorMultilevel => 11,
            CommandClassId::Meter => 5,
            CommandClassId::ThermostatSetpoint => 3,
            CommandClassId::MultiChannel => 4,
            CommandClassId::ManufacturerSpecific => 2,
            CommandClassId::Battery => 1,
            CommandClassId::WakeUp => 2,
            CommandClassId::Version => 3,
        }
    }
}

impl ParsableEnum for CommandClassId {
    const LABEL: &'static str = "command class";
}

impl Parsable for CommandClassId {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        parse::enum_u8(i)
    }
}

impl Serializable for CommandClassId {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(*self as u8).serialize(output);
    }
}
