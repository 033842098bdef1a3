use bytes::{Bytes, BytesMut};
use wavez_core::prelude::*;

mod basic;
mod battery;
mod manufacturer_specific;
mod meter;
mod multi_channel;
mod sensor_binary;
mod sensor_multilevel;
mod switch_binary;
mod switch_multilevel;
mod thermostat_setpoint;
mod version;
mod wake_up;

pub use basic::*;
pub use battery::*;
pub use manufacturer_specific::*;
pub use meter::*;
pub use multi_channel::*;
pub use sensor_binary::*;
pub use sensor_multilevel::*;
pub use switch_binary::*;
pub use switch_multilevel::*;
pub use thermostat_setpoint::*;
pub use version::*;
pub use wake_up::*;

/// Writes the two-byte header every command starts with: class and command.
pub(crate) fn cc_header(class: CommandClassId, command: u8) -> impl Serializable {
    move |output: &mut BytesMut| {
        class.serialize(output);
        serialize::bytes::be_u8(command).serialize(output);
    }
}

macro_rules! command_enum {
    ( $( $class:ident => $variant:ident ( $inner:ident ) ),+ $(,)? ) => {
        /// A typed command of any catalogued command class. Serialization
        /// yields the full command bytes: class, command, fields.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Command {
            $( $variant($inner), )+
        }

        impl Command {
            pub fn command_class(&self) -> CommandClassId {
                match self { $( Command::$variant(_) => CommandClassId::$class, )+ }
            }

            pub fn command_code(&self) -> u8 {
                match self { $( Command::$variant(c) => c.command_code(), )+ }
            }
        }

        impl Serializable for Command {
            fn serialize(&self, output: &mut BytesMut) {
                match self { $( Command::$variant(c) => c.serialize(output), )+ }
            }
        }

        $(
            impl From<$inner> for Command {
                fn from(c: $inner) -> Self {
                    Command::$variant(c)
                }
            }
        )+
    };
}

command_enum! {
    Basic => Basic(BasicCommand),
    Battery => Battery(BatteryCommand),
    ManufacturerSpecific => ManufacturerSpecific(ManufacturerSpecificCommand),
    Meter => Meter(MeterCommand),
    MultiChannel => MultiChannel(MultiChannelCommand),
    SensorBinary => SensorBinary(SensorBinaryCommand),
    SensorMultilevel => SensorMultilevel(SensorMultilevelCommand),
    SwitchBinary => SwitchBinary(SwitchBinaryCommand),
    SwitchMultilevel => SwitchMultilevel(SwitchMultilevelCommand),
    ThermostatSetpoint => ThermostatSetpoint(ThermostatSetpointCommand),
    Version => Version(VersionCommand),
    WakeUp => WakeUp(WakeUpCommand),
}

// Lift concrete commands straight into Command without spelling out the
// class enum at every call site
macro_rules! impl_into_command {
    ( $( $inner:ident => $class_enum:ident :: $variant:ident ),+ $(,)? ) => {
        $(
            impl From<$inner> for Command {
                fn from(c: $inner) -> Self {
                    $class_enum::$variant(c).into()
                }
            }
        )+
    };
}

impl_into_command! {
    BasicSet => BasicCommand::Set,
    BasicGet => BasicCommand::Get,
    BasicReport => BasicCommand::Report,
    BatteryGet => BatteryCommand::Get,
    BatteryReport => BatteryCommand::Report,
    ManufacturerSpecificGet => ManufacturerSpecificCommand::Get,
    ManufacturerSpecificReport => ManufacturerSpecificCommand::Report,
    DeviceSpecificGet => ManufacturerSpecificCommand::DeviceSpecificGet,
    DeviceSpecificReport => ManufacturerSpecificCommand::DeviceSpecificReport,
    MeterGet => MeterCommand::Get,
    MeterReport => MeterCommand::Report,
    MeterSupportedGet => MeterCommand::SupportedGet,
    MeterSupportedReport => MeterCommand::SupportedReport,
    MeterReset => MeterCommand::Reset,
    MultiInstanceGet => MultiChannelCommand::InstanceGet,
    MultiInstanceReport => MultiChannelCommand::InstanceReport,
    MultiInstanceCmdEncap => MultiChannelCommand::InstanceCmdEncap,
    MultiChannelEndPointGet => MultiChannelCommand::EndPointGet,
    MultiChannelEndPointReport => MultiChannelCommand::EndPointReport,
    MultiChannelCapabilityGet => MultiChannelCommand::CapabilityGet,
    MultiChannelCapabilityReport => MultiChannelCommand::CapabilityReport,
    MultiChannelEndPointFind => MultiChannelCommand::EndPointFind,
    MultiChannelEndPointFindReport => MultiChannelCommand::EndPointFindReport,
    MultiChannelCmdEncap => MultiChannelCommand::CmdEncap,
    MultiChannelAggregatedMembersGet => MultiChannelCommand::AggregatedMembersGet,
    MultiChannelAggregatedMembersReport => MultiChannelCommand::AggregatedMembersReport,
    SensorBinarySupportedGetSensor => SensorBinaryCommand::SupportedGetSensor,
    SensorBinaryGet => SensorBinaryCommand::Get,
    SensorBinaryReport => SensorBinaryCommand::Report,
    SensorBinarySupportedSensorReport => SensorBinaryCommand::SupportedSensorReport,
    SensorMultilevelSupportedGetSensor => SensorMultilevelCommand::SupportedGetSensor,
    SensorMultilevelSupportedSensorReport => SensorMultilevelCommand::SupportedSensorReport,
    SensorMultilevelSupportedGetScale => SensorMultilevelCommand::SupportedGetScale,
    SensorMultilevelGet => SensorMultilevelCommand::Get,
    SensorMultilevelReport => SensorMultilevelCommand::Report,
    SensorMultilevelSupportedScaleReport => SensorMultilevelCommand::SupportedScaleReport,
    SwitchBinarySet => SwitchBinaryCommand::Set,
    SwitchBinaryGet => SwitchBinaryCommand::Get,
    SwitchBinaryReport => SwitchBinaryCommand::Report,
    SwitchMultilevelSet => SwitchMultilevelCommand::Set,
    SwitchMultilevelGet => SwitchMultilevelCommand::Get,
    SwitchMultilevelReport => SwitchMultilevelCommand::Report,
    SwitchMultilevelStartLevelChange => SwitchMultilevelCommand::StartLevelChange,
    SwitchMultilevelStopLevelChange => SwitchMultilevelCommand::StopLevelChange,
    SwitchMultilevelSupportedGet => SwitchMultilevelCommand::SupportedGet,
    SwitchMultilevelSupportedReport => SwitchMultilevelCommand::SupportedReport,
    ThermostatSetpointSet => ThermostatSetpointCommand::Set,
    ThermostatSetpointGet => ThermostatSetpointCommand::Get,
    ThermostatSetpointReport => ThermostatSetpointCommand::Report,
    ThermostatSetpointSupportedGet => ThermostatSetpointCommand::SupportedGet,
    ThermostatSetpointSupportedReport => ThermostatSetpointCommand::SupportedReport,
    ThermostatSetpointCapabilitiesGet => ThermostatSetpointCommand::CapabilitiesGet,
    ThermostatSetpointCapabilitiesReport => ThermostatSetpointCommand::CapabilitiesReport,
    VersionGet => VersionCommand::Get,
    VersionReport => VersionCommand::Report,
    VersionCommandClassGet => VersionCommand::CommandClassGet,
    VersionCommandClassReport => VersionCommand::CommandClassReport,
    VersionCapabilitiesGet => VersionCommand::CapabilitiesGet,
    VersionCapabilitiesReport => VersionCommand::CapabilitiesReport,
    VersionZwaveSoftwareGet => VersionCommand::ZwaveSoftwareGet,
    VersionZwaveSoftwareReport => VersionCommand::ZwaveSoftwareReport,
    WakeUpIntervalSet => WakeUpCommand::IntervalSet,
    WakeUpIntervalGet => WakeUpCommand::IntervalGet,
    WakeUpIntervalReport => WakeUpCommand::IntervalReport,
    WakeUpNotification => WakeUpCommand::Notification,
    WakeUpNoMoreInformation => WakeUpCommand::NoMoreInformation,
    WakeUpIntervalCapabilitiesGet => WakeUpCommand::IntervalCapabilitiesGet,
    WakeUpIntervalCapabilitiesReport => WakeUpCommand::IntervalCapabilitiesReport,
}

impl Command {
    /// Decodes a command payload `[class, command, fields…]` with the command
    /// table of the given class version. Versions above the highest declared
    /// one reuse its table.
    pub fn parse(i: &mut Bytes, version: u8) -> ParseResult<Self> {
        let class = CommandClassId::parse(i)?;
        let command = parse::bytes::be_u8(i)?;
        let version = version.clamp(1, class.max_version());
        Self::parse_typed(class, command, version, i)
    }

    pub fn from_bytes(payload: &[u8], version: u8) -> ParseResult<Self> {
        let mut i = Bytes::copy_from_slice(payload);
        let cmd = Self::parse(&mut i, version)?;
        if !i.is_empty() {
            tracing::warn!(
                "{} trailing bytes after {:?} command {:#04x}",
                i.len(),
                cmd.command_class(),
                cmd.command_code()
            );
        }
        Ok(cmd)
    }

    fn parse_typed(
        class: CommandClassId,
        command: u8,
        version: u8,
        i: &mut Bytes,
    ) -> ParseResult<Self> {
        let cmd = match class {
            CommandClassId::Basic => BasicCommand::parse(command, version, i)?.into(),
            CommandClassId::Battery => BatteryCommand::parse(command, version, i)?.into(),
            CommandClassId::ManufacturerSpecific => {
                ManufacturerSpecificCommand::parse(command, version, i)?.into()
            }
            CommandClassId::Meter => MeterCommand::parse(command, version, i)?.into(),
            CommandClassId::MultiChannel => {
                MultiChannelCommand::parse(command, version, i)?.into()
            }
            CommandClassId::SensorBinary => {
                SensorBinaryCommand::parse(command, version, i)?.into()
            }
            CommandClassId::SensorMultilevel => {
                SensorMultilevelCommand::parse(command, version, i)?.into()
            }
            CommandClassId::SwitchBinary => {
                SwitchBinaryCommand::parse(command, version, i)?.into()
            }
            CommandClassId::SwitchMultilevel => {
                SwitchMultilevelCommand::parse(command, version, i)?.into()
            }
            CommandClassId::ThermostatSetpoint => {
                ThermostatSetpointCommand::parse(command, version, i)?.into()
            }
            CommandClassId::Version => VersionCommand::parse(command, version, i)?.into(),
            CommandClassId::WakeUp => WakeUpCommand::parse(command, version, i)?.into(),
        };
        Ok(cmd)
    }
}

/// Error helper for command codes a class version does not declare.
pub(crate) fn unknown_command(
    class: CommandClassId,
    command: u8,
    version: u8,
) -> ParseError {
    ParseError::recoverable(format!(
        "{class:?} v{version} declares no command {command:#04x}"
    ))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unknown_class_byte() {
        // 0x77 is not a catalogued command class
        assert!(Command::from_bytes(&[0x77, 0x01], 1).is_err());
    }

    #[test]
    fn test_version_gating() {
        // METER Reset exists from v2 on
        assert!(Command::from_bytes(&[0x32, 0x05], 1).is_err());
        assert!(Command::from_bytes(&[0x32, 0x05], 2).is_ok());
    }

    #[test]
    fn test_version_above_table_reuses_highest() {
        // SENSOR_MULTILEVEL v6..v11 reuse the v5 command table
        let data = hex::decode("31010000").unwrap();
        let v5 = Command::from_bytes(&data[..2], 5).unwrap();
        let v11 = Command::from_bytes(&data[..2], 11).unwrap();
        assert_eq!(v5, v11);
    }
}
