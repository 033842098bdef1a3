use crate::commandclass::{cc_header, unknown_command};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding::{int_size, int_sized, parse_int_sized};
use wavez_core::parse::{
    bytes::{be_u16, be_u8, take},
    Parser,
};
use wavez_core::prelude::*;

const CLASS: CommandClassId = CommandClassId::Meter;

fn hex_fmt<T: AsRef<[u8]>>(n: &Option<T>, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match n {
        Some(n) => write!(f, "0x{}", hex::encode(n)),
        None => write!(f, "None"),
    }
}

pub const METER_TYPE_ELECTRIC: u8 = 1;
pub const METER_TYPE_GAS: u8 = 2;
pub const METER_TYPE_WATER: u8 = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum MeterCommand {
    Get(MeterGet),
    Report(MeterReport),
    SupportedGet(MeterSupportedGet),
    SupportedReport(MeterSupportedReport),
    Reset(MeterReset),
}

impl MeterCommand {
    pub(crate) fn parse(command: u8, version: u8, i: &mut Bytes) -> ParseResult<Self> {
        Ok(match command {
            0x01 => Self::Get(MeterGet::parse_versioned(i, version)?),
            0x02 => Self::Report(MeterReport::parse_versioned(i, version)?),
            0x03 if version >= 2 => Self::SupportedGet(MeterSupportedGet {}),
            0x04 if version >= 2 => {
                Self::SupportedReport(MeterSupportedReport::parse_versioned(i, version)?)
            }
            0x05 if version >= 2 => Self::Reset(MeterReset {}),
            _ => return Err(unknown_command(CLASS, command, version)),
        })
    }

    pub fn command_code(&self) -> u8 {
        match self {
            MeterCommand::Get(_) => 0x01,
            MeterCommand::Report(_) => 0x02,
            MeterCommand::SupportedGet(_) => 0x03,
            MeterCommand::SupportedReport(_) => 0x04,
            MeterCommand::Reset(_) => 0x05,
        }
    }
}

impl Serializable for MeterCommand {
    fn serialize(&self, output: &mut BytesMut) {
        match self {
            MeterCommand::Get(c) => c.serialize(output),
            MeterCommand::Report(c) => c.serialize(output),
            MeterCommand::SupportedGet(c) => c.serialize(output),
            MeterCommand::SupportedReport(c) => c.serialize(output),
            MeterCommand::Reset(c) => c.serialize(output),
        }
    }
}

/// The scale selector grew from nothing (v1) over 2 bits (v2) to 3 bits plus
/// a rate type and an extension byte (v4).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeterGet {
    pub scale: Option<u8>,
    pub rate_type: Option<u8>,
    pub scale2: Option<u8>,
}

impl MeterGet {
    fn parse_versioned(i: &mut Bytes, version: u8) -> ParseResult<Self> {
        Ok(match version {
            1 => Self::default(),
            2 => Self {
                scale: Some((be_u8(i)? >> 3) & 0x03),
                ..Self::default()
            },
            3 => Self {
                scale: Some((be_u8(i)? >> 3) & 0x07),
                ..Self::default()
            },
            _ => {
                let b = be_u8(i)?;
                Self {
                    scale: Some((b >> 3) & 0x07),
                    rate_type: Some((b >> 6) & 0x03),
                    scale2: Some(be_u8(i)?),
                }
            }
        })
    }
}

impl Serializable for MeterGet {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};
        let selector = self.scale.map(|scale| {
            ((scale & 0x07) << 3) | ((self.rate_type.unwrap_or(0) & 0x03) << 6)
        });
        tuple((
            cc_header(CLASS, 0x01),
            selector.map(be_u8),
            self.scale2.map(be_u8),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeterReport {
    pub meter_type: u8,
    pub rate_type: Option<u8>,
    /// Third scale bit, split off into the first byte from v3 on
    pub scale_bit2: Option<bool>,
    pub scale: u8,
    pub precision: u8,
    pub value: i64,
    pub delta_time: Option<u16>,
    pub previous_value: Option<i64>,
    pub scale2: Option<u8>,
}

impl MeterReport {
    fn parse_versioned(i: &mut Bytes, version: u8) -> ParseResult<Self> {
        let b0 = be_u8(i)?;
        let (meter_type, rate_type, scale_bit2) = if version >= 3 {
            (b0 & 0x1f, Some((b0 >> 5) & 0x03), Some(b0 & 0x80 != 0))
        } else if version >= 2 {
            (b0 & 0x1f, Some((b0 >> 5) & 0x03), None)
        } else {
            (b0, None, None)
        };

        let b1 = be_u8(i)?;
        let size = (b1 & 0x07) as usize;
        let scale = (b1 >> 3) & 0x03;
        let precision = (b1 >> 5) & 0x07;
        let value = parse_int_sized(i, size)?;

        let (delta_time, previous_value) = if version >= 2 {
            let delta_time = be_u16(i)?;
            let previous_value = if delta_time != 0 {
                Some(parse_int_sized(i, size)?)
            } else {
                None
            };
            (Some(delta_time), previous_value)
        } else {
            (None, None)
        };

        let scale2 = if version >= 4 { Some(be_u8(i)?) } else { None };

        Ok(Self {
            meter_type,
            rate_type,
            scale_bit2,
            scale,
            precision,
            value,
            delta_time,
            previous_value,
            scale2,
        })
    }
}

impl Serializable for MeterReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u16, be_u8},
            sequence::tuple,
        };

        let mut b0 = self.meter_type;
        if self.rate_type.is_some() || self.scale_bit2.is_some() {
            b0 = self.meter_type & 0x1f;
            if let Some(rate_type) = self.rate_type {
                b0 |= (rate_type & 0x03) << 5;
            }
            if self.scale_bit2 == Some(true) {
                b0 |= 0x80;
            }
        }

        let size = self
            .previous_value
            .map_or(int_size(self.value), |prev| {
                int_size(self.value).max(int_size(prev))
            });
        let b1 = ((self.precision & 0x07) << 5) | ((self.scale & 0x03) << 3) | size as u8;

        tuple((
            cc_header(CLASS, 0x02),
            be_u8(b0),
            be_u8(b1),
            int_sized(self.value, size),
            self.delta_time.map(be_u16),
            self.previous_value.map(|prev| int_sized(prev, size)),
            self.scale2.map(be_u8),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeterSupportedGet {}

impl Serializable for MeterSupportedGet {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x03).serialize(output);
    }
}

#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct MeterSupportedReport {
    pub meter_type: u8,
    pub rate_type: Option<u8>,
    pub meter_reset: bool,
    pub scale_supported: u8,
    /// v4+: more-scale-types flag and extension bytes
    pub mst: Option<bool>,
    #[debug(with = "hex_fmt")]
    pub more_scales_supported: Option<Bytes>,
}

impl MeterSupportedReport {
    fn parse_versioned(i: &mut Bytes, version: u8) -> ParseResult<Self> {
        let b0 = be_u8(i)?;
        let meter_reset = b0 & 0x80 != 0;
        let meter_type = b0 & 0x1f;
        let rate_type = if version >= 4 {
            Some((b0 >> 5) & 0x03)
        } else {
            None
        };

        let b1 = be_u8(i)?;
        let (scale_supported, mst, more_scales_supported) = match version {
            2 => (b1 & 0x0f, None, None),
            3 => (b1, None, None),
            _ => {
                let mst = b1 & 0x80 != 0;
                let count = be_u8(i)?;
                let more = take(count).parse(i)?;
                (b1 & 0x7f, Some(mst), Some(more))
            }
        };

        Ok(Self {
            meter_type,
            rate_type,
            meter_reset,
            scale_supported,
            mst,
            more_scales_supported,
        })
    }
}

impl Serializable for MeterSupportedReport {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };

        let mut b0 = self.meter_type & 0x1f;
        if let Some(rate_type) = self.rate_type {
            b0 |= (rate_type & 0x03) << 5;
        }
        if self.meter_reset {
            b0 |= 0x80;
        }

        let mut b1 = self.scale_supported;
        if self.mst == Some(true) {
            b1 |= 0x80;
        }

        tuple((
            cc_header(CLASS, 0x04),
            be_u8(b0),
            be_u8(b1),
            self.more_scales_supported.as_ref().map(|more| {
                move |out: &mut BytesMut| {
                    be_u8(more.len() as u8).serialize(out);
                    slice(more).serialize(out);
                }
            }),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeterReset {}

impl Serializable for MeterReset {
    fn serialize(&self, output: &mut BytesMut) {
        cc_header(CLASS, 0x05).serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::commandclass::Command;

    #[test]
    fn test_report_v1_roundtrip() {
        // Electric meter, precision 2, scale 0, 2-byte value 2250
        let data = hex::decode("32020142 08ca".replace(' ', "")).unwrap();
        let cmd = Command::from_bytes(&data, 1).unwrap();
        let Command::Meter(MeterCommand::Report(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.meter_type, 1);
        assert_eq!(report.precision, 2);
        assert_eq!(report.scale, 0);
        assert_eq!(report.value, 2250);
        assert_eq!(report.delta_time, None);
        assert_eq!(cmd.as_bytes().as_ref(), data.as_slice());
    }

    #[test]
    fn test_report_v2_previous_value() {
        // delta_time 60s, previous value present
        let data = hex::decode("32022142 08ca 003c 0800".replace(' ', "")).unwrap();
        let cmd = Command::from_bytes(&data, 2).unwrap();
        let Command::Meter(MeterCommand::Report(report)) = &cmd else {
            panic!("wrong command: {cmd:?}");
        };
        assert_eq!(report.meter_type, 1);
        assert_eq!(report.rate_type, Some(1));
        assert_eq!(report.value, 2250);
        assert_eq!(report.delta_time, Some(60));
        assert_eq!(report.previous_value, Some(2048));
        assert_eq!(cmd.as_bytes().as_ref(), data.as_slice());
    }
}
