use crate::parse::{
    bits::{self, bool},
    bytes::be_u8,
    Parsable, ParseResult, Parser,
};
use crate::serialize::{self, write_bits, BitSerializable, Serializable};
use bytes::Bytes;

/// Protocol-level node capabilities as reported by GET_NODE_PROTOCOL_INFO.
/// Received once per node and cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeProtocolInfo {
    pub version: u8,
    pub max_baud_rate: u8,
    pub routing: bool,
    /// Mains powered, always-listening node
    pub listening: bool,
    pub security: bool,
    pub controller: bool,
    pub specific_device: bool,
    pub routing_slave: bool,
    pub beam_capability: bool,
    pub sensor_250ms: bool,
    pub sensor_1000ms: bool,
    pub optional_functionality: bool,
    pub reserved: u8,
    pub basic_device_class: u8,
    pub generic_device_class: u8,
    pub specific_device_class: u8,
}

impl Parsable for NodeProtocolInfo {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let (listening, routing, max_baud_rate, version) =
            bits::bits((bool, bool, bits::take(3), bits::take(3))).parse(i)?;
        let (
            optional_functionality,
            sensor_1000ms,
            sensor_250ms,
            beam_capability,
            routing_slave,
            specific_device,
            controller,
            security,
        ) = bits::bits((bool, bool, bool, bool, bool, bool, bool, bool)).parse(i)?;
        let reserved = be_u8(i)?;
        let basic_device_class = be_u8(i)?;
        let generic_device_class = be_u8(i)?;
        let specific_device_class = be_u8(i)?;

        Ok(Self {
            version,
            max_baud_rate,
            routing,
            listening,
            security,
            controller,
            specific_device,
            routing_slave,
            beam_capability,
            sensor_250ms,
            sensor_1000ms,
            optional_functionality,
            reserved,
            basic_device_class,
            generic_device_class,
            specific_device_class,
        })
    }
}

impl Serializable for NodeProtocolInfo {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            serialize::bits::bits(|bo| {
                self.listening.write(bo);
                self.routing.write(bo);
                write_bits(bo, self.max_baud_rate, 3);
                write_bits(bo, self.version, 3);
            }),
            serialize::bits::bits(|bo| {
                self.optional_functionality.write(bo);
                self.sensor_1000ms.write(bo);
                self.sensor_250ms.write(bo);
                self.beam_capability.write(bo);
                self.routing_slave.write(bo);
                self.specific_device.write(bo);
                self.controller.write(bo);
                self.security.write(bo);
            }),
            be_u8(self.reserved),
            be_u8(self.basic_device_class),
            be_u8(self.generic_device_class),
            be_u8(self.specific_device_class),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_roundtrip() {
        // Listening routing node, 40kbit, version 3, basic/generic/specific 04/10/01
        let data = hex::decode("d30100041001").unwrap();
        let info = NodeProtocolInfo::parse_complete(&data).unwrap();
        assert!(info.listening);
        assert!(info.routing);
        assert_eq!(info.max_baud_rate, 0b010);
        assert_eq!(info.version, 3);
        assert!(info.security);
        assert!(!info.controller);
        assert_eq!(info.generic_device_class, 0x10);
        assert_eq!(info.as_bytes().as_ref(), data.as_slice());
    }
}
