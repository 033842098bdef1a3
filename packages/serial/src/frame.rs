use crate::error::Error;
use crate::error::Result as SerialResult;
use bytes::{BufMut, Bytes, BytesMut};
use derive_try_from_primitive::TryFromPrimitive;
use wavez_core::checksum::xor_sum;

pub const ACK_BUFFER: [u8; 1] = [ControlByte::Ack as u8];
pub const NAK_BUFFER: [u8; 1] = [ControlByte::Nak as u8];
pub const CAN_BUFFER: [u8; 1] = [ControlByte::Can as u8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ControlByte {
    Sof = 0x01,
    Ack = 0x06,
    Nak = 0x15,
    Can = 0x18,
}

/// The checksum of a SOF frame: `0xFF XOR length-byte XOR payload bytes`.
pub fn checksum(payload: &[u8]) -> u8 {
    xor_sum(payload) ^ ((payload.len() + 1) & 0xff) as u8
}

/// Wraps a message payload in a SOF frame: `[SOF, len+1, payload…, checksum]`.
pub fn frame(payload: &[u8]) -> SerialResult<Bytes> {
    if payload.len() > 255 {
        return Err(Error::PayloadTooLarge(payload.len()));
    }
    let mut out = BytesMut::with_capacity(payload.len() + 3);
    out.put_u8(ControlByte::Sof as u8);
    out.put_u8((payload.len() + 1) as u8);
    out.extend_from_slice(payload);
    out.put_u8(checksum(payload));
    Ok(out.freeze())
}

/// Inverse of [`frame`], for tests and diagnostics. The framing state machine
/// itself reassembles frames byte-wise.
pub fn unframe(data: &[u8]) -> SerialResult<Bytes> {
    let bad_frame = || Error::Io(std::io::Error::other("bad frame"));
    if data.len() < 3 || data[0] != ControlByte::Sof as u8 {
        return Err(bad_frame());
    }
    let length = match data[1] as usize {
        0 => 256,
        n => n,
    };
    if data.len() != length + 2 {
        return Err(bad_frame());
    }
    let payload = &data[2..data.len() - 1];
    if checksum(payload) != data[data.len() - 1] {
        return Err(bad_frame());
    }
    Ok(Bytes::copy_from_slice(payload))
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_frame() {
        // GetSerialApiInitData request
        let payload = hex::decode("0002").unwrap();
        let framed = frame(&payload).unwrap();
        assert_eq!(framed.as_ref(), hex::decode("01030002fe").unwrap());
        assert_eq!(checksum(&payload), 0xfe);
    }

    #[test]
    fn test_frame_too_large() {
        let payload = vec![0u8; 256];
        assert!(matches!(frame(&payload), Err(Error::PayloadTooLarge(256))));
    }

    proptest! {
        #[test]
        fn prop_frame_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..=255)) {
            let framed = frame(&payload).unwrap();
            prop_assert_eq!(framed[framed.len() - 1], checksum(&payload));
            let unframed = unframe(&framed).unwrap();
            prop_assert_eq!(unframed.as_ref(), payload.as_slice());
        }
    }
}
