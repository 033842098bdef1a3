extern crate bytes as bytes_crate;
use bitvec::prelude::*;
use bytes_crate::{BufMut, Bytes, BytesMut};

pub mod bits;
pub mod bytes;
pub mod sequence;

pub const DEFAULT_CAPACITY: usize = 64;
const CAPACITY_INCREMENT: usize = 32;

pub trait Serializable {
    /// Write the value into the given buffer
    fn serialize(&self, output: &mut BytesMut);

    fn as_bytes_mut(&self) -> BytesMut {
        let mut output = BytesMut::with_capacity(DEFAULT_CAPACITY);
        self.serialize(&mut output);
        output
    }

    fn as_bytes(&self) -> Bytes {
        self.as_bytes_mut().freeze()
    }
}

pub type BitOutput = BitVec<u8, Msb0>;

pub trait BitSerializable {
    fn write(&self, b: &mut BitOutput);
}

// Convenience implementation of Serializable for functions
impl<F> Serializable for F
where
    F: Fn(&mut BytesMut),
{
    fn serialize(&self, output: &mut BytesMut) {
        self(output)
    }
}

// Convenience implementation of Serializable for Option<Serializable>
impl<T> Serializable for Option<T>
where
    T: Serializable,
{
    fn serialize(&self, output: &mut BytesMut) {
        if let Some(v) = self {
            v.serialize(output);
        }
    }
}

impl BitSerializable for bool {
    fn write(&self, b: &mut BitOutput) {
        b.push(*self);
    }
}

/// Appends the lowest `num_bits` bits of `value` to the bit output,
/// most significant of them first.
pub fn write_bits(b: &mut BitOutput, value: u8, num_bits: usize) {
    let bitslice = value.view_bits::<Msb0>();
    b.extend_from_bitslice(&bitslice[8 - num_bits..]);
}

/// Ensures that the given buffer has enough remaining capacity to write the
/// given number of bytes. Z-Wave frames usually fit the initial 64 bytes, so
/// growth happens in small increments.
#[inline(always)]
pub(crate) fn ensure_capacity(output: &mut BytesMut, required: usize) {
    if output.remaining_mut() < required {
        let mut additional = CAPACITY_INCREMENT;
        while additional < required {
            additional += CAPACITY_INCREMENT;
        }
        output.reserve(additional);
    }
}
