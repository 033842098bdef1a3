use super::{ensure_capacity, Serializable};
use bytes::BytesMut;

macro_rules! impl_int {
    ($un:ident, $bytes:literal) => {
        paste::paste! {
            pub fn [<be_ $un>](val: $un) -> impl Serializable {
                use bytes::BufMut;
                move |output: &mut BytesMut| {
                    ensure_capacity(output, $bytes);
                    output.[<put_ $un>](val);
                }
            }
        }
    };
}

impl_int!(u8, 1);
impl_int!(u16, 2);
impl_int!(u32, 4);
impl_int!(i8, 1);
impl_int!(i16, 2);
impl_int!(i32, 4);

/// Writes a 3-byte big-endian unsigned integer.
pub fn be_u24(val: u32) -> impl Serializable {
    use bytes::BufMut;
    move |output: &mut BytesMut| {
        ensure_capacity(output, 3);
        output.put_u8((val >> 16) as u8);
        output.put_u16(val as u16);
    }
}

pub fn slice<S>(data: S) -> impl Serializable
where
    S: AsRef<[u8]>,
{
    move |output: &mut BytesMut| {
        let data = data.as_ref();
        ensure_capacity(output, data.len());
        output.extend_from_slice(data);
    }
}

pub fn empty(_: &mut BytesMut) {
    // Do nothing
}
