use super::{ensure_capacity, BitOutput, Serializable};
use bytes::BytesMut;

/// Collects bit-level writes and appends the resulting bytes to the output.
/// The closure must fill whole bytes.
pub fn bits<F>(f: F) -> impl Serializable
where
    F: Fn(&mut BitOutput),
{
    move |output: &mut BytesMut| {
        let mut bo = BitOutput::new();
        f(&mut bo);

        let data = bo.as_raw_slice();
        ensure_capacity(output, data.len());
        output.extend_from_slice(data);
    }
}
