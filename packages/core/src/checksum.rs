/// XOR-folds the given bytes, starting from `0xff`.
pub fn xor_sum(data: &[u8]) -> u8 {
    data.iter().fold(0xff, |acc, x| acc ^ x)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_xor_sum() {
        // GetSerialApiInitData request frame, checksum over [len, type, class]
        let data = hex::decode("030002").unwrap();
        assert_eq!(xor_sum(&data), 0xfe);
    }
}
