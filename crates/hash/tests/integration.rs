//! Integration tests for the checksum stream

#[cfg(test)]
mod tests {
    use hangar_hash::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn chunking_does_not_change_digest(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk in 1usize..512,
        ) {
            let mut stream = ChecksumStream::new();
            for piece in data.chunks(chunk) {
                stream.update(piece);
            }
            prop_assert_eq!(stream.bytes_hashed(), data.len() as u64);
            prop_assert_eq!(stream.finalize(), Checksum::from_data(&data));
        }

        #[test]
        fn hex_parses_back(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let checksum = Checksum::from_data(&data);
            prop_assert_eq!(Checksum::from_hex(&checksum.to_hex()).unwrap(), checksum);
        }
    }
}
