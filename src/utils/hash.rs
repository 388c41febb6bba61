use blake2::{Blake2s256, Digest};

/// Checksums keep the first 16 bytes of the blake2s-256 digest. The result
/// is a fingerprint for change detection, not a security primitive.
pub const CHECKSUM_BYTES: usize = 16;

pub fn digest_bytes(input: &[u8]) -> String {
    let mut hasher = Blake2s256::new();
    hasher.update(input);
    let full = hasher.finalize();
    hex::encode(&full[..CHECKSUM_BYTES])
}

pub fn digest_str(input: &str) -> String {
    digest_bytes(input.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_shape() {
        let d = digest_str("abc");
        assert_eq!(d.len(), CHECKSUM_BYTES * 2);
        assert!(d.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn digest_discriminates() {
        assert_ne!(digest_str(""), digest_str("a"));
        assert_ne!(digest_str("ab"), digest_str("ba"));
    }

    proptest! {
        #[test]
        fn digest_is_deterministic(input in any::<Vec<u8>>()) {
            prop_assert_eq!(digest_bytes(&input), digest_bytes(&input));
        }

        #[test]
        fn digest_matches_str_form(input in "[a-z0-9]{0,64}") {
            prop_assert_eq!(digest_str(&input), digest_bytes(input.as_bytes()));
        }
    }
}
