//! Stable short digests used to derive collision free variable ids
use std::hash::{DefaultHasher, Hash, Hasher};

/// Hex digest of `t`
///
/// `DefaultHasher::new` uses fixed keys, so the digest is the same on every run of a build.
pub(crate) fn hash_as_hex_string<T: Hash + ?Sized>(t: &T) -> String {
    let mut hasher = DefaultHasher::new();
    t.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        assert_eq!(hash_as_hex_string("R1"), hash_as_hex_string("R1"));
        assert_ne!(hash_as_hex_string("R1"), hash_as_hex_string("R2"));
        assert!(hash_as_hex_string("R1")
            .chars()
            .all(|c| c.is_ascii_hexdigit()));
    }
}
