//! Hashing utilities.
//!
//! xxHash3 is used for content-based cache keys; [`slot_hash`] reproduces the
//! small multiplicative string hash that keys scoped-slot functions rendered
//! inside conditionals, so the generated keys stay stable across builds.

use xxhash_rust::xxh3::xxh3_64;

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Convert a hash to a hex string (16 characters).
#[inline]
pub fn hash_to_hex(hash: u64) -> std::string::String {
    format!("{:016x}", hash)
}

/// Compute hash of a string and return as hex.
#[inline]
pub fn content_hash(content: &str) -> std::string::String {
    hash_to_hex(hash_str(content))
}

/// Content hash for generated slot functions.
///
/// Walks the UTF-16 code units from the end, `h = (h * 33) ^ unit` in 32-bit
/// wrapping arithmetic, seeded with 5381.
pub fn slot_hash(source: &str) -> u32 {
    let units: Vec<u16> = source.encode_utf16().collect();
    let mut hash: i32 = 5381;
    for unit in units.into_iter().rev() {
        hash = hash.wrapping_mul(33) ^ i32::from(unit);
    }
    hash as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consistency() {
        let content = "Hello, World!";
        assert_eq!(hash_str(content), hash_str(content));
    }

    #[test]
    fn test_hash_difference() {
        assert_ne!(hash_str("Hello"), hash_str("World"));
    }

    #[test]
    fn test_hex_format() {
        let hex = hash_to_hex(hash_str("test"));
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_slot_hash_empty_is_seed() {
        assert_eq!(slot_hash(""), 5381);
    }

    #[test]
    fn test_slot_hash_single_char() {
        // 5381 * 33 ^ 'a'
        assert_eq!(slot_hash("a"), (5381u32 * 33) ^ 97);
    }

    #[test]
    fn test_slot_hash_is_order_sensitive() {
        assert_ne!(slot_hash("ab"), slot_hash("ba"));
    }
}
