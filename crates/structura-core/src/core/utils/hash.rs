//! 32-bit integer mixing used for structure and element-set hash codes.
//!
//! All arithmetic wraps at 32 bits so hash values are stable across platforms
//! and identical for identical inputs.

/// Bit-mixes a single 32-bit integer.
#[inline]
pub fn hash1(i: i32) -> i32 {
    let mut a = i ^ (i >> 4);
    a = (a ^ (0xdeadbeef_u32 as i32)).wrapping_add(a << 5);
    a ^ (a >> 11)
}

pub fn hash2(i: i32, j: i32) -> i32 {
    let mut a = 23_i32;
    a = 31_i32.wrapping_mul(a).wrapping_add(i);
    a = 31_i32.wrapping_mul(a).wrapping_add(j);
    hash1(a)
}

pub fn hash3(i: i32, j: i32, k: i32) -> i32 {
    let mut a = 23_i32;
    a = 31_i32.wrapping_mul(a).wrapping_add(i);
    a = 31_i32.wrapping_mul(a).wrapping_add(j);
    a = 31_i32.wrapping_mul(a).wrapping_add(k);
    hash1(a)
}

pub fn hash4(i: i32, j: i32, k: i32, l: i32) -> i32 {
    let mut a = 23_i32;
    a = 31_i32.wrapping_mul(a).wrapping_add(i);
    a = 31_i32.wrapping_mul(a).wrapping_add(j);
    a = 31_i32.wrapping_mul(a).wrapping_add(k);
    a = 31_i32.wrapping_mul(a).wrapping_add(l);
    hash1(a)
}

/// Java-style string hash over UTF-16 code units.
pub fn hash_string(s: &str) -> i32 {
    s.encode_utf16().fold(0_i32, |h, c| {
        (h << 5).wrapping_sub(h).wrapping_add(i32::from(c))
    })
}

/// Hash of a strictly increasing index sequence, sampling its length and
/// first, last and middle values.
pub fn sorted_slice_hash(xs: &[usize]) -> i32 {
    let len = xs.len();
    match len {
        0 => 0,
        1 | 2 => hash3(len as i32, xs[0] as i32, xs[len - 1] as i32),
        _ => hash4(
            len as i32,
            xs[0] as i32,
            xs[len - 1] as i32,
            xs[len >> 1] as i32,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash1_is_deterministic_and_mixes_bits() {
        assert_eq!(hash1(42), hash1(42));
        assert_ne!(hash1(1), hash1(2));
    }

    #[test]
    fn hash_string_matches_known_values() {
        assert_eq!(hash_string(""), 0);
        assert_eq!(hash_string("a"), 97);
        assert_eq!(hash_string("ab"), 97 * 31 + 98);
        assert_eq!(hash_string("hello"), 99162322);
    }

    #[test]
    fn hash_string_wraps_on_long_input() {
        let long = "x".repeat(1000);
        assert_eq!(hash_string(&long), hash_string(&long));
    }

    #[test]
    fn sorted_slice_hash_of_empty_is_zero() {
        assert_eq!(sorted_slice_hash(&[]), 0);
    }

    #[test]
    fn sorted_slice_hash_uses_three_term_form_for_short_slices() {
        assert_eq!(sorted_slice_hash(&[5]), hash3(1, 5, 5));
        assert_eq!(sorted_slice_hash(&[5, 9]), hash3(2, 5, 9));
    }

    #[test]
    fn sorted_slice_hash_samples_middle_for_longer_slices() {
        assert_eq!(sorted_slice_hash(&[1, 2, 3, 4]), hash4(4, 1, 4, 3));
        assert_ne!(
            sorted_slice_hash(&[1, 2, 3, 4]),
            sorted_slice_hash(&[1, 2, 3, 5])
        );
    }

    #[test]
    fn hash_functions_are_order_sensitive() {
        assert_ne!(hash2(1, 2), hash2(2, 1));
        assert_ne!(hash3(1, 2, 3), hash3(3, 2, 1));
    }
}
