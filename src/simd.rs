//! SIMD kernels for the hot distance paths.
//!
//! All kernels process the bulk of each vector in portable SIMD lanes
//! (`wide::f32x4` by default, `wide::f32x8` with the `wide8` feature) and
//! finish with a scalar tail for lengths not divisible by the lane width.
//!
//! Length agreement is a caller responsibility at this layer: the collection
//! validates dimensions before any kernel runs, and the standalone helpers
//! in [`crate::distance`] length-check on behalf of external callers.

use crate::config::SIGNATURE_WORD_BITS;
use wide::f32x4;
#[cfg(feature = "wide8")]
use wide::f32x8;

#[inline]
fn load4(slice: &[f32], i: usize) -> f32x4 {
    f32x4::from([slice[i], slice[i + 1], slice[i + 2], slice[i + 3]])
}

#[cfg(feature = "wide8")]
#[inline]
fn load8(slice: &[f32], i: usize) -> f32x8 {
    f32x8::from([
        slice[i],
        slice[i + 1],
        slice[i + 2],
        slice[i + 3],
        slice[i + 4],
        slice[i + 5],
        slice[i + 6],
        slice[i + 7],
    ])
}

/// Euclidean (L2) distance between two equal-length vectors.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let len = a.len();
    let mut i = 0;
    let mut acc = 0.0f32;

    #[cfg(feature = "wide8")]
    {
        let mut sum = f32x8::ZERO;
        while i + 8 <= len {
            let d = load8(a, i) - load8(b, i);
            sum += d * d;
            i += 8;
        }
        acc += sum.reduce_add();
    }
    #[cfg(not(feature = "wide8"))]
    {
        let mut sum = f32x4::ZERO;
        while i + 4 <= len {
            let d = load4(a, i) - load4(b, i);
            sum += d * d;
            i += 4;
        }
        acc += sum.reduce_add();
    }

    while i < len {
        let d = a[i] - b[i];
        acc += d * d;
        i += 1;
    }
    acc.sqrt()
}

/// Inner product of two equal-length vectors.
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    let len = a.len();
    let mut i = 0;
    let mut acc = 0.0f32;

    #[cfg(feature = "wide8")]
    {
        let mut sum = f32x8::ZERO;
        while i + 8 <= len {
            sum += load8(a, i) * load8(b, i);
            i += 8;
        }
        acc += sum.reduce_add();
    }
    #[cfg(not(feature = "wide8"))]
    {
        let mut sum = f32x4::ZERO;
        while i + 4 <= len {
            sum += load4(a, i) * load4(b, i);
            i += 4;
        }
        acc += sum.reduce_add();
    }

    while i < len {
        acc += a[i] * b[i];
        i += 1;
    }
    acc
}

/// Returns a copy of `v` scaled to unit L2 norm.
///
/// A vector with norm at or below `f32::EPSILON` is returned unchanged —
/// there is no meaningful direction to preserve.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = dot_product(v, v).sqrt();
    if norm > f32::EPSILON {
        let inv = 1.0 / norm;
        v.iter().map(|x| x * inv).collect()
    } else {
        v.to_vec()
    }
}

/// Packs the sign pattern of `v` into 64-bit words.
///
/// Bit `i` (word `i / 64`, bit position `i % 64`, LSB first) is set iff
/// `v[i]` is strictly positive; zero compresses to an unset bit. Unused
/// high bits of the last word stay zero, so signatures of equal-length
/// vectors compare bit-for-bit.
pub fn compress(v: &[f32]) -> Vec<u64> {
    let mut out = vec![0u64; v.len().div_ceil(SIGNATURE_WORD_BITS)];
    for (i, &x) in v.iter().enumerate() {
        if x > 0.0 {
            out[i / SIGNATURE_WORD_BITS] |= 1u64 << (i % SIGNATURE_WORD_BITS);
        }
    }
    out
}

/// Number of differing bits between two equal-length bit arrays.
pub fn hamming(a: &[u64], b: &[u64]) -> u32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_distance_pythagorean() {
        assert!((l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_l2_distance_zero_for_identical() {
        let v: Vec<f32> = (0..37).map(|i| i as f32 * 0.25 - 4.0).collect();
        assert_eq!(l2_distance(&v, &v), 0.0);
    }

    #[test]
    fn test_l2_distance_matches_scalar_on_odd_lengths() {
        // Lengths chosen to exercise every tail case around the lane width.
        for len in [1usize, 3, 4, 5, 7, 8, 9, 15, 16, 17, 33] {
            let a: Vec<f32> = (0..len).map(|i| (i as f32).sin()).collect();
            let b: Vec<f32> = (0..len).map(|i| (i as f32).cos()).collect();
            let expected: f32 = a
                .iter()
                .zip(&b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt();
            let got = l2_distance(&a, &b);
            assert!(
                (got - expected).abs() < 1e-5,
                "len {len}: {got} vs {expected}"
            );
        }
    }

    #[test]
    fn test_dot_product_known_value() {
        assert!((dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_product_matches_scalar_on_odd_lengths() {
        for len in [1usize, 5, 8, 13, 31] {
            let a: Vec<f32> = (0..len).map(|i| i as f32 * 0.5 - 2.0).collect();
            let b: Vec<f32> = (0..len).map(|i| 1.5 - i as f32 * 0.25).collect();
            let expected: f32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
            assert!((dot_product(&a, &b) - expected).abs() < 1e-4);
        }
    }

    #[test]
    fn test_normalize_unit_norm() {
        let n = normalize(&[3.0, 4.0]);
        assert!((n[0] - 0.6).abs() < 1e-6);
        assert!((n[1] - 0.8).abs() < 1e-6);
        assert!((dot_product(&n, &n).sqrt() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_unchanged() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_compress_strictly_positive_bits() {
        // Zero is not positive and must compress to an unset bit.
        let bits = compress(&[1.0, -1.0, 0.0, 0.5]);
        assert_eq!(bits, vec![0b1001]);
    }

    #[test]
    fn test_compress_lsb_is_index_zero() {
        let bits = compress(&[2.0, -3.0, -1.0, -1.0]);
        assert_eq!(bits, vec![0b0001]);
    }

    #[test]
    fn test_compress_spans_multiple_words() {
        let mut v = vec![-1.0f32; 70];
        v[0] = 1.0;
        v[63] = 1.0;
        v[64] = 1.0;
        let bits = compress(&v);
        assert_eq!(bits.len(), 2);
        assert_eq!(bits[0], 1 | (1 << 63));
        assert_eq!(bits[1], 1);
    }

    #[test]
    fn test_compress_is_deterministic() {
        let v = [0.3, -0.7, 1.5, -2.0, 0.0, 4.0];
        assert_eq!(compress(&v), compress(&v));
    }

    #[test]
    fn test_hamming_self_is_zero() {
        let bits = compress(&[1.0, -2.0, 3.0, -4.0, 5.0]);
        assert_eq!(hamming(&bits, &bits), 0);
    }

    #[test]
    fn test_hamming_negation_flips_every_bit() {
        // Holds whenever no component is exactly zero.
        let v: Vec<f32> = (0..100).map(|i| if i % 3 == 0 { -1.5 } else { 2.5 }).collect();
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        assert_eq!(hamming(&compress(&v), &compress(&neg)), 100);
    }

    #[test]
    fn test_hamming_two_flipped_signs() {
        let a = compress(&[1.0, 2.0, 3.0, 4.0]);
        let b = compress(&[-1.0, 2.0, -3.0, 4.0]);
        assert_eq!(hamming(&a, &b), 2);
    }
}
