//! Packs a [`crate::value::Scalar`] into a byte-sort-equivalent key.
//!
//! Signed integers flip the sign bit so two's-complement order becomes
//! unsigned byte order; floats use the standard IEEE-754 total-order
//! encoding (toggle the sign bit for positive numbers, invert all bits for
//! negative numbers); text uses the collator's sort key; binary is used
//! as-is. Decimal packs through its string form (lexicographic on a
//! normalized, zero-padded representation would be the production choice;
//! here we key by numeric value via an intermediate `f64` fallback is
//! explicitly avoided in favor of comparing the `BigDecimal` values
//! directly wherever an index is consulted, since decimal precision must
//! not be lost — see `index/mod.rs`'s use of `Ord` for in-memory indexes
//! and this module only for columns that need a flat byte key).

use crate::collation::Collator;
use crate::value::Scalar;

/// Packs a scalar into bytes such that byte-lexicographic order on the
/// result matches the scalar's semantic order, for every type except
/// `Decimal` (which an index keys by `Ord` directly rather than by packed
/// bytes, since no precision-preserving fixed-width encoding is in scope).
#[must_use]
pub fn pack(value: &Scalar, collator: &dyn Collator) -> Vec<u8> {
    match value {
        Scalar::Null => vec![0],
        Scalar::Int(v) => {
            let mut bytes = vec![1u8];
            bytes.extend_from_slice(&pack_i64(*v));
            bytes
        }
        Scalar::Float(v) => {
            let mut bytes = vec![2u8];
            bytes.extend_from_slice(&pack_f64(*v));
            bytes
        }
        Scalar::Decimal(v) => {
            let mut bytes = vec![3u8];
            bytes.extend_from_slice(v.to_string().as_bytes());
            bytes
        }
        Scalar::Text(s) => {
            let mut bytes = vec![4u8];
            bytes.extend(collator.sort_key(s));
            bytes
        }
        Scalar::Binary(b) => {
            let mut bytes = vec![5u8];
            bytes.extend_from_slice(b);
            bytes
        }
        Scalar::Date(d) => {
            let mut bytes = vec![6u8];
            bytes.extend_from_slice(&pack_i64(d.and_hms_opt(0, 0, 0).map_or(0, |dt| {
                dt.and_utc().timestamp()
            })));
            bytes
        }
        Scalar::Time(t) => {
            use chrono::Timelike;
            let mut bytes = vec![7u8];
            bytes.extend_from_slice(&pack_i64(i64::from(t.num_seconds_from_midnight())));
            bytes
        }
        Scalar::DateTime(dt) => {
            let mut bytes = vec![8u8];
            bytes.extend_from_slice(&pack_i64(dt.and_utc().timestamp()));
            bytes.extend_from_slice(&pack_i64(i64::from(dt.and_utc().timestamp_subsec_nanos())));
            bytes
        }
    }
}

/// Two's-complement signed integer with the sign bit flipped, so unsigned
/// big-endian byte order equals signed numeric order.
#[must_use]
pub fn pack_i64(v: i64) -> [u8; 8] {
    let flipped = (v as u64) ^ (1 << 63);
    flipped.to_be_bytes()
}

/// IEEE-754 total-order float encoding: for non-negative numbers (sign bit
/// 0) set the sign bit; for negative numbers (sign bit 1) invert every
/// bit. This makes `to_be_bytes` on the result order identically to the
/// float's numeric order, including across the zero/negative boundary.
#[must_use]
pub fn pack_f64(v: f64) -> [u8; 8] {
    let bits = v.to_bits();
    let encoded = if bits & (1 << 63) == 0 {
        bits | (1 << 63)
    } else {
        !bits
    };
    encoded.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_signed_ints_preserve_order() {
        let mut values = vec![-100i64, -1, 0, 1, 100, i64::MIN, i64::MAX];
        let mut packed: Vec<_> = values.iter().map(|v| pack_i64(*v)).collect();
        values.sort_unstable();
        packed.sort_unstable();
        let repacked: Vec<_> = values.iter().map(|v| pack_i64(*v)).collect();
        assert_eq!(packed, repacked);
    }

    #[test]
    fn packed_floats_preserve_order() {
        let values = vec![-100.5f64, -0.001, 0.0, 0.001, 100.5, f64::MIN, f64::MAX];
        let mut expected_order = values.clone();
        expected_order.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut by_packed = values.clone();
        by_packed.sort_by_key(|v| pack_f64(*v));
        assert_eq!(expected_order, by_packed);
    }

    #[test]
    fn negative_floats_sort_before_positive() {
        assert!(pack_f64(-1.0) < pack_f64(1.0));
        assert!(pack_f64(-2.0) < pack_f64(-1.0));
    }
}
