/// A single byte-level discrepancy between a reference file and its
/// candidate counterpart.
///
/// Records are immutable values emitted by the diff engine in strictly
/// increasing offset order.
use serde::{Deserialize, Serialize};

/// Why a byte position was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DamageKind {
    /// Both files have a byte here and they differ.
    #[default]
    Mismatch,
    /// The reference has a byte here, the candidate ended before it.
    /// `damaged_byte` is `0`.
    Truncated,
    /// The candidate has a byte here, the reference ended before it.
    /// `original_byte` is `0`.
    Extended,
}

/// One mismatching byte position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRecord {
    /// Byte position within the file. Non-negative unless offsets are
    /// computed with `OffsetWidth::Legacy32` and the file exceeds 2 GiB.
    pub offset: i64,
    pub original_byte: u8,
    pub damaged_byte: u8,
    #[serde(default)]
    pub kind: DamageKind,
}

impl DamageRecord {
    /// A plain byte mismatch.
    #[inline]
    pub fn mismatch(offset: i64, original_byte: u8, damaged_byte: u8) -> Self {
        Self {
            offset,
            original_byte,
            damaged_byte,
            kind: DamageKind::Mismatch,
        }
    }

    /// A reference byte with no candidate counterpart.
    #[inline]
    pub fn truncated(offset: i64, original_byte: u8) -> Self {
        Self {
            offset,
            original_byte,
            damaged_byte: 0,
            kind: DamageKind::Truncated,
        }
    }

    /// A candidate byte with no reference counterpart.
    #[inline]
    pub fn extended(offset: i64, damaged_byte: u8) -> Self {
        Self {
            offset,
            original_byte: 0,
            damaged_byte,
            kind: DamageKind::Extended,
        }
    }

    /// XOR of the two bytes — the flipped bits.
    #[inline]
    pub fn flipped_bits(&self) -> u8 {
        self.original_byte ^ self.damaged_byte
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialises_with_camel_case_fields() {
        let rec = DamageRecord::mismatch(1, 66, 90);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(
            json,
            r#"{"offset":1,"originalByte":66,"damagedByte":90,"kind":"MISMATCH"}"#
        );
    }

    #[test]
    fn flipped_bits_is_xor() {
        let rec = DamageRecord::mismatch(0, 0b1010_0000, 0b1010_0001);
        assert_eq!(rec.flipped_bits(), 1);
        assert_eq!(rec.flipped_bits().count_ones(), 1);
    }

    #[test]
    fn trailing_constructors_zero_the_absent_side() {
        let t = DamageRecord::truncated(10, 0xAB);
        assert_eq!((t.original_byte, t.damaged_byte, t.kind), (0xAB, 0, DamageKind::Truncated));
        let e = DamageRecord::extended(11, 0xCD);
        assert_eq!((e.original_byte, e.damaged_byte, e.kind), (0, 0xCD, DamageKind::Extended));
    }
}
