use super::{FIELDS, Packed};
use crate::id::{BitLayout, SnowflakeId};

/// Packs with native shifts. Fits in an `i64` because a checked layout uses
/// at most 63 bits.
#[allow(clippy::cast_possible_wrap)]
pub(super) fn pack(layout: &BitLayout, values: &Packed) -> SnowflakeId {
    let raw = FIELDS
        .iter()
        .zip(values)
        .fold(0_u64, |acc, (&field, &value)| acc | (value << layout.shift(field)));
    SnowflakeId::packed_native(raw as i64)
}

#[allow(clippy::cast_sign_loss)]
pub(super) fn unpack(layout: &BitLayout, raw: i64) -> Packed {
    let raw = raw as u64;
    FIELDS.map(|field| (raw >> layout.shift(field)) & layout.max(field))
}
