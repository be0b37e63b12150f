use super::Packed;
use crate::{
    error::Result,
    id::{BitLayout, SnowflakeId},
};

#[cfg(feature = "decimal")]
pub(super) use decimal::{pack, unpack};
#[cfg(not(feature = "decimal"))]
pub(super) use unsupported::{pack, unpack};

#[cfg(feature = "decimal")]
mod decimal {
    use super::{BitLayout, Packed, Result, SnowflakeId};
    use crate::{codec::FIELDS, codec::numeral::Numeral, error::Error};

    /// Hex digits needed for 64 bits.
    const HEX_WIDTH: usize = 16;

    /// Packs by multiplying each field by `2^shift` and summing. The fields
    /// occupy disjoint bit ranges, so the sum equals the bitwise or.
    pub(in crate::codec) fn pack(layout: &BitLayout, values: &Packed) -> Result<SnowflakeId> {
        let numeral = FIELDS
            .iter()
            .zip(values)
            .fold(Numeral::zero(), |acc, (&field, &value)| {
                acc.add(&Numeral::from_u64(value).shl(layout.shift(field)))
            });
        Ok(SnowflakeId::packed_numeral(numeral.to_string()))
    }

    /// Converts the numeral to 16 hex digits by long division and reads each
    /// field's bits straight out of the hex string.
    pub(in crate::codec) fn unpack(layout: &BitLayout, id: &str) -> Result<Packed> {
        let hex = Numeral::parse(id)?.to_hex(HEX_WIDTH);
        let hex = hex.as_bytes();
        if hex.len() > HEX_WIDTH || nibble(hex[0]) >= 8 {
            return Err(Error::malformed(id, "exceeds 63 bits"));
        }
        Ok(FIELDS.map(|field| extract(hex, layout.shift(field), layout.width(field))))
    }

    fn extract(hex: &[u8], shift: u32, width: u8) -> u64 {
        (0..u32::from(width)).fold(0, |acc, i| {
            let bit = shift + i;
            let digit = nibble(hex[hex.len() - 1 - (bit / 4) as usize]);
            acc | (u64::from((digit >> (bit % 4)) & 1) << i)
        })
    }

    const fn nibble(ascii: u8) -> u8 {
        match ascii {
            b'0'..=b'9' => ascii - b'0',
            _ => ascii - b'A' + 10,
        }
    }
}

#[cfg(not(feature = "decimal"))]
mod unsupported {
    use super::{BitLayout, Packed, Result, SnowflakeId};
    use crate::error::Error;

    const CAPABILITY: &str = "arbitrary precision arithmetic (enable feature `decimal`)";

    pub(in crate::codec) fn pack(_: &BitLayout, _: &Packed) -> Result<SnowflakeId> {
        Err(Error::PlatformCapability {
            capability: CAPABILITY,
        })
    }

    pub(in crate::codec) fn unpack(_: &BitLayout, _: &str) -> Result<Packed> {
        Err(Error::PlatformCapability {
            capability: CAPABILITY,
        })
    }
}
