//! Arbitrary precision decimal arithmetic for the narrow backend.
//!
//! Numbers are kept as decimal digit strings and every intermediate value
//! stays below 2^32, so the arithmetic works the same on targets whose
//! native integers cannot hold a full identifier.
//!
//! Only what the codec needs is implemented: building a numeral from two
//! 32-bit halves, multiplying by a power of two, addition, and conversion to
//! fixed-width hexadecimal by repeated long division by 16.
use core::fmt;

use crate::error::{Error, Result};

/// Largest factor or divisor accepted by the single-limb operations.
const MAX_LIMB: u32 = 1 << LIMB_BITS;
const LIMB_BITS: u32 = 16;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// A non-negative integer stored as base-10 digits, most significant first.
///
/// Always canonical: no leading zeros, and zero is a single `0` digit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Numeral {
    digits: Vec<u8>,
}

impl Numeral {
    pub fn zero() -> Self {
        Self { digits: vec![0] }
    }

    /// Parses a decimal numeral, dropping leading zeros.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] for empty input or any byte
    /// that is not an ASCII digit.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(Error::malformed(input, "empty"));
        }
        let digits = input
            .bytes()
            .map(|b| {
                if b.is_ascii_digit() {
                    Ok(b - b'0')
                } else {
                    Err(Error::malformed(input, "not a decimal numeral"))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::canonical(digits))
    }

    pub fn from_u32(mut value: u32) -> Self {
        if value == 0 {
            return Self::zero();
        }
        let mut digits = Vec::with_capacity(10);
        while value > 0 {
            digits.push((value % 10) as u8);
            value /= 10;
        }
        digits.reverse();
        Self { digits }
    }

    /// Builds a numeral from the two 32-bit halves of `value`.
    pub fn from_u64(value: u64) -> Self {
        let high = Self::from_u32((value >> 32) as u32);
        let low = Self::from_u32(value as u32);
        high.shl(32).add(&low)
    }

    pub fn is_zero(&self) -> bool {
        self.digits == [0]
    }

    /// Multiplies by `2^bits`.
    #[must_use]
    pub fn shl(&self, bits: u32) -> Self {
        let mut out = self.clone();
        let mut remaining = bits;
        while remaining >= LIMB_BITS {
            out = out.mul_small(MAX_LIMB);
            remaining -= LIMB_BITS;
        }
        if remaining > 0 {
            out = out.mul_small(1 << remaining);
        }
        out
    }

    /// Multiplies by a factor of at most 2^16.
    #[must_use]
    pub fn mul_small(&self, factor: u32) -> Self {
        debug_assert!(factor <= MAX_LIMB);
        let mut out = Vec::with_capacity(self.digits.len() + 5);
        let mut carry = 0_u32;
        for &digit in self.digits.iter().rev() {
            let product = u32::from(digit) * factor + carry;
            out.push((product % 10) as u8);
            carry = product / 10;
        }
        while carry > 0 {
            out.push((carry % 10) as u8);
            carry /= 10;
        }
        out.reverse();
        Self::canonical(out)
    }

    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        let len = self.digits.len().max(other.digits.len());
        let mut out = Vec::with_capacity(len + 1);
        let mut a = self.digits.iter().rev();
        let mut b = other.digits.iter().rev();
        let mut carry = 0_u8;
        for _ in 0..len {
            let sum = a.next().copied().unwrap_or(0) + b.next().copied().unwrap_or(0) + carry;
            out.push(sum % 10);
            carry = sum / 10;
        }
        if carry > 0 {
            out.push(carry);
        }
        out.reverse();
        Self::canonical(out)
    }

    /// Long division by a divisor of at most 2^16, returning quotient and
    /// remainder.
    pub fn div_rem_small(&self, divisor: u32) -> (Self, u32) {
        debug_assert!(divisor > 0 && divisor <= MAX_LIMB);
        let mut quotient = Vec::with_capacity(self.digits.len());
        let mut remainder = 0_u32;
        for &digit in &self.digits {
            let current = remainder * 10 + u32::from(digit);
            quotient.push((current / divisor) as u8);
            remainder = current % divisor;
        }
        (Self::canonical(quotient), remainder)
    }

    /// Converts to upper-case hexadecimal, left-padded with zeros to at least
    /// `width` digits.
    pub fn to_hex(&self, width: usize) -> String {
        let mut reversed = Vec::with_capacity(width);
        let mut current = self.clone();
        while !current.is_zero() {
            let (quotient, remainder) = current.div_rem_small(16);
            reversed.push(HEX[remainder as usize]);
            current = quotient;
        }
        while reversed.len() < width {
            reversed.push(b'0');
        }
        reversed.iter().rev().map(|&b| char::from(b)).collect()
    }

    fn canonical(mut digits: Vec<u8>) -> Self {
        let leading = digits
            .iter()
            .take_while(|&&d| d == 0)
            .count()
            .min(digits.len().saturating_sub(1));
        digits.drain(..leading);
        if digits.is_empty() {
            digits.push(0);
        }
        Self { digits }
    }
}

impl fmt::Display for Numeral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.digits
            .iter()
            .try_for_each(|&d| fmt::Write::write_char(f, char::from(b'0' + d)))
    }
}
