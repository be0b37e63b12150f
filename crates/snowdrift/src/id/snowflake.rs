use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};
use std::borrow::Cow;

use crate::error::{Error, Result};
use digits::{canonical_digits, fold_i64};

/// Decimal rendering of `i64::MAX`, the largest identifier below the sign bit.
const MAX_NUMERAL: &str = "9223372036854775807";

/// An immutable, non-negative Snowflake identifier.
///
/// The wide backend produces natively held values; the narrow backend
/// produces decimal numerals. Both compare, hash and display as the same
/// decimal numeral, so an id built from `4096` equals one parsed from
/// `"4096"`.
///
/// The representation is sealed: every value is non-negative and every
/// numeral is canonical (ASCII digits, no leading zeros, at most `i64::MAX`).
#[derive(Clone)]
pub struct SnowflakeId(Repr);

#[derive(Clone)]
enum Repr {
    Native(i64),
    Numeral(String),
}

impl SnowflakeId {
    /// Wraps a native value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] for negative values.
    pub fn from_i64(value: i64) -> Result<Self> {
        if value < 0 {
            return Err(Error::malformed(value.to_string(), "negative value"));
        }
        Ok(Self(Repr::Native(value)))
    }

    /// Parses a decimal numeral.
    ///
    /// Leading zeros are accepted and dropped. Signs, whitespace and values
    /// above `i64::MAX` are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] if `input` is not a
    /// non-negative integer numeral below 2^63.
    pub fn parse(input: &str) -> Result<Self> {
        let digits = canonical_digits(input)?;
        if digits.len() > MAX_NUMERAL.len()
            || (digits.len() == MAX_NUMERAL.len() && digits > MAX_NUMERAL)
        {
            return Err(Error::malformed(input, "exceeds 63 bits"));
        }
        Ok(Self(Repr::Numeral(digits.to_owned())))
    }

    /// Wraps a value packed from a checked layout, which never sets the sign
    /// bit.
    pub(crate) fn packed_native(value: i64) -> Self {
        debug_assert!(value >= 0, "packed value {value} is negative");
        Self(Repr::Native(value))
    }

    /// Wraps a numeral rendered by the narrow codec: canonical and below
    /// 2^63.
    pub(crate) fn packed_numeral(digits: String) -> Self {
        debug_assert!(
            canonical_digits(&digits).is_ok_and(|canonical| canonical.len() == digits.len()),
            "packed numeral {digits:?} is not canonical"
        );
        Self(Repr::Numeral(digits))
    }

    /// Returns the decimal numeral, borrowing when possible.
    pub fn numeral(&self) -> Cow<'_, str> {
        match &self.0 {
            Repr::Native(value) => Cow::Owned(value.to_string()),
            Repr::Numeral(digits) => Cow::Borrowed(digits),
        }
    }

    /// Returns the identifier as a native integer.
    pub fn to_i64(&self) -> i64 {
        match &self.0 {
            Repr::Native(value) => *value,
            Repr::Numeral(digits) => fold_i64(digits),
        }
    }

    pub const fn is_native(&self) -> bool {
        matches!(self.0, Repr::Native(_))
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<i64> for SnowflakeId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        Self::from_i64(value)
    }
}

impl TryFrom<u64> for SnowflakeId {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        i64::try_from(value)
            .map_err(|_| Error::malformed(value.to_string(), "exceeds 63 bits"))
            .and_then(Self::from_i64)
    }
}

impl From<SnowflakeId> for String {
    fn from(id: SnowflakeId) -> Self {
        match id.0 {
            Repr::Native(value) => value.to_string(),
            Repr::Numeral(digits) => digits,
        }
    }
}

impl PartialEq for SnowflakeId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Native(a), Repr::Native(b)) => a == b,
            _ => self.numeral() == other.numeral(),
        }
    }
}

impl Eq for SnowflakeId {}

impl Ord for SnowflakeId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.0, &other.0) {
            (Repr::Native(a), Repr::Native(b)) => a.cmp(b),
            _ => {
                let (a, b) = (self.numeral(), other.numeral());
                a.len().cmp(&b.len()).then_with(|| a.cmp(&b))
            }
        }
    }
}

impl PartialOrd for SnowflakeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Hash for SnowflakeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.numeral().hash(state);
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Native(value) => write!(f, "{value}"),
            Repr::Numeral(digits) => f.write_str(digits),
        }
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SnowflakeId")
            .field(&format_args!("{self}"))
            .finish()
    }
}

mod digits {
    use crate::error::{Error, Result};

    /// Validates `input` as a decimal numeral and strips leading zeros.
    pub(super) fn canonical_digits(input: &str) -> Result<&str> {
        if input.is_empty() {
            return Err(Error::malformed(input, "empty"));
        }
        if !input.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::malformed(input, "not a decimal numeral"));
        }
        let trimmed = input.trim_start_matches('0');
        Ok(if trimmed.is_empty() { "0" } else { trimmed })
    }

    /// Folds canonical digits (at most `i64::MAX`) into an `i64`.
    pub(super) fn fold_i64(digits: &str) -> i64 {
        digits
            .bytes()
            .fold(0_i64, |acc, b| acc * 10 + i64::from(b - b'0'))
    }
}
