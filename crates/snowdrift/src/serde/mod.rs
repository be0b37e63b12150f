//! `serde` support for [`SnowflakeId`].
//!
//! Identifiers serialize as decimal numeral strings, which survive every
//! consumer including JSON parsers limited to 53-bit integers. They
//! deserialize from a numeral string or from a non-negative integer.
//!
//! Use [`as_native`] on a field to write the integer form instead.
use core::fmt;

use ::serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, Visitor},
};

use crate::SnowflakeId;

impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&self.numeral())
    }
}

impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_any(SnowflakeIdVisitor)
    }
}

struct SnowflakeIdVisitor;

impl Visitor<'_> for SnowflakeIdVisitor {
    type Value = SnowflakeId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer below 2^63 or its decimal numeral")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        SnowflakeId::parse(v).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        SnowflakeId::from_i64(v).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        SnowflakeId::try_from(v).map_err(E::custom)
    }
}

/// Serializes a [`SnowflakeId`] field as a native `i64`.
///
/// ```
/// use snowdrift::SnowflakeId;
///
/// #[derive(serde::Serialize, serde::Deserialize)]
/// struct Row {
///     #[serde(with = "snowdrift::as_native")]
///     id: SnowflakeId,
/// }
/// ```
pub mod as_native {
    use super::{Deserialize, Deserializer, Serialize, Serializer};
    use crate::SnowflakeId;

    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SnowflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        id.to_i64().serialize(s)
    }

    /// # Errors
    ///
    /// Returns an error if the underlying deserializer fails or the value is
    /// negative.
    pub fn deserialize<'de, D>(d: D) -> Result<SnowflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(d)?;
        SnowflakeId::from_i64(raw).map_err(::serde::de::Error::custom)
    }
}
