//! Packing [`Components`] into identifiers and back.
//!
//! Two interchangeable backends produce the same decimal numerals:
//!
//! - [`Backend::Wide`] shifts and masks native 64-bit integers.
//! - [`Backend::Narrow`] never holds more than 32 bits in a native integer.
//!   It packs by multiplying each field by a power of two and summing, and
//!   unpacks by long division into hexadecimal. Requires feature `decimal`.
mod narrow;
#[cfg(feature = "decimal")]
mod numeral;
mod wide;

#[cfg(feature = "decimal")]
pub use numeral::Numeral;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    error::{ConfigurationError, Error, Result},
    id::{BitLayout, Components, Field, Origin, SnowflakeId},
};

/// Fields in packing order. Indexes into [`Packed`].
const FIELDS: [Field; 5] = [
    Field::Timestamp,
    Field::Datacenter,
    Field::Worker,
    Field::Origin,
    Field::Sequence,
];

/// Raw field values, in [`FIELDS`] order.
type Packed = [u64; 5];

/// Integer arithmetic used to pack and unpack identifiers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Native 64-bit shifts and masks.
    Wide,
    /// Decimal numerals and 32-bit limbs.
    Narrow,
}

impl Backend {
    /// The backend matching the target's native integer width.
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Wide
        } else {
            Self::Narrow
        }
    }

    /// Whether this backend is usable in the current build.
    pub const fn is_available(self) -> bool {
        match self {
            Self::Wide => true,
            Self::Narrow => cfg!(feature = "decimal"),
        }
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::native()
    }
}

/// Encodes and decodes identifiers for one [`BitLayout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Codec {
    layout: BitLayout,
    backend: Backend,
}

impl Codec {
    /// Creates a codec using the target's native backend.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the layout fails
    /// [`BitLayout::check`].
    pub fn new(layout: BitLayout) -> Result<Self> {
        Self::with_backend(layout, Backend::native())
    }

    /// Creates a codec with an explicit backend.
    ///
    /// # Errors
    ///
    /// - [`Error::Configuration`] if the layout fails [`BitLayout::check`]
    /// - [`Error::PlatformCapability`] if `backend` is not compiled in
    pub fn with_backend(layout: BitLayout, backend: Backend) -> Result<Self> {
        layout.check()?;
        if !backend.is_available() {
            return Err(Error::PlatformCapability {
                capability: "arbitrary precision arithmetic (enable feature `decimal`)",
            });
        }
        Ok(Self { layout, backend })
    }

    pub const fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub const fn backend(&self) -> Backend {
        self.backend
    }

    /// Packs `components` into an identifier.
    ///
    /// The timestamp wraps if it no longer fits its field. An origin flag is
    /// dropped when the layout has no origin bit.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::IdOutOfRange`] if the datacenter, worker
    /// or sequence exceeds its field.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn encode(&self, components: &Components) -> Result<SnowflakeId> {
        let values = self.pack_fields(components)?;
        match self.backend {
            Backend::Wide => Ok(wide::pack(&self.layout, &values)),
            Backend::Narrow => narrow::pack(&self.layout, &values),
        }
    }

    /// Splits an identifier back into its components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] if a numeral does not fit in 63
    /// bits.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn decode(&self, id: &SnowflakeId) -> Result<Components> {
        let values = match self.backend {
            Backend::Wide => wide::unpack(&self.layout, id.to_i64()),
            Backend::Narrow => narrow::unpack(&self.layout, &id.numeral())?,
        };
        Ok(self.unpack_fields(values))
    }

    /// Parses a decimal numeral and decodes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedIdentifier`] if `input` is not a
    /// non-negative integer numeral below 2^63.
    pub fn decode_str(&self, input: &str) -> Result<Components> {
        self.decode(&SnowflakeId::parse(input)?)
    }

    fn pack_fields(&self, components: &Components) -> Result<Packed> {
        for (field, value) in [
            (Field::Datacenter, components.datacenter),
            (Field::Worker, components.worker),
            (Field::Sequence, components.sequence),
        ] {
            let max = self.layout.max(field);
            if value > max {
                return Err(ConfigurationError::IdOutOfRange { field, value, max }.into());
            }
        }

        if components.timestamp > self.layout.max_timestamp_delta() {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                timestamp = components.timestamp,
                max = self.layout.max_timestamp_delta(),
                "timestamp exceeds field capacity and wraps"
            );
        }

        Ok([
            self.layout.timestamp_field(components.timestamp),
            components.datacenter,
            components.worker,
            components.origin.bit() & self.layout.max(Field::Origin),
            components.sequence,
        ])
    }

    fn unpack_fields(&self, values: Packed) -> Components {
        let [timestamp, datacenter, worker, origin, sequence] = values;
        Components {
            timestamp: self.layout.timestamp_delta(timestamp),
            datacenter,
            worker,
            origin: Origin::from_bit(origin),
            sequence,
        }
    }
}
